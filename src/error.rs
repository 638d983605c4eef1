use std::path::PathBuf;

use crate::retention::PolicyError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read backup folder {}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config file {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid retention policy: {0}")]
    Policy(#[from] PolicyError),
}

pub type Result<T> = std::result::Result<T, Error>;
