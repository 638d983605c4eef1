use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::{FixPermsArgs, ListArgs, PruneArgs};
use crate::error::{Error, Result};
use crate::perms::{self, OwnershipSpec};
use crate::platform;
use crate::retention::RetentionPolicy;

/// Contents of `config.toml`. Every key is optional, command line flags win.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub folder: Option<PathBuf>,
    pub trim_days: Option<u32>,
    pub keep_days: Option<u32>,
    pub min_keep: Option<usize>,
    pub dry_run: Option<bool>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub mode: Option<String>,
}

/// `~/.config/worldtrim/config.toml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "worldtrim")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl FileConfig {
    /// Loads an explicitly named file, or the default one if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::read(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::read(&path),
                _ => Ok(FileConfig::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let config: FileConfig = toml::from_str(text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

pub struct Config {
    pub folder: PathBuf,
    pub policy: RetentionPolicy,
    pub dry_run: bool,
    pub json_output: bool,
    pub ownership: OwnershipSpec,
}

impl Config {
    pub fn from_prune_args(args: &PruneArgs, file: &FileConfig) -> Result<Self> {
        let defaults = RetentionPolicy::default();
        let policy = RetentionPolicy {
            trim_days: args.trim_days.or(file.trim_days).unwrap_or(defaults.trim_days),
            keep_days: args.keep_days.or(file.keep_days).unwrap_or(defaults.keep_days),
            min_keep: args.min_keep.or(file.min_keep).unwrap_or(defaults.min_keep),
        };
        policy.validate()?;

        Ok(Config {
            folder: resolve_folder(args.folder.as_deref(), file)?,
            policy,
            // a dry run in either place wins, the flag cannot turn it off
            dry_run: args.dry_run || file.dry_run.unwrap_or(false),
            json_output: args.json,
            ownership: OwnershipSpec::default(),
        })
    }

    pub fn from_list_args(args: &ListArgs, file: &FileConfig) -> Result<Self> {
        Ok(Config {
            folder: resolve_folder(args.folder.as_deref(), file)?,
            policy: RetentionPolicy::default(),
            dry_run: true,
            json_output: args.json,
            ownership: OwnershipSpec::default(),
        })
    }

    pub fn from_perms_args(args: &FixPermsArgs, file: &FileConfig) -> Result<Self> {
        let mode = match args.mode.as_deref().or(file.mode.as_deref()) {
            Some(text) => Some(perms::parse_mode(text)?),
            None => None,
        };

        let ownership = OwnershipSpec {
            uid: args.uid.or(file.uid),
            gid: args.gid.or(file.gid),
            mode,
        };

        if ownership.is_empty() {
            return Err(Error::Config(
                "nothing to apply, set at least one of uid, gid or mode".to_string(),
            ));
        }

        Ok(Config {
            folder: resolve_folder(args.folder.as_deref(), file)?,
            policy: RetentionPolicy::default(),
            dry_run: false,
            json_output: false,
            ownership,
        })
    }
}

fn resolve_folder(flag: Option<&Path>, file: &FileConfig) -> Result<PathBuf> {
    flag.or(file.folder.as_deref())
        .map(platform::expand_home)
        .ok_or_else(|| {
            Error::Config("no backup folder given, pass --folder or set `folder` in the config file".to_string())
        })
}
