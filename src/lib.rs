pub mod clean;
pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod perms;
pub mod platform;
pub mod report;
pub mod retention;
pub mod util;

pub use error::{Error, Result};
