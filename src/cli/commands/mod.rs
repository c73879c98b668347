//! CLI command implementations

pub mod generate;
pub mod init;
pub mod inspect;
#[cfg(feature = "postgres-backend")]
pub mod load;

use crate::cli::error::CliError;
use crate::config::Config;
use std::path::{Path, PathBuf};

/// Load the explicit config file if given, else `<workspace>/avro-to-postgres.toml`
/// or defaults.
pub fn load_config(workspace: &Path, config: Option<&PathBuf>) -> Result<Config, CliError> {
    match config {
        Some(path) if !path.exists() => Err(CliError::FileNotFound(path.clone())),
        Some(path) => Ok(Config::load_file(path)?),
        None => Ok(Config::load(workspace)?),
    }
}
