//! Init-config command implementation

use crate::cli::error::CliError;
use crate::config::{CONFIG_FILENAME, sample_config};
use std::path::{Path, PathBuf};

/// Handle the init-config command: write the sample configuration into the workspace
pub fn handle_init_config(workspace: &Path, force: bool) -> Result<PathBuf, CliError> {
    let path = workspace.join(CONFIG_FILENAME);
    if path.exists() && !force {
        return Err(CliError::FileExists(path));
    }

    std::fs::create_dir_all(workspace)
        .map_err(|e| CliError::FileWriteError(workspace.to_path_buf(), e.to_string()))?;
    std::fs::write(&path, sample_config())
        .map_err(|e| CliError::FileWriteError(path.clone(), e.to_string()))?;

    println!("Wrote {}", path.display());
    Ok(path)
}
