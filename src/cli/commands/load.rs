//! Load command implementation

use crate::cli::commands::load_config;
use crate::cli::error::CliError;
use crate::database::{DatabaseError, PostgresExecutor, load_scripts};
use std::path::PathBuf;

/// Arguments for the load command
#[derive(Debug, Clone)]
pub struct LoadArgs {
    pub workspace: PathBuf,
    pub config: Option<PathBuf>,
    pub connection_string: Option<String>,
}

/// Handle the load command: run the generated DDL and INSERT scripts
pub fn handle_load(args: &LoadArgs) -> Result<(), CliError> {
    let config = load_config(&args.workspace, args.config.as_ref())?;
    let connection_string = args
        .connection_string
        .clone()
        .or_else(|| config.postgres.connection_string.clone())
        .ok_or_else(|| {
            DatabaseError::ConfigError(
                "no connection string (set [postgres] connection_string or --connection-string)"
                    .to_string(),
            )
        })?;
    let sql_home = config.sql_home(&args.workspace);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::IoError(format!("Failed to start runtime: {}", e)))?;
    let report = runtime.block_on(async {
        let mut executor = PostgresExecutor::connect(&connection_string).await?;
        load_scripts(&mut executor, &sql_home).await
    })?;

    println!(
        "Executed {} and {} INSERT scripts",
        report.ddl_script.display(),
        report.insert_scripts.len()
    );
    Ok(())
}
