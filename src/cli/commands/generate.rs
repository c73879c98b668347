//! Generate command implementation

use crate::cli::commands::load_config;
use crate::cli::error::CliError;
use crate::pipeline::{GenerateOptions, generate};
use std::path::PathBuf;

/// Arguments for the generate command
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub workspace: PathBuf,
    pub config: Option<PathBuf>,
    pub avro_home: Option<PathBuf>,
    pub sql_home: Option<PathBuf>,
    pub commit_every: Option<usize>,
    pub null_on_error: bool,
}

/// Handle the generate command
pub fn handle_generate(args: &GenerateArgs) -> Result<(), CliError> {
    let mut config = load_config(&args.workspace, args.config.as_ref())?;
    if let Some(avro_home) = &args.avro_home {
        config.local.avro_home = avro_home.to_string_lossy().into_owned();
    }
    if let Some(sql_home) = &args.sql_home {
        config.local.sql_home = sql_home.to_string_lossy().into_owned();
    }
    if let Some(n) = args.commit_every {
        config.insert.commit_every = n;
    }
    if args.null_on_error {
        config.insert.null_on_error = true;
    }

    let options = GenerateOptions::from_config(&config, &args.workspace)?;
    let report = generate(&options)?;

    match &report.ddl_path {
        Some(ddl_path) => {
            println!("DDL: {}", ddl_path.display());
            for file in &report.files {
                println!("  {} ({} rows)", file.output.display(), file.rows);
            }
            println!(
                "{} files, {} rows",
                report.files.len(),
                report.total_rows()
            );
        }
        None => println!("No Avro files found in {}", options.avro_home.display()),
    }
    Ok(())
}
