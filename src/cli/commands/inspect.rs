//! Inspect command implementation
//!
//! Prints the DDL one Avro file would produce on its own.

use crate::cli::error::CliError;
use crate::export::{DdlGenerator, DdlScript, derive_partition};
use crate::import::AvroFile;
use std::path::PathBuf;

/// Arguments for the inspect command
#[derive(Debug, Clone)]
pub struct InspectArgs {
    pub file: PathBuf,
    pub type_prefix: String,
    pub parent_table: String,
    pub partition_column: String,
    /// Print the writer schema JSON as well
    pub show_schema: bool,
}

/// Handle the inspect command
pub fn handle_inspect(args: &InspectArgs) -> Result<(), CliError> {
    if !args.file.exists() {
        return Err(CliError::FileNotFound(args.file.clone()));
    }

    let avro = AvroFile::open(&args.file)?;
    if args.show_schema {
        let pretty = serde_json::to_string_pretty(avro.schema_json())
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        println!("{}", pretty);
    }

    let file_schema = DdlGenerator::new(args.type_prefix.as_str())
        .generate(avro.schema())
        .map_err(|e| CliError::ExportError(e.into()))?;
    let partitions = match derive_partition(avro.table_name()) {
        Ok(partition) => vec![partition],
        Err(e) => {
            tracing::warn!("{}", e);
            Vec::new()
        }
    };

    let ddl = DdlScript {
        parent_table: &args.parent_table,
        partition_column: &args.partition_column,
        canonical: &file_schema.fragment,
        partitions: &partitions,
    }
    .render();
    print!("{}", ddl);
    Ok(())
}
