//! Export functionality
//!
//! Produces the generated SQL text:
//! - DDL (composite types, partitioned parent table, daily partitions)
//! - INSERT scripts batched into bounded transactions

pub mod ddl;
pub mod insert;

use crate::convert::ConvertError;

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Invalid partition date in table name '{table}': {reason}")]
    InvalidPartitionDate { table: String, reason: String },
    #[error("Record shape error: {0}")]
    RecordShape(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

// Re-export for convenience
pub use ddl::{
    ColumnBinding, ColumnSource, DDL_SCRIPT_SUFFIX, DdlGenerator, DdlScript,
    EVENT_TIMESTAMP_COLUMN, FileSchema, ddl_script_name, derive_partition, is_ddl_script,
};
pub use insert::{DEFAULT_COMMIT_EVERY, StatementWriter};
