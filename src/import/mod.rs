//! Import functionality
//!
//! Reads Avro object container files:
//! - the raw writer schema from the container header
//! - the records, as `apache_avro::types::Value`
//! - discovery of the daily export files under the Avro home

pub mod avro;

use crate::models::SchemaError;

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Avro error: {0}")]
    AvroError(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// Re-export for convenience
pub use avro::{AvroFile, AvroRecords, DEFAULT_FILE_PATTERN, discover_avro_files};
