//! Conversion functionality
//!
//! Translates Avro schema nodes into PostgreSQL types and Avro values into
//! PostgreSQL literals:
//! - `TypeMapper`: schema node -> column type, default literal, composite types
//! - `ValueEncoder`: row value -> SQL literal text
//! - `literal`: escaping and formatting shared by both

pub mod literal;
pub mod type_mapper;
pub mod value_encoder;

use crate::models::SchemaError;

/// Error during type mapping or value encoding
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Conversion error: type={avro_type}, value={value}")]
    Conversion { avro_type: String, value: String },
}

impl ConvertError {
    pub(crate) fn conversion(avro_type: impl ToString, value: impl std::fmt::Debug) -> Self {
        ConvertError::Conversion {
            avro_type: avro_type.to_string(),
            value: format!("{:?}", value),
        }
    }
}

/// What the encoder does when a value matches no mapping for its type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnError {
    /// Propagate the `ConvertError`
    #[default]
    Abort,
    /// Write `NULL` in place of the offending value
    NullOnError,
}

pub use type_mapper::{MappedType, TypeMapper};
pub use value_encoder::{ValueEncoder, event_timestamp_literal};
