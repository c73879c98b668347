//! Validation functionality
//!
//! Provides validation logic for:
//! - Schema consistency across the files of one run
//! - Identifier validation for generated SQL names

pub mod consistency;
pub mod input;

pub use consistency::{ConsistencyError, SchemaConsistencyValidator, fingerprint};
pub use input::{
    ValidationError, validate_column_name, validate_table_name, validate_type_prefix,
};
