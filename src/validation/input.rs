//! Identifier validation.
//!
//! Generated SQL emits table, column and type names unquoted, so they have to
//! be valid unquoted PostgreSQL identifiers. Avro names are checked while
//! generating; a failing name is logged as a warning and emitted unchanged.
//! Configured names (type prefix, parent table) are checked strictly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest identifier PostgreSQL keeps without truncation (NAMEDATALEN - 1)
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Errors that can occur during identifier validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// Input is empty when a value is required
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Input exceeds maximum allowed length
    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Input contains invalid characters
    #[error("{field} contains invalid characters: {reason}")]
    InvalidCharacters { field: &'static str, reason: String },

    /// Input has invalid format
    #[error("{0}: {1}")]
    InvalidFormat(&'static str, String),

    /// Input is a reserved word
    #[error("{field} cannot be a reserved word: {word}")]
    ReservedWord { field: &'static str, word: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a table name.
///
/// # Rules
///
/// - Must not be empty
/// - Must not exceed 63 bytes
/// - Must start with a letter or underscore
/// - May contain letters, digits, underscores and `$`
/// - Cannot be a reserved word
///
/// # Examples
///
/// ```
/// use avro_to_postgres::validation::input::validate_table_name;
///
/// assert!(validate_table_name("events_20231101").is_ok());
/// assert!(validate_table_name("").is_err());
/// assert!(validate_table_name("2023_events").is_err());
/// assert!(validate_table_name("events-20231101").is_err());
/// ```
pub fn validate_table_name(name: &str) -> ValidationResult<()> {
    validate_identifier("table name", name)
}

/// Validate a column or composite attribute name.
///
/// Same rules as [`validate_table_name`].
///
/// # Examples
///
/// ```
/// use avro_to_postgres::validation::input::validate_column_name;
///
/// assert!(validate_column_name("event_timestamp").is_ok());
/// assert!(validate_column_name("user").is_err());
/// ```
pub fn validate_column_name(name: &str) -> ValidationResult<()> {
    validate_identifier("column name", name)
}

/// Validate the composite type prefix.
///
/// The prefix is followed by `_type_<n>`, so the length limit leaves room for
/// that suffix.
pub fn validate_type_prefix(prefix: &str) -> ValidationResult<()> {
    validate_identifier("type prefix", prefix)?;
    // "_type_" plus up to 4 digits
    let max = MAX_IDENTIFIER_LENGTH - 10;
    if prefix.len() > max {
        return Err(ValidationError::TooLong {
            field: "type prefix",
            max,
            actual: prefix.len(),
        });
    }
    Ok(())
}

fn validate_identifier(field: &'static str, name: &str) -> ValidationResult<()> {
    let Some(first_char) = name.chars().next() else {
        return Err(ValidationError::Empty(field));
    };

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_IDENTIFIER_LENGTH,
            actual: name.len(),
        });
    }

    if !first_char.is_alphabetic() && first_char != '_' {
        return Err(ValidationError::InvalidFormat(
            field,
            "must start with a letter or underscore".to_string(),
        ));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !c.is_alphanumeric() && *c != '_' && *c != '$')
    {
        return Err(ValidationError::InvalidCharacters {
            field,
            reason: format!("invalid character: '{}'", c),
        });
    }

    if is_sql_reserved_word(name) {
        return Err(ValidationError::ReservedWord {
            field,
            word: name.to_string(),
        });
    }

    Ok(())
}

/// Check if a word is reserved in PostgreSQL and cannot be used unquoted as
/// a column or table name.
pub fn is_sql_reserved_word(word: &str) -> bool {
    const RESERVED_WORDS: &[&str] = &[
        "all",
        "analyse",
        "analyze",
        "and",
        "any",
        "array",
        "as",
        "asc",
        "asymmetric",
        "both",
        "case",
        "cast",
        "check",
        "collate",
        "column",
        "constraint",
        "create",
        "current_catalog",
        "current_date",
        "current_role",
        "current_time",
        "current_timestamp",
        "current_user",
        "default",
        "deferrable",
        "desc",
        "distinct",
        "do",
        "else",
        "end",
        "except",
        "false",
        "fetch",
        "for",
        "foreign",
        "from",
        "grant",
        "group",
        "having",
        "in",
        "initially",
        "intersect",
        "into",
        "lateral",
        "leading",
        "limit",
        "localtime",
        "localtimestamp",
        "not",
        "null",
        "offset",
        "on",
        "only",
        "or",
        "order",
        "placing",
        "primary",
        "references",
        "returning",
        "select",
        "session_user",
        "some",
        "symmetric",
        "system_user",
        "table",
        "then",
        "to",
        "trailing",
        "true",
        "union",
        "unique",
        "user",
        "using",
        "variadic",
        "when",
        "where",
        "window",
        "with",
    ];

    let lower = word.to_lowercase();
    RESERVED_WORDS.contains(&lower.as_str())
}
