//! DDL generation
//!
//! Builds one `FileSchema` per input file (the structural DDL fragment plus
//! the column bindings reused by the INSERT writer), derives the file's daily
//! partition from its table name, and assembles the single transactional
//! DDL script for a run.

use super::ExportError;
use crate::convert::{ConvertError, TypeMapper};
use crate::models::{
    AvroSchema, AvroTypeNode, ColumnDef, DdlFragment, PartitionSpec, PgType,
    TargetTypeDescriptor,
};
use crate::validation::input::validate_column_name;
use chrono::{Days, NaiveDate};
use std::path::Path;
use tracing::{debug, warn};

/// Source field carrying microseconds since the Unix epoch.
pub const EVENT_TIMESTAMP_FIELD: &str = "event_timestamp";

/// Synthetic column derived from `event_timestamp`.
pub const EVENT_TIMESTAMP_COLUMN: &str = "eventtimestamp";

/// File name suffix of a run's DDL script.
pub const DDL_SCRIPT_SUFFIX: &str = "_ddl.sql";

/// `<table_name>_ddl.sql`
pub fn ddl_script_name(table_name: &str) -> String {
    format!("{}{}", table_name, DDL_SCRIPT_SUFFIX)
}

/// Whether `path` names a DDL script.
pub fn is_ddl_script(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(DDL_SCRIPT_SUFFIX))
}

/// Where a table column's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    /// A top-level Avro field, encoded against its descriptor
    Field {
        node: AvroTypeNode,
        descriptor: TargetTypeDescriptor,
    },
    /// `eventtimestamp`, computed from the preceding `event_timestamp` field
    EventTimestamp,
}

/// One column of the generated table, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    pub name: String,
    pub source: ColumnSource,
}

/// Generated schema of one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSchema {
    pub fragment: DdlFragment,
    pub columns: Vec<ColumnBinding>,
}

impl FileSchema {
    /// Number of Avro fields bound to columns (excludes derived columns).
    pub fn field_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| matches!(c.source, ColumnSource::Field { .. }))
            .count()
    }
}

/// DDL generator for one run.
#[derive(Debug, Clone)]
pub struct DdlGenerator {
    type_prefix: String,
}

impl DdlGenerator {
    pub fn new(type_prefix: impl Into<String>) -> Self {
        Self {
            type_prefix: type_prefix.into(),
        }
    }

    /// Generate the schema of one file.
    ///
    /// A fresh `TypeMapper` is used per call, so composite numbering restarts
    /// at 1 for every file.
    ///
    /// # Example
    ///
    /// ```rust
    /// use avro_to_postgres::export::DdlGenerator;
    /// use avro_to_postgres::models::AvroSchema;
    ///
    /// let schema = AvroSchema::parse_str(
    ///     r#"{"type": "record", "name": "Root", "fields": [{"name": "event_name", "type": ["null", "string"]}]}"#,
    /// )
    /// .unwrap();
    /// let file_schema = DdlGenerator::new("events").generate(&schema).unwrap();
    /// assert_eq!(file_schema.fragment.table.columns[0].to_sql(), "event_name VARCHAR");
    /// ```
    pub fn generate(&self, schema: &AvroSchema) -> Result<FileSchema, ConvertError> {
        let mut mapper = TypeMapper::new(self.type_prefix.as_str());
        let mut fragment = DdlFragment::default();
        let mut columns = Vec::new();

        for field in schema.fields() {
            if let Err(e) = validate_column_name(&field.name) {
                warn!("Column name validation warning for '{}': {}", field.name, e);
            }

            let mapped = mapper.map(&field.node, field.default.as_ref())?;
            fragment.composite_types.extend(mapped.composite_types);
            fragment.table.columns.push(ColumnDef {
                name: field.name.clone(),
                type_name: mapped.descriptor.type_name(),
                nullable: mapped.nullable,
                default: mapped.default_literal,
            });
            columns.push(ColumnBinding {
                name: field.name.clone(),
                source: ColumnSource::Field {
                    node: field.node.clone(),
                    descriptor: mapped.descriptor,
                },
            });

            if field.name == EVENT_TIMESTAMP_FIELD {
                fragment.table.columns.push(ColumnDef {
                    name: EVENT_TIMESTAMP_COLUMN.to_string(),
                    type_name: PgType::TimestampTz.as_str().to_string(),
                    nullable: true,
                    default: Some("NULL".to_string()),
                });
                columns.push(ColumnBinding {
                    name: EVENT_TIMESTAMP_COLUMN.to_string(),
                    source: ColumnSource::EventTimestamp,
                });
            }
        }

        debug!(
            "Generated {} columns and {} composite types (prefix '{}')",
            fragment.table.columns.len(),
            mapper.composite_count(),
            self.type_prefix
        );

        Ok(FileSchema { fragment, columns })
    }
}

/// Derive the daily partition from the trailing `YYYYMMDD` of a table name.
///
/// # Example
///
/// ```rust
/// use avro_to_postgres::export::derive_partition;
///
/// let spec = derive_partition("events_20231231").unwrap();
/// assert_eq!(spec.date_to.to_string(), "2024-01-01");
/// assert!(derive_partition("events_latest").is_err());
/// ```
pub fn derive_partition(table_name: &str) -> Result<PartitionSpec, ExportError> {
    let invalid = |reason: String| ExportError::InvalidPartitionDate {
        table: table_name.to_string(),
        reason,
    };

    let suffix = table_name
        .len()
        .checked_sub(8)
        .and_then(|start| table_name.get(start..))
        .ok_or_else(|| invalid("name is shorter than an 8-digit date".to_string()))?;

    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(format!("'{}' is not a YYYYMMDD date", suffix)));
    }

    let date_from = NaiveDate::parse_from_str(suffix, "%Y%m%d")
        .map_err(|e| invalid(format!("'{}': {}", suffix, e)))?;
    let date_to = date_from
        .checked_add_days(Days::new(1))
        .ok_or_else(|| invalid("date overflow".to_string()))?;

    Ok(PartitionSpec {
        table_name: table_name.to_string(),
        date_from,
        date_to,
    })
}

/// The single transactional DDL script of a run.
#[derive(Debug, Clone)]
pub struct DdlScript<'a> {
    pub parent_table: &'a str,
    pub partition_column: &'a str,
    pub canonical: &'a DdlFragment,
    pub partitions: &'a [PartitionSpec],
}

impl DdlScript<'_> {
    /// Render `BEGIN;`, composite types, the parent table, partitions in
    /// ascending date order, and `COMMIT;`.
    pub fn render(&self) -> String {
        let mut partitions: Vec<&PartitionSpec> = self.partitions.iter().collect();
        partitions.sort();

        let mut sql = String::from("BEGIN;\n");
        sql.push_str(&self.canonical.to_sql(self.parent_table, self.partition_column));
        for partition in partitions {
            sql.push_str(&partition.to_sql(self.parent_table));
        }
        sql.push_str("COMMIT;\n");
        sql
    }
}
