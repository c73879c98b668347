//! Cross-file schema consistency.
//!
//! Every input file of a run must generate the same DDL fragment as the first
//! (newest) file, since all partitions attach to one parent table.

use crate::models::{CompositeType, DdlFragment};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Error raised when a file's schema differs from the canonical one.
#[derive(Debug, Clone, Error)]
pub enum ConsistencyError {
    #[error(
        "Schema of '{}' differs from '{}': {detail}",
        file.display(),
        canonical_file.display()
    )]
    SchemaMismatch {
        file: PathBuf,
        canonical_file: PathBuf,
        detail: String,
    },
}

/// Compares each file's fragment against the first one seen.
#[derive(Debug, Default)]
pub struct SchemaConsistencyValidator {
    canonical: Option<(PathBuf, DdlFragment)>,
}

impl SchemaConsistencyValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the first fragment as canonical, or compare a later one to it.
    pub fn check(&mut self, path: &Path, fragment: &DdlFragment) -> Result<(), ConsistencyError> {
        let Some((canonical_file, canonical)) = &self.canonical else {
            debug!(
                "Canonical schema from {} (sha256 {})",
                path.display(),
                fingerprint(fragment)
            );
            self.canonical = Some((path.to_path_buf(), fragment.clone()));
            return Ok(());
        };

        if canonical == fragment {
            return Ok(());
        }

        Err(ConsistencyError::SchemaMismatch {
            file: path.to_path_buf(),
            canonical_file: canonical_file.clone(),
            detail: first_difference(canonical, fragment),
        })
    }

    /// The canonical fragment, once a file has been checked.
    pub fn canonical(&self) -> Option<&DdlFragment> {
        self.canonical.as_ref().map(|(_, fragment)| fragment)
    }

    /// Hex sha256 of the canonical fragment's rendering.
    pub fn fingerprint(&self) -> Option<String> {
        self.canonical().map(fingerprint)
    }
}

/// Hex sha256 of a fragment's composite types and column definitions.
pub fn fingerprint(fragment: &DdlFragment) -> String {
    let mut hasher = Sha256::new();
    for composite in &fragment.composite_types {
        hasher.update(composite.to_sql().as_bytes());
    }
    for column in &fragment.table.columns {
        hasher.update(column.to_sql().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

fn first_difference(expected: &DdlFragment, actual: &DdlFragment) -> String {
    let expected_columns = &expected.table.columns;
    let actual_columns = &actual.table.columns;
    for (i, (e, a)) in expected_columns.iter().zip(actual_columns).enumerate() {
        if e != a {
            return format!(
                "column {} is '{}', expected '{}'",
                i + 1,
                a.to_sql(),
                e.to_sql()
            );
        }
    }
    if expected_columns.len() != actual_columns.len() {
        return format!(
            "{} columns, expected {}",
            actual_columns.len(),
            expected_columns.len()
        );
    }

    for (e, a) in expected.composite_types.iter().zip(&actual.composite_types) {
        if e != a {
            return format!(
                "composite type {} is {}, expected {}",
                a.name,
                describe(a),
                describe(e)
            );
        }
    }
    format!(
        "{} composite types, expected {}",
        actual.composite_types.len(),
        expected.composite_types.len()
    )
}

fn describe(composite: &CompositeType) -> String {
    let fields = composite
        .fields
        .iter()
        .map(|f| format!("{} {}", f.name, f.type_name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", composite.name, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDef, CompositeField, TableDef};

    fn fragment(columns: &[(&str, &str, bool)]) -> DdlFragment {
        DdlFragment {
            composite_types: vec![],
            table: TableDef {
                columns: columns
                    .iter()
                    .map(|(name, type_name, nullable)| ColumnDef {
                        name: name.to_string(),
                        type_name: type_name.to_string(),
                        nullable: *nullable,
                        default: None,
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_identical_fragments_pass() {
        let mut validator = SchemaConsistencyValidator::new();
        let f = fragment(&[("event_date", "VARCHAR", true)]);
        validator.check(Path::new("a.avro"), &f).unwrap();
        validator.check(Path::new("b.avro"), &f).unwrap();
        assert_eq!(validator.canonical(), Some(&f));
        assert_eq!(validator.fingerprint(), Some(fingerprint(&f)));
    }

    #[test]
    fn test_nullability_difference_is_reported() {
        let mut validator = SchemaConsistencyValidator::new();
        validator
            .check(Path::new("new.avro"), &fragment(&[("id", "BIGINT", true)]))
            .unwrap();
        let err = validator
            .check(Path::new("old.avro"), &fragment(&[("id", "BIGINT", false)]))
            .unwrap_err();

        let ConsistencyError::SchemaMismatch {
            file,
            canonical_file,
            detail,
        } = err;
        assert_eq!(file, PathBuf::from("old.avro"));
        assert_eq!(canonical_file, PathBuf::from("new.avro"));
        assert_eq!(detail, "column 1 is 'id BIGINT NOT NULL', expected 'id BIGINT'");
    }

    #[test]
    fn test_extra_column_is_reported() {
        let mut validator = SchemaConsistencyValidator::new();
        validator
            .check(Path::new("a.avro"), &fragment(&[("id", "BIGINT", true)]))
            .unwrap();
        let err = validator
            .check(
                Path::new("b.avro"),
                &fragment(&[("id", "BIGINT", true), ("name", "VARCHAR", true)]),
            )
            .unwrap_err();
        assert!(err.to_string().contains("2 columns, expected 1"));
    }

    #[test]
    fn test_composite_difference_is_reported() {
        let mut canonical = fragment(&[("device", "events_type_1", true)]);
        canonical.composite_types.push(CompositeType {
            name: "events_type_1".to_string(),
            fields: vec![CompositeField {
                name: "category".to_string(),
                type_name: "VARCHAR".to_string(),
            }],
        });
        let mut other = canonical.clone();
        other.composite_types[0].fields[0].type_name = "BIGINT".to_string();

        let mut validator = SchemaConsistencyValidator::new();
        validator.check(Path::new("a.avro"), &canonical).unwrap();
        let err = validator.check(Path::new("b.avro"), &other).unwrap_err();
        assert!(err.to_string().contains(
            "composite type events_type_1 is events_type_1(category BIGINT), expected events_type_1(category VARCHAR)"
        ));
        assert_ne!(fingerprint(&canonical), fingerprint(&other));
    }
}
