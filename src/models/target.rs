//! PostgreSQL target types

use serde::{Deserialize, Serialize};

/// PostgreSQL scalar column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PgType {
    Varchar,
    Bytea,
    Integer,
    BigInt,
    Real,
    DoublePrecision,
    Boolean,
    Numeric,
    Json,
    TimestampTz,
    Timestamp,
    Date,
    TimeTz,
}

impl PgType {
    /// Returns the Postgres type name
    pub fn as_str(&self) -> &'static str {
        match self {
            PgType::Varchar => "VARCHAR",
            PgType::Bytea => "BYTEA",
            PgType::Integer => "INTEGER",
            PgType::BigInt => "BIGINT",
            PgType::Real => "REAL",
            PgType::DoublePrecision => "DOUBLE PRECISION",
            PgType::Boolean => "BOOLEAN",
            PgType::Numeric => "NUMERIC",
            PgType::Json => "JSON",
            PgType::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            PgType::Timestamp => "TIMESTAMP",
            PgType::Date => "DATE",
            PgType::TimeTz => "TIME WITH TIME ZONE",
        }
    }
}

/// Column type derived from an Avro node.
///
/// Produced once per field per file and reused for every row of that file.
/// `Record::fields` is positional and always follows the Avro field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetTypeDescriptor {
    Scalar(PgType),
    Array {
        element: Box<TargetTypeDescriptor>,
        element_type_name: String,
    },
    Record {
        composite_name: String,
        fields: Vec<TargetTypeDescriptor>,
    },
}

impl TargetTypeDescriptor {
    /// SQL type name used in column and attribute declarations.
    pub fn type_name(&self) -> String {
        match self {
            TargetTypeDescriptor::Scalar(pg) => pg.as_str().to_string(),
            TargetTypeDescriptor::Array {
                element_type_name, ..
            } => format!("{}[]", element_type_name),
            TargetTypeDescriptor::Record { composite_name, .. } => composite_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(
            TargetTypeDescriptor::Scalar(PgType::TimestampTz).type_name(),
            "TIMESTAMP WITH TIME ZONE"
        );

        let record = TargetTypeDescriptor::Record {
            composite_name: "events_type_1".to_string(),
            fields: vec![TargetTypeDescriptor::Scalar(PgType::BigInt)],
        };
        let array = TargetTypeDescriptor::Array {
            element_type_name: record.type_name(),
            element: Box::new(record),
        };
        assert_eq!(array.type_name(), "events_type_1[]");
    }
}
