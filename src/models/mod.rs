//! Models module
//!
//! Defines the Avro-side schema tree, the PostgreSQL-side type descriptors
//! and the structural DDL produced from them.

pub mod avro_type;
pub mod ddl;
pub mod target;

pub use avro_type::{
    AvroField, AvroSchema, AvroTypeNode, LogicalType, PrimitiveType, RecordSchema, SqlOverride,
};
pub use ddl::{ColumnDef, CompositeField, CompositeType, DdlFragment, PartitionSpec, TableDef};
pub use target::{PgType, TargetTypeDescriptor};

/// Malformed or unsupported Avro schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Schema error: {0}")]
pub struct SchemaError(pub String);
