//! Avro node -> PostgreSQL column type mapping

use super::ConvertError;
use super::literal::{
    date_from_days, latin1_bytes, quote_text, render_bool, render_bytes, render_date,
    render_decimal, render_double, render_local_timestamp, render_time, render_timestamp,
    time_from_micros, timestamp_from_micros, timestamp_from_millis,
};
use crate::models::{
    AvroTypeNode, CompositeField, CompositeType, LogicalType, PgType, PrimitiveType, RecordSchema,
    SchemaError, TargetTypeDescriptor,
};
use num_bigint::BigInt;
use serde_json::Value;
use tracing::warn;

/// Result of mapping one Avro node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    pub descriptor: TargetTypeDescriptor,
    /// Rendered `DEFAULT` literal, `None` when the schema gives no default.
    pub default_literal: Option<String>,
    pub nullable: bool,
    /// Composite types declared under this node, children before parents.
    pub composite_types: Vec<CompositeType>,
}

/// Maps Avro nodes to PostgreSQL types for one file's generation pass.
///
/// Composite types are named `<prefix>_type_<n>`. The counter belongs to the
/// mapper, so build a new mapper for every file; identical schemas then get
/// identical names.
#[derive(Debug)]
pub struct TypeMapper {
    prefix: String,
    counter: u32,
}

impl TypeMapper {
    /// Create a mapper whose first composite type is `<prefix>_type_1`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use avro_to_postgres::convert::TypeMapper;
    /// use avro_to_postgres::models::AvroTypeNode;
    ///
    /// let node = AvroTypeNode::from_json(&serde_json::json!(["null", "string"])).unwrap();
    /// let mapped = TypeMapper::new("events").map(&node, None).unwrap();
    /// assert_eq!(mapped.descriptor.type_name(), "VARCHAR");
    /// assert!(mapped.nullable);
    /// ```
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    /// Number of composite types named so far.
    pub fn composite_count(&self) -> u32 {
        self.counter
    }

    /// Map a node and its optional JSON default.
    pub fn map(
        &mut self,
        node: &AvroTypeNode,
        default: Option<&Value>,
    ) -> Result<MappedType, ConvertError> {
        let (node, nullable) = node.non_null_member()?;

        let (descriptor, composite_types) = match node {
            AvroTypeNode::Union(_) => {
                return Err(SchemaError(format!("nested union is not allowed: {}", node)).into());
            }
            AvroTypeNode::Primitive(primitive) => {
                (TargetTypeDescriptor::Scalar(primitive_pg_type(*primitive)?), Vec::new())
            }
            AvroTypeNode::Logical { logical, .. } => {
                (TargetTypeDescriptor::Scalar(logical_pg_type(logical)), Vec::new())
            }
            AvroTypeNode::SqlOverride { .. } => {
                (TargetTypeDescriptor::Scalar(PgType::Json), Vec::new())
            }
            AvroTypeNode::Array(items) => {
                let item = self.map(items, None)?;
                let descriptor = TargetTypeDescriptor::Array {
                    element_type_name: item.descriptor.type_name(),
                    element: Box::new(item.descriptor),
                };
                (descriptor, item.composite_types)
            }
            AvroTypeNode::Record(record) => self.map_record(record)?,
        };

        let default_literal = match default {
            Some(value) => render_default(node, value)?,
            None => None,
        };

        Ok(MappedType {
            descriptor,
            default_literal,
            nullable,
            composite_types,
        })
    }

    fn map_record(
        &mut self,
        record: &RecordSchema,
    ) -> Result<(TargetTypeDescriptor, Vec<CompositeType>), ConvertError> {
        // Parents are numbered before their children.
        self.counter += 1;
        let composite_name = format!("{}_type_{}", self.prefix, self.counter);

        let mut composite_types = Vec::new();
        let mut descriptors = Vec::with_capacity(record.fields.len());
        let mut attributes = Vec::with_capacity(record.fields.len());

        for field in &record.fields {
            let mapped = self.map(&field.node, None)?;
            composite_types.extend(mapped.composite_types);
            attributes.push(CompositeField {
                name: field.name.clone(),
                type_name: mapped.descriptor.type_name(),
            });
            descriptors.push(mapped.descriptor);
        }

        composite_types.push(CompositeType {
            name: composite_name.clone(),
            fields: attributes,
        });

        Ok((
            TargetTypeDescriptor::Record {
                composite_name,
                fields: descriptors,
            },
            composite_types,
        ))
    }
}

fn primitive_pg_type(primitive: PrimitiveType) -> Result<PgType, SchemaError> {
    let pg = match primitive {
        PrimitiveType::String => PgType::Varchar,
        PrimitiveType::Bytes => PgType::Bytea,
        PrimitiveType::Int => PgType::Integer,
        PrimitiveType::Long => PgType::BigInt,
        PrimitiveType::Float => PgType::Real,
        PrimitiveType::Double => PgType::DoublePrecision,
        PrimitiveType::Boolean => PgType::Boolean,
        PrimitiveType::Null => {
            return Err(SchemaError(
                "'null' outside a union has no column type".to_string(),
            ));
        }
    };
    Ok(pg)
}

fn logical_pg_type(logical: &LogicalType) -> PgType {
    match logical {
        LogicalType::Decimal { .. } => PgType::Numeric,
        LogicalType::TimestampMillis | LogicalType::TimestampMicros => PgType::TimestampTz,
        LogicalType::Date => PgType::Date,
        LogicalType::TimeMillis | LogicalType::TimeMicros => PgType::TimeTz,
        LogicalType::LocalTimestampMillis | LogicalType::LocalTimestampMicros => {
            PgType::Timestamp
        }
    }
}

/// Render a schema default for the non-null member `node`.
fn render_default(node: &AvroTypeNode, value: &Value) -> Result<Option<String>, ConvertError> {
    if value.is_null() {
        return Ok(Some("NULL".to_string()));
    }

    let mismatch = || ConvertError::conversion(node, value);

    let literal = match node {
        AvroTypeNode::Primitive(PrimitiveType::String) => {
            quote_text(value.as_str().ok_or_else(mismatch)?)
        }
        AvroTypeNode::Primitive(PrimitiveType::Bytes) => {
            let bytes = value.as_str().and_then(latin1_bytes).ok_or_else(mismatch)?;
            render_bytes(&bytes)
        }
        AvroTypeNode::Primitive(PrimitiveType::Int | PrimitiveType::Long) => {
            value.as_i64().ok_or_else(mismatch)?.to_string()
        }
        AvroTypeNode::Primitive(PrimitiveType::Float | PrimitiveType::Double) => {
            render_double(value.as_f64().ok_or_else(mismatch)?)
        }
        AvroTypeNode::Primitive(PrimitiveType::Boolean) => {
            render_bool(value.as_bool().ok_or_else(mismatch)?).to_string()
        }
        AvroTypeNode::SqlOverride { .. } => match value.as_str() {
            Some(text) => quote_text(text),
            None => quote_text(&value.to_string()),
        },
        AvroTypeNode::Logical { logical, .. } => render_logical_default(logical, value)
            .ok_or_else(mismatch)?,
        AvroTypeNode::Array(_) => return Ok(None),
        AvroTypeNode::Record(record) => {
            warn!(
                "Ignoring non-null default for record '{}'; composite defaults are not rendered",
                record.name
            );
            return Ok(None);
        }
        AvroTypeNode::Primitive(PrimitiveType::Null) | AvroTypeNode::Union(_) => {
            return Err(mismatch());
        }
    };

    Ok(Some(literal))
}

fn render_logical_default(logical: &LogicalType, value: &Value) -> Option<String> {
    if let Some(text) = value.as_str() {
        return match logical {
            LogicalType::Decimal { scale, .. } => {
                let bytes = latin1_bytes(text)?;
                Some(render_decimal(&BigInt::from_signed_bytes_be(&bytes), *scale))
            }
            _ => Some(quote_text(text)),
        };
    }

    let literal = match logical {
        LogicalType::Decimal { .. } => value.is_number().then(|| value.to_string())?,
        LogicalType::TimestampMillis => render_timestamp(&timestamp_from_millis(value.as_i64()?)?),
        LogicalType::TimestampMicros => render_timestamp(&timestamp_from_micros(value.as_i64()?)?),
        LogicalType::Date => render_date(&date_from_days(value.as_i64()?)?),
        LogicalType::TimeMillis => render_time(&time_from_micros(value.as_i64()?.checked_mul(1_000)?)?),
        LogicalType::TimeMicros => render_time(&time_from_micros(value.as_i64()?)?),
        LogicalType::LocalTimestampMillis => {
            render_local_timestamp(&timestamp_from_millis(value.as_i64()?)?.naive_utc())
        }
        LogicalType::LocalTimestampMicros => {
            render_local_timestamp(&timestamp_from_micros(value.as_i64()?)?.naive_utc())
        }
    };
    Some(literal)
}
