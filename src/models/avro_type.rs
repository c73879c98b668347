//! Avro type model
//!
//! A closed representation of the Avro schema shapes found in daily event
//! exports. Parsing happens once per input file from the raw `avro.schema`
//! JSON stored in the container header, so vendor attributes such as
//! `sqlType` survive.

use super::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Avro primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveType {
    /// Look up a primitive by its Avro name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(PrimitiveType::Null),
            "boolean" => Some(PrimitiveType::Boolean),
            "int" => Some(PrimitiveType::Int),
            "long" => Some(PrimitiveType::Long),
            "float" => Some(PrimitiveType::Float),
            "double" => Some(PrimitiveType::Double),
            "bytes" => Some(PrimitiveType::Bytes),
            "string" => Some(PrimitiveType::String),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Bytes => "bytes",
            PrimitiveType::String => "string",
        }
    }
}

/// Avro logical types with a dedicated PostgreSQL mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalType {
    Decimal { precision: u32, scale: u32 },
    TimestampMillis,
    TimestampMicros,
    Date,
    TimeMillis,
    TimeMicros,
    LocalTimestampMillis,
    LocalTimestampMicros,
}

impl LogicalType {
    pub fn name(&self) -> &'static str {
        match self {
            LogicalType::Decimal { .. } => "decimal",
            LogicalType::TimestampMillis => "timestamp-millis",
            LogicalType::TimestampMicros => "timestamp-micros",
            LogicalType::Date => "date",
            LogicalType::TimeMillis => "time-millis",
            LogicalType::TimeMicros => "time-micros",
            LogicalType::LocalTimestampMillis => "local-timestamp-millis",
            LogicalType::LocalTimestampMicros => "local-timestamp-micros",
        }
    }
}

/// Vendor `sqlType` tags that override the column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlOverride {
    Json,
}

/// A field of an Avro record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvroField {
    pub name: String,
    pub node: AvroTypeNode,
    /// Raw JSON default; `Some(Value::Null)` is an explicit `"default": null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// An Avro record: name plus ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<AvroField>,
}

/// One node of an Avro schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AvroTypeNode {
    Primitive(PrimitiveType),
    Union(Vec<AvroTypeNode>),
    Logical {
        logical: LogicalType,
        base: PrimitiveType,
    },
    SqlOverride {
        sql_type: SqlOverride,
        base: PrimitiveType,
    },
    Array(Box<AvroTypeNode>),
    Record(RecordSchema),
}

impl AvroTypeNode {
    /// Parse a schema node from its JSON form.
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::String(name) => PrimitiveType::from_name(name)
                .map(AvroTypeNode::Primitive)
                .ok_or_else(|| SchemaError(format!("unknown or unsupported type name '{}'", name))),
            Value::Array(members) => members
                .iter()
                .map(AvroTypeNode::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(AvroTypeNode::Union),
            Value::Object(obj) => {
                let type_value = obj
                    .get("type")
                    .ok_or_else(|| SchemaError("type object missing 'type'".to_string()))?;

                match type_value.as_str() {
                    Some("array") => {
                        let items = obj
                            .get("items")
                            .ok_or_else(|| SchemaError("array type missing 'items'".to_string()))?;
                        return Ok(AvroTypeNode::Array(Box::new(AvroTypeNode::from_json(items)?)));
                    }
                    Some("record") => {
                        return Ok(AvroTypeNode::Record(RecordSchema::from_json(value)?));
                    }
                    Some(other @ ("map" | "enum" | "fixed")) => {
                        return Err(SchemaError(format!("unsupported complex type '{}'", other)));
                    }
                    _ => {}
                }

                let base = match AvroTypeNode::from_json(type_value)? {
                    AvroTypeNode::Primitive(base) => base,
                    // {"type": {...}} wrapping a complex node without annotations
                    nested => return Ok(nested),
                };

                if let Some(sql_type) = obj.get("sqlType").and_then(|v| v.as_str()) {
                    if sql_type == "JSON" {
                        return Ok(AvroTypeNode::SqlOverride {
                            sql_type: SqlOverride::Json,
                            base,
                        });
                    }
                    warn!(
                        "Unsupported sqlType '{}', falling back to '{}'",
                        sql_type,
                        base.name()
                    );
                }

                if let Some(logical) = obj.get("logicalType").and_then(|v| v.as_str()) {
                    match parse_logical(logical, obj) {
                        Some(logical) => return Ok(AvroTypeNode::Logical { logical, base }),
                        None => warn!(
                            "Unsupported logicalType '{}', falling back to '{}'",
                            logical,
                            base.name()
                        ),
                    }
                }

                Ok(AvroTypeNode::Primitive(base))
            }
            other => Err(SchemaError(format!("unrecognized type shape: {}", other))),
        }
    }

    /// Reduce a union to its single non-null member.
    ///
    /// Returns the member and whether a null marker was present. Non-union
    /// nodes are returned as-is with `nullable = false`.
    pub fn non_null_member(&self) -> Result<(&AvroTypeNode, bool), SchemaError> {
        let AvroTypeNode::Union(members) = self else {
            return Ok((self, false));
        };

        let nullable = members
            .iter()
            .any(|m| matches!(m, AvroTypeNode::Primitive(PrimitiveType::Null)));
        let mut rest = members
            .iter()
            .filter(|m| !matches!(m, AvroTypeNode::Primitive(PrimitiveType::Null)));

        match (rest.next(), rest.next()) {
            (Some(member), None) => Ok((member, nullable)),
            (None, _) => Err(SchemaError("union has no non-null member".to_string())),
            (Some(_), Some(_)) => Err(SchemaError(format!(
                "union has more than one non-null member: {}",
                self
            ))),
        }
    }
}

fn parse_logical(name: &str, obj: &serde_json::Map<String, Value>) -> Option<LogicalType> {
    let logical = match name {
        "decimal" => LogicalType::Decimal {
            precision: obj.get("precision").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            scale: obj.get("scale").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        },
        "timestamp-millis" => LogicalType::TimestampMillis,
        "timestamp-micros" => LogicalType::TimestampMicros,
        "date" => LogicalType::Date,
        "time-millis" => LogicalType::TimeMillis,
        "time-micros" => LogicalType::TimeMicros,
        "local-timestamp-millis" => LogicalType::LocalTimestampMillis,
        "local-timestamp-micros" => LogicalType::LocalTimestampMicros,
        _ => return None,
    };
    Some(logical)
}

impl fmt::Display for AvroTypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvroTypeNode::Primitive(p) => write!(f, "{}", p.name()),
            AvroTypeNode::Union(members) => {
                write!(f, "[")?;
                for (idx, member) in members.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, "]")
            }
            AvroTypeNode::Logical { logical, base } => {
                write!(f, "{}({})", logical.name(), base.name())
            }
            AvroTypeNode::SqlOverride { base, .. } => write!(f, "JSON({})", base.name()),
            AvroTypeNode::Array(items) => write!(f, "array<{}>", items),
            AvroTypeNode::Record(record) => write!(f, "record {}", record.name),
        }
    }
}

impl RecordSchema {
    /// Parse a `{"type": "record", "name": ..., "fields": [...]}` object.
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SchemaError("record schema must be an object".to_string()))?;

        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let fields = obj
            .get("fields")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SchemaError(format!("record '{}' missing 'fields'", name)))?
            .iter()
            .map(AvroField::from_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { name, fields })
    }
}

impl AvroField {
    fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SchemaError("field must be an object".to_string()))?;

        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError("field missing name".to_string()))?
            .to_string();

        let type_value = obj
            .get("type")
            .ok_or_else(|| SchemaError(format!("field '{}' missing type", name)))?;
        let node = AvroTypeNode::from_json(type_value)
            .map_err(|e| SchemaError(format!("field '{}': {}", name, e.0)))?;

        Ok(Self {
            name,
            node,
            default: obj.get("default").cloned(),
        })
    }
}

/// The top-level record schema of one Avro container file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvroSchema {
    pub record: RecordSchema,
}

impl AvroSchema {
    /// Parse the schema document stored under `avro.schema`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use avro_to_postgres::models::AvroSchema;
    ///
    /// let schema = AvroSchema::parse_str(
    ///     r#"{"type": "record", "name": "Root", "fields": [{"name": "id", "type": "long"}]}"#,
    /// )
    /// .unwrap();
    /// assert_eq!(schema.fields().len(), 1);
    /// ```
    pub fn parse_str(content: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| SchemaError(format!("schema is not valid JSON: {}", e)))?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        Ok(Self {
            record: RecordSchema::from_json(value)?,
        })
    }

    pub fn fields(&self) -> &[AvroField] {
        &self.record.fields
    }
}
