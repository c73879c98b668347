//! Avro value -> PostgreSQL literal encoding
//!
//! Dispatch mirrors `TypeMapper`: the Avro node decides how a value is
//! rendered, and the `TargetTypeDescriptor` produced for the same node
//! supplies array element types and composite field order. Record fields are
//! zipped positionally, never looked up by name.

use super::literal::{
    date_from_days, quote_text, render_bool, render_bytes, render_date, render_decimal,
    render_double, render_float, render_local_timestamp, render_time, render_timestamp,
    time_from_micros, timestamp_from_micros, timestamp_from_millis,
};
use super::{ConvertError, OnError};
use crate::models::{AvroTypeNode, LogicalType, PrimitiveType, TargetTypeDescriptor};
use apache_avro::types::Value;
use chrono::DateTime;
use num_bigint::BigInt;
use tracing::debug;

/// Encodes row values as SQL literal text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueEncoder {
    on_error: OnError,
}

impl ValueEncoder {
    pub fn new(on_error: OnError) -> Self {
        Self { on_error }
    }

    pub fn on_error(&self) -> OnError {
        self.on_error
    }

    /// Encode one value. A null value is always `NULL`, whatever the
    /// declared nullability.
    ///
    /// # Example
    ///
    /// ```rust
    /// use apache_avro::types::Value;
    /// use avro_to_postgres::convert::{TypeMapper, ValueEncoder};
    /// use avro_to_postgres::models::AvroTypeNode;
    ///
    /// let node = AvroTypeNode::from_json(&serde_json::json!("string")).unwrap();
    /// let mapped = TypeMapper::new("events").map(&node, None).unwrap();
    /// let literal = ValueEncoder::default()
    ///     .encode(&node, &mapped.descriptor, &Value::String("page_view".into()))
    ///     .unwrap();
    /// assert_eq!(literal, "'page_view'");
    /// ```
    pub fn encode(
        &self,
        node: &AvroTypeNode,
        descriptor: &TargetTypeDescriptor,
        value: &Value,
    ) -> Result<String, ConvertError> {
        let value = unwrap_union(value);
        if matches!(value, Value::Null) {
            return Ok("NULL".to_string());
        }

        match self.encode_value(node, descriptor, value) {
            Err(err @ ConvertError::Conversion { .. }) if self.on_error == OnError::NullOnError => {
                debug!("Substituting NULL: {}", err);
                Ok("NULL".to_string())
            }
            result => result,
        }
    }

    fn encode_value(
        &self,
        node: &AvroTypeNode,
        descriptor: &TargetTypeDescriptor,
        value: &Value,
    ) -> Result<String, ConvertError> {
        let (node, _) = node.non_null_member()?;

        let literal = match (node, descriptor, value) {
            (
                AvroTypeNode::Array(items),
                TargetTypeDescriptor::Array {
                    element,
                    element_type_name,
                },
                Value::Array(values),
            ) => {
                let elements = values
                    .iter()
                    .map(|v| self.encode(items, element, v))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("ARRAY[{}]::{}[]", elements.join(","), element_type_name)
            }
            (
                AvroTypeNode::Record(record),
                TargetTypeDescriptor::Record { fields, .. },
                Value::Record(values),
            ) if record.fields.len() == fields.len() && fields.len() == values.len() => {
                let encoded = record
                    .fields
                    .iter()
                    .zip(fields)
                    .zip(values)
                    .map(|((field, descriptor), (_, v))| self.encode(&field.node, descriptor, v))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("ROW({})", encoded.join(","))
            }
            (_, TargetTypeDescriptor::Scalar(_), _) => encode_scalar(node, value).unwrap_or_default(),
            _ => String::new(),
        };

        if literal.is_empty() {
            return Err(ConvertError::conversion(node, value));
        }
        Ok(literal)
    }
}

fn unwrap_union(value: &Value) -> &Value {
    match value {
        Value::Union(_, inner) => unwrap_union(inner),
        other => other,
    }
}

fn encode_scalar(node: &AvroTypeNode, value: &Value) -> Option<String> {
    let literal = match (node, value) {
        (AvroTypeNode::Primitive(PrimitiveType::String), Value::String(s)) => quote_text(s),
        (AvroTypeNode::Primitive(PrimitiveType::String), Value::Enum(_, s)) => quote_text(s),
        (AvroTypeNode::Primitive(PrimitiveType::String), Value::Uuid(u)) => {
            quote_text(&u.to_string())
        }
        (AvroTypeNode::Primitive(PrimitiveType::Bytes), Value::Bytes(b)) => render_bytes(b),
        (AvroTypeNode::Primitive(PrimitiveType::Int), Value::Int(i)) => i.to_string(),
        (AvroTypeNode::Primitive(PrimitiveType::Long), Value::Long(i)) => i.to_string(),
        (AvroTypeNode::Primitive(PrimitiveType::Long), Value::Int(i)) => i.to_string(),
        (AvroTypeNode::Primitive(PrimitiveType::Float), Value::Float(f)) => render_float(*f),
        (AvroTypeNode::Primitive(PrimitiveType::Double), Value::Double(d)) => render_double(*d),
        (AvroTypeNode::Primitive(PrimitiveType::Double), Value::Float(f)) => {
            render_double(f64::from(*f))
        }
        (AvroTypeNode::Primitive(PrimitiveType::Boolean), Value::Boolean(b)) => {
            render_bool(*b).to_string()
        }
        (AvroTypeNode::SqlOverride { .. }, Value::String(s)) => quote_text(s),
        (AvroTypeNode::Logical { logical, .. }, value) => encode_logical(logical, value)?,
        _ => return None,
    };
    Some(literal)
}

fn encode_logical(logical: &LogicalType, value: &Value) -> Option<String> {
    let literal = match (logical, value) {
        (LogicalType::Decimal { scale, .. }, Value::Decimal(decimal)) => {
            render_decimal(&BigInt::from(decimal.clone()), *scale)
        }
        (LogicalType::Decimal { scale, .. }, Value::Bytes(bytes) | Value::Fixed(_, bytes)) => {
            render_decimal(&BigInt::from_signed_bytes_be(bytes), *scale)
        }
        (LogicalType::TimestampMillis, Value::TimestampMillis(ms) | Value::Long(ms)) => {
            render_timestamp(&timestamp_from_millis(*ms)?)
        }
        (LogicalType::TimestampMicros, Value::TimestampMicros(us) | Value::Long(us)) => {
            render_timestamp(&timestamp_from_micros(*us)?)
        }
        (LogicalType::Date, Value::Date(days) | Value::Int(days)) => {
            render_date(&date_from_days(i64::from(*days))?)
        }
        (LogicalType::TimeMillis, Value::TimeMillis(ms) | Value::Int(ms)) => {
            render_time(&time_from_micros(i64::from(*ms) * 1_000)?)
        }
        (LogicalType::TimeMicros, Value::TimeMicros(us) | Value::Long(us)) => {
            render_time(&time_from_micros(*us)?)
        }
        (
            LogicalType::LocalTimestampMillis,
            Value::LocalTimestampMillis(ms) | Value::Long(ms),
        ) => render_local_timestamp(&timestamp_from_millis(*ms)?.naive_utc()),
        (
            LogicalType::LocalTimestampMicros,
            Value::LocalTimestampMicros(us) | Value::Long(us),
        ) => render_local_timestamp(&timestamp_from_micros(*us)?.naive_utc()),
        _ => return None,
    };
    Some(literal)
}

/// Literal for the derived `eventtimestamp` column: the source field's
/// microseconds since the Unix epoch, rendered as an ISO-8601 timestamp.
///
/// # Example
///
/// ```rust
/// use apache_avro::types::Value;
/// use avro_to_postgres::convert::event_timestamp_literal;
///
/// let literal = event_timestamp_literal(&Value::Long(1_700_000_000_000_000)).unwrap();
/// assert_eq!(literal, "'2023-11-14T22:13:20+00:00'");
/// ```
pub fn event_timestamp_literal(value: &Value) -> Result<String, ConvertError> {
    let micros = match unwrap_union(value) {
        Value::Null => return Ok("NULL".to_string()),
        Value::Long(us) | Value::TimestampMicros(us) => *us,
        Value::Int(us) => i64::from(*us),
        other => return Err(ConvertError::conversion("event_timestamp", other)),
    };

    let timestamp = DateTime::UNIX_EPOCH
        .checked_add_signed(chrono::TimeDelta::microseconds(micros))
        .ok_or_else(|| ConvertError::conversion("event_timestamp", value))?;
    Ok(render_timestamp(&timestamp))
}
