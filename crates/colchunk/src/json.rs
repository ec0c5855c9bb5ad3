//! JSON representation of decoded values.
use serde_json::{Number, Value as JsonValue};

use crate::value::{format_decimal, Value};

impl Value {
    /// Convert to a JSON value.
    ///
    /// Dates and timestamps become ISO 8601 strings, decimals become strings
    /// to keep their precision, and non-finite floats become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(v) => JsonValue::Bool(*v),
            Value::Int32(v) => JsonValue::from(*v),
            Value::Int64(v) => JsonValue::from(*v),
            Value::UInt64(v) => JsonValue::from(*v),
            Value::Int96(v) => JsonValue::from(v.to_nanos()),
            Value::Float(v) => float(*v as f64),
            Value::Double(v) => float(*v),
            Value::Bytes(v) => JsonValue::Array(v.iter().map(|&b| JsonValue::from(b)).collect()),
            Value::String(v) => JsonValue::String(v.clone()),
            Value::Date(v) => JsonValue::String(v.to_string()),
            Value::Timestamp(v) => JsonValue::String(v.to_rfc3339()),
            Value::Decimal { unscaled, scale } => {
                JsonValue::String(format_decimal(*unscaled, *scale))
            }
            Value::List(vals) => rows_to_json(vals),
        }
    }
}

/// Convert decoded rows to a JSON array.
pub fn rows_to_json(rows: &[Value]) -> JsonValue {
    JsonValue::Array(rows.iter().map(Value::to_json).collect())
}

fn float(v: f64) -> JsonValue {
    match Number::from_f64(v) {
        Some(n) => JsonValue::Number(n),
        None => JsonValue::Null,
    }
}
