//! Attribute-encoded record decoding
//!
//! Key-value store scans deliver each field as a single-key object whose key
//! is a type tag: `{"S": "text"}`, `{"N": "3.5"}`, `{"BOOL": true}`,
//! `{"M": {...}}`, `{"L": [...]}`, `{"NULL": true}`. This module converts that
//! wire shape into [`TypedValue`]. Unrecognized tags degrade to
//! [`TypedValue::Other`] carrying the raw JSON text; a record never fails to
//! decode because one field failed to classify.

use super::types::TypedValue;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use tracing::debug;

/// Decode one attribute-encoded record
///
/// The input must be a JSON object mapping field names to attribute objects.
pub fn decode_record(value: &JsonValue) -> Result<TypedValue> {
    let JsonValue::Object(map) = value else {
        return Err(Error::decode(format!(
            "expected a JSON object record, got {}",
            json_type_name(value)
        )));
    };

    let fields = map
        .iter()
        .map(|(key, attr)| (key.clone(), decode_value(attr)))
        .collect();
    Ok(TypedValue::Map(fields))
}

/// Decode one attribute object into a `TypedValue`
///
/// Total: anything that is not a recognizable single-tag object becomes
/// `Other` with its compact JSON text.
pub fn decode_value(attr: &JsonValue) -> TypedValue {
    let JsonValue::Object(map) = attr else {
        return other(attr);
    };

    let Some((tag, inner)) = map.iter().next() else {
        return other(attr);
    };

    match (tag.as_str(), inner) {
        ("S", JsonValue::String(s)) => TypedValue::String(s.clone()),
        ("N", JsonValue::String(text)) => TypedValue::Number(text.clone()),
        // Some producers emit numbers unquoted
        ("N", JsonValue::Number(n)) => TypedValue::Number(n.to_string()),
        ("BOOL", JsonValue::Bool(b)) => TypedValue::Bool(*b),
        ("NULL", _) => TypedValue::Null,
        ("M", JsonValue::Object(nested)) => TypedValue::Map(
            nested
                .iter()
                .map(|(key, nested_attr)| (key.clone(), decode_value(nested_attr)))
                .collect(),
        ),
        ("L", JsonValue::Array(items)) => {
            TypedValue::List(items.iter().map(decode_value).collect())
        }
        _ => {
            debug!(tag = %tag, "unrecognized attribute tag, keeping raw text");
            other(attr)
        }
    }
}

fn other(attr: &JsonValue) -> TypedValue {
    TypedValue::Other(attr.to_string())
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
