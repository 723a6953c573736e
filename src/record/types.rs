//! Record value types
//!
//! `TypedValue` is the tagged-union representation of a single source field as
//! delivered by an explicitly-typed source (every field arrives wrapped in a
//! type tag). `FlatRecord` is the flattened form: an insertion-ordered mapping
//! of column name to scalar value.

use crate::types::JsonValue;
use serde::Serialize;
use std::collections::HashMap;

// ============================================================================
// TypedValue
// ============================================================================

/// A single field of a source record, with its source-declared type
///
/// Exactly one tag is active. `Number` carries the original decimal text so
/// integer-vs-float classification stays deterministic: text containing `.`
/// parses as a float, anything else as an integer.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// UTF-8 text
    String(String),
    /// Numeric value, kept as the original decimal text
    Number(String),
    /// Boolean
    Bool(bool),
    /// Nested record, keys in source order
    Map(Vec<(String, TypedValue)>),
    /// Ordered list of values
    List(Vec<TypedValue>),
    /// Explicit null
    Null,
    /// A value the source could not classify, kept as raw text
    Other(String),
}

impl TypedValue {
    /// Create a string value
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }

    /// Create a number value from its decimal text
    pub fn number(text: impl Into<String>) -> Self {
        Self::Number(text.into())
    }

    /// Create a map value from key/value pairs
    pub fn map<K: Into<String>>(fields: Vec<(K, TypedValue)>) -> Self {
        Self::Map(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Create a list value
    pub fn list(items: Vec<TypedValue>) -> Self {
        Self::List(items)
    }

    /// The active tag's name, for diagnostics
    pub fn tag(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Map(_) => "map",
            Self::List(_) => "list",
            Self::Null => "null",
            Self::Other(_) => "other",
        }
    }

    /// Borrow the fields if this is a map
    pub fn as_map(&self) -> Option<&[(String, TypedValue)]> {
        match self {
            Self::Map(fields) => Some(fields),
            _ => None,
        }
    }
}

// ============================================================================
// ScalarValue
// ============================================================================

/// A flattened cell value
///
/// Serializes untagged, so rows become plain JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// Missing or explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Text
    Text(String),
}

impl ScalarValue {
    /// Classify a source number's decimal text
    ///
    /// Text containing `.` parses as a float, anything else as an integer. On
    /// parse failure (or a non-finite float) the original text is kept rather
    /// than dropping the field.
    pub fn from_decimal_text(text: &str) -> Self {
        if text.contains('.') {
            match text.parse::<f64>() {
                Ok(f) if f.is_finite() => Self::Float(f),
                _ => Self::Text(text.to_string()),
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => Self::Int(i),
                Err(_) => Self::Text(text.to_string()),
            }
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(f) => {
                // from_decimal_text only admits finite floats
                serde_json::Number::from_f64(*f)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
            Self::Text(s) => JsonValue::String(s.clone()),
        }
    }

    /// Render for plain-text output (CSV cells); null becomes an empty cell
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Check if this is the null scalar
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

// ============================================================================
// FlatRecord
// ============================================================================

/// A flattened record: column name → scalar, in first-insertion order
///
/// Overwriting an existing column keeps the column's original position. The
/// flattener's last-write-wins collision policy depends on this: which value
/// survives is decided by write order, where the column sits is decided by
/// first sight.
#[derive(Debug, Clone, Default)]
pub struct FlatRecord {
    entries: Vec<(String, ScalarValue)>,
    index: HashMap<String, usize>,
}

impl FlatRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column value
    ///
    /// Returns the previous value if the column already existed.
    pub fn insert(&mut self, column: impl Into<String>, value: ScalarValue) -> Option<ScalarValue> {
        let column = column.into();
        match self.index.get(&column) {
            Some(&pos) => {
                let old = std::mem::replace(&mut self.entries[pos].1, value);
                Some(old)
            }
            None => {
                self.index.insert(column.clone(), self.entries.len());
                self.entries.push((column, value));
                None
            }
        }
    }

    /// Look up a column's value
    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.index.get(column).map(|&pos| &self.entries[pos].1)
    }

    /// Check if a column exists
    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Iterate columns and values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the record has no columns
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for FlatRecord {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
