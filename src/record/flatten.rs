//! Record flattening
//!
//! Converts one nested `TypedValue` record into one flat mapping of column
//! name to scalar value. Flattening is total: malformed subtrees degrade to
//! their string form instead of aborting the batch, and the same input always
//! produces the same output.

use super::types::{FlatRecord, ScalarValue, TypedValue};
use crate::types::JsonValue;
use tracing::warn;

/// Flattens nested typed records into flat column/scalar mappings
///
/// Nested map fields are emitted as `parent_child` columns at every depth.
/// When two paths flatten to the same column name the later value overwrites
/// the earlier one (last-write-wins); every collision is logged.
#[derive(Debug, Clone)]
pub struct RecordFlattener {
    /// Separator between parent and child key segments
    separator: String,
}

impl Default for RecordFlattener {
    fn default() -> Self {
        Self {
            separator: "_".to_string(),
        }
    }
}

impl RecordFlattener {
    /// Create a flattener with the default `_` separator
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key segment separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Flatten one record
    ///
    /// The root must be a `TypedValue::Map`; any other root degrades to an
    /// empty record with a warning, since a scalar root has no column names to
    /// flatten into.
    pub fn flatten(&self, record: &TypedValue) -> FlatRecord {
        match record {
            TypedValue::Map(fields) => self.flatten_fields(fields),
            other => {
                warn!(tag = other.tag(), "record root is not a map, skipping");
                FlatRecord::new()
            }
        }
    }

    fn flatten_fields(&self, fields: &[(String, TypedValue)]) -> FlatRecord {
        let mut out = FlatRecord::new();
        for (key, value) in fields {
            self.flatten_into(&mut out, key, value);
        }
        out
    }

    fn flatten_into(&self, out: &mut FlatRecord, column: &str, value: &TypedValue) {
        match value {
            TypedValue::String(s) => self.emit(out, column, ScalarValue::Text(s.clone())),
            TypedValue::Number(text) => {
                let scalar = ScalarValue::from_decimal_text(text);
                if matches!(scalar, ScalarValue::Text(_)) {
                    warn!(column, value = %text, "unparseable number, keeping text");
                }
                self.emit(out, column, scalar);
            }
            TypedValue::Bool(b) => self.emit(out, column, ScalarValue::Bool(*b)),
            TypedValue::Map(fields) => {
                for (key, nested) in fields {
                    let child = format!("{column}{}{key}", self.separator);
                    self.flatten_into(out, &child, nested);
                }
            }
            TypedValue::List(items) => {
                self.emit(out, column, ScalarValue::Text(self.list_to_json(items)));
            }
            TypedValue::Null => self.emit(out, column, ScalarValue::Null),
            TypedValue::Other(raw) => {
                warn!(column, "unclassified value, keeping raw text");
                self.emit(out, column, ScalarValue::Text(raw.clone()));
            }
        }
    }

    fn emit(&self, out: &mut FlatRecord, column: &str, value: ScalarValue) {
        if let Some(old) = out.insert(column, value) {
            warn!(column, previous = %old.render(), "column collision, last write wins");
        }
    }

    /// Serialize a list to a compact JSON array string
    ///
    /// Lists stay in one column regardless of length so the column set is
    /// stable across records. The string round-trips through standard JSON
    /// parsing.
    fn list_to_json(&self, items: &[TypedValue]) -> String {
        let array: Vec<JsonValue> = items.iter().map(|item| self.value_to_json(item)).collect();
        JsonValue::Array(array).to_string()
    }

    fn value_to_json(&self, value: &TypedValue) -> JsonValue {
        match value {
            TypedValue::String(s) => JsonValue::String(s.clone()),
            TypedValue::Number(text) => ScalarValue::from_decimal_text(text).to_json(),
            TypedValue::Bool(b) => JsonValue::Bool(*b),
            TypedValue::Null => JsonValue::Null,
            TypedValue::Other(raw) => JsonValue::String(raw.clone()),
            TypedValue::List(items) => {
                JsonValue::Array(items.iter().map(|item| self.value_to_json(item)).collect())
            }
            TypedValue::Map(fields) => {
                let flat = self.flatten_fields(fields);
                let mut object = serde_json::Map::new();
                for (column, scalar) in flat.iter() {
                    object.insert(column.to_string(), scalar.to_json());
                }
                JsonValue::Object(object)
            }
        }
    }
}
