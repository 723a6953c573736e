//! Schema types

use crate::record::ScalarValue;
use serde::Serialize;
use std::collections::HashMap;

/// An ordered set of unique column names
///
/// Column order is first-seen order across the batch that produced the schema.
/// Once computed, every row emitted against the schema has exactly these
/// columns in this order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableSchema {
    columns: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TableSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column if it is not already present
    ///
    /// Returns true if the column was added.
    pub fn add_column(&mut self, name: &str) -> bool {
        if self.index.contains_key(name) {
            return false;
        }
        self.index.insert(name.to_string(), self.columns.len());
        self.columns.push(name.to_string());
        true
    }

    /// The position of a column, if present
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Column names in schema order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl PartialEq for TableSchema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl<S: AsRef<str>> FromIterator<S> for TableSchema {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut schema = Self::new();
        for name in iter {
            schema.add_column(name.as_ref());
        }
        schema
    }
}

/// A schema together with rows padded to it
///
/// Every row has exactly `schema.len()` values, in schema order; values a
/// record never contained are `ScalarValue::Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableBatch {
    /// The unified column set
    pub schema: TableSchema,
    /// Uniform rows in input order
    pub rows: Vec<Vec<ScalarValue>>,
}

impl TableBatch {
    /// Create a batch from parts
    pub fn new(schema: TableSchema, rows: Vec<Vec<ScalarValue>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the batch has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
