//! Schema unification across a batch of flat records

use super::types::{TableBatch, TableSchema};
use crate::record::{FlatRecord, ScalarValue};
use tracing::debug;

/// Computes a common column set and pads records into uniform rows
///
/// Downstream tabular storage needs a fixed column set per write, independent
/// of which records happened to contain which optional fields.
#[derive(Debug, Clone, Default)]
pub struct SchemaUnifier;

impl SchemaUnifier {
    /// Create a new unifier
    pub fn new() -> Self {
        Self
    }

    /// Unify a batch of flat records
    ///
    /// First pass collects column names in first-seen order across the batch;
    /// second pass emits one row per record with `Null` for absent columns.
    /// An empty input yields an empty schema and zero rows.
    pub fn unify(&self, records: &[FlatRecord]) -> TableBatch {
        let mut schema = TableSchema::new();
        for record in records {
            for column in record.columns() {
                schema.add_column(column);
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                schema
                    .columns()
                    .iter()
                    .map(|column| record.get(column).cloned().unwrap_or(ScalarValue::Null))
                    .collect()
            })
            .collect();

        debug!(
            columns = schema.len(),
            rows = records.len(),
            "unified batch"
        );
        TableBatch::new(schema, rows)
    }
}

/// Unify a batch of flat records (convenience function)
pub fn unify_records(records: &[FlatRecord]) -> TableBatch {
    SchemaUnifier::new().unify(records)
}
