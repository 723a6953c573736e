//! Local file sink
//!
//! Writes unified batches to files under a root directory. The destination's
//! extension picks the format; destinations without one (relational table
//! names) get the sink's default format appended.

use crate::connector::RowSink;
use crate::error::Result;
use crate::record::ScalarValue;
use crate::schema::TableSchema;
use crate::types::SinkFormat;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// File-backed row sink
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
    default_format: SinkFormat,
}

impl FileSink {
    /// Create a sink rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_format: SinkFormat::default(),
        }
    }

    /// Set the format used for destinations without an extension
    #[must_use]
    pub fn with_format(mut self, format: SinkFormat) -> Self {
        self.default_format = format;
        self
    }

    fn resolve(&self, destination: &str) -> (PathBuf, SinkFormat) {
        match destination.rsplit_once('.') {
            Some((_, "csv")) => (self.root.join(destination), SinkFormat::Csv),
            Some((_, "json")) => (self.root.join(destination), SinkFormat::Json),
            _ => (
                self.root.join(format!(
                    "{destination}.{}",
                    self.default_format.extension()
                )),
                self.default_format,
            ),
        }
    }

    fn write_csv(path: &PathBuf, schema: &TableSchema, rows: &[Vec<ScalarValue>]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        if schema.is_empty() {
            // Zero-column batch: leave an empty file rather than a zero-field record
            writer.flush()?;
            return Ok(());
        }
        writer.write_record(schema.columns())?;
        for row in rows {
            writer.write_record(row.iter().map(ScalarValue::render))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json(path: &PathBuf, schema: &TableSchema, rows: &[Vec<ScalarValue>]) -> Result<()> {
        let objects: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                let mut object = serde_json::Map::new();
                for (column, value) in schema.columns().iter().zip(row) {
                    object.insert(column.clone(), value.to_json());
                }
                serde_json::Value::Object(object)
            })
            .collect();
        let text = serde_json::to_string_pretty(&objects)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[async_trait]
impl RowSink for FileSink {
    async fn write(
        &self,
        schema: &TableSchema,
        rows: &[Vec<ScalarValue>],
        destination: &str,
    ) -> Result<()> {
        let (path, format) = self.resolve(destination);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match format {
            SinkFormat::Csv => Self::write_csv(&path, schema, rows)?,
            SinkFormat::Json => Self::write_json(&path, schema, rows)?,
        }

        debug!(destination, path = %path.display(), rows = rows.len(), "batch written");
        Ok(())
    }
}
