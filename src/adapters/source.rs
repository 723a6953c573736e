//! Local JSON file source
//!
//! Reads attribute-encoded records from `<root>/<source_id>.json` (a JSON
//! array) or `<root>/<source_id>.jsonl` (one record per line). Useful for
//! local runs and tests; production sources implement [`SourceReader`] against
//! their own backends.

use crate::connector::{RecordStream, SourceReader};
use crate::error::{Error, Result};
use crate::record::{decode_record, TypedValue};
use crate::types::JsonValue;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed source of attribute-encoded records
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    root: PathBuf,
}

impl JsonFileSource {
    /// Create a source rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, source_id: &str) -> Result<PathBuf> {
        for extension in ["json", "jsonl"] {
            let candidate = self.root.join(format!("{source_id}.{extension}"));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(Error::FileNotFound {
            path: self
                .root
                .join(format!("{source_id}.json"))
                .display()
                .to_string(),
        })
    }

    fn parse(path: &Path, text: &str) -> Result<Vec<TypedValue>> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') {
            let values: Vec<JsonValue> = serde_json::from_str(text)?;
            values.iter().map(decode_record).collect()
        } else {
            // One record per non-empty line
            let mut records = Vec::new();
            for (line_num, line) in text.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let value: JsonValue = serde_json::from_str(line).map_err(|e| {
                    Error::decode(format!(
                        "{} line {}: {e}",
                        path.display(),
                        line_num + 1
                    ))
                })?;
                records.push(decode_record(&value)?);
            }
            Ok(records)
        }
    }
}

#[async_trait]
impl SourceReader for JsonFileSource {
    async fn read(&self, source_id: &str) -> Result<RecordStream<'_>> {
        let path = self.resolve(source_id)?;
        let text = tokio::fs::read_to_string(&path).await?;
        let records = Self::parse(&path, &text)?;
        debug!(source_id, path = %path.display(), records = records.len(), "read source file");
        Ok(stream::iter(records.into_iter().map(Ok)).boxed())
    }
}
