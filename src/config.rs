//! Pipeline configuration
//!
//! Dataset descriptors, per-stage polling policies, and sink settings, loaded
//! from YAML. Validation is split the way the run loop needs it: file-level
//! problems fail the load, per-dataset problems are discovered when that
//! dataset's run starts, so one malformed descriptor never blocks the rest.

use crate::error::{Error, Result};
use crate::poll::PollingPolicy;
use crate::types::SinkFormat;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Relational identifiers: databases, tables, columns
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"));

/// Job names: crawlers and the like, where `-` and `.` are common
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").expect("static regex"));

// ============================================================================
// Duration Parsing
// ============================================================================

/// Parse a human duration string: `500ms`, `45s`, `5m`, `2h`
///
/// A bare number is taken as seconds.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::config("empty duration"));
    }

    let (num_str, unit) = if let Some(stripped) = text.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(stripped) = text.strip_suffix('s') {
        (stripped, "s")
    } else if let Some(stripped) = text.strip_suffix('m') {
        (stripped, "m")
    } else if let Some(stripped) = text.strip_suffix('h') {
        (stripped, "h")
    } else {
        (text, "s")
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("invalid duration number: {text}")))?;

    let duration = match unit {
        "ms" => Duration::from_millis(num),
        "s" => Duration::from_secs(num),
        "m" => Duration::from_secs(num * 60),
        "h" => Duration::from_secs(num * 3600),
        _ => unreachable!(),
    };

    Ok(duration)
}

// ============================================================================
// Polling Policy Config
// ============================================================================

/// Serialized form of a [`PollingPolicy`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Maximum probe attempts (> 0)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between attempts, e.g. `"30s"`
    #[serde(default = "default_delay")]
    pub delay: String,
    /// Optional wall-clock budget, e.g. `"20m"`
    #[serde(default)]
    pub timeout_budget: Option<String>,
}

fn default_max_attempts() -> u32 {
    20
}

fn default_delay() -> String {
    "30s".to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_delay(),
            timeout_budget: None,
        }
    }
}

impl PolicyConfig {
    /// Resolve into a runtime policy
    pub fn to_policy(&self) -> Result<PollingPolicy> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_value("max_attempts", "must be greater than 0"));
        }
        let mut policy = PollingPolicy::new(self.max_attempts, parse_duration(&self.delay)?);
        if let Some(budget) = &self.timeout_budget {
            policy = policy.with_timeout_budget(parse_duration(budget)?);
        }
        Ok(policy)
    }
}

/// One polling policy per stage kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagePolicies {
    /// Waiting for the catalog entity to become visible
    #[serde(default)]
    pub catalog: PolicyConfig,
    /// Waiting for a crawler run to finish
    #[serde(default)]
    pub crawler: PolicyConfig,
    /// Waiting for a query execution to finish
    #[serde(default)]
    pub query: PolicyConfig,
}

// ============================================================================
// Dataset Descriptor
// ============================================================================

/// Everything one dataset's pipeline run needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatasetDescriptor {
    /// Source to scan (table name, file path, ... as the reader understands it)
    pub source_id: String,
    /// Catalog database the crawler registers schemas into
    pub database_name: String,
    /// Named crawler to trigger
    pub crawler_name: String,
    /// Query to execute once the catalog is ready
    pub query: String,
    /// Destination table for the query results
    pub sink_table: String,
}

impl DatasetDescriptor {
    /// Validate required fields and identifier shapes
    ///
    /// A failure here aborts only this dataset, before any stage runs.
    pub fn validate(&self) -> Result<()> {
        if self.source_id.is_empty() {
            return Err(Error::missing_field("source_id"));
        }
        if self.query.trim().is_empty() {
            return Err(Error::missing_field("query"));
        }
        for (field, value) in [
            ("database_name", &self.database_name),
            ("sink_table", &self.sink_table),
        ] {
            if value.is_empty() {
                return Err(Error::missing_field(field));
            }
            if !IDENT_RE.is_match(value) {
                return Err(Error::invalid_value(
                    field,
                    format!("'{value}' is not a valid identifier"),
                ));
            }
        }
        if self.crawler_name.is_empty() {
            return Err(Error::missing_field("crawler_name"));
        }
        if !NAME_RE.is_match(&self.crawler_name) {
            return Err(Error::invalid_value(
                "crawler_name",
                format!("'{}' is not a valid job name", self.crawler_name),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Sink Config
// ============================================================================

/// Settings for the load stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    /// Output file format for staged batches
    #[serde(default)]
    pub format: SinkFormat,
    /// Prefix under which staged batches are written
    #[serde(default = "default_staging_prefix")]
    pub staging_prefix: String,
}

fn default_staging_prefix() -> String {
    "staging".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            format: SinkFormat::default(),
            staging_prefix: default_staging_prefix(),
        }
    }
}

impl SinkConfig {
    /// Destination key for a dataset's staged batch: `<prefix>/<source_id>.<ext>`
    pub fn staging_destination(&self, source_id: &str) -> String {
        format!(
            "{}/{}.{}",
            self.staging_prefix.trim_end_matches('/'),
            source_id,
            self.format.extension()
        )
    }
}

// ============================================================================
// Pipeline Config
// ============================================================================

/// Top-level configuration for one pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Datasets to process, in order
    #[serde(default)]
    pub datasets: Vec<DatasetDescriptor>,
    /// Per-stage polling policies
    #[serde(default)]
    pub policies: StagePolicies,
    /// Load stage settings
    #[serde(default)]
    pub sink: SinkConfig,
}

impl PipelineConfig {
    /// Parse from a YAML string
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate_policies()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_yaml_str(&text)
    }

    /// Check that every stage policy resolves
    ///
    /// Policies are shared across datasets, so a bad one fails the load rather
    /// than each dataset in turn.
    fn validate_policies(&self) -> Result<()> {
        self.policies.catalog.to_policy()?;
        self.policies.crawler.to_policy()?;
        self.policies.query.to_policy()?;
        Ok(())
    }
}
