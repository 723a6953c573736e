//! Pipeline run reporting types

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Stages
// ============================================================================

/// A dataset pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Descriptor validation, before any stage runs
    Config,
    /// Scanning source records
    Extract,
    /// Flattening and schema unification
    Transform,
    /// Writing the staged batch
    Load,
    /// Waiting for the catalog entity to become visible
    Catalog,
    /// Triggering and awaiting the crawler
    Crawl,
    /// Launching and awaiting the query, fetching results
    Query,
    /// Writing query results to the relational sink
    LoadResults,
}

impl PipelineStage {
    /// Stable name for logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Extract => "extract",
            Self::Transform => "transform",
            Self::Load => "load",
            Self::Catalog => "catalog",
            Self::Crawl => "crawl",
            Self::Query => "query",
            Self::LoadResults => "load_results",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Stage Errors
// ============================================================================

/// An error attributed to the stage it occurred in
#[derive(Debug)]
pub(crate) struct StageError {
    pub stage: PipelineStage,
    pub error: Error,
}

/// Attach stage attribution to a fallible step
pub(crate) trait StageResultExt<T> {
    fn at_stage(self, stage: PipelineStage) -> std::result::Result<T, StageError>;
}

impl<T> StageResultExt<T> for crate::error::Result<T> {
    fn at_stage(self, stage: PipelineStage) -> std::result::Result<T, StageError> {
        self.map_err(|error| StageError { stage, error })
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Per-dataset counters for a completed run
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetReport {
    /// Records extracted from the source
    pub records_extracted: usize,
    /// Columns in the unified schema
    pub columns: usize,
    /// Rows written to the staging destination
    pub rows_loaded: usize,
    /// Probe attempts until the catalog entity became visible
    pub catalog_attempts: u32,
    /// Probe attempts until the crawler run finished
    pub crawler_attempts: u32,
    /// Probe attempts until the query finished
    pub query_attempts: u32,
    /// Query result rows written to the relational sink
    pub result_rows_loaded: usize,
    /// Wall time for the dataset
    pub duration_ms: u64,
}

/// Terminal state of one dataset's run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DatasetStatus {
    /// All stages finished
    Completed {
        /// Stage counters
        report: DatasetReport,
    },
    /// A stage failed; later stages did not run
    Abandoned {
        /// The failing stage
        stage: PipelineStage,
        /// Error classification, as text
        error: String,
    },
}

/// One dataset's outcome within a run
#[derive(Debug, Clone, Serialize)]
pub struct DatasetOutcome {
    /// The dataset's source id
    pub dataset: String,
    /// How the dataset ended
    #[serde(flatten)]
    pub status: DatasetStatus,
}

impl DatasetOutcome {
    /// Check if all stages finished
    pub fn is_completed(&self) -> bool {
        matches!(self.status, DatasetStatus::Completed { .. })
    }
}

/// The whole run's outcome: one entry per configured dataset, in order
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Per-dataset outcomes
    pub outcomes: Vec<DatasetOutcome>,
}

impl RunSummary {
    /// Number of datasets that completed all stages
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    /// Number of datasets abandoned at some stage
    pub fn abandoned(&self) -> usize {
        self.outcomes.len() - self.completed()
    }
}
