//! Collaborator interfaces
//!
//! The pipeline core never talks to a cloud service directly. Everything that
//! crosses a network sits behind one of these traits: reading source records,
//! launching asynchronous jobs, fetching query results, and writing rows.
//! Implementations own credentials, pagination, and wire formats; the core
//! owns sequencing, polling, and the transform.
//!
//! The status-check seam, [`crate::poll::JobStatusProbe`], lives with the
//! polling engine that drives it.

use crate::error::Result;
use crate::poll::{JobHandle, JobKind};
use crate::record::{ScalarValue, TypedValue};
use crate::schema::{TableBatch, TableSchema};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A lazy, finite sequence of source records
///
/// Not restartable once consumed. Pagination and per-page retry are the
/// producing collaborator's responsibility.
pub type RecordStream<'a> = BoxStream<'a, Result<TypedValue>>;

// ============================================================================
// Source
// ============================================================================

/// Produces the typed records of one source
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Open a full scan of the given source
    ///
    /// Every yielded record is a `TypedValue::Map`.
    async fn read(&self, source_id: &str) -> Result<RecordStream<'_>>;
}

// ============================================================================
// Job Launching
// ============================================================================

/// Parameters for starting an asynchronous external job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Job name (crawler name, query label, ...)
    pub name: String,
    /// Database/catalog the job runs against
    pub database: Option<String>,
    /// Statement text, for query jobs
    pub statement: Option<String>,
    /// Data location the job reads or writes
    pub target: Option<String>,
}

impl LaunchSpec {
    /// Spec for a crawler run over a data location
    pub fn crawler(name: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database: Some(database.into()),
            ..Self::default()
        }
    }

    /// Spec for a query execution
    pub fn query(statement: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            database: Some(database.into()),
            statement: Some(statement.into()),
            target: None,
        }
    }

    /// Set the data location
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// How a launch request was received by the collaborator
///
/// "Already exists" and "already running" are ordinary outcomes, not errors:
/// repeated pipeline runs re-launch the same named jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// A new job run was started
    Started,
    /// The named entity already existed; nothing was created
    AlreadyExists,
    /// A run of this job is already in progress
    AlreadyRunning,
}

/// A started (or deduplicated) job, ready to poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    /// Handle for status probes
    pub handle: JobHandle,
    /// How the collaborator received the request
    pub outcome: LaunchOutcome,
}

impl Launch {
    /// A freshly started job
    pub fn started(handle: JobHandle) -> Self {
        Self {
            handle,
            outcome: LaunchOutcome::Started,
        }
    }
}

/// Starts asynchronous external jobs
#[async_trait]
pub trait JobLauncher: Send + Sync {
    /// Start a job of the given kind
    ///
    /// Idempotent-or-"already exists" outcomes must surface as a
    /// [`LaunchOutcome`], not as an error.
    async fn start(&self, kind: JobKind, spec: &LaunchSpec) -> Result<Launch>;
}

// ============================================================================
// Results
// ============================================================================

/// Retrieves the result table of a finished query job
#[async_trait]
pub trait ResultFetcher: Send + Sync {
    /// Fetch the results for a job that polled to `Succeeded`
    async fn fetch(&self, handle: &JobHandle) -> Result<TableBatch>;
}

// ============================================================================
// Sink
// ============================================================================

/// Writes uniform rows to a destination
///
/// The core treats writes as at-least-once and does not retry internally.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Write one batch to the given destination
    async fn write(
        &self,
        schema: &TableSchema,
        rows: &[Vec<ScalarValue>],
        destination: &str,
    ) -> Result<()>;
}
