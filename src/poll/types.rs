//! Polling types
//!
//! Job handles, lifecycle statuses, and the policy that bounds a poll loop.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Job Kind / Handle
// ============================================================================

/// Classification of an asynchronous external job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Waiting for a schema catalog entity to become visible
    CatalogExistence,
    /// A crawler run discovering schemas
    CrawlerRun,
    /// An interactive query execution
    QueryExecution,
}

impl JobKind {
    /// Stable name, used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CatalogExistence => "catalog-existence",
            Self::CrawlerRun => "crawler-run",
            Self::QueryExecution => "query-execution",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque identifier for an asynchronous external job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// What kind of job this identifies
    pub kind: JobKind,
    /// Collaborator-assigned identifier (crawler name, query execution id, ...)
    pub id: String,
}

impl JobHandle {
    /// Create a handle
    pub fn new(kind: JobKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}

// ============================================================================
// Job Status
// ============================================================================

/// Point-in-time lifecycle status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued, not yet running
    Pending,
    /// In progress
    Running,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
    /// Stopped before finishing
    Cancelled,
    /// The entity does not exist yet
    ///
    /// Only meaningful for catalog-existence checks: the catalog entry has not
    /// been created, which is retryable, not an error.
    NotFoundYet,
}

impl JobStatus {
    /// Check if no further state change will occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

// ============================================================================
// Polling Policy
// ============================================================================

/// Bounds for one poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingPolicy {
    /// Maximum number of probe calls (must be > 0)
    pub max_attempts: u32,
    /// Sleep between attempts
    pub delay: Duration,
    /// Optional wall-clock budget measured from the first probe
    pub timeout_budget: Option<Duration>,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            delay: Duration::from_secs(30),
            timeout_budget: None,
        }
    }
}

impl PollingPolicy {
    /// Create a policy with the given attempt bound and delay
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            timeout_budget: None,
        }
    }

    /// Set a wall-clock budget
    #[must_use]
    pub fn with_timeout_budget(mut self, budget: Duration) -> Self {
        self.timeout_budget = Some(budget);
        self
    }
}

// ============================================================================
// Poll Outcome
// ============================================================================

/// How a poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    /// The job reached `Succeeded`
    Succeeded,
    /// The job reached `Failed`
    Failed,
    /// The job reached `Cancelled`
    Cancelled,
    /// Attempt or time budget spent without a terminal status
    TimedOut,
}

/// Result of driving a probe to completion
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// How the loop ended
    pub verdict: PollVerdict,
    /// Last status observed from a successful probe call, if any
    pub status: Option<JobStatus>,
    /// Probe calls made (including errored ones)
    pub attempts: u32,
    /// Wall time from the first probe call
    pub elapsed: Duration,
    /// Last transient probe error, if any occurred
    pub last_error: Option<String>,
}

impl PollOutcome {
    /// Check if the job succeeded
    pub fn is_success(&self) -> bool {
        self.verdict == PollVerdict::Succeeded
    }

    /// Map a non-success verdict to the error the owning dataset should abort with
    pub fn error_for(&self, handle: &JobHandle) -> Option<Error> {
        let kind = handle.kind.as_str().to_string();
        match self.verdict {
            PollVerdict::Succeeded => None,
            PollVerdict::Failed => Some(Error::JobFailed {
                kind,
                id: handle.id.clone(),
            }),
            PollVerdict::Cancelled => Some(Error::JobCancelled {
                kind,
                id: handle.id.clone(),
            }),
            PollVerdict::TimedOut => Some(Error::JobTimeout {
                kind,
                id: handle.id.clone(),
                attempts: self.attempts,
            }),
        }
    }
}

// ============================================================================
// Probe Trait
// ============================================================================

/// A point-in-time status check against an external asynchronous job
///
/// Implementations own the remote call and the mapping from the collaborator's
/// status vocabulary to [`JobStatus`]. Transport problems should surface as
/// [`Error::Probe`] (retried within budget); authorization failures as
/// [`Error::Unauthorized`] (aborts the poll immediately).
#[async_trait]
pub trait JobStatusProbe: Send + Sync {
    /// Check the job's current status
    async fn check(&self, handle: &JobHandle) -> Result<JobStatus>;
}
