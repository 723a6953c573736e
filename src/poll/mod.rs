//! Asynchronous-completion polling
//!
//! One parameterized engine replaces the hand-rolled wait loops that otherwise
//! accumulate around every asynchronous collaborator: catalog visibility,
//! crawler runs, and query executions all share it, each with its own probe
//! and policy.
//!
//! # Overview
//!
//! - `JobHandle` / `JobStatus` - identify a job and classify its lifecycle
//! - `PollingPolicy` - attempt bound, inter-attempt delay, wall-clock budget
//! - `JobStatusProbe` - collaborator-implemented status check
//! - `PollingOrchestrator` - drives a probe until terminal status or budget
//!   exhaustion

mod types;

pub use types::{JobHandle, JobKind, JobStatus, JobStatusProbe, PollOutcome, PollingPolicy, PollVerdict};

use crate::error::Result;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Drives a [`JobStatusProbe`] through a bounded retry loop
///
/// Stateless apart from the probe calls and sleeps it performs; the same
/// orchestrator instance can serve any number of jobs.
#[derive(Debug, Clone, Default)]
pub struct PollingOrchestrator;

impl PollingOrchestrator {
    /// Create an orchestrator
    pub fn new() -> Self {
        Self
    }

    /// Poll until the job reaches a terminal status or the policy's budget runs out
    ///
    /// Per attempt, the probe is called once and the status classified:
    /// terminal statuses return immediately; `Running`/`Pending` and
    /// `NotFoundYet` sleep `policy.delay` and continue; transient probe errors
    /// are recorded and consume an attempt. A non-transient error (for example
    /// an authorization failure) aborts the poll as `Err` at once. Exhausting
    /// `max_attempts`, or reaching the wall-clock budget measured from the
    /// first probe, yields a `TimedOut` outcome rather than an error: the
    /// caller decides whether that abandons the dataset.
    pub async fn await_completion(
        &self,
        probe: &dyn JobStatusProbe,
        handle: &JobHandle,
        policy: &PollingPolicy,
    ) -> Result<PollOutcome> {
        let started = Instant::now();
        let max_attempts = policy.max_attempts.max(1);
        let mut last_status = None;
        let mut last_error: Option<String> = None;
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            attempts = attempt;

            match probe.check(handle).await {
                Ok(status) => {
                    last_status = Some(status);
                    match status {
                        JobStatus::Succeeded => {
                            debug!(job = %handle, attempt, "job succeeded");
                            return Ok(self.outcome(
                                PollVerdict::Succeeded,
                                last_status,
                                attempts,
                                started,
                                last_error,
                            ));
                        }
                        JobStatus::Failed => {
                            warn!(job = %handle, attempt, "job failed");
                            return Ok(self.outcome(
                                PollVerdict::Failed,
                                last_status,
                                attempts,
                                started,
                                last_error,
                            ));
                        }
                        JobStatus::Cancelled => {
                            warn!(job = %handle, attempt, "job cancelled");
                            return Ok(self.outcome(
                                PollVerdict::Cancelled,
                                last_status,
                                attempts,
                                started,
                                last_error,
                            ));
                        }
                        JobStatus::Running | JobStatus::Pending => {
                            debug!(job = %handle, attempt, status = ?status, "job in progress");
                        }
                        JobStatus::NotFoundYet => {
                            // Distinct from Running: the entity has not been
                            // created yet, which is still retryable.
                            debug!(job = %handle, attempt, "entity not created yet");
                        }
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!(job = %handle, attempt, error = %e, "transient probe error");
                    last_error = Some(e.to_string());
                }
                Err(e) => {
                    warn!(job = %handle, attempt, error = %e, "fatal probe error, aborting poll");
                    return Err(e);
                }
            }

            if attempt == max_attempts {
                break;
            }
            if self.budget_spent(started, policy) {
                break;
            }
            tokio::time::sleep(policy.delay).await;
        }

        warn!(
            job = %handle,
            attempts,
            "no terminal status within budget, reporting timeout"
        );
        Ok(self.outcome(PollVerdict::TimedOut, last_status, attempts, started, last_error))
    }

    /// Check whether sleeping into another attempt would run past the budget
    fn budget_spent(&self, started: Instant, policy: &PollingPolicy) -> bool {
        match policy.timeout_budget {
            Some(budget) => started.elapsed() + policy.delay >= budget,
            None => false,
        }
    }

    fn outcome(
        &self,
        verdict: PollVerdict,
        status: Option<JobStatus>,
        attempts: u32,
        started: Instant,
        last_error: Option<String>,
    ) -> PollOutcome {
        PollOutcome {
            verdict,
            status,
            attempts,
            elapsed: started.elapsed(),
            last_error,
        }
    }
}

#[cfg(test)]
mod tests;
