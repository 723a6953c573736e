//! Tests for poll module

use super::*;
use crate::error::Error;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted probe response
enum Step {
    Status(JobStatus),
    Transient,
    Fatal,
}

/// Probe that replays a fixed script, then repeats its last step
struct ScriptedProbe {
    steps: Mutex<VecDeque<Step>>,
    last: Step,
    calls: AtomicU32,
}

impl ScriptedProbe {
    fn new(mut steps: Vec<Step>) -> Self {
        let last = steps.pop().expect("script must not be empty");
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last,
            calls: AtomicU32::new(0),
        }
    }

    fn always(status: JobStatus) -> Self {
        Self::new(vec![Step::Status(status)])
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(step: &Step) -> crate::error::Result<JobStatus> {
        match step {
            Step::Status(status) => Ok(*status),
            Step::Transient => Err(Error::probe("connection reset")),
            Step::Fatal => Err(Error::unauthorized("token expired")),
        }
    }
}

#[async_trait]
impl JobStatusProbe for ScriptedProbe {
    async fn check(&self, _handle: &JobHandle) -> crate::error::Result<JobStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.steps.lock().unwrap().pop_front() {
            Some(step) => Self::respond(&step),
            None => Self::respond(&self.last),
        }
    }
}

fn handle() -> JobHandle {
    JobHandle::new(JobKind::CrawlerRun, "crawler_orders")
}

fn instant_policy(max_attempts: u32) -> PollingPolicy {
    PollingPolicy::new(max_attempts, Duration::ZERO)
}

// ============================================================================
// Status Classification Tests
// ============================================================================

#[tokio::test]
async fn test_terminates_on_succeeded_after_running() {
    let probe = ScriptedProbe::new(vec![
        Step::Status(JobStatus::Running),
        Step::Status(JobStatus::Running),
        Step::Status(JobStatus::Succeeded),
    ]);

    let outcome = PollingOrchestrator::new()
        .await_completion(&probe, &handle(), &instant_policy(3))
        .await
        .unwrap();

    assert_eq!(probe.calls(), 3);
    assert_eq!(outcome.verdict, PollVerdict::Succeeded);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.status, Some(JobStatus::Succeeded));
    assert!(outcome.is_success());
    assert!(outcome.last_error.is_none());
    assert!(outcome.error_for(&handle()).is_none());
}

#[tokio::test]
async fn test_terminal_on_first_call_makes_no_further_probes() {
    let probe = ScriptedProbe::always(JobStatus::Succeeded);

    let outcome = PollingOrchestrator::new()
        .await_completion(&probe, &handle(), &instant_policy(10))
        .await
        .unwrap();

    assert_eq!(probe.calls(), 1);
    assert_eq!(outcome.attempts, 1);
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_failed_is_terminal() {
    let probe = ScriptedProbe::new(vec![
        Step::Status(JobStatus::Pending),
        Step::Status(JobStatus::Failed),
    ]);

    let outcome = PollingOrchestrator::new()
        .await_completion(&probe, &handle(), &instant_policy(10))
        .await
        .unwrap();

    assert_eq!(probe.calls(), 2);
    assert_eq!(outcome.verdict, PollVerdict::Failed);

    let err = outcome.error_for(&handle()).unwrap();
    assert!(matches!(err, Error::JobFailed { .. }));
    assert_eq!(err.to_string(), "crawler-run job 'crawler_orders' failed");
}

#[tokio::test]
async fn test_cancelled_is_terminal() {
    let probe = ScriptedProbe::always(JobStatus::Cancelled);

    let outcome = PollingOrchestrator::new()
        .await_completion(&probe, &handle(), &instant_policy(10))
        .await
        .unwrap();

    assert_eq!(probe.calls(), 1);
    assert_eq!(outcome.verdict, PollVerdict::Cancelled);
    assert!(matches!(
        outcome.error_for(&handle()),
        Some(Error::JobCancelled { .. })
    ));
}

// ============================================================================
// Budget Exhaustion Tests
// ============================================================================

#[tokio::test]
async fn test_not_found_yet_exhausts_attempts_without_raising() {
    let probe = ScriptedProbe::always(JobStatus::NotFoundYet);
    let handle = JobHandle::new(JobKind::CatalogExistence, "orders_db");

    let outcome = PollingOrchestrator::new()
        .await_completion(&probe, &handle, &instant_policy(5))
        .await
        .unwrap();

    assert_eq!(probe.calls(), 5);
    assert_eq!(outcome.verdict, PollVerdict::TimedOut);
    assert_eq!(outcome.attempts, 5);
    assert_eq!(outcome.status, Some(JobStatus::NotFoundYet));

    let err = outcome.error_for(&handle).unwrap();
    assert_eq!(
        err.to_string(),
        "catalog-existence job 'orders_db' did not reach a terminal state after 5 attempts"
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_budget_preempts_attempt_budget() {
    let probe = ScriptedProbe::always(JobStatus::Running);
    let policy = PollingPolicy::new(100, Duration::from_secs(1))
        .with_timeout_budget(Duration::from_secs(3));

    let outcome = PollingOrchestrator::new()
        .await_completion(&probe, &handle(), &policy)
        .await
        .unwrap();

    // Sleeping into a fourth attempt would run past the 3s budget.
    assert_eq!(outcome.verdict, PollVerdict::TimedOut);
    assert_eq!(outcome.attempts, 3);
    assert!(probe.calls() < 100);
}

#[tokio::test]
async fn test_zero_attempt_policy_still_probes_once() {
    let probe = ScriptedProbe::always(JobStatus::Running);

    let outcome = PollingOrchestrator::new()
        .await_completion(&probe, &handle(), &instant_policy(0))
        .await
        .unwrap();

    assert_eq!(probe.calls(), 1);
    assert_eq!(outcome.verdict, PollVerdict::TimedOut);
}

// ============================================================================
// Probe Error Tests
// ============================================================================

#[tokio::test]
async fn test_transient_error_consumes_attempt_and_continues() {
    let probe = ScriptedProbe::new(vec![Step::Transient, Step::Status(JobStatus::Succeeded)]);

    let outcome = PollingOrchestrator::new()
        .await_completion(&probe, &handle(), &instant_policy(3))
        .await
        .unwrap();

    assert_eq!(probe.calls(), 2);
    assert!(outcome.is_success());
    assert_eq!(outcome.attempts, 2);
    // The transient error is preserved for reporting even on success
    assert!(outcome.last_error.unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_persistent_transient_errors_time_out() {
    let probe = ScriptedProbe::new(vec![Step::Transient]);

    let outcome = PollingOrchestrator::new()
        .await_completion(&probe, &handle(), &instant_policy(4))
        .await
        .unwrap();

    assert_eq!(probe.calls(), 4);
    assert_eq!(outcome.verdict, PollVerdict::TimedOut);
    assert_eq!(outcome.status, None);
    assert!(outcome.last_error.is_some());
}

#[tokio::test]
async fn test_fatal_error_aborts_immediately() {
    let probe = ScriptedProbe::new(vec![Step::Fatal, Step::Status(JobStatus::Succeeded)]);

    let err = PollingOrchestrator::new()
        .await_completion(&probe, &handle(), &instant_policy(10))
        .await
        .unwrap_err();

    assert_eq!(probe.calls(), 1);
    assert!(matches!(err, Error::Unauthorized { .. }));
}

// ============================================================================
// Type Tests
// ============================================================================

#[test]
fn test_job_status_terminality() {
    assert!(JobStatus::Succeeded.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(JobStatus::Cancelled.is_terminal());

    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Running.is_terminal());
    assert!(!JobStatus::NotFoundYet.is_terminal());
}

#[test]
fn test_job_handle_display() {
    let handle = JobHandle::new(JobKind::QueryExecution, "q-123");
    assert_eq!(handle.to_string(), "query-execution 'q-123'");
}

#[test]
fn test_job_status_serde() {
    let status: JobStatus = serde_json::from_str("\"not_found_yet\"").unwrap();
    assert_eq!(status, JobStatus::NotFoundYet);

    let json = serde_json::to_string(&JobStatus::Succeeded).unwrap();
    assert_eq!(json, "\"succeeded\"");
}

#[test]
fn test_polling_policy_builder() {
    let policy = PollingPolicy::new(5, Duration::from_secs(2))
        .with_timeout_budget(Duration::from_secs(60));
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay, Duration::from_secs(2));
    assert_eq!(policy.timeout_budget, Some(Duration::from_secs(60)));

    let policy = PollingPolicy::default();
    assert!(policy.timeout_budget.is_none());
}
