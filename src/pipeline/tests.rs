//! Tests for pipeline module

use super::*;
use crate::config::{DatasetDescriptor, PipelineConfig, PolicyConfig, StagePolicies};
use crate::connector::{
    JobLauncher, Launch, LaunchOutcome, LaunchSpec, ResultFetcher, RowSink, SourceReader,
};
use crate::error::{Error, Result};
use crate::poll::{JobHandle, JobKind, JobStatus, JobStatusProbe};
use crate::record::{ScalarValue, TypedValue};
use crate::schema::{TableBatch, TableSchema};
use crate::connector::RecordStream;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// In-memory collaborators
// ============================================================================

#[derive(Default)]
struct MemorySource {
    records: HashMap<String, Vec<TypedValue>>,
    reads: AtomicU32,
}

impl MemorySource {
    fn with(mut self, source_id: &str, records: Vec<TypedValue>) -> Self {
        self.records.insert(source_id.to_string(), records);
        self
    }

    fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceReader for MemorySource {
    async fn read(&self, source_id: &str) -> Result<RecordStream<'_>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let records = self
            .records
            .get(source_id)
            .cloned()
            .ok_or_else(|| Error::source(source_id, "unknown source"))?;
        Ok(stream::iter(records.into_iter().map(Ok)).boxed())
    }
}

/// Probe that succeeds everywhere, except a crawler that never finishes
#[derive(Default)]
struct TestProbe {
    stuck_crawler: Option<String>,
    calls: AtomicU32,
}

impl TestProbe {
    fn with_stuck_crawler(id: &str) -> Self {
        Self {
            stuck_crawler: Some(id.to_string()),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobStatusProbe for TestProbe {
    async fn check(&self, handle: &JobHandle) -> Result<JobStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if handle.kind == JobKind::CrawlerRun && Some(&handle.id) == self.stuck_crawler.as_ref() {
            return Ok(JobStatus::Running);
        }
        Ok(JobStatus::Succeeded)
    }
}

/// Launcher that derives handles from the spec
#[derive(Default)]
struct MemoryLauncher {
    crawler_outcome: Option<LaunchOutcome>,
}

#[async_trait]
impl JobLauncher for MemoryLauncher {
    async fn start(&self, kind: JobKind, spec: &LaunchSpec) -> Result<Launch> {
        let id = match kind {
            JobKind::CrawlerRun => spec.name.clone(),
            JobKind::QueryExecution => format!(
                "q-{}",
                spec.database.clone().unwrap_or_else(|| "default".into())
            ),
            JobKind::CatalogExistence => spec.name.clone(),
        };
        let mut launch = Launch::started(JobHandle::new(kind, id));
        if kind == JobKind::CrawlerRun {
            if let Some(outcome) = self.crawler_outcome {
                launch.outcome = outcome;
            }
        }
        Ok(launch)
    }
}

struct MemoryFetcher {
    batch: TableBatch,
}

impl MemoryFetcher {
    fn with_rows(rows: Vec<Vec<ScalarValue>>) -> Self {
        let schema: TableSchema = ["id", "total"].into_iter().collect();
        Self {
            batch: TableBatch::new(schema, rows),
        }
    }
}

#[async_trait]
impl ResultFetcher for MemoryFetcher {
    async fn fetch(&self, _handle: &JobHandle) -> Result<TableBatch> {
        Ok(self.batch.clone())
    }
}

#[derive(Debug, Clone)]
struct SinkWrite {
    destination: String,
    columns: Vec<String>,
    rows: usize,
}

#[derive(Default)]
struct MemorySink {
    writes: Mutex<Vec<SinkWrite>>,
    fail_destination: Option<String>,
}

impl MemorySink {
    fn failing_on(destination: &str) -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            fail_destination: Some(destination.to_string()),
        }
    }

    fn writes(&self) -> Vec<SinkWrite> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowSink for MemorySink {
    async fn write(
        &self,
        schema: &TableSchema,
        rows: &[Vec<ScalarValue>],
        destination: &str,
    ) -> Result<()> {
        if self.fail_destination.as_deref() == Some(destination) {
            return Err(Error::sink(destination, "disk full"));
        }
        self.writes.lock().unwrap().push(SinkWrite {
            destination: destination.to_string(),
            columns: schema.columns().to_vec(),
            rows: rows.len(),
        });
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn dataset(source_id: &str) -> DatasetDescriptor {
    DatasetDescriptor {
        source_id: source_id.to_string(),
        database_name: format!("{source_id}_db"),
        crawler_name: format!("crawler_{source_id}"),
        query: format!("SELECT * FROM {source_id}"),
        sink_table: format!("summary_{source_id}"),
    }
}

fn instant_policy(max_attempts: u32) -> PolicyConfig {
    PolicyConfig {
        max_attempts,
        delay: "0s".to_string(),
        timeout_budget: None,
    }
}

fn config(datasets: Vec<DatasetDescriptor>) -> PipelineConfig {
    PipelineConfig {
        datasets,
        policies: StagePolicies {
            catalog: instant_policy(3),
            crawler: instant_policy(3),
            query: instant_policy(3),
        },
        sink: Default::default(),
    }
}

fn sample_records() -> Vec<TypedValue> {
    vec![
        TypedValue::map(vec![
            ("id", TypedValue::number("1")),
            ("name", TypedValue::string("alice")),
        ]),
        TypedValue::map(vec![
            ("id", TypedValue::number("2")),
            ("email", TypedValue::string("bob@example.com")),
        ]),
    ]
}

fn coordinator(
    config: PipelineConfig,
    source: Arc<MemorySource>,
    probe: Arc<TestProbe>,
    launcher: Arc<MemoryLauncher>,
    sink: Arc<MemorySink>,
) -> PipelineCoordinator {
    let fetcher = Arc::new(MemoryFetcher::with_rows(vec![vec![
        ScalarValue::Int(1),
        ScalarValue::Float(9.5),
    ]]));
    PipelineCoordinator::new(config, source, probe, launcher, fetcher, sink)
}

// ============================================================================
// Coordinator Tests
// ============================================================================

#[tokio::test]
async fn test_happy_path_runs_all_stages() {
    let source = Arc::new(MemorySource::default().with("orders", sample_records()));
    let probe = Arc::new(TestProbe::default());
    let launcher = Arc::new(MemoryLauncher::default());
    let sink = Arc::new(MemorySink::default());

    let summary = coordinator(
        config(vec![dataset("orders")]),
        source,
        probe,
        launcher,
        Arc::clone(&sink),
    )
    .run()
    .await;

    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.completed(), 1);
    assert_eq!(summary.abandoned(), 0);

    let DatasetStatus::Completed { report } = &summary.outcomes[0].status else {
        panic!("expected completion");
    };
    assert_eq!(report.records_extracted, 2);
    // id + name + email after unification
    assert_eq!(report.columns, 3);
    assert_eq!(report.rows_loaded, 2);
    assert_eq!(report.result_rows_loaded, 1);
    assert_eq!(report.catalog_attempts, 1);
    assert_eq!(report.crawler_attempts, 1);
    assert_eq!(report.query_attempts, 1);

    let writes = sink.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].destination, "staging/orders.csv");
    assert_eq!(writes[0].columns, vec!["id", "name", "email"]);
    assert_eq!(writes[0].rows, 2);
    assert_eq!(writes[1].destination, "summary_orders");
    assert_eq!(writes[1].rows, 1);
}

#[tokio::test]
async fn test_crawler_timeout_does_not_block_next_dataset() {
    let source = Arc::new(
        MemorySource::default()
            .with("orders", sample_records())
            .with("users", sample_records()),
    );
    let probe = Arc::new(TestProbe::with_stuck_crawler("crawler_orders"));
    let launcher = Arc::new(MemoryLauncher::default());
    let sink = Arc::new(MemorySink::default());

    let summary = coordinator(
        config(vec![dataset("orders"), dataset("users")]),
        source,
        probe,
        launcher,
        Arc::clone(&sink),
    )
    .run()
    .await;

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.completed(), 1);

    let DatasetStatus::Abandoned { stage, error } = &summary.outcomes[0].status else {
        panic!("expected abandonment");
    };
    assert_eq!(*stage, PipelineStage::Crawl);
    assert!(error.contains("did not reach a terminal state"));

    assert!(summary.outcomes[1].is_completed());

    // Dataset 1 staged its batch but never wrote results; dataset 2 wrote both.
    let destinations: Vec<_> = sink.writes().iter().map(|w| w.destination.clone()).collect();
    assert_eq!(
        destinations,
        vec!["staging/orders.csv", "staging/users.csv", "summary_users"]
    );
}

#[tokio::test]
async fn test_invalid_descriptor_aborts_before_any_stage() {
    let mut bad = dataset("orders");
    bad.database_name = "not a db!".to_string();

    let source = Arc::new(
        MemorySource::default()
            .with("orders", sample_records())
            .with("users", sample_records()),
    );
    let probe = Arc::new(TestProbe::default());
    let launcher = Arc::new(MemoryLauncher::default());
    let sink = Arc::new(MemorySink::default());

    let summary = coordinator(
        config(vec![bad, dataset("users")]),
        Arc::clone(&source),
        probe,
        launcher,
        Arc::clone(&sink),
    )
    .run()
    .await;

    let DatasetStatus::Abandoned { stage, .. } = &summary.outcomes[0].status else {
        panic!("expected abandonment");
    };
    assert_eq!(*stage, PipelineStage::Config);

    // The bad dataset's source was never opened; only the good one was.
    assert_eq!(source.reads(), 1);
    assert!(summary.outcomes[1].is_completed());
}

#[tokio::test]
async fn test_already_running_crawler_is_tolerated() {
    let source = Arc::new(MemorySource::default().with("orders", sample_records()));
    let probe = Arc::new(TestProbe::default());
    let launcher = Arc::new(MemoryLauncher {
        crawler_outcome: Some(LaunchOutcome::AlreadyRunning),
    });
    let sink = Arc::new(MemorySink::default());

    let summary = coordinator(
        config(vec![dataset("orders")]),
        source,
        probe,
        launcher,
        sink,
    )
    .run()
    .await;

    assert_eq!(summary.completed(), 1);
}

#[tokio::test]
async fn test_staging_write_failure_aborts_before_polling() {
    let source = Arc::new(MemorySource::default().with("orders", sample_records()));
    let probe = Arc::new(TestProbe::default());
    let launcher = Arc::new(MemoryLauncher::default());
    let sink = Arc::new(MemorySink::failing_on("staging/orders.csv"));

    let summary = coordinator(
        config(vec![dataset("orders")]),
        source,
        Arc::clone(&probe),
        launcher,
        sink,
    )
    .run()
    .await;

    let DatasetStatus::Abandoned { stage, error } = &summary.outcomes[0].status else {
        panic!("expected abandonment");
    };
    assert_eq!(*stage, PipelineStage::Load);
    assert!(error.contains("disk full"));
    assert_eq!(probe.calls(), 0);
}

#[tokio::test]
async fn test_unknown_source_abandons_at_extract() {
    let source = Arc::new(MemorySource::default());
    let probe = Arc::new(TestProbe::default());
    let launcher = Arc::new(MemoryLauncher::default());
    let sink = Arc::new(MemorySink::default());

    let summary = coordinator(
        config(vec![dataset("orders")]),
        source,
        probe,
        launcher,
        Arc::clone(&sink),
    )
    .run()
    .await;

    let DatasetStatus::Abandoned { stage, .. } = &summary.outcomes[0].status else {
        panic!("expected abandonment");
    };
    assert_eq!(*stage, PipelineStage::Extract);
    assert!(sink.writes().is_empty());
}

#[tokio::test]
async fn test_empty_source_still_stages_empty_batch() {
    let source = Arc::new(MemorySource::default().with("orders", vec![]));
    let probe = Arc::new(TestProbe::default());
    let launcher = Arc::new(MemoryLauncher::default());
    let sink = Arc::new(MemorySink::default());

    let summary = coordinator(
        config(vec![dataset("orders")]),
        source,
        probe,
        launcher,
        Arc::clone(&sink),
    )
    .run()
    .await;

    assert_eq!(summary.completed(), 1);
    let writes = sink.writes();
    assert_eq!(writes[0].rows, 0);
    assert!(writes[0].columns.is_empty());
}
