//! Pipeline coordination
//!
//! # Overview
//!
//! The pipeline module provides:
//! - `PipelineCoordinator` - sequences the stages of each dataset's run
//! - `RunSummary` / `DatasetOutcome` / `DatasetReport` - run reporting
//!
//! Datasets are processed strictly sequentially; no shared mutable state
//! crosses dataset boundaries. A failure in any stage abandons its own
//! dataset and the coordinator moves on to the next one, so a single bad
//! dataset never takes down the run.

mod types;

pub use types::{DatasetOutcome, DatasetReport, DatasetStatus, PipelineStage, RunSummary};

use crate::config::{DatasetDescriptor, PipelineConfig};
use crate::connector::{JobLauncher, Launch, LaunchOutcome, LaunchSpec, ResultFetcher, RowSink, SourceReader};
use crate::poll::{JobHandle, JobKind, JobStatusProbe, PollOutcome, PollingOrchestrator, PollingPolicy};
use crate::record::{FlatRecord, RecordFlattener, TypedValue};
use crate::schema::SchemaUnifier;
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use types::{StageError, StageResultExt};

/// Sequences Extract → Transform → Load → Catalog → Crawl → Query →
/// Load-results per dataset
///
/// All remote work happens through the collaborator traits; the coordinator
/// owns ordering, polling, and failure isolation.
pub struct PipelineCoordinator {
    source: Arc<dyn SourceReader>,
    probe: Arc<dyn JobStatusProbe>,
    launcher: Arc<dyn JobLauncher>,
    results: Arc<dyn ResultFetcher>,
    sink: Arc<dyn RowSink>,
    config: PipelineConfig,
    flattener: RecordFlattener,
    unifier: SchemaUnifier,
    poller: PollingOrchestrator,
}

impl PipelineCoordinator {
    /// Create a coordinator over the given collaborators
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn SourceReader>,
        probe: Arc<dyn JobStatusProbe>,
        launcher: Arc<dyn JobLauncher>,
        results: Arc<dyn ResultFetcher>,
        sink: Arc<dyn RowSink>,
    ) -> Self {
        Self {
            source,
            probe,
            launcher,
            results,
            sink,
            config,
            flattener: RecordFlattener::new(),
            unifier: SchemaUnifier::new(),
            poller: PollingOrchestrator::new(),
        }
    }

    /// Replace the default flattener
    #[must_use]
    pub fn with_flattener(mut self, flattener: RecordFlattener) -> Self {
        self.flattener = flattener;
        self
    }

    /// Run every configured dataset, in order
    ///
    /// Never fails as a whole: each dataset's outcome is recorded and the next
    /// dataset always starts.
    pub async fn run(&self) -> RunSummary {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(self.config.datasets.len());

        for dataset in &self.config.datasets {
            info!(dataset = %dataset.source_id, "starting dataset pipeline");
            let started = Instant::now();

            let status = match self.run_dataset(dataset).await {
                Ok(mut report) => {
                    report.duration_ms = started.elapsed().as_millis() as u64;
                    info!(
                        dataset = %dataset.source_id,
                        records = report.records_extracted,
                        result_rows = report.result_rows_loaded,
                        "dataset pipeline completed"
                    );
                    DatasetStatus::Completed { report }
                }
                Err(StageError { stage, error }) => {
                    warn!(
                        dataset = %dataset.source_id,
                        stage = %stage,
                        error = %error,
                        "dataset abandoned"
                    );
                    DatasetStatus::Abandoned {
                        stage,
                        error: error.to_string(),
                    }
                }
            };

            outcomes.push(DatasetOutcome {
                dataset: dataset.source_id.clone(),
                status,
            });
        }

        RunSummary {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }

    async fn run_dataset(
        &self,
        dataset: &DatasetDescriptor,
    ) -> std::result::Result<DatasetReport, StageError> {
        dataset.validate().at_stage(PipelineStage::Config)?;
        let catalog_policy = self.policy(|p| &p.catalog).at_stage(PipelineStage::Config)?;
        let crawler_policy = self.policy(|p| &p.crawler).at_stage(PipelineStage::Config)?;
        let query_policy = self.policy(|p| &p.query).at_stage(PipelineStage::Config)?;

        let mut report = DatasetReport::default();

        // Extract
        let records = self
            .extract(&dataset.source_id)
            .await
            .at_stage(PipelineStage::Extract)?;
        report.records_extracted = records.len();
        info!(dataset = %dataset.source_id, records = records.len(), "extracted source records");

        // Transform: flatten, then unify into uniform rows. An empty batch
        // still flows through the load so source problems stay visible.
        let flat: Vec<FlatRecord> = records.iter().map(|r| self.flattener.flatten(r)).collect();
        let batch = self.unifier.unify(&flat);
        report.columns = batch.schema.len();
        report.rows_loaded = batch.row_count();

        // Load
        let destination = self.config.sink.staging_destination(&dataset.source_id);
        self.sink
            .write(&batch.schema, &batch.rows, &destination)
            .await
            .at_stage(PipelineStage::Load)?;
        info!(dataset = %dataset.source_id, destination = %destination, rows = batch.row_count(), "staged batch written");

        // Catalog: wait for the database entity to become visible
        let catalog_handle = JobHandle::new(JobKind::CatalogExistence, &dataset.database_name);
        let outcome = self
            .await_job(&catalog_handle, &catalog_policy, PipelineStage::Catalog)
            .await?;
        report.catalog_attempts = outcome.attempts;

        // Crawl: trigger the crawler and wait for the run to finish
        let spec = LaunchSpec::crawler(&dataset.crawler_name, &dataset.database_name)
            .with_target(&destination);
        let launch = self
            .launch(JobKind::CrawlerRun, &spec, PipelineStage::Crawl)
            .await?;
        let outcome = self
            .await_job(&launch.handle, &crawler_policy, PipelineStage::Crawl)
            .await?;
        report.crawler_attempts = outcome.attempts;

        // Query: run the per-dataset query and wait for it
        let spec = LaunchSpec::query(&dataset.query, &dataset.database_name);
        let launch = self
            .launch(JobKind::QueryExecution, &spec, PipelineStage::Query)
            .await?;
        let outcome = self
            .await_job(&launch.handle, &query_policy, PipelineStage::Query)
            .await?;
        report.query_attempts = outcome.attempts;

        // Load results into the relational sink
        let results = self
            .results
            .fetch(&launch.handle)
            .await
            .at_stage(PipelineStage::Query)?;
        report.result_rows_loaded = results.row_count();
        self.sink
            .write(&results.schema, &results.rows, &dataset.sink_table)
            .await
            .at_stage(PipelineStage::LoadResults)?;
        info!(dataset = %dataset.source_id, table = %dataset.sink_table, rows = results.row_count(), "query results written");

        Ok(report)
    }

    /// Drain the source stream into a batch
    async fn extract(&self, source_id: &str) -> crate::error::Result<Vec<TypedValue>> {
        let mut stream = self.source.read(source_id).await?;
        let mut records = Vec::new();
        while let Some(record) = stream.next().await {
            records.push(record?);
        }
        Ok(records)
    }

    /// Start a job, tolerating "already exists / already running"
    async fn launch(
        &self,
        kind: JobKind,
        spec: &LaunchSpec,
        stage: PipelineStage,
    ) -> std::result::Result<Launch, StageError> {
        let launch = self.launcher.start(kind, spec).await.at_stage(stage)?;
        match launch.outcome {
            LaunchOutcome::Started => {
                info!(job = %launch.handle, "job started");
            }
            LaunchOutcome::AlreadyExists => {
                warn!(job = %launch.handle, "entity already exists, continuing");
            }
            LaunchOutcome::AlreadyRunning => {
                warn!(job = %launch.handle, "job already running, attaching to it");
            }
        }
        Ok(launch)
    }

    /// Poll a job to completion and turn non-success verdicts into stage errors
    async fn await_job(
        &self,
        handle: &JobHandle,
        policy: &PollingPolicy,
        stage: PipelineStage,
    ) -> std::result::Result<PollOutcome, StageError> {
        let outcome = self
            .poller
            .await_completion(self.probe.as_ref(), handle, policy)
            .await
            .at_stage(stage)?;
        if let Some(error) = outcome.error_for(handle) {
            return Err(StageError { stage, error });
        }
        Ok(outcome)
    }

    fn policy(
        &self,
        select: impl Fn(&crate::config::StagePolicies) -> &crate::config::PolicyConfig,
    ) -> crate::error::Result<PollingPolicy> {
        select(&self.config.policies).to_policy()
    }
}

#[cfg(test)]
mod tests;
