//! CLI command execution

use super::commands::{Cli, Commands};
use crate::adapters::{FileSink, JsonFileSource};
use crate::config::PipelineConfig;
use crate::connector::{RowSink, SourceReader};
use crate::error::{Error, Result};
use crate::record::RecordFlattener;
use crate::schema::unify_records;
use crate::types::OptionStringExt;
use futures::StreamExt;
use std::path::Path;

/// Executes parsed CLI commands
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner for the parsed CLI
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Validate { config } => self.validate(config),
            Commands::Plan { config } => self.plan(config),
            Commands::Flatten { input, output } => self.flatten(input, output).await,
        }
    }

    fn validate(&self, config_path: &Path) -> Result<()> {
        let config = PipelineConfig::from_yaml_file(config_path)?;

        let mut problems = 0;
        for dataset in &config.datasets {
            match dataset.validate() {
                Ok(()) => println!("ok      {}", dataset.source_id),
                Err(e) => {
                    problems += 1;
                    let label = dataset
                        .source_id
                        .clone()
                        .none_if_empty()
                        .unwrap_or_else(|| "<unnamed>".to_string());
                    println!("invalid {label}: {e}");
                }
            }
        }

        println!(
            "{} dataset(s), {} invalid",
            config.datasets.len(),
            problems
        );
        if problems > 0 {
            return Err(Error::config(format!("{problems} invalid dataset(s)")));
        }
        Ok(())
    }

    fn plan(&self, config_path: &Path) -> Result<()> {
        let config = PipelineConfig::from_yaml_file(config_path)?;

        for dataset in &config.datasets {
            println!("dataset {}", dataset.source_id);
            println!(
                "  extract    source '{}' -> flatten -> unify",
                dataset.source_id
            );
            println!(
                "  load       {}",
                config.sink.staging_destination(&dataset.source_id)
            );
            println!(
                "  catalog    await '{}' ({} x {})",
                dataset.database_name,
                config.policies.catalog.max_attempts,
                config.policies.catalog.delay
            );
            println!(
                "  crawl      '{}' ({} x {})",
                dataset.crawler_name,
                config.policies.crawler.max_attempts,
                config.policies.crawler.delay
            );
            println!(
                "  query      {} ({} x {})",
                dataset.query,
                config.policies.query.max_attempts,
                config.policies.query.delay
            );
            println!("  results -> {}", dataset.sink_table);
        }
        Ok(())
    }

    async fn flatten(&self, input: &Path, output: &Path) -> Result<()> {
        let root = input.parent().unwrap_or_else(|| Path::new("."));
        let source_id = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| Error::config(format!("unusable input path: {}", input.display())))?;

        let source = JsonFileSource::new(root);
        let mut stream = source.read(source_id).await?;
        let mut records = Vec::new();
        while let Some(record) = stream.next().await {
            records.push(record?);
        }

        let flattener = RecordFlattener::new();
        let flat: Vec<_> = records.iter().map(|r| flattener.flatten(r)).collect();
        let batch = unify_records(&flat);

        let out_root = output.parent().unwrap_or_else(|| Path::new("."));
        let destination = output
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::config(format!("unusable output path: {}", output.display())))?;

        let sink = FileSink::new(out_root);
        sink.write(&batch.schema, &batch.rows, destination).await?;

        println!(
            "{} record(s), {} column(s) -> {}",
            batch.row_count(),
            batch.schema.len(),
            output.display()
        );
        Ok(())
    }
}
