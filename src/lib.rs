//! # rowforge
//!
//! A Rust-native toolkit for flattening explicitly-typed records and running
//! poll-driven ETL pipelines.
//!
//! ## Features
//!
//! - **Typed-record flattening**: nested, tagged source records become flat,
//!   schema-consistent tabular rows; bad data degrades instead of failing
//! - **Schema unification**: heterogeneous batches get one stable column set
//! - **Completion polling**: one bounded retry engine for every asynchronous
//!   collaborator (catalog visibility, crawler runs, query executions)
//! - **Dataset isolation**: one failing dataset never stops the rest
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rowforge::config::PipelineConfig;
//! use rowforge::pipeline::PipelineCoordinator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rowforge::Result<()> {
//!     let config = PipelineConfig::from_yaml_file("pipeline.yaml")?;
//!
//!     // Collaborators implement the traits in rowforge::connector
//!     let coordinator = PipelineCoordinator::new(
//!         config, source, probe, launcher, results, sink,
//!     );
//!
//!     let summary = coordinator.run().await;
//!     println!("{} completed, {} abandoned", summary.completed(), summary.abandoned());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      PipelineCoordinator                        │
//! │  extract → flatten/unify → load → catalog → crawl → query →     │
//! │  load results          (per dataset, failures isolated)         │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬────────────┬──────┴────────┬────────────┬───────────┐
//! │  Record  │   Schema   │     Poll      │ Connector  │ Adapters  │
//! ├──────────┼────────────┼───────────────┼────────────┼───────────┤
//! │ TypedVal │ Unifier    │ Orchestrator  │ Source     │ JSON file │
//! │ Flatten  │ TableBatch │ Policy        │ Launcher   │ CSV/JSON  │
//! │ Decode   │            │ Probe         │ Sink       │   sink    │
//! └──────────┴────────────┴───────────────┴────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pipeline configuration
pub mod config;

/// Typed record model and flattening
pub mod record;

/// Schema unification
pub mod schema;

/// Asynchronous-completion polling
pub mod poll;

/// Collaborator interfaces
pub mod connector;

/// Pipeline coordination
pub mod pipeline;

/// Local file adapters
pub mod adapters;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use pipeline::{PipelineCoordinator, RunSummary};
pub use poll::{JobHandle, JobKind, JobStatus, JobStatusProbe, PollingOrchestrator, PollingPolicy};
pub use record::{FlatRecord, RecordFlattener, ScalarValue, TypedValue};
pub use schema::{SchemaUnifier, TableBatch, TableSchema};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
