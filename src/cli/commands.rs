//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rowforge command-line interface
#[derive(Parser, Debug)]
#[command(name = "rowforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a pipeline configuration file
    Validate {
        /// Pipeline configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the resolved stage plan without running anything
    Plan {
        /// Pipeline configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Flatten attribute-encoded records into a tabular file
    ///
    /// Runs the core transform locally: decode, flatten, unify, write.
    Flatten {
        /// Input records: a JSON array or JSONL of attribute-encoded objects
        #[arg(short, long)]
        input: PathBuf,

        /// Output file; `.csv` or `.json` picks the format
        #[arg(short, long)]
        output: PathBuf,
    },
}
