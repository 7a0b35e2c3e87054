//! CLI command definitions
//!
//! Defines the clap commands for the request chain runner.

use clap::Subcommand;
use std::path::PathBuf;

use crate::common::config::RevisitPolicy;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a suite's request chain and write a JSON report
    Run {
        /// Path to the JSON (or YAML) suite file
        test_file: PathBuf,

        /// Directory the report is written into (created if missing)
        result_path: PathBuf,

        /// Title shown in the report
        #[arg(short = 't', long)]
        title: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// What to do when `next` leads back to an executed step
        #[arg(long, value_enum)]
        on_revisit: Option<RevisitPolicy>,
    },

    /// Validate every step of a suite without sending any request
    Validate {
        /// Path to the JSON (or YAML) suite file
        test_file: PathBuf,
    },
}
