//! reqchain - chained HTTP request test runner
//!
//! Runs a suite of HTTP requests linked by `next` pointers, checks
//! assumptions on each reply, and writes a JSON report.

use std::path::PathBuf;

use clap::Parser;
use reqchain::common::{config::Config, logging};
use reqchain::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "reqchain", about = "Chained HTTP request test runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let guard = match &cli.log_file {
        Some(path) => logging::init_with_file(path),
        None => {
            logging::init_cli();
            None
        }
    };

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        cli::report_fatal(&e);
        drop(guard);
        std::process::exit(1);
    }
}
