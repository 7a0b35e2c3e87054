//! CLI command handling
//!
//! Dispatches CLI commands to the chain runner and formats output.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::{Config, RevisitPolicy};
use crate::common::{Error, Result};
use crate::testing::{print_summary, write_report, ChainRunner, HttpTransport, Suite, Summary};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Run {
            test_file,
            result_path,
            title,
            timeout,
            on_revisit,
        } => {
            if let Some(secs) = timeout {
                config.http.timeout_secs = secs;
            }
            let policy = on_revisit.unwrap_or(config.run.on_revisit);
            let title = title.unwrap_or_else(|| config.run.default_title.clone());

            let summary = run(&test_file, &config, policy, &title).await?;
            write_report(&summary, &result_path)?;
            print_summary(&summary);

            Ok(())
        }

        Commands::Validate { test_file } => validate(&test_file),
    }
}

/// Report an error that ends the process
pub fn report_fatal(error: &Error) {
    tracing::error!(error = %error, "Run aborted");
    eprintln!("Error: {error}");
}

/// Load a suite, run its chain, and aggregate the results
pub async fn run(
    test_file: &Path,
    config: &Config,
    policy: RevisitPolicy,
    title: &str,
) -> Result<Summary> {
    let suite = Suite::load(test_file)?;
    let transport = HttpTransport::new(&config.http)?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let results = ChainRunner::new(&suite, &transport)
        .on_revisit(policy)
        .with_stop_flag(stop)
        .run()
        .await;
    interrupt.abort();

    Ok(Summary::create(title, results?))
}

/// Validate every step and print the chain order
fn validate(test_file: &Path) -> Result<()> {
    let suite = Suite::load(test_file)?;
    let steps = suite.validate_all()?;

    for step in steps.values() {
        let next = step.next.as_deref().unwrap_or("end");
        println!(
            "  {} Step {}: {} {} -> {}",
            "✓".green(),
            step.id,
            step.method,
            step.url.dimmed(),
            next
        );
    }

    let (_, order) = suite.plan()?;
    if order.is_empty() {
        println!("\n{}", "No entry step \"1\"; nothing would run".yellow());
    } else {
        println!("\nChain: {}", order.join(" -> "));
    }

    Ok(())
}
