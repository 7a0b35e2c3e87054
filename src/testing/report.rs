//! Report output
//!
//! The summary is written as pretty JSON to a timestamped file inside the
//! result directory, and a short banner is printed to the console.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use colored::Colorize;

use super::summary::Summary;
use crate::common::paths::ensure_result_dir;
use crate::common::{Error, Result};

/// File name for a report produced at `now`
pub fn report_file_name(now: DateTime<Local>) -> String {
    format!("result-{}.json", now.format("%Y-%m-%d-%H-%M-%S"))
}

/// Write `summary` into `result_dir`, creating the directory if needed
pub fn write_report(summary: &Summary, result_dir: &Path) -> Result<PathBuf> {
    let report_error = |path: &Path, error: String| Error::Report {
        path: path.display().to_string(),
        error,
    };

    let dir = ensure_result_dir(result_dir).map_err(|e| report_error(result_dir, e.to_string()))?;
    let path = dir.join(report_file_name(Local::now()));

    let body = serde_json::to_string_pretty(summary)?;
    std::fs::write(&path, body).map_err(|e| report_error(path.as_path(), e.to_string()))?;

    tracing::info!(path = %path.display(), "Report written");
    Ok(path)
}

/// Totals framed by `=` rules as wide as the longer line
pub fn banner(summary: &Summary) -> Vec<String> {
    let run = format!("Tests run: {}", summary.total);
    let counts = format!("{} failed. {} passed.", summary.fail, summary.pass);
    let rule = "=".repeat(run.len().max(counts.len()));
    vec![rule.clone(), run, counts, rule]
}

/// Print per-step verdicts followed by the banner
pub fn print_summary(summary: &Summary) {
    println!("\n{}", summary.title.white().bold());
    for result in &summary.tests {
        if result.passed() {
            println!(
                "  {} Step {}: {} {} ({:.5}s)",
                "✓".green(),
                result.step,
                result.method,
                result.url.dimmed(),
                result.duration
            );
        } else {
            println!(
                "  {} Step {}: {} {} - {}",
                "✗".red(),
                result.step,
                result.method,
                result.url.dimmed(),
                result.cause
            );
        }
    }

    println!();
    for line in banner(summary) {
        if summary.fail > 0 {
            println!("{}", line.red().bold());
        } else {
            println!("{}", line.green().bold());
        }
    }
}
