//! reqchain - chained HTTP request test runner
//!
//! This library loads request-chain suites, executes them against live
//! HTTP services, and aggregates per-step verdicts into a report.

pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{ChainRunner, StepResult, Suite, Summary};
