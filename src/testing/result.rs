//! Per-step outcome records

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::assertion::AssumptionFailure;
use super::step::{Assumption, Method, StepDescriptor};

/// Pass/fail verdict of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FAILED")]
    Failed,
    /// Any other verdict string, e.g. from a results file written elsewhere
    #[serde(other)]
    Unknown,
}

/// Result of a single step invocation
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: String,
    pub url: String,
    pub method: Method,
    #[serde(rename = "result")]
    pub outcome: Outcome,
    /// Empty iff the step passed
    pub cause: String,
    /// Seconds, rounded to 5 decimals
    pub duration: f64,
    pub assumptions: Vec<Assumption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<AssumptionFailure>,
}

impl StepResult {
    /// A FAILED result with no cause yet, as recorded before a step runs
    pub fn pending(step: &StepDescriptor) -> Self {
        Self {
            step: step.id.clone(),
            url: step.url.clone(),
            method: step.method,
            outcome: Outcome::Failed,
            cause: String::new(),
            duration: 0.0,
            assumptions: step.assumptions.clone(),
            failure: None,
        }
    }

    pub fn pass(&mut self) {
        self.outcome = Outcome::Ok;
        self.cause.clear();
    }

    pub fn fail(&mut self, cause: impl Into<String>) {
        self.outcome = Outcome::Failed;
        self.cause = cause.into();
    }

    pub fn fail_assumption(&mut self, failure: AssumptionFailure) {
        self.fail(failure.cause());
        self.failure = Some(failure);
    }

    pub fn set_duration(&mut self, elapsed: Duration) {
        self.duration = (elapsed.as_secs_f64() * 100_000.0).round() / 100_000.0;
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Ok
    }
}
