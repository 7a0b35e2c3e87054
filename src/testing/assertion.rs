//! Assertion evaluation
//!
//! Each [`Assumption`] observes one part of the response, then a
//! [`Condition`] compares that observation with the expected value.
//! Evaluation stops at the first assumption that does not hold.

use serde::Serialize;

use super::extract::{find_by_xpath, find_in_json, StepError};
use super::request::Response;
use super::step::{Assumption, Target};

/// Comparison applied between an observed value and the expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Observed equals expected
    Eq,
    /// Observed differs from expected
    Neq,
    /// Expected is a substring of observed
    In,
    /// Expected is not a substring of observed
    Nin,
    /// Nothing was observed (e.g. a JSON null)
    Empty,
    /// Something was observed
    NEmpty,
    /// Always holds
    Ninja,
}

impl Condition {
    /// Parse a lowercase condition name as written in `pass_if`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "in" => Some(Self::In),
            "nin" => Some(Self::Nin),
            "empty" => Some(Self::Empty),
            "nempty" => Some(Self::NEmpty),
            "ninja" => Some(Self::Ninja),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Empty => "empty",
            Self::NEmpty => "nempty",
            Self::Ninja => "ninja",
        }
    }

    /// Whether `expected` must be given for this condition
    pub fn requires_expected(&self) -> bool {
        !matches!(self, Self::Empty | Self::NEmpty)
    }

    pub fn holds(&self, got: Option<&str>, expected: Option<&str>) -> bool {
        match self {
            Self::Eq => got == expected,
            Self::Neq => got != expected,
            Self::In => matches!((got, expected), (Some(got), Some(expected)) if got.contains(expected)),
            Self::Nin => !Self::In.holds(got, expected),
            Self::Empty => got.is_none(),
            Self::NEmpty => got.is_some(),
            Self::Ninja => true,
        }
    }
}

/// The first assumption that did not hold, with the body it was checked against
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssumptionFailure {
    pub assumption: Assumption,
    pub condition: Condition,
    /// Full response body
    pub got: String,
}

impl AssumptionFailure {
    /// Human-readable cause for a step result
    pub fn cause(&self) -> String {
        let target = self.assumption.target.type_name();
        match &self.assumption.expected {
            Some(expected) if self.assumption.target != Target::File => format!(
                "Assumption failed: {} {} '{}'",
                target,
                self.condition.as_str(),
                expected
            ),
            _ => format!("Assumption failed: {} {}", target, self.condition.as_str()),
        }
    }
}

/// Extract the value an assumption inspects
///
/// `None` means the response held nothing at that location, such as a
/// JSON null.
pub fn observe(target: &Target, response: &Response) -> Result<Option<String>, StepError> {
    match target {
        Target::Json(keys) => find_in_json(&response.text, keys),
        Target::XPath(expr) => find_by_xpath(&response.text, expr).map(Some),
        Target::StatusCode => Ok(Some(response.status.to_string())),
        Target::Text | Target::File => Ok(Some(response.text.clone())),
    }
}

/// Check a single assumption; extraction errors count as a failed check
pub fn check(assumption: &Assumption, response: &Response) -> bool {
    match observe(&assumption.target, response) {
        Ok(got) => {
            let passed = assumption
                .condition
                .holds(got.as_deref(), assumption.expected.as_deref());
            tracing::debug!(
                target_type = assumption.target.type_name(),
                condition = assumption.condition.as_str(),
                passed,
                "Checked assumption"
            );
            passed
        }
        Err(e) => {
            tracing::debug!(error = %e, "Assumption extraction failed");
            false
        }
    }
}

/// Evaluate assumptions in order, short-circuiting on the first failure
pub fn evaluate(assumptions: &[Assumption], response: &Response) -> Result<(), AssumptionFailure> {
    match assumptions.iter().find(|a| !check(a, response)) {
        Some(failed) => Err(AssumptionFailure {
            assumption: failed.clone(),
            condition: failed.condition,
            got: response.text.clone(),
        }),
        None => Ok(()),
    }
}
