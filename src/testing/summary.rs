//! Result aggregation

use serde::Serialize;

use super::result::{Outcome, StepResult};

/// Aggregate of a run, handed to report rendering
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub title: String,
    pub date: String,
    pub total: usize,
    pub pass: usize,
    /// Percent of `total`, two decimals
    pub pass_pct: f64,
    pub fail: usize,
    pub fail_pct: f64,
    pub tests: Vec<StepResult>,
}

impl Summary {
    /// Tally outcomes; unknown outcomes are logged and counted in neither bucket
    pub fn create(title: &str, results: Vec<StepResult>) -> Self {
        let total = results.len();
        let mut pass = 0;
        let mut fail = 0;
        for result in &results {
            match result.outcome {
                Outcome::Ok => pass += 1,
                Outcome::Failed => fail += 1,
                Outcome::Unknown => {
                    tracing::error!("Unknown test result for step {}", result.step);
                }
            }
        }

        Self {
            title: title.to_string(),
            date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            total,
            pass,
            pass_pct: percentage(pass, total),
            fail,
            fail_pct: percentage(fail, total),
            tests: results,
        }
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 10_000.0 / total as f64).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::step::Method;

    fn result(step: &str, outcome: Outcome) -> StepResult {
        StepResult {
            step: step.to_string(),
            url: format!("http://svc.local/{}", step),
            method: Method::Get,
            outcome,
            cause: String::new(),
            duration: 0.0,
            assumptions: Vec::new(),
            failure: None,
        }
    }

    #[test]
    fn test_counts_and_percentages() {
        let summary = Summary::create(
            "Nightly",
            vec![
                result("1", Outcome::Ok),
                result("2", Outcome::Failed),
                result("3", Outcome::Ok),
            ],
        );
        assert_eq!(summary.title, "Nightly");
        assert_eq!(summary.total, 3);
        assert_eq!(summary.pass, 2);
        assert_eq!(summary.fail, 1);
        assert_eq!(summary.pass_pct, 66.67);
        assert_eq!(summary.fail_pct, 33.33);
    }

    #[test]
    fn test_order_preserved() {
        let summary = Summary::create(
            "t",
            vec![result("b", Outcome::Ok), result("a", Outcome::Ok)],
        );
        let steps: Vec<&str> = summary.tests.iter().map(|r| r.step.as_str()).collect();
        assert_eq!(steps, vec!["b", "a"]);
    }

    #[test]
    fn test_empty_run_reports_zero_percent() {
        let summary = Summary::create("Empty", Vec::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.pass_pct, 0.0);
        assert_eq!(summary.fail_pct, 0.0);
    }

    #[test]
    fn test_unknown_outcome_excluded_from_both_counts() {
        let summary = Summary::create(
            "t",
            vec![result("1", Outcome::Ok), result("2", Outcome::Unknown)],
        );
        assert_eq!(summary.total, 2);
        assert_eq!(summary.pass, 1);
        assert_eq!(summary.fail, 0);
        assert_eq!(summary.pass_pct, 50.0);
        assert_eq!(summary.fail_pct, 0.0);
    }
}
