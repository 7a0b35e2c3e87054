//! Chain execution
//!
//! Starting at step "1", the runner follows `next` pointers, invoking one
//! step at a time and handing each reply to the following step. Every
//! step reachable from the entry point is validated before the first
//! request goes out, so a malformed suite never runs partially.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::Instrument;

use super::request::{invoke, Response, Transport};
use super::result::StepResult;
use super::suite::{Suite, ENTRY_STEP};
use crate::common::config::RevisitPolicy;
use crate::common::Result;

/// Drives a suite's chain through a transport
pub struct ChainRunner<'a> {
    suite: &'a Suite,
    transport: &'a dyn Transport,
    on_revisit: RevisitPolicy,
    stop: Option<Arc<AtomicBool>>,
}

impl<'a> ChainRunner<'a> {
    pub fn new(suite: &'a Suite, transport: &'a dyn Transport) -> Self {
        Self {
            suite,
            transport,
            on_revisit: RevisitPolicy::default(),
            stop: None,
        }
    }

    pub fn on_revisit(mut self, policy: RevisitPolicy) -> Self {
        self.on_revisit = policy;
        self
    }

    /// Flag checked between steps; once set, no further step starts
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Run the chain and return one result per executed step
    ///
    /// Only validation errors are returned as `Err`; step failures are
    /// recorded in the results and the chain carries on.
    pub async fn run(&self) -> Result<Vec<StepResult>> {
        let (steps, _) = self.suite.plan()?;

        let mut previous: Option<Response> = None;
        let mut visited: Vec<String> = Vec::new();
        let mut results = Vec::new();
        let mut current = Some(ENTRY_STEP.to_string());

        while let Some(id) = current.take() {
            if self.stop_requested() {
                tracing::warn!("Run interrupted before step {}", id);
                break;
            }

            visited.push(id.clone());
            let Some(step) = steps.get(&id) else {
                tracing::error!("Step {} not found.", id);
                break;
            };

            let span = tracing::info_span!("step", step = %id);
            let invocation = invoke(step, previous.as_ref(), self.transport)
                .instrument(span)
                .await;
            results.push(invocation.result);
            previous = invocation.response;

            current = step.next.clone();
            if let Some(next) = &current {
                if visited.contains(next) {
                    tracing::warn!(step = %next, "WARNING! possible infinite loop.");
                    if self.on_revisit == RevisitPolicy::Stop {
                        break;
                    }
                }
            }
        }

        Ok(results)
    }
}
