//! Chained HTTP request testing
//!
//! A suite file describes steps linked by `next` pointers. Each step sends
//! one request, checks assumptions on the reply, and may pull parameters
//! out of the previous step's reply via JSON key paths or XPath.

mod assertion;
mod extract;
#[cfg(test)]
mod mock;
mod report;
mod request;
mod result;
mod runner;
mod step;
mod suite;
mod summary;

pub use assertion::{evaluate, AssumptionFailure, Condition};
pub use extract::{find_by_xpath, find_in_json, resolve, StepError};
pub use report::{banner, print_summary, report_file_name, write_report};
pub use request::{
    build_request, invoke, resolve_payload, HttpTransport, Invocation, OutboundRequest, Payload,
    Response, Transport,
};
pub use result::{Outcome, StepResult};
pub use runner::ChainRunner;
pub use step::{
    Assumption, ExtractionSpec, JsonKey, Method, ParamPackage, RawStep, StepDescriptor, Target,
};
pub use suite::{Suite, ENTRY_STEP};
pub use summary::Summary;
