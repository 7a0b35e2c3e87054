//! Request building and invocation
//!
//! A step's parameters are resolved against the previous reply, sent
//! through a [`Transport`], and the reply is checked against the step's
//! assumptions. Every failure here is recorded on the [`StepResult`];
//! nothing is retried.

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;

use super::assertion;
use super::extract::{resolve, StepError};
use super::result::StepResult;
use super::step::{Method, ParamPackage, StepDescriptor};
use crate::common::config::HttpConfig;
use crate::common::{Error, Result};

/// Reply to a step's request; the only state carried between steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub text: String,
}

/// What a request carries besides its headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Empty,
    /// Query parameters, in first-seen order of their names
    Params(Vec<(String, String)>),
    /// Raw request body (file upload)
    Body(String),
}

/// A fully resolved request ready to send
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub payload: Payload,
}

/// Sends one request and waits for its reply
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> std::result::Result<Response, StepError>;
}

/// [`Transport`] backed by a reqwest client
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> std::result::Result<Response, StepError> {
        let mut builder = self.client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.payload {
            Payload::Empty => builder,
            Payload::Params(params) => builder.query(&params),
            Payload::Body(body) => builder.body(body),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| StepError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StepError::Transport(e.to_string()))?;

        Ok(Response { status, text })
    }
}

/// Resolve a step's `send_data` into a payload
///
/// A file package short-circuits into a raw body. Parameters whose name
/// or value resolves to nothing are left out; a repeated name keeps its
/// last value.
pub fn resolve_payload(
    data: &[ParamPackage],
    previous: Option<&Response>,
) -> std::result::Result<Payload, StepError> {
    let mut params: Vec<(String, String)> = Vec::new();
    for package in data {
        match package {
            ParamPackage::File(contents) => return Ok(Payload::Body(contents.clone())),
            ParamPackage::Pair { name, value } => {
                let (Some(name), Some(value)) = (resolve(name, previous)?, resolve(value, previous)?)
                else {
                    tracing::debug!("Skipping parameter that resolved to null");
                    continue;
                };
                match params.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(slot) => slot.1 = value,
                    None => params.push((name, value)),
                }
            }
        }
    }

    Ok(if params.is_empty() {
        Payload::Empty
    } else {
        Payload::Params(params)
    })
}

/// Build the outbound request for a step
pub fn build_request(
    step: &StepDescriptor,
    previous: Option<&Response>,
) -> std::result::Result<OutboundRequest, StepError> {
    Ok(OutboundRequest {
        method: step.method,
        url: step.url.clone(),
        headers: step.headers.clone(),
        payload: resolve_payload(&step.data, previous)?,
    })
}

/// Outcome of invoking one step, plus the reply if one was obtained
#[derive(Debug)]
pub struct Invocation {
    pub result: StepResult,
    pub response: Option<Response>,
}

/// Run one step: resolve, send, check
pub async fn invoke(
    step: &StepDescriptor,
    previous: Option<&Response>,
    transport: &dyn Transport,
) -> Invocation {
    let start = Instant::now();
    let mut result = StepResult::pending(step);
    tracing::info!("Requesting => {}", step.url);

    let response = match build_request(step, previous) {
        Err(e) => {
            result.fail(e.to_string());
            None
        }
        Ok(request) => {
            tracing::debug!(method = %request.method, payload = ?request.payload, "Sending request");
            match transport.send(request).await {
                Err(e) => {
                    result.fail(e.to_string());
                    None
                }
                Ok(response) => {
                    if response.status >= 400 {
                        result.fail(format!("Got status_code: {}", response.status));
                    } else {
                        match assertion::evaluate(&step.assumptions, &response) {
                            Ok(()) => result.pass(),
                            Err(failure) => result.fail_assumption(failure),
                        }
                    }
                    Some(response)
                }
            }
        }
    };

    result.set_duration(start.elapsed());
    if result.passed() {
        tracing::info!(duration = result.duration, "OK");
    } else {
        tracing::info!(duration = result.duration, cause = %result.cause, "FAILED");
    }

    Invocation { result, response }
}
