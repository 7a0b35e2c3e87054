//! Value extraction from previous replies
//!
//! Two locator languages are supported: a JSON key path (object keys and
//! array indices) and XPath over an XML body. An XPath must select exactly
//! one node; ambiguous matches are an error.

use serde_json::Value;
use thiserror::Error;

use super::request::Response;
use super::step::{ExtractionSpec, JsonKey};

/// Failure scoped to a single step; becomes a FAILED result, never aborts a run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// A json/xpath value was requested but no earlier reply exists
    #[error("Request failed, previous reply not available.")]
    ReplyNotAvailable,

    #[error("JSON Parse error: {0}")]
    JsonParse(String),

    #[error("JSON Key {0} not found")]
    JsonKeyNotFound(String),

    #[error("XML Parse error: {0}")]
    XmlParse(String),

    #[error("XPath {expr} evaluation error: {message}")]
    XPath { expr: String, message: String },

    #[error("Request failed: {0}")]
    Transport(String),
}

impl StepError {
    fn xpath(expr: &str, message: impl ToString) -> Self {
        Self::XPath {
            expr: expr.to_string(),
            message: message.to_string(),
        }
    }
}

/// Resolve one extraction spec to a concrete value
///
/// `Ok(None)` is returned when a JSON lookup lands on `null`.
pub fn resolve(spec: &ExtractionSpec, previous: Option<&Response>) -> Result<Option<String>, StepError> {
    match spec {
        // File contents were already loaded during validation
        ExtractionSpec::Static(value) | ExtractionSpec::File(value) => Ok(Some(value.clone())),
        ExtractionSpec::Json(keys) => find_in_json(&reply(previous)?.text, keys),
        ExtractionSpec::XPath(expr) => find_by_xpath(&reply(previous)?.text, expr).map(Some),
    }
}

fn reply(previous: Option<&Response>) -> Result<&Response, StepError> {
    previous.ok_or(StepError::ReplyNotAvailable)
}

/// Follow `keys` through a JSON document
///
/// Negative indices count from the end of an array.
pub fn find_in_json(source: &str, keys: &[JsonKey]) -> Result<Option<String>, StepError> {
    let root: Value =
        serde_json::from_str(source).map_err(|e| StepError::JsonParse(e.to_string()))?;

    let mut current = &root;
    for key in keys {
        let next = match (key, current) {
            (JsonKey::Name(name), Value::Object(map)) => map.get(name),
            (JsonKey::Index(index), Value::Array(items)) => {
                let len = items.len() as i64;
                let position = if *index < 0 { len + index } else { *index };
                usize::try_from(position).ok().and_then(|i| items.get(i))
            }
            _ => None,
        };
        current = next.ok_or_else(|| StepError::JsonKeyNotFound(key.to_string()))?;
    }

    Ok(match current {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

/// Evaluate an XPath expression that must select exactly one node
pub fn find_by_xpath(source: &str, expr: &str) -> Result<String, StepError> {
    let package = sxd_document::parser::parse(source)
        .map_err(|e| StepError::XmlParse(format!("{:?}", e)))?;
    let document = package.as_document();

    let value = sxd_xpath::evaluate_xpath(&document, expr).map_err(|e| StepError::xpath(expr, e))?;

    let found = match value {
        sxd_xpath::Value::Nodeset(nodes) => match nodes.size() {
            1 => nodes
                .document_order_first()
                .map(|node| node.string_value())
                .ok_or_else(|| StepError::xpath(expr, "empty node set"))?,
            count => {
                return Err(StepError::xpath(
                    expr,
                    format!("expected exactly one match, found {}", count),
                ));
            }
        },
        sxd_xpath::Value::String(s) => s,
        sxd_xpath::Value::Number(n) => n.to_string(),
        sxd_xpath::Value::Boolean(b) => b.to_string(),
    };
    Ok(found)
}
