//! Step definitions and validation
//!
//! A suite file holds loosely typed [`RawStep`]s. Before anything is sent,
//! each step on the chain is validated into an immutable [`StepDescriptor`]
//! whose extraction specs and assumptions are closed enums. Validation
//! failures carry the step id and a field path such as `send_data[1].param_name`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::assertion::Condition;
use crate::common::{Error, Result};

/// A step exactly as written in the suite file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStep {
    #[serde(default)]
    pub method: Option<Value>,
    #[serde(default)]
    pub url: Option<Value>,
    #[serde(default)]
    pub next: Option<Value>,
    /// An explicit `null` is kept as `Some(Value::Null)` so it can be rejected
    #[serde(default, deserialize_with = "present")]
    pub send_data: Option<Value>,
    #[serde(default)]
    pub assume: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub headers: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// HTTP verbs a step may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Parse a verb case-insensitively
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "head" => Some(Self::Head),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a JSON key path: an object key or an array index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JsonKey {
    Name(String),
    Index(i64),
}

impl fmt::Display for JsonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Where a parameter value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionSpec {
    /// Literal value
    Static(String),
    /// File contents, read during validation
    File(String),
    /// Key path into the previous JSON reply
    Json(Vec<JsonKey>),
    /// XPath expression over the previous XML reply
    XPath(String),
}

impl ExtractionSpec {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Static(_) => "static",
            Self::File(_) => "file",
            Self::Json(_) => "json",
            Self::XPath(_) => "xpath",
        }
    }

    /// Whether resolving this spec needs the previous reply
    pub fn needs_reply(&self) -> bool {
        matches!(self, Self::Json(_) | Self::XPath(_))
    }
}

/// One entry of a step's `send_data`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamPackage {
    /// Raw request body taken from a file; always the only package of its step
    File(String),
    /// Query parameter whose name and value are resolved independently
    Pair {
        name: ExtractionSpec,
        value: ExtractionSpec,
    },
}

/// What part of the response an assumption inspects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Text,
    /// Whole body, compared against the contents of a file
    File,
    StatusCode,
    Json(Vec<JsonKey>),
    XPath(String),
}

impl Target {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::StatusCode => "status_code",
            Self::Json(_) => "json",
            Self::XPath(_) => "xpath",
        }
    }
}

/// A single assertion on a step's response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "AssumptionRecord")]
pub struct Assumption {
    pub target: Target,
    pub condition: Condition,
    /// Absent only for `empty` / `nempty`
    pub expected: Option<String>,
}

/// Report shape of an [`Assumption`], mirroring the suite file's keys
#[derive(Debug, Serialize)]
pub struct AssumptionRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub pass_if: Condition,
    pub expected: Option<String>,
    pub got: Value,
}

impl From<Assumption> for AssumptionRecord {
    fn from(assumption: Assumption) -> Self {
        let got = match &assumption.target {
            Target::Json(keys) => Value::Array(
                keys.iter()
                    .map(|key| match key {
                        JsonKey::Name(name) => Value::from(name.as_str()),
                        JsonKey::Index(index) => Value::from(*index),
                    })
                    .collect(),
            ),
            Target::XPath(expr) => Value::from(expr.as_str()),
            _ => Value::Null,
        };
        Self {
            kind: assumption.target.type_name(),
            pass_if: assumption.condition,
            expected: assumption.expected,
            got,
        }
    }
}

/// A validated, immutable step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDescriptor {
    pub id: String,
    pub method: Method,
    pub url: String,
    pub data: Vec<ParamPackage>,
    pub assumptions: Vec<Assumption>,
    pub headers: BTreeMap<String, String>,
    pub next: Option<String>,
}

impl StepDescriptor {
    /// Validate a raw step, reading any referenced files eagerly
    pub fn validate(id: &str, raw: &RawStep) -> Result<Self> {
        let v = Validator { step: id };
        Ok(Self {
            id: id.to_string(),
            method: v.method(raw.method.as_ref())?,
            url: v.url(raw.url.as_ref())?,
            data: v.data(raw.send_data.as_ref())?,
            assumptions: v.assumptions(raw.assume.as_ref())?,
            headers: v.headers(raw.headers.as_ref())?,
            next: v.next(raw.next.as_ref())?,
        })
    }
}

/// Field-by-field checks for one step; every error names `step`
struct Validator<'a> {
    step: &'a str,
}

impl Validator<'_> {
    fn err(&self, field: &str, message: impl Into<String>) -> Error {
        Error::invalid_step(self.step, field, message)
    }

    fn method(&self, raw: Option<&Value>) -> Result<Method> {
        let name = match raw {
            None => "",
            Some(Value::String(s)) => s.as_str(),
            Some(_) => return Err(self.err("method", "expected a string")),
        };
        Method::parse(name).ok_or_else(|| {
            self.err(
                "method",
                format!("method \"{}\" not allowed (use GET, HEAD, POST, PUT or DELETE)", name),
            )
        })
    }

    fn url(&self, raw: Option<&Value>) -> Result<String> {
        match raw {
            Some(Value::String(url)) => Ok(url.clone()),
            Some(_) => Err(self.err("url", "expected a string")),
            None => Err(self.err("url", "URL not specified")),
        }
    }

    fn next(&self, raw: Option<&Value>) -> Result<Option<String>> {
        match raw {
            None => Ok(None),
            Some(Value::String(id)) => Ok(Some(id.clone())),
            Some(_) => Err(self.err("next", "expected a step id string or null")),
        }
    }

    fn headers(&self, raw: Option<&Value>) -> Result<BTreeMap<String, String>> {
        let Some(raw) = raw else {
            return Ok(BTreeMap::new());
        };
        let invalid = || self.err("headers", "invalid request header(s), expected string values");
        let map = raw.as_object().ok_or_else(invalid)?;
        map.iter()
            .map(|(name, value)| match value {
                Value::String(value) => Ok((name.clone(), value.clone())),
                _ => Err(invalid()),
            })
            .collect()
    }

    /// Read a string-valued type tag, lowercased, falling back to `default`
    fn tag(&self, field: &str, raw: Option<&Value>, default: &str) -> Result<String> {
        match raw {
            None | Some(Value::Null) => Ok(default.to_string()),
            Some(Value::String(tag)) => Ok(tag.to_ascii_lowercase()),
            Some(_) => Err(self.err(field, "expected a string")),
        }
    }

    fn json_keys(&self, field: &str, raw: Option<&Value>) -> Result<Vec<JsonKey>> {
        let invalid = || self.err(field, "expected a list of string or integer keys");
        let items = raw.and_then(Value::as_array).ok_or_else(invalid)?;
        items
            .iter()
            .map(|item| match item {
                Value::String(name) => Ok(JsonKey::Name(name.clone())),
                Value::Number(n) => n.as_i64().map(JsonKey::Index).ok_or_else(invalid),
                _ => Err(invalid()),
            })
            .collect()
    }

    fn read_file(&self, field: &str, path: &str) -> Result<String> {
        std::fs::read_to_string(Path::new(path))
            .map_err(|e| self.err(field, format!("unable to open {}: {}", path, e)))
    }

    fn object<'v>(&self, field: &str, raw: &'v Value) -> Result<&'v Map<String, Value>> {
        raw.as_object()
            .ok_or_else(|| self.err(field, "expected an object"))
    }

    fn assumptions(&self, raw: Option<&Value>) -> Result<Vec<Assumption>> {
        let items = match raw {
            Some(Value::Array(items)) if !items.is_empty() => items,
            Some(Value::Array(_)) | None => {
                return Err(self.err("assume", "no assumptions found"));
            }
            Some(_) => return Err(self.err("assume", "expected a list of assumptions")),
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.assumption(&format!("assume[{}]", i), item))
            .collect()
    }

    fn assumption(&self, field: &str, raw: &Value) -> Result<Assumption> {
        let obj = self.object(field, raw)?;

        let type_field = format!("{}.type", field);
        let kind = self.tag(&type_field, obj.get("type"), "text")?;

        let cond_field = format!("{}.pass_if", field);
        let cond = self.tag(&cond_field, obj.get("pass_if"), "eq")?;
        let condition = Condition::parse(&cond)
            .ok_or_else(|| self.err(&cond_field, format!("unknown condition '{}'", cond)))?;

        let expected_field = format!("{}.expected", field);
        let expected = match obj.get("expected") {
            Some(Value::String(expected)) => Some(expected.clone()),
            _ if condition.requires_expected() => {
                return Err(self.err(&expected_field, "expectation invalid or not specified"));
            }
            _ => None,
        };

        let got_field = format!("{}.got", field);
        let got = obj.get("got");
        let (target, expected) = match kind.as_str() {
            "text" => (Target::Text, expected),
            "status_code" => (Target::StatusCode, expected),
            "json" => (Target::Json(self.json_keys(&got_field, got)?), expected),
            "xpath" => match got {
                Some(Value::String(expr)) => (Target::XPath(expr.clone()), expected),
                _ => return Err(self.err(&got_field, "expected an XPath string")),
            },
            "file" => {
                let path = expected
                    .ok_or_else(|| self.err(&expected_field, "file assumption needs a path"))?;
                (Target::File, Some(self.read_file(&expected_field, &path)?))
            }
            other => {
                return Err(self.err(
                    &type_field,
                    format!("assumption type {} invalid", other),
                ));
            }
        };

        Ok(Assumption {
            target,
            condition,
            expected,
        })
    }

    fn data(&self, raw: Option<&Value>) -> Result<Vec<ParamPackage>> {
        let items = match raw {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(self.err("send_data", "invalid send_data, expected a list")),
        };

        let mut packages = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let field = format!("send_data[{}]", i);
            let pkg = self.object(&field, item)?;

            let value_field = format!("{}.param_value", field);
            let value = self.extraction(&value_field, pkg.get("param_value"))?;

            if let ExtractionSpec::File(contents) = value {
                let dropped = items.len() - 1;
                if dropped > 0 {
                    tracing::warn!(
                        step = self.step,
                        dropped,
                        "File upload is exclusive; ignoring other send_data entries"
                    );
                }
                return Ok(vec![ParamPackage::File(contents)]);
            }

            let name_field = format!("{}.param_name", field);
            let name = self.extraction(&name_field, pkg.get("param_name"))?;
            packages.push(ParamPackage::Pair { name, value });
        }

        Ok(packages)
    }

    fn extraction(&self, field: &str, raw: Option<&Value>) -> Result<ExtractionSpec> {
        let raw = raw.ok_or_else(|| self.err(field, "not found"))?;
        let obj = self.object(field, raw)?;
        let kind = self.tag(&format!("{}.type", field), obj.get("type"), "static")?;

        let value_field = format!("{}.value", field);
        let value = obj.get("value");
        let string_value = || match value {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(self.err(&value_field, "expected a string")),
        };

        match kind.as_str() {
            "static" => Ok(ExtractionSpec::Static(string_value()?)),
            "xpath" => Ok(ExtractionSpec::XPath(string_value()?)),
            "file" => Ok(ExtractionSpec::File(
                self.read_file(&value_field, &string_value()?)?,
            )),
            "json" => Ok(ExtractionSpec::Json(self.json_keys(&value_field, value)?)),
            other => Err(self.err(
                &format!("{}.type", field),
                format!("invalid send_data param type {}", other),
            )),
        }
    }
}
