//! Suite file loading
//!
//! A suite is an object mapping step ids to step definitions. JSON is the
//! native format; files ending in `.yaml`/`.yml` are read as YAML (step
//! ids must then be quoted strings).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::step::{RawStep, StepDescriptor};
use crate::common::{Error, Result};

/// Id of the step every chain starts from
pub const ENTRY_STEP: &str = "1";

/// All steps of a suite file, keyed by id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Suite {
    steps: BTreeMap<String, RawStep>,
}

impl Suite {
    /// Load a suite from disk, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let shown = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|_| Error::SuiteNotFound(shown.clone()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let suite = if is_yaml {
            Self::from_yaml_str(&content).map_err(|e| Error::suite_parse(&shown, e))?
        } else {
            Self::from_json_str(&content).map_err(|e| Error::suite_parse(&shown, e))?
        };

        tracing::debug!(path = %shown, steps = suite.len(), "Loaded suite");
        Ok(suite)
    }

    pub fn from_json_str(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn get(&self, id: &str) -> Option<&RawStep> {
        self.steps.get(id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Validate every step reachable from the entry point
    ///
    /// Returns the validated steps and their first-visit order. The walk
    /// ends at a null `next`, a missing id, or an already visited id.
    pub fn plan(&self) -> Result<(HashMap<String, StepDescriptor>, Vec<String>)> {
        let mut steps = HashMap::new();
        let mut order = Vec::new();
        let mut current = Some(ENTRY_STEP.to_string());

        while let Some(id) = current.take() {
            if steps.contains_key(&id) {
                break;
            }
            let Some(raw) = self.get(&id) else {
                break;
            };
            let step = StepDescriptor::validate(&id, raw)?;
            current = step.next.clone();
            order.push(id.clone());
            steps.insert(id, step);
        }

        Ok((steps, order))
    }

    /// Validate every step, reachable or not, in id order
    pub fn validate_all(&self) -> Result<BTreeMap<String, StepDescriptor>> {
        self.steps
            .iter()
            .map(|(id, raw)| Ok((id.clone(), StepDescriptor::validate(id, raw)?)))
            .collect()
    }
}
