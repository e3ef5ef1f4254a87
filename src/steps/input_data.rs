//! Concrete parameter bindings for a step.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::param::Params;

/// A validated parameter binding tied to exactly one step.
///
/// Created through [`Step::generate_input_data`](super::Step::generate_input_data),
/// which checks the parameters against the step's contract. Equality compares
/// the identifier, the step name and the parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputData {
    identifier: String,
    step_name: String,
    params: Params,
}

impl InputData {
    pub(crate) fn new(identifier: String, step_name: String, params: Params) -> Self {
        Self {
            identifier,
            step_name,
            params,
        }
    }

    /// Identifier, unique within the owning step's namespace.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Name of the step this binding was generated for.
    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    /// The parameter values.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Look up a single parameter value.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Hook for derived-value computation. Does nothing.
    pub fn preprocess(&mut self) {}
}

impl fmt::Display for InputData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InputData(identifier={}, step_name={}, params={})",
            self.identifier,
            self.step_name,
            serde_json::to_string(&self.params).unwrap_or_default()
        )
    }
}
