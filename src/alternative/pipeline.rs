//! A single candidate pipeline.

use crate::error::{AltSimError, Result};
use crate::steps::{InputData, Step};

/// One candidate simulation run: an ordered sequence of steps and the
/// index-aligned parameter bindings they run with.
///
/// The same step may appear more than once. Pipelines only grow; every
/// appended pair is checked with [`Step::is_inputdata_from_self`].
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    identifier: String,
    steps: Vec<Step>,
    input_data: Vec<InputData>,
}

impl Alternative {
    /// Create an empty pipeline.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            steps: Vec::new(),
            input_data: Vec::new(),
        }
    }

    /// Create a pipeline from (step, input data) pairs, checking each one.
    pub fn with_steps(
        identifier: impl Into<String>,
        pairs: impl IntoIterator<Item = (Step, InputData)>,
    ) -> Result<Self> {
        let mut alternative = Self::new(identifier);
        for (step, input_data) in pairs {
            alternative.add_simulation_step(step, input_data)?;
        }
        Ok(alternative)
    }

    /// Pipeline identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Number of steps.
    pub fn num_step(&self) -> usize {
        self.steps.len()
    }

    /// Check if the pipeline has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in pipeline order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Parameter bindings in pipeline order.
    pub fn input_data(&self) -> &[InputData] {
        &self.input_data
    }

    /// Iterate over (step, input data) pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&Step, &InputData)> {
        self.steps.iter().zip(self.input_data.iter())
    }

    /// Get the pair at a position.
    pub fn step_at(&self, index: usize) -> Result<(&Step, &InputData)> {
        match (self.steps.get(index), self.input_data.get(index)) {
            (Some(step), Some(input_data)) => Ok((step, input_data)),
            _ => Err(AltSimError::StepIndexOutOfRange {
                alternative: self.identifier.clone(),
                index,
                len: self.steps.len(),
            }),
        }
    }

    /// Append a step with its parameter binding.
    ///
    /// Fails without modifying the pipeline if `input_data` was not
    /// generated for `step` or no longer satisfies its contract.
    pub fn add_simulation_step(&mut self, step: Step, input_data: InputData) -> Result<()> {
        step.is_inputdata_from_self(&input_data)?;
        self.steps.push(step);
        self.input_data.push(input_data);
        Ok(())
    }

    /// Recompute the identifier from the pipeline's contents.
    ///
    /// The identifier becomes `<prefix>_<input id>` for every position,
    /// joined with `_`. Does nothing on an empty pipeline.
    pub fn adjust_identifier_from_inputdata_identifier(&mut self) {
        if self.steps.is_empty() {
            return;
        }

        self.identifier = self
            .pairs()
            .map(|(step, input_data)| format!("{}_{}", step.prefix(), input_data.identifier()))
            .collect::<Vec<_>>()
            .join("_");
    }

    /// Check whether two pipelines have the same step at `step_index`.
    ///
    /// With `check_inputdata`, the parameter bindings must match as well.
    /// Fails if either pipeline is too short.
    pub fn has_same_simulation_step(
        alt_a: &Alternative,
        alt_b: &Alternative,
        step_index: usize,
        check_inputdata: bool,
    ) -> Result<bool> {
        let (step_a, input_a) = alt_a.step_at(step_index)?;
        let (step_b, input_b) = alt_b.step_at(step_index)?;

        if step_a != step_b {
            return Ok(false);
        }

        Ok(!check_inputdata || input_a == input_b)
    }
}
