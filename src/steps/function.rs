//! The computation behind a step.
//!
//! Steps treat their work as an opaque capability. Anything implementing
//! [`StepFunction`] can back a step; closures are adapted with [`step_fn`].
//! Two functions are considered the same when their declared names match.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::param::Params;

/// Inputs handed to a step function.
#[derive(Debug, Clone, Copy)]
pub struct StepInputs<'a> {
    /// The validated parameter binding for this position.
    pub params: &'a Params,

    /// Outputs of the step's declared dependencies, in declaration order.
    pub upstream: &'a [Value],
}

impl<'a> StepInputs<'a> {
    /// Create inputs from params and upstream outputs.
    pub fn new(params: &'a Params, upstream: &'a [Value]) -> Self {
        Self { params, upstream }
    }

    /// Number of positional upstream inputs.
    pub fn arity(&self) -> usize {
        self.upstream.len()
    }

    /// Look up a parameter value.
    pub fn param(&self, name: &str) -> Option<&'a Value> {
        self.params.get(name)
    }
}

/// A unit of computation a step delegates to.
pub trait StepFunction: Send + Sync {
    /// Identity label used for step equality.
    fn name(&self) -> &str;

    /// Compute the step's output.
    fn compute(&self, inputs: &StepInputs<'_>) -> anyhow::Result<Value>;
}

/// A [`StepFunction`] backed by a closure.
pub struct FnStep<F> {
    name: String,
    func: F,
}

impl<F> StepFunction for FnStep<F>
where
    F: Fn(&StepInputs<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, inputs: &StepInputs<'_>) -> anyhow::Result<Value> {
        (self.func)(inputs)
    }
}

impl<F> fmt::Debug for FnStep<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish()
    }
}

/// Wrap a closure as a shareable step function.
pub fn step_fn<F>(name: impl Into<String>, func: F) -> Arc<dyn StepFunction>
where
    F: Fn(&StepInputs<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(FnStep {
        name: name.into(),
        func,
    })
}

/// Placeholder for a function known only by name.
///
/// Used when steps are declared in a manifest or restored from a snapshot
/// without an implementation. Grouping and validation work as usual; running
/// the step fails.
#[derive(Debug, Clone)]
pub struct DeclaredFunction {
    name: String,
}

impl DeclaredFunction {
    /// Create a placeholder for the named function.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl StepFunction for DeclaredFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, _inputs: &StepInputs<'_>) -> anyhow::Result<Value> {
        anyhow::bail!("no implementation registered for function '{}'", self.name)
    }
}
