//! Step declarations and parameter validation.

use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{AltSimError, Result, ValidationKind};

use super::function::{StepFunction, StepInputs};
use super::input_data::InputData;
use super::param::{ParamSpec, ParamType, Params};

/// A reusable computation stage with a declared parameter contract.
///
/// Steps are immutable once built and cheap to clone. Two steps are equal
/// when their names, parameter declarations and function names match, so
/// independently built steps with the same declaration are interchangeable.
#[derive(Clone)]
pub struct Step {
    name: String,
    function: Arc<dyn StepFunction>,
    required_params: Vec<ParamSpec>,
    dependencies: Vec<String>,
    parallelizable: bool,
    prefix: Option<String>,
}

impl Step {
    /// Start building a step.
    pub fn builder(name: impl Into<String>, function: Arc<dyn StepFunction>) -> StepBuilder {
        StepBuilder::new(name, function)
    }

    /// Step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing function.
    pub fn function(&self) -> &Arc<dyn StepFunction> {
        &self.function
    }

    /// Declared name of the backing function.
    pub fn function_name(&self) -> &str {
        self.function.name()
    }

    /// Parameter declarations, in declaration order.
    pub fn required_params(&self) -> &[ParamSpec] {
        &self.required_params
    }

    /// Names of steps whose outputs feed this step.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Whether this step may run alongside its siblings.
    pub fn parallelizable(&self) -> bool {
        self.parallelizable
    }

    /// Label used when deriving pipeline identifiers. Defaults to the name.
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(&self.name)
    }

    /// Validate `params` and bind them to this step.
    ///
    /// Every missing non-optional parameter is reported at once, then every
    /// type mismatch, then every undeclared parameter.
    pub fn generate_input_data(
        &self,
        identifier: impl Into<String>,
        params: Params,
    ) -> Result<InputData> {
        self.check_params(&params)?;
        Ok(InputData::new(identifier.into(), self.name.clone(), params))
    }

    /// Validate `params` without producing an [`InputData`].
    pub fn check_params(&self, params: &Params) -> Result<()> {
        let mut missing = Vec::new();
        let mut invalid_types = Vec::new();

        for spec in &self.required_params {
            match params.get(&spec.name) {
                None if !spec.optional => missing.push(spec.name.clone()),
                None => {}
                Some(value) if !spec.ty.accepts(value) => invalid_types.push(spec.name.clone()),
                Some(_) => {}
            }
        }

        let unknown: Vec<String> = params
            .keys()
            .filter(|key| !self.required_params.iter().any(|spec| &spec.name == *key))
            .cloned()
            .collect();

        for (kind, names) in [
            (ValidationKind::MissingParameters, missing),
            (ValidationKind::InvalidTypes, invalid_types),
            (ValidationKind::UnknownParameters, unknown),
        ] {
            if !names.is_empty() {
                return Err(AltSimError::Validation {
                    step: self.name.clone(),
                    kind,
                    params: names,
                });
            }
        }

        Ok(())
    }

    /// Check that `input_data` was generated for this step and still
    /// satisfies its contract.
    pub fn is_inputdata_from_self(&self, input_data: &InputData) -> Result<bool> {
        if input_data.step_name() != self.name {
            return Err(AltSimError::StructuralMismatch {
                step: self.name.clone(),
                input_step: input_data.step_name().to_string(),
            });
        }

        if let Err(e) = self.check_params(input_data.params()) {
            debug!("InputData '{}' rejected: {}", input_data.identifier(), e);
            return Err(AltSimError::InconsistentInputData {
                step: self.name.clone(),
                input_data: input_data.identifier().to_string(),
            });
        }

        Ok(true)
    }

    /// Invoke the backing function.
    ///
    /// Steps hold no result cache; callers that share results across
    /// pipelines go through [`ResultStore`](crate::runner::ResultStore).
    pub fn run(&self, inputs: &StepInputs<'_>) -> anyhow::Result<Value> {
        self.function.compute(inputs)
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.required_params == other.required_params
            && self.function.name() == other.function.name()
    }
}

impl Eq for Step {}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("function", &self.function.name())
            .field("required_params", &self.required_params)
            .field("dependencies", &self.dependencies)
            .field("parallelizable", &self.parallelizable)
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Builder for constructing a [`Step`].
pub struct StepBuilder {
    name: String,
    function: Arc<dyn StepFunction>,
    required_params: Vec<ParamSpec>,
    dependencies: Vec<String>,
    parallelizable: bool,
    prefix: Option<String>,
}

impl StepBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>, function: Arc<dyn StepFunction>) -> Self {
        Self {
            name: name.into(),
            function,
            required_params: Vec::new(),
            dependencies: Vec::new(),
            parallelizable: false,
            prefix: None,
        }
    }

    /// Declare a required parameter.
    pub fn param(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.required_params.push(ParamSpec::required(name, ty));
        self
    }

    /// Declare an optional parameter.
    pub fn optional_param(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.required_params.push(ParamSpec::optional(name, ty));
        self
    }

    /// Append already-built parameter declarations.
    pub fn params(mut self, specs: impl IntoIterator<Item = ParamSpec>) -> Self {
        self.required_params.extend(specs);
        self
    }

    /// Declare a step whose output feeds this one.
    pub fn depends_on(mut self, step: impl Into<String>) -> Self {
        self.dependencies.push(step.into());
        self
    }

    /// Mark the step as safe to run alongside its siblings.
    pub fn parallelizable(mut self, parallelizable: bool) -> Self {
        self.parallelizable = parallelizable;
        self
    }

    /// Override the identifier prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Build the step.
    ///
    /// Returns an error if two parameters share a name.
    pub fn build(self) -> Result<Step> {
        let mut seen = HashSet::new();
        for spec in &self.required_params {
            if !seen.insert(spec.name.as_str()) {
                return Err(AltSimError::InvalidStep {
                    step: self.name,
                    message: format!("parameter '{}' is declared more than once", spec.name),
                });
            }
        }

        Ok(Step {
            name: self.name,
            function: self.function,
            required_params: self.required_params,
            dependencies: self.dependencies,
            parallelizable: self.parallelizable,
            prefix: self.prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::function::{step_fn, DeclaredFunction};
    use serde_json::json;

    fn max_fn() -> Arc<dyn StepFunction> {
        Arc::new(DeclaredFunction::new("max"))
    }

    fn step1() -> Step {
        Step::builder("Step 1", max_fn())
            .param("param1", ParamType::Int)
            .optional_param("param2", ParamType::Float)
            .build()
            .unwrap()
    }

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn prefix_defaults_to_name() {
        let step = step1();
        assert_eq!(step.prefix(), "Step 1");

        let prefixed = Step::builder("mesh", max_fn()).prefix("m").build().unwrap();
        assert_eq!(prefixed.prefix(), "m");
    }

    #[test]
    fn duplicate_param_names_rejected() {
        let result = Step::builder("bad", max_fn())
            .param("x", ParamType::Int)
            .optional_param("x", ParamType::Float)
            .build();
        assert!(matches!(result, Err(AltSimError::InvalidStep { .. })));
    }

    #[test]
    fn generate_with_all_params() {
        let data = step1()
            .generate_input_data("in_1", params(&[("param1", json!(1)), ("param2", json!(3.5))]))
            .unwrap();
        assert_eq!(data.identifier(), "in_1");
        assert_eq!(data.step_name(), "Step 1");
    }

    #[test]
    fn generate_without_optional_param() {
        assert!(step1()
            .generate_input_data("in", params(&[("param1", json!(1))]))
            .is_ok());
    }

    #[test]
    fn reports_every_missing_param() {
        let step = Step::builder("s", max_fn())
            .param("a", ParamType::Int)
            .param("b", ParamType::Int)
            .param("c", ParamType::Int)
            .build()
            .unwrap();

        let err = step
            .generate_input_data("in", params(&[("b", json!(1))]))
            .unwrap_err();
        match err {
            AltSimError::Validation { kind, params, .. } => {
                assert_eq!(kind, ValidationKind::MissingParameters);
                assert_eq!(params, vec!["a".to_string(), "c".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reports_every_type_mismatch() {
        let step = Step::builder("s", max_fn())
            .param("a", ParamType::Int)
            .param("b", ParamType::Str)
            .build()
            .unwrap();

        let err = step
            .generate_input_data("in", params(&[("a", json!(1.5)), ("b", json!(2))]))
            .unwrap_err();
        match err {
            AltSimError::Validation { kind, params, .. } => {
                assert_eq!(kind, ValidationKind::InvalidTypes);
                assert_eq!(params, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_reported_before_type_mismatch_and_unknown() {
        let step = Step::builder("s", max_fn())
            .param("a", ParamType::Int)
            .param("b", ParamType::Int)
            .build()
            .unwrap();

        let err = step
            .generate_input_data("in", params(&[("b", json!("x")), ("zzz", json!(1))]))
            .unwrap_err();
        assert!(matches!(
            err,
            AltSimError::Validation {
                kind: ValidationKind::MissingParameters,
                ..
            }
        ));
    }

    #[test]
    fn type_mismatch_reported_before_unknown() {
        let err = step1()
            .generate_input_data(
                "in",
                params(&[("param1", json!("one")), ("param3", json!(3.5))]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AltSimError::Validation {
                kind: ValidationKind::InvalidTypes,
                ..
            }
        ));
    }

    #[test]
    fn unknown_params_rejected() {
        let err = step1()
            .generate_input_data("in", params(&[("param1", json!(1)), ("param3", json!(3.5))]))
            .unwrap_err();
        match err {
            AltSimError::Validation { kind, params, .. } => {
                assert_eq!(kind, ValidationKind::UnknownParameters);
                assert_eq!(params, vec!["param3".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(step1(), step1());

        let renamed_param = Step::builder("Step 1", max_fn())
            .param("param3", ParamType::Int)
            .optional_param("param2", ParamType::Float)
            .build()
            .unwrap();
        assert_ne!(step1(), renamed_param);
    }

    #[test]
    fn equality_compares_function_names() {
        let other_fn = Step::builder("Step 1", Arc::new(DeclaredFunction::new("min")))
            .param("param1", ParamType::Int)
            .optional_param("param2", ParamType::Float)
            .build()
            .unwrap();
        assert_ne!(step1(), other_fn);
    }

    #[test]
    fn inputdata_from_self_accepts_own_data() {
        let step = step1();
        let data = step
            .generate_input_data("in", params(&[("param1", json!(1))]))
            .unwrap();
        assert!(step.is_inputdata_from_self(&data).unwrap());
    }

    #[test]
    fn inputdata_from_other_step_is_mismatch() {
        let step2 = Step::builder("Step 2", max_fn())
            .param("param3", ParamType::Int)
            .build()
            .unwrap();
        let data = step2
            .generate_input_data("in", params(&[("param3", json!(1))]))
            .unwrap();

        let err = step1().is_inputdata_from_self(&data).unwrap_err();
        assert!(matches!(err, AltSimError::StructuralMismatch { .. }));
    }

    #[test]
    fn inputdata_with_stale_contract_is_inconsistent() {
        let loose = Step::builder("Step 1", max_fn())
            .param("param1", ParamType::Int)
            .optional_param("extra", ParamType::Int)
            .build()
            .unwrap();
        let data = loose
            .generate_input_data("in", params(&[("param1", json!(1)), ("extra", json!(2))]))
            .unwrap();

        let err = step1().is_inputdata_from_self(&data).unwrap_err();
        assert!(matches!(err, AltSimError::InconsistentInputData { .. }));
    }

    #[test]
    fn run_invokes_function_every_time() {
        let step = Step::builder(
            "sum",
            step_fn("sum", |inputs| {
                let total: i64 = inputs.upstream.iter().filter_map(Value::as_i64).sum();
                Ok(json!(total))
            }),
        )
        .build()
        .unwrap();

        let empty = Params::new();
        let first = vec![json!(1), json!(2)];
        let second = vec![json!(10)];
        assert_eq!(step.run(&StepInputs::new(&empty, &first)).unwrap(), json!(3));
        assert_eq!(step.run(&StepInputs::new(&empty, &second)).unwrap(), json!(10));
    }
}
