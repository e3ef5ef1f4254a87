//! Declarative snapshots of a registry.
//!
//! A [`ManagerSnapshot`] records every step declaration and every pipeline's
//! (step, input data) sequence. Step functions are stored by name only and
//! are resolved through a [`StepCatalog`] when the registry is rebuilt, so
//! the same format doubles as a hand-written pipeline manifest.
//!
//! A single step declaration can be checkpointed on its own with
//! [`Step::save`] and read back with [`Step::load`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use tracing::{error, info};

use crate::alternative::Alternative;
use crate::error::{AltSimError, Result};
use crate::state::write_atomic;
use crate::steps::{ParamSpec, Params, Step, StepCatalog};

use super::registry::AlternativeSimulationManager;

/// Declarative content of an [`AlternativeSimulationManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    /// Schema version for migration.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Step declarations, unique by name.
    #[serde(default)]
    pub steps: Vec<StepRecord>,

    /// Pipelines in registration order.
    #[serde(default)]
    pub alternatives: Vec<AlternativeRecord>,
}

/// A serialized step declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,

    /// Function name; defaults to the step name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    #[serde(default)]
    pub params: Vec<ParamSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub parallelizable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// A serialized pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeRecord {
    /// Pipeline identifier. Derived from step prefixes and input
    /// identifiers when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    pub steps: Vec<PositionRecord>,
}

/// One (step, input data) position of a serialized pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Name of a declared step.
    pub step: String,

    /// InputData identifier.
    pub input: String,

    #[serde(default)]
    pub params: Params,
}

impl ManagerSnapshot {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Capture a registry.
    ///
    /// Fails if two different declarations share a step name.
    pub fn capture(manager: &AlternativeSimulationManager) -> Result<Self> {
        let mut steps: Vec<StepRecord> = Vec::new();
        let mut declared: HashMap<String, &Step> = HashMap::new();
        let mut alternatives = Vec::new();

        for alternative in manager.alternatives() {
            let mut positions = Vec::with_capacity(alternative.num_step());
            for (step, input_data) in alternative.pairs() {
                match declared.get(step.name()) {
                    Some(existing) if *existing != step => {
                        return Err(AltSimError::InvalidStep {
                            step: step.name().to_string(),
                            message: "conflicting declarations share this name".to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        declared.insert(step.name().to_string(), step);
                        steps.push(StepRecord::from(step));
                    }
                }

                positions.push(PositionRecord {
                    step: step.name().to_string(),
                    input: input_data.identifier().to_string(),
                    params: input_data.params().clone(),
                });
            }

            alternatives.push(AlternativeRecord {
                identifier: Some(alternative.identifier().to_string()),
                steps: positions,
            });
        }

        Ok(Self {
            version: Self::CURRENT_VERSION,
            steps,
            alternatives,
        })
    }

    /// Rebuild a registry, resolving functions through `catalog`.
    ///
    /// Every position is validated against its step's contract.
    pub fn restore(&self, catalog: &StepCatalog) -> Result<AlternativeSimulationManager> {
        let mut steps: BTreeMap<&str, Step> = BTreeMap::new();
        for record in &self.steps {
            let step = record.build(catalog)?;
            if steps.insert(record.name.as_str(), step).is_some() {
                return Err(AltSimError::InvalidStep {
                    step: record.name.clone(),
                    message: "declared more than once".to_string(),
                });
            }
        }

        let mut manager = AlternativeSimulationManager::new();
        for (index, record) in self.alternatives.iter().enumerate() {
            let mut alternative = Alternative::new(
                record
                    .identifier
                    .clone()
                    .unwrap_or_else(|| format!("alternative_{}", index)),
            );

            for position in &record.steps {
                let step = steps
                    .get(position.step.as_str())
                    .ok_or_else(|| AltSimError::InvalidStep {
                        step: position.step.clone(),
                        message: "referenced by a pipeline but never declared".to_string(),
                    })?;
                let input_data =
                    step.generate_input_data(position.input.clone(), position.params.clone())?;
                alternative.add_simulation_step(step.clone(), input_data)?;
            }

            if record.identifier.is_none() {
                alternative.adjust_identifier_from_inputdata_identifier();
            }
            manager.add_alternative(alternative)?;
        }

        Ok(manager)
    }
}

impl Default for ManagerSnapshot {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            steps: Vec::new(),
            alternatives: Vec::new(),
        }
    }
}

impl StepRecord {
    fn build(&self, catalog: &StepCatalog) -> Result<Step> {
        let function = catalog.resolve(self.function.as_deref().unwrap_or(&self.name));
        let mut builder = Step::builder(self.name.clone(), function)
            .params(self.params.iter().cloned())
            .parallelizable(self.parallelizable);
        for dependency in &self.dependencies {
            builder = builder.depends_on(dependency.clone());
        }
        if let Some(prefix) = &self.prefix {
            builder = builder.prefix(prefix.clone());
        }
        builder.build()
    }
}

impl From<&Step> for StepRecord {
    fn from(step: &Step) -> Self {
        Self {
            name: step.name().to_string(),
            function: (step.function_name() != step.name()).then(|| step.function_name().to_string()),
            params: step.required_params().to_vec(),
            dependencies: step.dependencies().to_vec(),
            parallelizable: step.parallelizable(),
            prefix: (step.prefix() != step.name()).then(|| step.prefix().to_string()),
        }
    }
}

impl AlternativeSimulationManager {
    /// Save the registry as a JSON snapshot.
    ///
    /// Writes to a temporary file first and renames it into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let result = ManagerSnapshot::capture(self).and_then(|snapshot| {
            let content = serde_json::to_string_pretty(&snapshot).map_err(|e| {
                AltSimError::Persistence {
                    path: path.to_path_buf(),
                    message: format!("Failed to serialize snapshot: {}", e),
                }
            })?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            write_atomic(path, &content)
        });

        match result {
            Ok(()) => {
                info!("Saved {} alternatives to {}", self.num_alternatives(), path.display());
                Ok(())
            }
            Err(e) => {
                error!("Error saving alternatives to {}: {}", path.display(), e);
                Err(into_persistence(path, e))
            }
        }
    }

    /// Load a registry from a JSON snapshot.
    pub fn load(path: &Path, catalog: &StepCatalog) -> Result<Self> {
        let result = fs::read_to_string(path)
            .map_err(AltSimError::from)
            .and_then(|content| {
                serde_json::from_str::<ManagerSnapshot>(&content).map_err(|e| {
                    AltSimError::Persistence {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }
                })
            })
            .and_then(|snapshot| snapshot.restore(catalog));

        match result {
            Ok(manager) => {
                info!(
                    "Loaded {} alternatives from {}",
                    manager.num_alternatives(),
                    path.display()
                );
                Ok(manager)
            }
            Err(e) => {
                error!("Error loading alternatives from {}: {}", path.display(), e);
                Err(into_persistence(path, e))
            }
        }
    }
}

impl Step {
    /// Save this step's declaration as JSON.
    ///
    /// The function is recorded by name and resolved again on [`Step::load`].
    pub fn save(&self, path: &Path) -> Result<()> {
        let result = serde_json::to_string_pretty(&StepRecord::from(self))
            .map_err(|e| AltSimError::Persistence {
                path: path.to_path_buf(),
                message: format!("Failed to serialize step: {}", e),
            })
            .and_then(|content| {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                write_atomic(path, &content)
            });

        match result {
            Ok(()) => {
                info!("Saved step '{}' to {}", self.name(), path.display());
                Ok(())
            }
            Err(e) => {
                error!("Error saving step '{}' to {}: {}", self.name(), path.display(), e);
                Err(into_persistence(path, e))
            }
        }
    }

    /// Load a step declaration, resolving its function through `catalog`.
    pub fn load(path: &Path, catalog: &StepCatalog) -> Result<Step> {
        let result = fs::read_to_string(path)
            .map_err(AltSimError::from)
            .and_then(|content| {
                serde_json::from_str::<StepRecord>(&content).map_err(|e| {
                    AltSimError::Persistence {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }
                })
            })
            .and_then(|record| record.build(catalog));

        match result {
            Ok(step) => {
                info!("Loaded step '{}' from {}", step.name(), path.display());
                Ok(step)
            }
            Err(e) => {
                error!("Error loading step from {}: {}", path.display(), e);
                Err(into_persistence(path, e))
            }
        }
    }
}

fn into_persistence(path: &Path, err: AltSimError) -> AltSimError {
    match err {
        AltSimError::Persistence { .. } => err,
        AltSimError::Io(e) => AltSimError::Persistence {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
        other => other,
    }
}

fn default_version() -> u32 {
    ManagerSnapshot::CURRENT_VERSION
}

fn is_false(v: &bool) -> bool {
    !v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{step_fn, ParamType};
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_manager() -> AlternativeSimulationManager {
        let s1 = Step::builder("S1", step_fn("load", |_| Ok(json!(1))))
            .param("x", ParamType::Int)
            .prefix("s1")
            .build()
            .unwrap();
        let s2 = Step::builder("S2", step_fn("S2", |_| Ok(json!(2))))
            .param("y", ParamType::Int)
            .optional_param("z", ParamType::Float)
            .depends_on("S1")
            .parallelizable(true)
            .build()
            .unwrap();

        let mut manager = AlternativeSimulationManager::new();
        for (id, y) in [("P1", 2), ("P2", 3)] {
            let mut x = Params::new();
            x.insert("x".into(), json!(1));
            let mut yv = Params::new();
            yv.insert("y".into(), json!(y));
            let alt = Alternative::with_steps(
                id,
                [
                    (s1.clone(), s1.generate_input_data("a", x).unwrap()),
                    (s2.clone(), s2.generate_input_data(format!("y{}", y), yv).unwrap()),
                ],
            )
            .unwrap();
            manager.add_alternative(alt).unwrap();
        }
        manager
    }

    #[test]
    fn capture_declares_each_step_once() {
        let snapshot = ManagerSnapshot::capture(&sample_manager()).unwrap();
        assert_eq!(snapshot.steps.len(), 2);
        assert_eq!(snapshot.steps[0].function.as_deref(), Some("load"));
        assert_eq!(snapshot.steps[1].function, None);
        assert_eq!(snapshot.alternatives.len(), 2);
    }

    #[test]
    fn save_and_load_preserves_grouping() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manager.json");
        let manager = sample_manager();
        manager.save(&path).unwrap();

        let loaded = AlternativeSimulationManager::load(&path, &StepCatalog::new()).unwrap();
        assert_eq!(loaded.num_alternatives(), 2);

        let original = manager.group_all().unwrap();
        let restored = loaded.group_all().unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn load_missing_file_is_persistence_error() {
        let temp = TempDir::new().unwrap();
        let err = AlternativeSimulationManager::load(&temp.path().join("nope.json"), &StepCatalog::new())
            .unwrap_err();
        assert!(matches!(err, AltSimError::Persistence { .. }));
    }

    #[test]
    fn step_save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("steps").join("solve.json");
        let solve = Step::builder("solve", step_fn("solver", |inputs| {
            Ok(json!(inputs.param("n").and_then(|v| v.as_i64()).unwrap_or(0) + 1))
        }))
        .param("n", ParamType::Int)
        .optional_param("tol", ParamType::Float)
        .depends_on("mesh")
        .parallelizable(true)
        .prefix("sv")
        .build()
        .unwrap();

        solve.save(&path).unwrap();

        let mut catalog = StepCatalog::new();
        catalog.register(solve.function().clone());
        let loaded = Step::load(&path, &catalog).unwrap();

        assert_eq!(loaded, solve);
        assert_eq!(loaded.dependencies(), ["mesh".to_string()]);
        assert!(loaded.parallelizable());
        assert_eq!(loaded.prefix(), "sv");

        let mut params = Params::new();
        params.insert("n".into(), json!(4));
        let inputs = crate::steps::StepInputs::new(&params, &[]);
        assert_eq!(loaded.run(&inputs).unwrap(), json!(5));
    }

    #[test]
    fn step_load_failures_are_persistence_errors() {
        let temp = TempDir::new().unwrap();
        let missing = Step::load(&temp.path().join("nope.json"), &StepCatalog::new()).unwrap_err();
        assert!(matches!(missing, AltSimError::Persistence { .. }));

        let garbled = temp.path().join("garbled.json");
        fs::write(&garbled, "{ \"name\": 3 }").unwrap();
        let err = Step::load(&garbled, &StepCatalog::new()).unwrap_err();
        assert!(matches!(err, AltSimError::Persistence { .. }));
    }

    #[test]
    fn restore_validates_params() {
        let snapshot: ManagerSnapshot = serde_yaml::from_str(
            r#"
steps:
  - name: S1
    params:
      - { name: x, type: int }
alternatives:
  - identifier: bad
    steps:
      - { step: S1, input: a, params: { x: "one" } }
"#,
        )
        .unwrap();

        let err = snapshot.restore(&StepCatalog::new()).unwrap_err();
        assert!(matches!(err, AltSimError::Validation { .. }));
    }

    #[test]
    fn restore_derives_missing_identifier() {
        let snapshot: ManagerSnapshot = serde_yaml::from_str(
            r#"
steps:
  - name: S1
    prefix: s1
    params:
      - { name: x, type: int }
alternatives:
  - steps:
      - { step: S1, input: a, params: { x: 1 } }
"#,
        )
        .unwrap();

        let manager = snapshot.restore(&StepCatalog::new()).unwrap();
        assert_eq!(manager.alternative_ids(), vec!["s1_a"]);
    }

    #[test]
    fn restore_rejects_undeclared_step() {
        let snapshot: ManagerSnapshot = serde_yaml::from_str(
            r#"
alternatives:
  - identifier: p
    steps:
      - { step: ghost, input: a }
"#,
        )
        .unwrap();

        let err = snapshot.restore(&StepCatalog::new()).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
