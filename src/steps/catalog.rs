//! Lookup of step functions by name.
//!
//! Snapshots and manifests only record a function's name. A [`StepCatalog`]
//! maps those names back to implementations when a registry is rebuilt.

use std::collections::HashMap;
use std::sync::Arc;

use super::function::{DeclaredFunction, StepFunction};

/// Registry of step function implementations.
#[derive(Default, Clone)]
pub struct StepCatalog {
    functions: HashMap<String, Arc<dyn StepFunction>>,
}

impl StepCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation under its own name.
    ///
    /// A later registration with the same name replaces the earlier one.
    pub fn register(&mut self, function: Arc<dyn StepFunction>) -> &mut Self {
        self.functions.insert(function.name().to_string(), function);
        self
    }

    /// Check if a function is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Resolve a function name.
    ///
    /// Unknown names resolve to a [`DeclaredFunction`] placeholder.
    pub fn resolve(&self, name: &str) -> Arc<dyn StepFunction> {
        self.functions
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(DeclaredFunction::new(name)))
    }
}

impl std::fmt::Debug for StepCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("StepCatalog").field("functions", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::function::{step_fn, StepInputs};
    use crate::steps::Params;
    use serde_json::json;

    #[test]
    fn resolves_registered_function() {
        let mut catalog = StepCatalog::new();
        catalog.register(step_fn("one", |_| Ok(json!(1))));

        assert!(catalog.contains("one"));
        let f = catalog.resolve("one");
        let params = Params::new();
        assert_eq!(f.compute(&StepInputs::new(&params, &[])).unwrap(), json!(1));
    }

    #[test]
    fn unknown_function_resolves_to_placeholder() {
        let catalog = StepCatalog::new();
        let f = catalog.resolve("ghost");
        assert_eq!(f.name(), "ghost");
        let params = Params::new();
        assert!(f.compute(&StepInputs::new(&params, &[])).is_err());
    }
}
