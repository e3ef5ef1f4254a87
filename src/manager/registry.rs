//! The registry of candidate pipelines for one simulation run.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::alternative::Alternative;
use crate::config::Settings;
use crate::error::{AltSimError, Result};
use crate::runner::{ExecutionOptions, SimulationExecutor};
use crate::state::validate_identifier;

use super::tree::{group_alternatives, GroupingTree};

/// Owns every candidate pipeline of a simulation, keyed by identifier.
///
/// Identifiers are unique: registering a pipeline under an identifier that
/// is already taken is a logged no-op and never replaces the stored one.
#[derive(Debug, Clone, Default)]
pub struct AlternativeSimulationManager {
    alternatives: BTreeMap<String, Alternative>,
}

impl AlternativeSimulationManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered pipelines.
    pub fn num_alternatives(&self) -> usize {
        self.alternatives.len()
    }

    /// Registered identifiers, sorted.
    pub fn alternative_ids(&self) -> Vec<&str> {
        self.alternatives.keys().map(String::as_str).collect()
    }

    /// Look up a pipeline.
    pub fn get(&self, id: &str) -> Option<&Alternative> {
        self.alternatives.get(id)
    }

    /// Iterate over registered pipelines in identifier order.
    pub fn alternatives(&self) -> impl Iterator<Item = &Alternative> {
        self.alternatives.values()
    }

    /// Register a pipeline.
    ///
    /// Returns `Ok(false)` and logs a warning if the identifier is taken.
    /// Fails with [`AltSimError::InvalidIdentifier`] if the identifier cannot
    /// name a directory below the simulation root.
    pub fn add_alternative(&mut self, alternative: Alternative) -> Result<bool> {
        validate_identifier(alternative.identifier())?;

        if self.alternatives.contains_key(alternative.identifier()) {
            let err = AltSimError::DuplicateAlternative {
                id: alternative.identifier().to_string(),
            };
            warn!("{}, it will not be added a second time", err);
            return Ok(false);
        }

        debug!(
            "Registered alternative '{}' ({} steps)",
            alternative.identifier(),
            alternative.num_step()
        );
        self.alternatives
            .insert(alternative.identifier().to_string(), alternative);
        Ok(true)
    }

    /// Register several pipelines, returning how many were added.
    ///
    /// Stops at the first invalid identifier; pipelines before it stay
    /// registered.
    pub fn add_alternatives(
        &mut self,
        alternatives: impl IntoIterator<Item = Alternative>,
    ) -> Result<usize> {
        let mut added = 0;
        for alternative in alternatives {
            if self.add_alternative(alternative)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Resolve identifiers to pipelines.
    ///
    /// Duplicates are dropped, keeping the first occurrence. Fails listing
    /// every identifier that is not registered.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<&Alternative>> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        let mut unknown = Vec::new();

        for id in ids {
            let id = id.as_ref();
            if !seen.insert(id) {
                continue;
            }
            match self.alternatives.get(id) {
                Some(alternative) => resolved.push(alternative),
                None => unknown.push(id.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Err(AltSimError::UnknownAlternatives { ids: unknown });
        }

        Ok(resolved)
    }

    /// Group the given pipelines into a prefix-sharing tree.
    pub fn group_alternatives_to_tree<S: AsRef<str>>(&self, ids: &[S]) -> Result<GroupingTree> {
        let selected = self.resolve(ids)?;
        let non_empty: Vec<&Alternative> = selected
            .into_iter()
            .filter(|alternative| {
                if alternative.is_empty() {
                    debug!("Skipping empty alternative '{}'", alternative.identifier());
                }
                !alternative.is_empty()
            })
            .collect();

        group_alternatives(&non_empty)
    }

    /// Group every registered pipeline.
    pub fn group_all(&self) -> Result<GroupingTree> {
        let ids = self.alternative_ids();
        self.group_alternatives_to_tree(ids.as_slice())
    }

    /// Prepare an executor for the selected pipelines.
    ///
    /// An empty selection means every registered pipeline. The simulation
    /// root is taken from `settings` relative to `project_root`.
    pub fn set_up<S: AsRef<str>>(
        &self,
        project_root: &Path,
        settings: &Settings,
        ids: &[S],
    ) -> Result<SimulationExecutor> {
        let selected: Vec<Alternative> = if ids.is_empty() {
            self.alternatives.values().cloned().collect()
        } else {
            self.resolve(ids)?.into_iter().cloned().collect()
        };

        let refs: Vec<&Alternative> = selected.iter().filter(|a| !a.is_empty()).collect();
        let tree = group_alternatives(&refs)?;

        let root: PathBuf = project_root.join(&settings.simulation_root);
        info!(
            "Prepared {} alternatives under {} ({} shared computations, {} avoided)",
            selected.len(),
            root.display(),
            tree.node_count(),
            tree.saved_step_count()
        );

        Ok(SimulationExecutor::new(
            selected,
            tree,
            root,
            ExecutionOptions::from(settings),
        ))
    }
}
