//! Pipeline manifests.
//!
//! A manifest is a [`ManagerSnapshot`] written by hand in YAML. Since YAML
//! accepts JSON, snapshots saved by
//! [`AlternativeSimulationManager::save`] load here unchanged.
//!
//! ```yaml
//! steps:
//!   - name: mesh
//!     params:
//!       - { name: resolution, type: int }
//! alternatives:
//!   - identifier: coarse
//!     steps:
//!       - { step: mesh, input: r32, params: { resolution: 32 } }
//! ```

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{AltSimError, Result};
use crate::manager::{AlternativeSimulationManager, ManagerSnapshot};
use crate::steps::StepCatalog;

/// Read a manifest without validating it.
pub fn load_manifest(path: &Path) -> Result<ManagerSnapshot> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AltSimError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AltSimError::Io(e)
        }
    })?;

    parse_manifest(&content, path)
}

/// Parse manifest content.
pub fn parse_manifest(content: &str, source_path: &Path) -> Result<ManagerSnapshot> {
    serde_yaml::from_str(content).map_err(|e| AltSimError::ConfigParse {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read a manifest and validate it into a registry.
///
/// Functions missing from `catalog` resolve to placeholders, which is
/// enough to validate and group but not to run.
pub fn load_registry(path: &Path, catalog: &StepCatalog) -> Result<AlternativeSimulationManager> {
    let snapshot = load_manifest(path)?;
    debug!(
        "Manifest {} declares {} steps and {} alternatives",
        path.display(),
        snapshot.steps.len(),
        snapshot.alternatives.len()
    );
    snapshot.restore(catalog)
}
