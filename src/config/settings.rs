//! Project settings read from `altsim.yml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for simulation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one subdirectory per pipeline, relative to the
    /// project root.
    #[serde(
        default = "default_simulation_root",
        skip_serializing_if = "is_default_simulation_root"
    )]
    pub simulation_root: PathBuf,

    /// Discard existing progress and results before running
    #[serde(default, skip_serializing_if = "is_false")]
    pub overwrite: bool,

    /// Enable parallel execution of sibling groups
    #[serde(default, skip_serializing_if = "is_false")]
    pub parallel: bool,

    /// Maximum concurrent groups
    #[serde(
        default = "default_max_parallel",
        skip_serializing_if = "is_default_max_parallel"
    )]
    pub max_parallel: usize,

    /// Persist step results so interrupted runs can resume
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub write_results: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            simulation_root: default_simulation_root(),
            overwrite: false,
            parallel: false,
            max_parallel: default_max_parallel(),
            write_results: true,
        }
    }
}

fn default_simulation_root() -> PathBuf {
    PathBuf::from("simulations")
}

fn is_default_simulation_root(v: &PathBuf) -> bool {
    *v == default_simulation_root()
}

fn default_max_parallel() -> usize {
    4
}

fn is_default_max_parallel(v: &usize) -> bool {
    *v == default_max_parallel()
}

fn default_true() -> bool {
    true
}

fn is_false(v: &bool) -> bool {
    !v
}

fn is_true(v: &bool) -> bool {
    *v
}
