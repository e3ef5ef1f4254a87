//! altsim - Run families of simulation pipelines that share prefixes.
//!
//! A simulation study often explores many *alternatives*: pipelines built
//! from the same steps with different parameter bindings. When several
//! alternatives start with identical (step, input data) pairs, that prefix
//! only needs to be computed once. altsim validates the bindings, groups
//! alternatives into a prefix-sharing tree and executes the tree while
//! recording resumable per-alternative progress on disk.
//!
//! # Modules
//!
//! - [`alternative`] - Pipelines of (step, input data) pairs
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Project settings and pipeline manifests
//! - [`error`] - Error types and result aliases
//! - [`manager`] - Pipeline registry, grouping and snapshots
//! - [`runner`] - Progress-aware execution of the grouping tree
//! - [`state`] - Progress files and simulation directory layout
//! - [`steps`] - Step declarations and validated input data
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use altsim::alternative::Alternative;
//! use altsim::config::Settings;
//! use altsim::manager::AlternativeSimulationManager;
//! use altsim::steps::{step_fn, ParamType, Params, Step};
//! use serde_json::json;
//! use tempfile::TempDir;
//!
//! let mesh = Step::builder("mesh", step_fn("mesh", |inputs| {
//!     Ok(json!(inputs.param("cells").and_then(|v| v.as_i64()).unwrap_or(0) * 2))
//! }))
//! .param("cells", ParamType::Int)
//! .build()
//! .unwrap();
//!
//! let mut manager = AlternativeSimulationManager::new();
//! for id in ["a", "b"] {
//!     let mut params = Params::new();
//!     params.insert("cells".to_string(), json!(8));
//!     let input = mesh.generate_input_data("coarse", params).unwrap();
//!     manager.add_alternative(Alternative::with_steps(id, [(mesh.clone(), input)]).unwrap()).unwrap();
//! }
//!
//! let project = TempDir::new().unwrap();
//! let mut executor = manager.set_up(project.path(), &Settings::default(), &["a", "b"]).unwrap();
//! let report = executor.run().unwrap();
//!
//! assert_eq!(report.executed, 1);
//! assert_eq!(report.reused, 1);
//! assert_eq!(report.outputs["b"], json!(16));
//! ```

pub mod alternative;
pub mod cli;
pub mod config;
pub mod error;
pub mod manager;
pub mod runner;
pub mod state;
pub mod steps;
pub mod ui;

pub use error::{AltSimError, Result};
