//! Simulation execution.
//!
//! - [`executor`] - Walks a grouping tree and records progress
//! - [`result_store`] - Shared step results keyed by prefix chain

pub mod executor;
pub mod result_store;

pub use executor::{ExecutionOptions, ExecutionReport, SimulationExecutor};
pub use result_store::{result_key, ResultStore, StoredResult, RESULTS_DIR};
