//! Pipeline registry and prefix grouping.
//!
//! - [`registry`] - The [`AlternativeSimulationManager`] owning all pipelines
//! - [`tree`] - The grouping algorithm and the [`GroupingTree`] it produces
//! - [`snapshot`] - Declarative save/load of a registry
//!
//! # Example
//!
//! ```
//! use altsim::alternative::Alternative;
//! use altsim::manager::AlternativeSimulationManager;
//! use altsim::steps::{step_fn, ParamType, Params, Step};
//! use serde_json::json;
//!
//! let s1 = Step::builder("S1", step_fn("s1", |_| Ok(json!(0))))
//!     .param("x", ParamType::Int)
//!     .build()
//!     .unwrap();
//!
//! let mut manager = AlternativeSimulationManager::new();
//! for id in ["a", "b"] {
//!     let mut params = Params::new();
//!     params.insert("x".to_string(), json!(1));
//!     let input = s1.generate_input_data("x1", params).unwrap();
//!     manager.add_alternative(Alternative::with_steps(id, [(s1.clone(), input)]).unwrap()).unwrap();
//! }
//!
//! let tree = manager.group_alternatives_to_tree(&["a", "b"]).unwrap();
//! assert_eq!(tree.roots.len(), 1);
//! assert_eq!(tree.roots[0].members, vec!["a", "b"]);
//! ```

pub mod registry;
pub mod snapshot;
pub mod tree;

pub use registry::AlternativeSimulationManager;
pub use snapshot::{AlternativeRecord, ManagerSnapshot, PositionRecord, StepRecord};
pub use tree::{group_alternatives, GroupNode, GroupingTree};
