//! Step declarations and parameter bindings.
//!
//! This module provides the leaves of the pipeline model:
//!
//! - [`Step`] - A reusable computation stage with a parameter contract
//! - [`InputData`] - A validated parameter binding for one step
//! - [`ParamSpec`] / [`ParamType`] - The parameter contract vocabulary
//! - [`StepFunction`] - The capability a step delegates its work to
//! - [`StepCatalog`] - Function lookup by name for restored registries
//!
//! # Example
//!
//! ```
//! use altsim::steps::{step_fn, ParamType, Params, Step};
//! use serde_json::json;
//!
//! let step = Step::builder("mesh", step_fn("mesh", |_| Ok(json!(null))))
//!     .param("resolution", ParamType::Int)
//!     .optional_param("tolerance", ParamType::Float)
//!     .build()
//!     .unwrap();
//!
//! let mut params = Params::new();
//! params.insert("resolution".to_string(), json!(64));
//! let data = step.generate_input_data("coarse", params).unwrap();
//! assert_eq!(data.step_name(), "mesh");
//! ```

pub mod catalog;
pub mod definition;
pub mod function;
pub mod input_data;
pub mod param;

pub use catalog::StepCatalog;
pub use definition::{Step, StepBuilder};
pub use function::{step_fn, DeclaredFunction, FnStep, StepFunction, StepInputs};
pub use input_data::InputData;
pub use param::{ParamSpec, ParamType, Params};
