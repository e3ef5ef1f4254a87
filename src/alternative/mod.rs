//! Candidate pipelines.
//!
//! An [`Alternative`] is one complete candidate simulation run, assembled by
//! appending validated (step, input data) pairs.

pub mod pipeline;

pub use pipeline::Alternative;
