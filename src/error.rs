//! Error types for altsim operations.
//!
//! This module defines [`AltSimError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `AltSimError` for domain errors that callers need to tell apart
//! - Step functions return `anyhow::Result` and their failures are wrapped
//!   into [`AltSimError::StepExecution`] by the executor
//! - Every error names the offending identifiers or parameters so it can be
//!   diagnosed without inspecting internals

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Category of a parameter validation failure.
///
/// Categories are checked in declaration order: missing parameters are
/// reported before type mismatches, which are reported before unknown ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// Non-optional parameters that were not provided.
    MissingParameters,
    /// Provided parameters whose value does not match the declared type.
    InvalidTypes,
    /// Provided parameters the step does not declare.
    UnknownParameters,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationKind::MissingParameters => "Missing required parameters",
            ValidationKind::InvalidTypes => "Invalid types for parameters",
            ValidationKind::UnknownParameters => "Invalid parameters",
        };
        write!(f, "{}", s)
    }
}

/// Core error type for altsim operations.
#[derive(Debug, Error)]
pub enum AltSimError {
    /// Parameters do not satisfy a step's declared contract.
    #[error("{kind} in step '{step}': {}", .params.join(", "))]
    Validation {
        step: String,
        kind: ValidationKind,
        params: Vec<String>,
    },

    /// An InputData's parameters no longer satisfy the step it names.
    #[error("InputData '{input_data}' parameters are inconsistent with step '{step}'")]
    InconsistentInputData { step: String, input_data: String },

    /// A step declaration is malformed.
    #[error("Invalid step '{step}': {message}")]
    InvalidStep { step: String, message: String },

    /// An InputData was presented to a step it was not generated for.
    #[error("Mismatch between step '{step}' and InputData generated for '{input_step}'")]
    StructuralMismatch { step: String, input_step: String },

    /// One or more pipeline identifiers are not registered.
    #[error("Unknown alternatives: '{}'", .ids.join("', '"))]
    UnknownAlternatives { ids: Vec<String> },

    /// A step position beyond the pipeline's length was requested.
    #[error("Step index {index} is out of range for alternative '{alternative}' ({len} steps)")]
    StepIndexOutOfRange {
        alternative: String,
        index: usize,
        len: usize,
    },

    /// A pipeline identifier cannot name a directory below the simulation root.
    #[error("Invalid alternative identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// A pipeline identifier is already registered.
    #[error("Alternative '{id}' is already registered")]
    DuplicateAlternative { id: String },

    /// A progress update targeted a pipeline whose record was never initialized.
    #[error("Progress for alternative '{alternative}' has not been initialized")]
    ProgressNotInitialized { alternative: String },

    /// A progress file on disk describes a different pipeline.
    #[error("Progress for alternative '{alternative}' does not match its steps; rerun with overwrite")]
    StaleProgress { alternative: String },

    /// A progress file exists but cannot be read back.
    #[error("Corrupt progress file at {path}: {message}")]
    ProgressParse { path: PathBuf, message: String },

    /// A step function failed.
    #[error("Step '{step}' failed for alternative '{alternative}': {message}")]
    StepExecution {
        step: String,
        alternative: String,
        message: String,
    },

    /// A declared dependency has no upstream result on the current branch.
    #[error("Step '{step}' depends on '{dependency}' which has not run on this branch")]
    UnresolvedDependency { step: String, dependency: String },

    /// Saving or loading a snapshot failed.
    #[error("Persistence error at {path}: {message}")]
    Persistence { path: PathBuf, message: String },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a configuration or manifest file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for altsim operations.
pub type Result<T> = std::result::Result<T, AltSimError>;
