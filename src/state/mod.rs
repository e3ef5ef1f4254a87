//! On-disk simulation state.
//!
//! - [`layout`] - Directory creation and atomic file writes
//! - [`progress`] - Per-pipeline `progress.json` records

pub mod layout;
pub mod progress;

pub use layout::{
    create_directory, directory_exists, file_exists, validate_identifier, write_atomic,
};
pub use progress::{AlternativeProgress, InitOutcome, ProgressStore, StepProgress, PROGRESS_FILE};
