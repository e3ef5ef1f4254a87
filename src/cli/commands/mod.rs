//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! routed by the [`CommandDispatcher`].

pub mod dispatcher;
pub mod status;
pub mod tree;
pub mod validate;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};

use std::path::{Path, PathBuf};

use crate::error::{AltSimError, Result};
use crate::ui::UserInterface;

/// Resolve a user-supplied path against the project root.
pub(crate) fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

/// Report a manifest loading failure and pick the exit code.
///
/// A missing manifest exits with 2, a manifest that fails to parse or
/// validate with 1. Anything else is propagated.
pub(crate) fn report_manifest_error(
    error: AltSimError,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    match error {
        AltSimError::ConfigNotFound { path } => {
            ui.error(&format!("Manifest not found: {}", path.display()));
            Ok(CommandResult::failure(2))
        }
        e @ (AltSimError::ConfigParse { .. }
        | AltSimError::Validation { .. }
        | AltSimError::InvalidStep { .. }
        | AltSimError::InvalidIdentifier { .. }
        | AltSimError::StructuralMismatch { .. }
        | AltSimError::InconsistentInputData { .. }) => {
            ui.error(&e.to_string());
            Ok(CommandResult::failure(1))
        }
        e => Err(e),
    }
}
