//! Tree command implementation.
//!
//! `altsim tree <manifest>` prints the prefix-sharing tree of the manifest's
//! alternatives and how many computations the sharing saves.

use std::path::{Path, PathBuf};

use crate::cli::args::TreeArgs;
use crate::config::load_registry;
use crate::error::{AltSimError, Result};
use crate::steps::StepCatalog;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::{report_manifest_error, resolve_path};

/// The tree command implementation.
pub struct TreeCommand {
    project_root: PathBuf,
    args: TreeArgs,
}

impl TreeCommand {
    /// Create a new tree command.
    pub fn new(project_root: &Path, args: TreeArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &TreeArgs {
        &self.args
    }
}

impl Command for TreeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = resolve_path(&self.project_root, &self.args.manifest);
        let manager = match load_registry(&path, &StepCatalog::new()) {
            Ok(m) => m,
            Err(e) => return report_manifest_error(e, ui),
        };

        let grouped = if self.args.alternatives.is_empty() {
            manager.group_all()
        } else {
            manager.group_alternatives_to_tree(&self.args.alternatives)
        };
        let tree = match grouped {
            Ok(t) => t,
            Err(e @ AltSimError::UnknownAlternatives { .. }) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        if tree.is_empty() {
            ui.warning("No alternatives with steps to group");
            return Ok(CommandResult::success());
        }

        ui.show_header("Execution tree");
        for line in tree.to_string().lines() {
            ui.message(line);
        }

        ui.detail("Computations", &tree.node_count().to_string());
        ui.detail("Without sharing", &tree.total_step_count().to_string());
        ui.detail("Saved", &tree.saved_step_count().to_string());
        Ok(CommandResult::success())
    }
}
