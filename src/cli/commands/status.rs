//! Status command implementation.
//!
//! `altsim status` reads every `progress.json` under the simulation root and
//! summarises how far each alternative has come.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::args::StatusArgs;
use crate::config::load_settings;
use crate::error::Result;
use crate::state::{AlternativeProgress, ProgressStore};
use crate::ui::{format_duration, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::resolve_path;

/// The status command implementation.
pub struct StatusCommand {
    project_root: PathBuf,
    args: StatusArgs,
}

impl StatusCommand {
    /// Create a new status command.
    pub fn new(project_root: &Path, args: StatusArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &StatusArgs {
        &self.args
    }

    fn simulation_root(&self) -> Result<PathBuf> {
        let root = match &self.args.root {
            Some(root) => root.clone(),
            None => load_settings(&self.project_root)?.simulation_root,
        };
        Ok(resolve_path(&self.project_root, &root))
    }

    fn show_steps(&self, ui: &mut dyn UserInterface, progress: &AlternativeProgress) {
        for (index, step) in &progress.steps {
            let state = match (&step.parent_alternative, step.duration) {
                _ if !step.has_run => "pending".to_string(),
                (Some(parent), _) => format!("reused from {}", parent),
                (None, Some(secs)) => match Duration::try_from_secs_f64(secs) {
                    Ok(duration) => format!("done in {}", format_duration(duration)),
                    Err(_) => "done".to_string(),
                },
                (None, None) => "done".to_string(),
            };
            ui.message(&format!(
                "  [{}] {} [{}] {}",
                index, step.step_id, step.input_data_id, state
            ));
        }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let root = self.simulation_root()?;
        let store = ProgressStore::new(&root);
        let all = store.list()?;

        ui.show_header("Simulation status");
        ui.detail("Root", &root.display().to_string());

        if let Some(id) = &self.args.alternative {
            let Some(progress) = all.get(id) else {
                ui.error(&format!("No progress recorded for alternative '{}'", id));
                return Ok(CommandResult::failure(1));
            };
            ui.message(&format!(
                "{}: {}/{} steps",
                id,
                progress.completed_count(),
                progress.steps.len()
            ));
            self.show_steps(ui, progress);
            return Ok(CommandResult::success());
        }

        if all.is_empty() {
            ui.warning(&format!("No simulations found under {}", root.display()));
            return Ok(CommandResult::success());
        }

        let mut complete = 0;
        for (id, progress) in &all {
            if progress.is_complete() {
                complete += 1;
            }
            ui.message(&format!(
                "{} {}: {}/{} steps",
                if progress.is_complete() { "✓" } else { "○" },
                id,
                progress.completed_count(),
                progress.steps.len()
            ));
        }

        if complete == all.len() {
            ui.success(&format!("All {} alternatives complete", all.len()));
        } else {
            ui.message(&format!("{} of {} alternatives complete", complete, all.len()));
        }
        Ok(CommandResult::success())
    }
}
