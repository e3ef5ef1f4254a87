//! Validate command implementation.
//!
//! `altsim validate <manifest>` checks every binding of a manifest against
//! its step's parameter contract.

use std::path::{Path, PathBuf};

use crate::cli::args::ValidateArgs;
use crate::config::load_manifest;
use crate::error::Result;
use crate::steps::StepCatalog;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::{report_manifest_error, resolve_path};

/// The validate command implementation.
pub struct ValidateCommand {
    project_root: PathBuf,
    args: ValidateArgs,
}

impl ValidateCommand {
    /// Create a new validate command.
    pub fn new(project_root: &Path, args: ValidateArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ValidateArgs {
        &self.args
    }
}

impl Command for ValidateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = resolve_path(&self.project_root, &self.args.manifest);
        ui.show_header(&format!("Validating {}", path.display()));

        let snapshot = match load_manifest(&path) {
            Ok(s) => s,
            Err(e) => return report_manifest_error(e, ui),
        };
        let manager = match snapshot.restore(&StepCatalog::new()) {
            Ok(m) => m,
            Err(e) => return report_manifest_error(e, ui),
        };

        ui.detail("Steps", &snapshot.steps.len().to_string());
        ui.detail("Alternatives", &manager.num_alternatives().to_string());

        let ignored = snapshot.alternatives.len() - manager.num_alternatives();
        if ignored > 0 {
            ui.warning(&format!(
                "{} duplicate alternative{} ignored",
                ignored,
                if ignored == 1 { "" } else { "s" }
            ));
        }
        for alternative in manager.alternatives().filter(|a| a.is_empty()) {
            ui.warning(&format!(
                "Alternative '{}' has no steps and will not run",
                alternative.identifier()
            ));
        }

        ui.success(&format!(
            "Manifest is valid: {} alternatives",
            manager.num_alternatives()
        ));
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn setup(manifest: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pipelines.yml"), manifest).unwrap();
        temp
    }

    fn run(temp: &TempDir) -> (CommandResult, MockUI) {
        let cmd = ValidateCommand::new(
            temp.path(),
            ValidateArgs {
                manifest: PathBuf::from("pipelines.yml"),
            },
        );
        let mut ui = MockUI::new();
        let result = cmd.execute(&mut ui).unwrap();
        (result, ui)
    }

    const VALID: &str = r#"
steps:
  - name: S1
    params:
      - { name: x, type: int }
alternatives:
  - identifier: A
    steps:
      - { step: S1, input: i1, params: { x: 1 } }
  - identifier: B
    steps:
      - { step: S1, input: i2, params: { x: 2 } }
"#;

    #[test]
    fn valid_manifest_succeeds() {
        let temp = setup(VALID);
        let (result, ui) = run(&temp);

        assert!(result.success);
        assert!(ui.has_success("2 alternatives"));
        assert_eq!(ui.detail_value("Steps"), Some("1"));
    }

    #[test]
    fn missing_parameter_fails() {
        let temp = setup(
            r#"
steps:
  - name: S1
    params:
      - { name: x, type: int }
      - { name: y, type: int }
alternatives:
  - identifier: A
    steps:
      - { step: S1, input: i1, params: {} }
"#,
        );
        let (result, ui) = run(&temp);

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("Missing required parameters in step 'S1': x, y"));
    }

    #[test]
    fn duplicate_alternative_warns() {
        let temp = setup(
            r#"
steps:
  - name: S1
alternatives:
  - identifier: A
    steps:
      - { step: S1, input: i1 }
  - identifier: A
    steps:
      - { step: S1, input: i2 }
"#,
        );
        let (result, ui) = run(&temp);

        assert!(result.success);
        assert!(ui.has_warning("1 duplicate alternative ignored"));
    }

    #[test]
    fn empty_alternative_warns() {
        let temp = setup(
            r#"
steps: []
alternatives:
  - identifier: Empty
    steps: []
"#,
        );
        let (result, ui) = run(&temp);

        assert!(result.success);
        assert!(ui.has_warning("'Empty' has no steps"));
    }

    #[test]
    fn identifier_outside_simulation_root_fails() {
        let temp = setup(
            r#"
steps:
  - name: S1
alternatives:
  - identifier: ".."
    steps:
      - { step: S1, input: i1 }
"#,
        );
        let (result, ui) = run(&temp);

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("Invalid alternative identifier '..'"));
    }

    #[test]
    fn missing_manifest_exits_with_2() {
        let temp = TempDir::new().unwrap();
        let (result, ui) = run(&temp);

        assert_eq!(result.exit_code, 2);
        assert!(ui.has_error("Manifest not found"));
    }
}
