//! User-facing output.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for styled terminal output
//! - [`MockUI`] for capturing output in tests

pub mod mock;
pub mod output;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::{format_duration, OutputMode};
pub use terminal::TerminalUI;
pub use theme::{should_use_colors, AltSimTheme};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a line of output. Shown in every mode.
    fn message(&mut self, msg: &str);

    /// Display a labelled value. Hidden in quiet mode.
    fn detail(&mut self, key: &str, value: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Show a header. Hidden in quiet mode.
    fn show_header(&mut self, title: &str);
}
