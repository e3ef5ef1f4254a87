//! Command-line interface for altsim.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, StatusArgs, TreeArgs, ValidateArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
