//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// altsim - Run families of simulation pipelines that share prefixes.
#[derive(Debug, Parser)]
#[command(name = "altsim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true, env = "ALTSIM_PROJECT")]
    pub project: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a pipeline manifest
    Validate(ValidateArgs),

    /// Show how pipelines share computations
    Tree(TreeArgs),

    /// Show simulation progress
    Status(StatusArgs),
}

/// Arguments for the `validate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ValidateArgs {
    /// Manifest file (YAML or JSON)
    pub manifest: PathBuf,
}

/// Arguments for the `tree` command.
#[derive(Debug, Clone, clap::Args)]
pub struct TreeArgs {
    /// Manifest file (YAML or JSON)
    pub manifest: PathBuf,

    /// Only group these alternatives (repeatable)
    #[arg(short, long = "alternative")]
    pub alternatives: Vec<String>,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Simulation root (overrides `simulation_root` from altsim.yml)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Show per-step progress of one alternative
    #[arg(short, long)]
    pub alternative: Option<String>,
}
