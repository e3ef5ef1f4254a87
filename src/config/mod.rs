//! Project settings and pipeline manifests.
//!
//! - [`settings`] - The [`Settings`] read from `altsim.yml`
//! - [`loader`] - Settings discovery and parsing
//! - [`manifest`] - Declarative pipeline manifests
//!
//! # Example
//!
//! ```
//! use altsim::config::load_settings;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("altsim.yml"), "max_parallel: 2").unwrap();
//!
//! let settings = load_settings(temp.path()).unwrap();
//! assert_eq!(settings.max_parallel, 2);
//! ```

pub mod loader;
pub mod manifest;
pub mod settings;

pub use loader::{
    find_project_root, load_settings, load_settings_file, parse_settings, SETTINGS_FILE,
};
pub use manifest::{load_manifest, load_registry, parse_manifest};
pub use settings::Settings;
