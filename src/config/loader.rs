//! Settings discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::settings::Settings;
use crate::error::{AltSimError, Result};

/// Settings file name looked up in the project root.
pub const SETTINGS_FILE: &str = "altsim.yml";

/// Find the project root by walking up from `start`.
///
/// A directory containing `altsim.yml` wins; a `.git` directory is the
/// fallback marker.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(SETTINGS_FILE).is_file() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a settings file.
pub fn load_settings_file(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AltSimError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AltSimError::Io(e)
        }
    })?;

    parse_settings(&content, path)
}

/// Parse settings from YAML content. An empty file yields the defaults.
pub fn parse_settings(content: &str, source_path: &Path) -> Result<Settings> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str(content).map_err(|e| AltSimError::ConfigParse {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load `altsim.yml` from the project root, or the defaults if absent.
pub fn load_settings(project_root: &Path) -> Result<Settings> {
    let path = project_root.join(SETTINGS_FILE);
    if !path.is_file() {
        debug!("No {} in {}, using defaults", SETTINGS_FILE, project_root.display());
        return Ok(Settings::default());
    }

    debug!("Loading settings from {}", path.display());
    load_settings_file(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        assert_eq!(load_settings(temp.path()).unwrap(), Settings::default());
    }

    #[test]
    fn loads_project_settings() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "parallel: true\n").unwrap();

        let settings = load_settings(temp.path()).unwrap();
        assert!(settings.parallel);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "").unwrap();
        assert_eq!(load_settings(temp.path()).unwrap(), Settings::default());
    }

    #[test]
    fn explicit_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = load_settings_file(&temp.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, AltSimError::ConfigNotFound { .. }));
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "max_parallel: [not a number").unwrap();

        let err = load_settings_file(&path).unwrap_err();
        assert!(matches!(err, AltSimError::ConfigParse { .. }));
    }

    #[test]
    fn find_project_root_walks_up() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "").unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested), Some(temp.path().to_path_buf()));
    }
}
