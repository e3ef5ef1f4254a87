//! Directory and file helpers for the simulation layout.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{AltSimError, Result};
use crate::runner::RESULTS_DIR;

/// Check if a directory exists.
pub fn directory_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Check if a regular file exists.
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Create a directory and its parents.
///
/// With `overwrite`, an existing directory is removed first so the result
/// is empty. Returns `true` if the directory was (re)created.
pub fn create_directory(path: &Path, overwrite: bool) -> Result<bool> {
    if directory_exists(path) {
        if !overwrite {
            return Ok(false);
        }
        debug!("Removing stale directory {}", path.display());
        fs::remove_dir_all(path)?;
    }

    fs::create_dir_all(path)?;
    Ok(true)
}

/// Check that a pipeline identifier names exactly one directory below the
/// simulation root.
///
/// Rejects empty identifiers, `.` and `..`, the results directory and
/// anything containing a path separator.
pub fn validate_identifier(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        Some("identifier is empty")
    } else if id == "." || id == ".." || id == RESULTS_DIR {
        Some("identifier is a reserved name")
    } else if id.contains(['/', '\\', '\0']) {
        Some("identifier contains a path separator or NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(AltSimError::InvalidIdentifier {
            id: id.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Write `content` to `path` via a temporary sibling and a rename.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_new_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");

        assert!(!directory_exists(&dir));
        assert!(create_directory(&dir, false).unwrap());
        assert!(directory_exists(&dir));
    }

    #[test]
    fn existing_directory_kept_without_overwrite() {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join("marker");
        fs::write(&marker, "x").unwrap();

        assert!(!create_directory(temp.path(), false).unwrap());
        assert!(file_exists(&marker));
    }

    #[test]
    fn overwrite_empties_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("alt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("progress.json"), "{}").unwrap();

        assert!(create_directory(&dir, true).unwrap());
        assert!(directory_exists(&dir));
        assert!(!file_exists(&dir.join("progress.json")));
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");

        write_atomic(&path, "{\"a\":1}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}");
        assert!(!file_exists(&temp.path().join("progress.json.tmp")));
    }

    #[test]
    fn plain_identifiers_are_accepted() {
        for id in ["P1", "s1_a_s2_b", "mesh.fine", "..x"] {
            assert!(validate_identifier(id).is_ok(), "{id}");
        }
    }

    #[test]
    fn identifiers_escaping_the_root_are_rejected() {
        for id in ["", ".", "..", ".results", "a/b", "../up", "a\\b", "nul\0"] {
            let err = validate_identifier(id).unwrap_err();
            assert!(
                matches!(err, AltSimError::InvalidIdentifier { .. }),
                "{id:?}"
            );
        }
    }

    #[test]
    fn file_exists_is_false_for_directories() {
        let temp = TempDir::new().unwrap();
        assert!(!file_exists(temp.path()));
    }
}
