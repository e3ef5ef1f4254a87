//! Execution-scoped step results.
//!
//! Results are keyed by the whole prefix chain leading to a node, so equal
//! (step, input data) pairs reached through different upstream prefixes
//! never share an entry. With a backing directory every insert is also
//! written to `<dir>/<key>.json`, which lets a resumed run pick up outputs
//! of steps that completed before the interruption.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::Result;
use crate::manager::GroupNode;
use crate::state::{directory_exists, file_exists, write_atomic};

/// Directory below the simulation root holding persisted results.
pub const RESULTS_DIR: &str = ".results";

/// Output of one shared computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    /// Pipeline that ran the computation.
    pub origin: String,

    /// Step name.
    pub step: String,

    /// Value returned by the step function.
    pub value: Value,

    /// Run time in seconds.
    pub duration: Option<f64>,
}

/// Thread-safe map from prefix-chain keys to results.
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: Mutex<HashMap<String, StoredResult>>,
    dir: Option<PathBuf>,
}

impl ResultStore {
    /// Store that keeps results for the current process only.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store that also writes every result below `dir`.
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            dir: Some(dir.into()),
        }
    }

    /// Backing directory, if results are persisted.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Look up a result, falling back to the backing directory.
    pub fn get(&self, key: &str) -> Result<Option<StoredResult>> {
        if let Some(found) = self.lock().get(key) {
            return Ok(Some(found.clone()));
        }

        let Some(path) = self.entry_path(key) else {
            return Ok(None);
        };
        if !file_exists(&path) {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        match serde_json::from_str::<StoredResult>(&content) {
            Ok(result) => {
                debug!("Rehydrated result {} from {}", key, path.display());
                self.lock().insert(key.to_string(), result.clone());
                Ok(Some(result))
            }
            Err(e) => {
                warn!("Ignoring unreadable result {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Record a result, writing it through when persistent.
    pub fn insert(&self, key: &str, result: StoredResult) -> Result<()> {
        if let Some(path) = self.entry_path(key) {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(&result).map_err(anyhow::Error::from)?;
            write_atomic(&path, &content)?;
        }

        self.lock().insert(key.to_string(), result);
        Ok(())
    }

    /// Number of results held in memory.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no result is held in memory.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every result, including persisted ones.
    pub fn clear(&self) -> Result<()> {
        self.lock().clear();
        if let Some(dir) = &self.dir {
            if directory_exists(dir) {
                fs::remove_dir_all(dir)?;
            }
        }
        Ok(())
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{}.json", key)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredResult>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Key for the computation at the end of `chain`.
///
/// SHA-256 over the canonical JSON of every (step name, function name,
/// declared params, input identifier, params) from the root down to the
/// node. Each link covers everything [`Step`](crate::steps::Step) equality
/// compares, so two nodes never share a key.
pub fn result_key(chain: &[&GroupNode]) -> String {
    let links: Vec<Value> = chain
        .iter()
        .map(|node| {
            json!([
                node.step.name(),
                node.step.function_name(),
                node.step.required_params(),
                node.input_data.identifier(),
                node.input_data.params(),
            ])
        })
        .collect();

    let canonical = Value::Array(links).to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}
