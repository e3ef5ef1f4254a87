//! Per-pipeline progress records.
//!
//! Every pipeline owns `<root>/<identifier>/progress.json`, mapping each
//! step position to whether it has run, how long it took and which sibling
//! pipeline computed it when the result was shared. Files are rewritten
//! whole and atomically on every update, and each update touches exactly
//! one position.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::alternative::Alternative;
use crate::error::{AltSimError, Result};

use super::layout::{
    create_directory, directory_exists, file_exists, validate_identifier, write_atomic,
};

/// Name of the progress file inside a pipeline directory.
pub const PROGRESS_FILE: &str = "progress.json";

/// Progress of one step position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    /// Name of the step at this position.
    pub step_id: String,

    /// Identifier of the InputData at this position.
    pub input_data_id: String,

    /// Whether the step has run for this pipeline.
    pub has_run: bool,

    /// Run time in seconds; `null` until run and for reused results.
    pub duration: Option<f64>,

    /// Pipeline that computed a reused result, `null` if computed directly.
    pub parent_alternative: Option<String>,

    /// When the record was marked as run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepProgress {
    fn pending(step_id: &str, input_data_id: &str) -> Self {
        Self {
            step_id: step_id.to_string(),
            input_data_id: input_data_id.to_string(),
            has_run: false,
            duration: None,
            parent_alternative: None,
            completed_at: None,
        }
    }
}

/// Progress of a whole pipeline, keyed by step position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlternativeProgress {
    pub steps: BTreeMap<usize, StepProgress>,
}

impl AlternativeProgress {
    /// Fresh records for every position of a pipeline.
    pub fn for_alternative(alternative: &Alternative) -> Self {
        Self {
            steps: alternative
                .pairs()
                .enumerate()
                .map(|(index, (step, input_data))| {
                    (index, StepProgress::pending(step.name(), input_data.identifier()))
                })
                .collect(),
        }
    }

    /// Check whether the records describe this pipeline's positions.
    pub fn matches(&self, alternative: &Alternative) -> bool {
        self.steps.len() == alternative.num_step()
            && alternative
                .pairs()
                .enumerate()
                .all(|(index, (step, input_data))| {
                    self.steps.get(&index).is_some_and(|record| {
                        record.step_id == step.name()
                            && record.input_data_id == input_data.identifier()
                    })
                })
    }

    /// Number of positions marked as run.
    pub fn completed_count(&self) -> usize {
        self.steps.values().filter(|s| s.has_run).count()
    }

    /// Check if every position has run.
    pub fn is_complete(&self) -> bool {
        self.steps.values().all(|s| s.has_run)
    }

    /// Get the record for a position.
    pub fn get(&self, index: usize) -> Option<&StepProgress> {
        self.steps.get(&index)
    }
}

/// What [`ProgressStore::initialize`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A fresh progress file was written.
    Created,
    /// A matching progress file already existed and was kept.
    Resumed {
        /// Positions already marked as run.
        completed: usize,
    },
}

/// Reads and writes progress files below a simulation root.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    root: PathBuf,
}

impl ProgressStore {
    /// Create a store rooted at the simulation directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The simulation root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owned by a pipeline.
    ///
    /// Fails with [`AltSimError::InvalidIdentifier`] unless the identifier
    /// names a single directory directly below the root.
    pub fn alternative_dir(&self, alternative_id: &str) -> Result<PathBuf> {
        validate_identifier(alternative_id)?;
        Ok(self.root.join(alternative_id))
    }

    /// Progress file of a pipeline.
    pub fn progress_path(&self, alternative_id: &str) -> Result<PathBuf> {
        Ok(self.alternative_dir(alternative_id)?.join(PROGRESS_FILE))
    }

    /// Check if a pipeline's progress has been initialized.
    pub fn is_initialized(&self, alternative_id: &str) -> bool {
        self.progress_path(alternative_id)
            .is_ok_and(|path| file_exists(&path))
    }

    /// Create the pipeline directory and its progress file.
    ///
    /// Without `overwrite`, an existing file describing the same positions is
    /// kept untouched so an interrupted run can resume; one describing other
    /// positions fails with [`AltSimError::StaleProgress`]. With `overwrite`
    /// the directory is emptied and the records start over.
    pub fn initialize(&self, alternative: &Alternative, overwrite: bool) -> Result<InitOutcome> {
        let id = alternative.identifier();
        create_directory(&self.alternative_dir(id)?, overwrite)?;

        if self.is_initialized(id) {
            let existing = self.load(id)?;
            if !existing.matches(alternative) {
                return Err(AltSimError::StaleProgress {
                    alternative: id.to_string(),
                });
            }
            let completed = existing.completed_count();
            debug!("Resuming '{}' with {} completed steps", id, completed);
            return Ok(InitOutcome::Resumed { completed });
        }

        self.save(id, &AlternativeProgress::for_alternative(alternative))?;
        debug!("Initialized progress for '{}'", id);
        Ok(InitOutcome::Created)
    }

    /// Read a pipeline's progress.
    pub fn load(&self, alternative_id: &str) -> Result<AlternativeProgress> {
        let path = self.progress_path(alternative_id)?;
        if !file_exists(&path) {
            return Err(AltSimError::ProgressNotInitialized {
                alternative: alternative_id.to_string(),
            });
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| AltSimError::ProgressParse {
            path,
            message: e.to_string(),
        })
    }

    /// Read the record of one position.
    pub fn record(&self, alternative_id: &str, index: usize) -> Result<StepProgress> {
        let progress = self.load(alternative_id)?;
        let len = progress.steps.len();
        progress
            .steps
            .get(&index)
            .cloned()
            .ok_or_else(|| AltSimError::StepIndexOutOfRange {
                alternative: alternative_id.to_string(),
                index,
                len,
            })
    }

    /// Mark one position as run.
    ///
    /// `parent` names the pipeline whose result was reused, if any. Only the
    /// record at `index` changes.
    pub fn mark_step_run(
        &self,
        alternative_id: &str,
        index: usize,
        duration: Option<Duration>,
        parent: Option<&str>,
    ) -> Result<()> {
        let mut progress = self.load(alternative_id)?;
        let len = progress.steps.len();
        let record =
            progress
                .steps
                .get_mut(&index)
                .ok_or_else(|| AltSimError::StepIndexOutOfRange {
                    alternative: alternative_id.to_string(),
                    index,
                    len,
                })?;

        record.has_run = true;
        record.duration = duration.map(|d| d.as_secs_f64());
        record.parent_alternative = parent.map(String::from);
        record.completed_at = Some(Utc::now());

        self.save(alternative_id, &progress)?;
        debug!("Marked '{}' step {} as run", alternative_id, index);
        Ok(())
    }

    /// Check whether a position has run with exactly this step and input.
    pub fn is_step_complete(
        &self,
        alternative_id: &str,
        index: usize,
        step_id: &str,
        input_data_id: &str,
    ) -> Result<bool> {
        let record = self.record(alternative_id, index)?;
        Ok(record.has_run && record.step_id == step_id && record.input_data_id == input_data_id)
    }

    /// Progress of every initialized pipeline under the root, by identifier.
    pub fn list(&self) -> Result<BTreeMap<String, AlternativeProgress>> {
        let mut all = BTreeMap::new();
        if !directory_exists(&self.root) {
            return Ok(all);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            if self.is_initialized(&id) {
                let progress = self.load(&id)?;
                all.insert(id, progress);
            }
        }

        Ok(all)
    }

    fn save(&self, alternative_id: &str, progress: &AlternativeProgress) -> Result<()> {
        let content = serde_json::to_string_pretty(progress).map_err(anyhow::Error::from)?;
        write_atomic(&self.progress_path(alternative_id)?, &content)
    }
}
