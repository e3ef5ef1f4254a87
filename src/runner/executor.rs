//! Progress-aware execution of a grouping tree.
//!
//! The executor walks the tree depth-first. Each node's step runs at most
//! once; its output is handed in memory to the node's children and recorded
//! in every member pipeline's progress file. Re-running an interrupted
//! simulation skips whatever the progress files already mark as run.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::alternative::Alternative;
use crate::config::Settings;
use crate::error::{AltSimError, Result};
use crate::manager::{GroupNode, GroupingTree};
use crate::state::{create_directory, validate_identifier, InitOutcome, ProgressStore};
use crate::steps::StepInputs;

use super::result_store::{result_key, ResultStore, StoredResult, RESULTS_DIR};

/// Options controlling a simulation run.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Wipe existing pipeline directories and persisted results.
    pub overwrite: bool,

    /// Run parallelizable sibling subtrees on worker threads.
    pub parallel: bool,

    /// Upper bound on concurrently running subtrees.
    pub max_parallel: usize,

    /// Persist step results below the simulation root.
    pub write_results: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            parallel: false,
            max_parallel: 4,
            write_results: true,
        }
    }
}

impl From<&Settings> for ExecutionOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            overwrite: settings.overwrite,
            parallel: settings.parallel,
            max_parallel: settings.max_parallel.max(1),
            write_results: settings.write_results,
        }
    }
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Step functions actually invoked.
    pub executed: usize,

    /// Member records filled from another pipeline's computation.
    pub reused: usize,

    /// Nodes satisfied by an earlier run.
    pub resumed: usize,

    /// Final output of each pipeline whose last step is known.
    pub outputs: BTreeMap<String, Value>,
}

impl ExecutionReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: ExecutionReport) {
        self.executed += other.executed;
        self.reused += other.reused;
        self.resumed += other.resumed;
        self.outputs.extend(other.outputs);
    }
}

/// Runs the pipelines of a [`GroupingTree`] below a simulation root.
#[derive(Debug)]
pub struct SimulationExecutor {
    alternatives: Vec<Alternative>,
    tree: GroupingTree,
    progress: ProgressStore,
    results: ResultStore,
    options: ExecutionOptions,
    initialized: bool,
}

impl SimulationExecutor {
    /// Create an executor. Nothing touches the disk until
    /// [`init_simulation`](Self::init_simulation) or [`run`](Self::run).
    pub fn new(
        alternatives: Vec<Alternative>,
        tree: GroupingTree,
        root: impl Into<PathBuf>,
        options: ExecutionOptions,
    ) -> Self {
        let root = root.into();
        let results = if options.write_results {
            ResultStore::persistent(root.join(RESULTS_DIR))
        } else {
            ResultStore::in_memory()
        };

        Self {
            alternatives,
            tree,
            progress: ProgressStore::new(root),
            results,
            options,
            initialized: false,
        }
    }

    /// The tree this executor walks.
    pub fn tree(&self) -> &GroupingTree {
        &self.tree
    }

    /// The simulation root.
    pub fn root(&self) -> &Path {
        self.progress.root()
    }

    /// Pipelines covered by this executor.
    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    /// Progress files of the covered pipelines.
    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress
    }

    /// Results computed or rehydrated so far.
    pub fn result_store(&self) -> &ResultStore {
        &self.results
    }

    /// The options in effect.
    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Create the simulation root and initialize every pipeline's progress.
    ///
    /// Safe to call repeatedly: without `overwrite`, matching progress files
    /// are left as they are. Every identifier is checked before anything on
    /// disk is created or removed.
    pub fn init_simulation(&mut self) -> Result<()> {
        for alternative in &self.alternatives {
            validate_identifier(alternative.identifier())?;
        }

        create_directory(self.progress.root(), false)?;
        if self.options.overwrite {
            self.results.clear()?;
        }

        for alternative in &self.alternatives {
            match self.progress.initialize(alternative, self.options.overwrite)? {
                InitOutcome::Created => {
                    debug!("Created progress for '{}'", alternative.identifier())
                }
                InitOutcome::Resumed { completed } => info!(
                    "Resuming '{}' ({}/{} steps done)",
                    alternative.identifier(),
                    completed,
                    alternative.num_step()
                ),
            }
        }

        self.initialized = true;
        Ok(())
    }

    /// Run every pending step of the tree.
    pub fn run(&mut self) -> Result<ExecutionReport> {
        if !self.initialized {
            self.init_simulation()?;
        }

        let started = Instant::now();
        info!(
            "Running {} alternatives ({} shared computations)",
            self.alternatives.len(),
            self.tree.node_count()
        );

        let report = self.run_nodes(&self.tree.roots, &[], &[])?;

        info!(
            "Simulation finished in {:.2?}: {} executed, {} reused, {} resumed",
            started.elapsed(),
            report.executed,
            report.reused,
            report.resumed
        );
        Ok(report)
    }

    fn run_nodes(
        &self,
        nodes: &[GroupNode],
        ancestors: &[&GroupNode],
        values: &[Value],
    ) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();

        let concurrent = self.options.parallel
            && nodes.len() > 1
            && nodes.iter().all(|n| n.step.parallelizable());

        if !concurrent {
            for node in nodes {
                report.merge(self.run_node(node, ancestors, values)?);
            }
            return Ok(report);
        }

        for batch in nodes.chunks(self.options.max_parallel.max(1)) {
            debug!("Running {} sibling groups concurrently", batch.len());
            let outcomes: Vec<Result<ExecutionReport>> = thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|node| scope.spawn(move || self.run_node(node, ancestors, values)))
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(anyhow::anyhow!("worker thread panicked").into())
                        })
                    })
                    .collect()
            });

            for outcome in outcomes {
                report.merge(outcome?);
            }
        }

        Ok(report)
    }

    fn run_node(
        &self,
        node: &GroupNode,
        ancestors: &[&GroupNode],
        values: &[Value],
    ) -> Result<ExecutionReport> {
        let mut chain = ancestors.to_vec();
        chain.push(node);
        let key = result_key(&chain);

        if self.subtree_complete(node)? {
            debug!(
                "Skipping completed group {} [{}] for {:?}",
                node.step.name(),
                node.input_data.identifier(),
                node.members
            );
            let mut report = ExecutionReport {
                resumed: node.subtree_size(),
                ..Default::default()
            };
            self.collect_stored_outputs(node, &mut chain, &mut report)?;
            return Ok(report);
        }

        let mut report = ExecutionReport::default();
        let pending = self.pending_members(node)?;

        let stored = match self.results.get(&key)? {
            Some(stored) => {
                report.resumed += 1;
                stored
            }
            None => {
                let origin = pending
                    .first()
                    .copied()
                    .unwrap_or(node.members[0].as_str());
                let upstream = resolve_upstream(node, ancestors, values)?;
                let (value, duration) = self.compute(node, origin, &upstream)?;
                report.executed += 1;

                let stored = StoredResult {
                    origin: origin.to_string(),
                    step: node.step.name().to_string(),
                    value,
                    duration: Some(duration.as_secs_f64()),
                };
                self.results.insert(&key, stored.clone())?;
                stored
            }
        };

        for member in &pending {
            if *member == stored.origin {
                // A persisted duration may have been edited by hand.
                let duration = stored
                    .duration
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
                self.progress
                    .mark_step_run(member, node.depth, duration, None)?;
            } else {
                self.progress
                    .mark_step_run(member, node.depth, None, Some(&stored.origin))?;
                report.reused += 1;
            }
        }

        for member in node.terminal_members() {
            report
                .outputs
                .insert(member.to_string(), stored.value.clone());
        }

        let mut branch_values = values.to_vec();
        branch_values.push(stored.value);
        report.merge(self.run_nodes(&node.children, &chain, &branch_values)?);

        Ok(report)
    }

    fn compute(
        &self,
        node: &GroupNode,
        alternative_id: &str,
        upstream: &[Value],
    ) -> Result<(Value, Duration)> {
        info!(
            "Running {} [{}] for {}",
            node.step.name(),
            node.input_data.identifier(),
            alternative_id
        );

        let inputs = StepInputs::new(node.input_data.params(), upstream);
        let start = Instant::now();
        let value = node
            .step
            .run(&inputs)
            .map_err(|e| AltSimError::StepExecution {
                step: node.step.name().to_string(),
                alternative: alternative_id.to_string(),
                message: format!("{:#}", e),
            })?;

        let elapsed = start.elapsed();
        debug!("{} finished in {:.2?}", node.step.name(), elapsed);
        Ok((value, elapsed))
    }

    /// Members that have not yet run this node's position.
    fn pending_members<'n>(&self, node: &'n GroupNode) -> Result<Vec<&'n str>> {
        let mut pending = Vec::new();
        for member in &node.members {
            let done = self.progress.is_step_complete(
                member,
                node.depth,
                node.step.name(),
                node.input_data.identifier(),
            )?;
            if !done {
                pending.push(member.as_str());
            }
        }
        Ok(pending)
    }

    fn subtree_complete(&self, node: &GroupNode) -> Result<bool> {
        if !self.pending_members(node)?.is_empty() {
            return Ok(false);
        }
        for child in &node.children {
            if !self.subtree_complete(child)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn collect_stored_outputs<'a>(
        &self,
        node: &'a GroupNode,
        chain: &mut Vec<&'a GroupNode>,
        report: &mut ExecutionReport,
    ) -> Result<()> {
        let terminal = node.terminal_members();
        if !terminal.is_empty() {
            if let Some(stored) = self.results.get(&result_key(chain))? {
                for member in terminal {
                    report.outputs.insert(member.to_string(), stored.value.clone());
                }
            }
        }

        for child in &node.children {
            chain.push(child);
            self.collect_stored_outputs(child, chain, report)?;
            chain.pop();
        }
        Ok(())
    }
}

/// Values of the declared dependencies, taken from the nearest ancestor of
/// the same step name on this branch.
fn resolve_upstream(
    node: &GroupNode,
    ancestors: &[&GroupNode],
    values: &[Value],
) -> Result<Vec<Value>> {
    node.step
        .dependencies()
        .iter()
        .map(|dependency| {
            ancestors
                .iter()
                .zip(values)
                .rev()
                .find(|(ancestor, _)| ancestor.step.name() == dependency)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| AltSimError::UnresolvedDependency {
                    step: node.step.name().to_string(),
                    dependency: dependency.clone(),
                })
        })
        .collect()
}
