//! Prefix-sharing tree construction.
//!
//! Pipelines that use identical (step, input data) pairs for their first
//! positions share a branch of the tree. Each node therefore stands for one
//! computation that only has to run once for all of its members.

use std::fmt;

use tracing::debug;

use crate::alternative::Alternative;
use crate::error::Result;
use crate::steps::{InputData, Step};

/// A shared (step, input data) pair at one depth of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    /// Step position this node covers.
    pub depth: usize,

    /// The step shared by every member at this depth.
    pub step: Step,

    /// The parameter binding shared by every member at this depth.
    pub input_data: InputData,

    /// Identifiers of the pipelines sharing this prefix, in encounter order.
    pub members: Vec<String>,

    /// Groups for the next position. Empty when no member continues.
    pub children: Vec<GroupNode>,
}

impl GroupNode {
    /// Check if no member has a step beyond this node.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if a pipeline shares this node.
    pub fn contains(&self, alternative_id: &str) -> bool {
        self.members.iter().any(|m| m == alternative_id)
    }

    /// Members whose pipeline ends at this node.
    pub fn terminal_members(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| !self.children.iter().any(|child| child.contains(m)))
            .map(String::as_str)
            .collect()
    }

    /// Number of nodes in this subtree, including this one.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(GroupNode::subtree_size).sum::<usize>()
    }
}

/// Ordered forest of [`GroupNode`]s produced by [`group_alternatives`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingTree {
    /// Top-level groups, one per distinct first (step, input data) pair.
    pub roots: Vec<GroupNode>,
}

impl GroupingTree {
    /// Check if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of distinct computations the tree requires.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(GroupNode::subtree_size).sum()
    }

    /// Number of computations running every pipeline separately would take.
    pub fn total_step_count(&self) -> usize {
        self.iter().map(|node| node.members.len()).sum()
    }

    /// Computations avoided by sharing prefixes.
    pub fn saved_step_count(&self) -> usize {
        self.total_step_count() - self.node_count()
    }

    /// Length of the longest branch.
    pub fn depth(&self) -> usize {
        self.iter().map(|node| node.depth + 1).max().unwrap_or(0)
    }

    /// Iterate over nodes depth-first, parents before children.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Nodes a pipeline passes through, from the root down.
    pub fn branch_of(&self, alternative_id: &str) -> Vec<&GroupNode> {
        let mut branch = Vec::new();
        let mut level = &self.roots;
        while let Some(node) = level.iter().find(|n| n.contains(alternative_id)) {
            branch.push(node);
            level = &node.children;
        }
        branch
    }
}

/// Depth-first iterator over a [`GroupingTree`].
pub struct Iter<'a> {
    stack: Vec<&'a GroupNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a GroupNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl fmt::Display for GroupingTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_level(f: &mut fmt::Formatter<'_>, nodes: &[GroupNode], indent: &str) -> fmt::Result {
            for (i, node) in nodes.iter().enumerate() {
                let last = i + 1 == nodes.len();
                let (branch, next_indent) = if last {
                    ("└── ", format!("{}    ", indent))
                } else {
                    ("├── ", format!("{}│   ", indent))
                };
                writeln!(
                    f,
                    "{}{}{} [{}] ({})",
                    indent,
                    branch,
                    node.step.name(),
                    node.input_data.identifier(),
                    node.members.join(", ")
                )?;
                write_level(f, &node.children, &next_indent)?;
            }
            Ok(())
        }

        write_level(f, &self.roots, "")
    }
}

/// Group pipelines into a prefix-sharing tree.
///
/// At every depth a pipeline joins the first group whose first member has
/// the same step and input data at that position, or starts a new group.
/// Pipelines shorter than the current depth drop out of the partition.
pub fn group_alternatives(alternatives: &[&Alternative]) -> Result<GroupingTree> {
    Ok(GroupingTree {
        roots: group_recursive(alternatives, 0)?,
    })
}

fn group_recursive(alternatives: &[&Alternative], step_index: usize) -> Result<Vec<GroupNode>> {
    let mut groups: Vec<Vec<&Alternative>> = Vec::new();

    for &alternative in alternatives {
        if step_index >= alternative.num_step() {
            continue;
        }

        let mut placed = false;
        for group in groups.iter_mut() {
            if Alternative::has_same_simulation_step(alternative, group[0], step_index, true)? {
                group.push(alternative);
                placed = true;
                break;
            }
        }

        if !placed {
            groups.push(vec![alternative]);
        }
    }

    let mut nodes = Vec::with_capacity(groups.len());
    for group in groups {
        let (step, input_data) = group[0].step_at(step_index)?;
        let members: Vec<String> = group.iter().map(|a| a.identifier().to_string()).collect();
        debug!(
            "Depth {}: '{}' [{}] shared by {}",
            step_index,
            step.name(),
            input_data.identifier(),
            members.join(", ")
        );

        nodes.push(GroupNode {
            depth: step_index,
            step: step.clone(),
            input_data: input_data.clone(),
            members,
            children: group_recursive(&group, step_index + 1)?,
        });
    }

    Ok(nodes)
}
