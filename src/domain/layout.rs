//! Dependency graph layout
//!
//! Turns a task snapshot into positioned nodes and directed edges for any
//! graph-drawing surface. The engine is total: dangling references, cycles
//! and duplicate IDs degrade the result but never fail the call.
//!
//! ## Algorithm
//!
//! 1. Index the snapshot ([`DependencyGraph`]).
//! 2. Assign each task a level: 0 without contributing dependencies,
//!    otherwise one more than its deepest dependency. Dangling IDs and
//!    back-edges to a task still on the traversal path do not contribute.
//! 3. Bucket tasks by level, ordered by category precedence then input order.
//! 4. One row per level; each row is centered on `x = 0`.
//! 5. One edge per resolved `(dependency, dependent)` pair.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::graph::DependencyGraph;
use super::id::TaskId;
use super::task::{Task, TaskCategory, TaskStatus};
use petgraph::graph::NodeIndex;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutConfigError {
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidSpacing { name: &'static str, value: f64 },

    #[error("Offset {offset} for category '{category}' must be smaller than {limit} (half the row spacing)")]
    OffsetTooLarge {
        category: String,
        offset: f64,
        limit: f64,
    },
}

/// Geometry settings for the layout engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance between consecutive levels
    pub row_spacing: f64,

    /// Distance between neighbouring nodes within a level
    pub column_spacing: f64,

    /// Cosmetic row offset per category label
    pub category_offsets: BTreeMap<String, f64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_spacing: 150.0,
            column_spacing: 250.0,
            category_offsets: BTreeMap::new(),
        }
    }
}

impl LayoutConfig {
    /// Checks that spacing is usable and that no offset can push a node into another row
    pub fn validate(&self) -> Result<(), LayoutConfigError> {
        for (name, value) in [
            ("row_spacing", self.row_spacing),
            ("column_spacing", self.column_spacing),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutConfigError::InvalidSpacing { name, value });
            }
        }

        let limit = self.row_spacing / 2.0;
        for (category, &offset) in &self.category_offsets {
            if !offset.is_finite() || offset.abs() >= limit {
                return Err(LayoutConfigError::OffsetTooLarge {
                    category: category.clone(),
                    offset,
                    limit,
                });
            }
        }

        Ok(())
    }

    /// Returns the row offset for a category (0 when unconfigured)
    pub fn offset_for(&self, category: &TaskCategory) -> f64 {
        self.category_offsets
            .get(category.as_str())
            .copied()
            .unwrap_or(0.0)
    }
}

/// A task placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode<'a> {
    pub id: &'a TaskId,
    pub x: f64,
    pub y: f64,
    /// Computed dependency depth (row index)
    pub level: usize,
    /// The source record
    pub task: &'a Task,
}

/// A directed edge from a dependency to the task that needs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge<'a> {
    pub from_id: &'a TaskId,
    pub to_id: &'a TaskId,
    /// The dependent task is blocked
    pub emphasized: bool,
    /// The dependent task is in progress
    pub animated: bool,
}

impl<'a> LayoutEdge<'a> {
    /// Builds the edge `dependency -> dependent`, styled from the dependent's status
    pub fn between(dependency: &'a Task, dependent: &'a Task) -> Self {
        Self {
            from_id: &dependency.id,
            to_id: &dependent.id,
            emphasized: dependent.status == TaskStatus::Blocked,
            animated: dependent.status == TaskStatus::InProgress,
        }
    }
}

/// A computed layout borrowing the snapshot it was built from
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout<'a> {
    pub nodes: Vec<PositionedNode<'a>>,
    pub edges: Vec<LayoutEdge<'a>>,
}

impl<'a> Layout<'a> {
    /// Finds the node for a task ID
    pub fn node(&self, task_id: &str) -> Option<&PositionedNode<'a>> {
        self.nodes.iter().find(|n| n.id.as_str() == task_id)
    }

    /// Returns the level assigned to a task
    pub fn level_of(&self, task_id: &str) -> Option<usize> {
        self.node(task_id).map(|n| n.level)
    }

    /// Returns the level of every task
    pub fn levels(&self) -> BTreeMap<&'a str, usize> {
        self.nodes
            .iter()
            .map(|n| (n.id.as_str(), n.level))
            .collect()
    }

    /// Number of rows (levels) in the layout
    pub fn rows(&self) -> usize {
        self.nodes.iter().map(|n| n.level + 1).max().unwrap_or(0)
    }

    /// Iterates over the nodes of one row, left to right
    pub fn row(&self, level: usize) -> impl Iterator<Item = &PositionedNode<'a>> {
        self.nodes.iter().filter(move |n| n.level == level)
    }

    /// Walks the rows in level order in one pass over the nodes
    ///
    /// Relies on nodes being grouped by level, which is how the engine emits them.
    pub fn row_slices(&self) -> impl Iterator<Item = &[PositionedNode<'a>]> {
        self.nodes.chunk_by(|a, b| a.level == b.level)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Content hash of everything a renderer draws
    ///
    /// Covers node geometry, the node fields used for styling, and edges.
    /// Identical snapshots always produce identical fingerprints.
    pub fn fingerprint(&self) -> String {
        fn field(hasher: &mut blake3::Hasher, bytes: &[u8]) {
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }

        let mut hasher = blake3::Hasher::new();
        for node in &self.nodes {
            field(&mut hasher, node.id.as_str().as_bytes());
            field(&mut hasher, &node.x.to_bits().to_le_bytes());
            field(&mut hasher, &node.y.to_bits().to_le_bytes());
            field(&mut hasher, &(node.level as u64).to_le_bytes());
            field(&mut hasher, node.task.status.label().as_bytes());
            field(&mut hasher, node.task.category.as_str().as_bytes());
            field(&mut hasher, node.task.title.as_bytes());
        }
        field(&mut hasher, b"--edges--");
        for edge in &self.edges {
            field(&mut hasher, edge.from_id.as_str().as_bytes());
            field(&mut hasher, edge.to_id.as_str().as_bytes());
            field(&mut hasher, &[edge.emphasized as u8, edge.animated as u8]);
        }

        hasher.finalize().to_hex().to_string()
    }
}

/// Computes layouts from task snapshots
#[derive(Debug, Clone, Default)]
pub struct GraphLayoutEngine {
    config: LayoutConfig,
}

impl GraphLayoutEngine {
    /// Creates an engine with the given geometry
    ///
    /// The config is used as-is; call [`LayoutConfig::validate`] first if it
    /// comes from user input.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out a snapshot
    pub fn layout<'a>(&self, tasks: &'a [Task]) -> Layout<'a> {
        let graph = DependencyGraph::from_tasks(tasks);
        let levels = assign_levels(&graph);
        let buckets = group_by_level(&graph, &levels);

        let mut nodes = Vec::with_capacity(graph.len());
        for (level, bucket) in buckets.iter().enumerate() {
            let center = (bucket.len() as f64 - 1.0) / 2.0;
            for (i, &idx) in bucket.iter().enumerate() {
                let task = graph.task(idx);
                nodes.push(PositionedNode {
                    id: &task.id,
                    x: (i as f64 - center) * self.config.column_spacing,
                    y: level as f64 * self.config.row_spacing
                        + self.config.offset_for(&task.category),
                    level,
                    task,
                });
            }
        }

        Layout {
            nodes,
            edges: synthesize_edges(&graph),
        }
    }
}

/// Lays out a snapshot with the default geometry
pub fn generate_layout(tasks: &[Task]) -> Layout<'_> {
    GraphLayoutEngine::default().layout(tasks)
}

/// One task being resolved on the traversal stack
struct Frame {
    node: NodeIndex,
    /// Next position in the task's dependency list
    next: usize,
    deepest: Option<usize>,
}

impl Frame {
    fn new(node: NodeIndex) -> Self {
        Self {
            node,
            next: 0,
            deepest: None,
        }
    }

    fn absorb(&mut self, level: usize) {
        self.deepest = Some(self.deepest.map_or(level, |d| d.max(level)));
    }

    fn level(&self) -> usize {
        self.deepest.map_or(0, |d| d + 1)
    }
}

/// Assigns a level to every node, indexed by node index
///
/// Iterative depth-first traversal with memoized results. Roots are taken
/// in input order, which fixes how cycles are broken.
fn assign_levels(graph: &DependencyGraph<'_>) -> Vec<usize> {
    let n = graph.len();
    let mut memo: Vec<Option<usize>> = vec![None; n];
    let mut on_path = vec![false; n];
    let mut stack: Vec<Frame> = Vec::new();

    for root in (0..n).map(NodeIndex::new) {
        if memo[root.index()].is_some() {
            continue;
        }
        on_path[root.index()] = true;
        stack.push(Frame::new(root));

        while let Some(frame) = stack.last_mut() {
            let task = graph.task(frame.node);

            if let Some(dep_id) = task.dependencies.get(frame.next) {
                frame.next += 1;
                let Some(dep) = graph.resolve(dep_id.as_str()) else {
                    continue;
                };
                if on_path[dep.index()] {
                    continue;
                }
                match memo[dep.index()] {
                    Some(level) => frame.absorb(level),
                    None => {
                        on_path[dep.index()] = true;
                        stack.push(Frame::new(dep));
                    }
                }
                continue;
            }

            let node = frame.node;
            let level = frame.level();
            stack.pop();
            on_path[node.index()] = false;
            memo[node.index()] = Some(level);
            if let Some(parent) = stack.last_mut() {
                parent.absorb(level);
            }
        }
    }

    memo.into_iter().map(|level| level.unwrap_or(0)).collect()
}

/// Buckets nodes by level, each bucket sorted by category precedence
///
/// The sort is stable, so ties keep input order.
fn group_by_level(graph: &DependencyGraph<'_>, levels: &[usize]) -> Vec<Vec<NodeIndex>> {
    let rows = levels.iter().map(|l| l + 1).max().unwrap_or(0);
    let mut buckets: Vec<Vec<NodeIndex>> = vec![Vec::new(); rows];

    for (i, &level) in levels.iter().enumerate() {
        buckets[level].push(NodeIndex::new(i));
    }
    for bucket in &mut buckets {
        bucket.sort_by_key(|&idx| graph.task(idx).category.precedence());
    }

    buckets
}

/// Emits one edge per resolved dependency, in dependent then declaration order
fn synthesize_edges<'a>(graph: &DependencyGraph<'a>) -> Vec<LayoutEdge<'a>> {
    let mut edges = Vec::with_capacity(graph.edge_count());
    for task in graph.tasks() {
        for dep_id in &task.dependencies {
            if let Some(dependency) = graph.get(dep_id.as_str()) {
                edges.push(LayoutEdge::between(dependency, task));
            }
        }
    }
    edges
}
