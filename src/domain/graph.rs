//! Dependency graph for tasks
//!
//! Indexes a task snapshot for dependency queries. Unlike an editing graph,
//! this one never rejects input: dangling references are recorded and
//! cycles are reported on request instead of being refused.
//! Uses petgraph for graph operations.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

use super::id::TaskId;
use super::task::{Task, TaskStatus};

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Dependency cycle detected at task: {0}")]
    CycleDetected(TaskId),
}

/// A dependency reference that names no task in the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    /// Task holding the reference
    pub task: TaskId,
    /// The unknown dependency ID
    pub missing: TaskId,
}

/// A read-only dependency graph over a task snapshot
///
/// Node indices follow first-occurrence input order. When an ID appears more
/// than once, the node keeps its first position and the last record wins.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    /// Edges point from a dependency to its dependent
    graph: DiGraph<&'a Task, ()>,

    /// Map from task ID to node index
    node_map: HashMap<&'a str, NodeIndex>,

    dangling: Vec<DanglingRef>,

    duplicates: Vec<TaskId>,
}

impl<'a> DependencyGraph<'a> {
    /// Builds a graph from a task snapshot
    pub fn from_tasks(tasks: &'a [Task]) -> Self {
        let mut graph: DiGraph<&'a Task, ()> = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut node_map: HashMap<&'a str, NodeIndex> = HashMap::with_capacity(tasks.len());
        let mut duplicates = Vec::new();

        // First pass: nodes, last record wins
        for task in tasks {
            match node_map.get(task.id.as_str()).copied() {
                Some(idx) => {
                    graph[idx] = task;
                    duplicates.push(task.id.clone());
                }
                None => {
                    let idx = graph.add_node(task);
                    node_map.insert(task.id.as_str(), idx);
                }
            }
        }

        // Second pass: edges from the winning records
        let mut edges = Vec::new();
        let mut dangling = Vec::new();
        for idx in graph.node_indices() {
            let task: &'a Task = graph[idx];
            for dep_id in &task.dependencies {
                match node_map.get(dep_id.as_str()) {
                    Some(&dep_idx) => edges.push((dep_idx, idx)),
                    None => dangling.push(DanglingRef {
                        task: task.id.clone(),
                        missing: dep_id.clone(),
                    }),
                }
            }
        }
        for (from, to) in edges {
            graph.add_edge(from, to, ());
        }

        Self {
            graph,
            node_map,
            dangling,
            duplicates,
        }
    }

    /// Looks up the node index for a task ID
    pub fn resolve(&self, task_id: &str) -> Option<NodeIndex> {
        self.node_map.get(task_id).copied()
    }

    /// Returns the task stored at a node
    pub fn task(&self, idx: NodeIndex) -> &'a Task {
        self.graph[idx]
    }

    /// Looks up a task by ID
    pub fn get(&self, task_id: &str) -> Option<&'a Task> {
        self.resolve(task_id).map(|idx| self.graph[idx])
    }

    /// Iterates over distinct tasks in first-occurrence order
    pub fn tasks(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.graph.node_indices().map(move |idx| self.graph[idx])
    }

    /// Returns the known direct dependencies of a task, in declaration order
    pub fn dependencies(&self, task_id: &str) -> Vec<&'a Task> {
        match self.get(task_id) {
            Some(task) => task
                .dependencies
                .iter()
                .filter_map(|dep_id| self.get(dep_id.as_str()))
                .collect(),
            None => vec![],
        }
    }

    /// Returns the direct dependents of a task (tasks that depend on it), in input order
    pub fn dependents(&self, task_id: &str) -> Vec<&'a Task> {
        let task_idx = match self.resolve(task_id) {
            Some(idx) => idx,
            None => return vec![],
        };

        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(task_idx, Direction::Outgoing)
            .collect();
        children.sort();
        children.dedup();

        children.into_iter().map(|idx| self.graph[idx]).collect()
    }

    /// Returns every dependency reference that names no known task
    pub fn dangling(&self) -> &[DanglingRef] {
        &self.dangling
    }

    /// Returns IDs that appeared more than once in the snapshot (one entry per extra occurrence)
    pub fn duplicates(&self) -> &[TaskId] {
        &self.duplicates
    }

    /// Returns groups of tasks that form dependency cycles
    ///
    /// Each group is in input order; groups are ordered by their first task.
    pub fn cycles(&self) -> Vec<Vec<TaskId>> {
        let mut groups: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|mut scc| {
                scc.sort();
                scc
            })
            .collect();
        groups.sort();

        groups
            .into_iter()
            .map(|scc| scc.into_iter().map(|idx| self.graph[idx].id.clone()).collect())
            .collect()
    }

    /// Returns true if any dependency cycle exists
    pub fn has_cycles(&self) -> bool {
        !self.cycles().is_empty()
    }

    /// Returns all tasks in topological order (dependencies before dependents)
    pub fn topological_order(&self) -> Result<Vec<TaskId>, GraphError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .map(|idx| self.graph[idx].id.clone())
                .collect()),
            Err(cycle) => Err(GraphError::CycleDetected(
                self.graph[cycle.node_id()].id.clone(),
            )),
        }
    }

    /// Returns pending tasks whose known dependencies are all completed
    ///
    /// Dangling references never hold a task back.
    pub fn ready_tasks(&self) -> Vec<&'a Task> {
        self.tasks()
            .filter(|task| task.status == TaskStatus::Pending)
            .filter(|task| {
                self.dependencies(task.id.as_str())
                    .iter()
                    .all(|dep| dep.status.is_complete())
            })
            .collect()
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task_id: &str) -> bool {
        self.node_map.contains_key(task_id)
    }

    /// Returns the number of distinct tasks in the graph
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the number of resolved dependency edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::from_tasks(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn from_tasks() {
        let tasks = vec![Task::new("a"), Task::new("b").with_dependency("a")];
        let graph = DependencyGraph::from_tasks(&tasks);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(ids(&graph.dependencies("b")), vec!["a"]);
        assert_eq!(ids(&graph.dependents("a")), vec!["b"]);
    }

    #[test]
    fn dangling_references_are_recorded() {
        let tasks = vec![Task::new("a").with_dependency("ghost")];
        let graph = DependencyGraph::from_tasks(&tasks);

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(
            graph.dangling(),
            &[DanglingRef {
                task: TaskId::from("a"),
                missing: TaskId::from("ghost"),
            }]
        );
        assert!(graph.dependencies("a").is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first_position_and_last_record() {
        let tasks = vec![
            Task::new("a").with_title("first"),
            Task::new("b"),
            Task::new("a").with_title("second"),
        ];
        let graph = DependencyGraph::from_tasks(&tasks);

        assert_eq!(graph.len(), 2);
        let order: Vec<_> = graph.tasks().map(|t| t.title.as_str()).collect();
        assert_eq!(order, vec!["second", ""]);
        assert_eq!(graph.duplicates(), &[TaskId::from("a")]);
    }

    #[test]
    fn dependents_are_in_input_order() {
        let tasks = vec![
            Task::new("root"),
            Task::new("x").with_dependency("root"),
            Task::new("y").with_dependency("root").with_dependency("root"),
            Task::new("z").with_dependency("root"),
        ];
        let graph = DependencyGraph::from_tasks(&tasks);

        assert_eq!(ids(&graph.dependents("root")), vec!["x", "y", "z"]);
        // parallel edges are kept
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn cycle_detection() {
        let tasks = vec![
            Task::new("a").with_dependency("c"),
            Task::new("b").with_dependency("a"),
            Task::new("c").with_dependency("b"),
            Task::new("d").with_dependency("d"),
            Task::new("e"),
        ];
        let graph = DependencyGraph::from_tasks(&tasks);

        let cycles = graph.cycles();
        assert_eq!(
            cycles,
            vec![
                vec![TaskId::from("a"), TaskId::from("b"), TaskId::from("c")],
                vec![TaskId::from("d")],
            ]
        );
        assert!(graph.has_cycles());
        assert!(matches!(
            graph.topological_order(),
            Err(GraphError::CycleDetected(_))
        ));
    }

    #[test]
    fn topological_order() {
        let tasks = vec![
            Task::new("1").with_dependency("2"),
            Task::new("2").with_dependency("3"),
            Task::new("3"),
        ];
        let graph = DependencyGraph::from_tasks(&tasks);

        let order = graph.topological_order().unwrap();
        let pos = |id: &str| order.iter().position(|t| t.as_str() == id).unwrap();

        assert!(pos("3") < pos("2"));
        assert!(pos("2") < pos("1"));
    }

    #[test]
    fn ready_tasks() {
        let mut tasks = vec![
            Task::new("1"),
            Task::new("2").with_dependency("1"),
            Task::new("3").with_dependency("ghost"),
        ];

        let graph = DependencyGraph::from_tasks(&tasks);
        assert_eq!(ids(&graph.ready_tasks()), vec!["1", "3"]);

        tasks[0].status = TaskStatus::Completed;
        let graph = DependencyGraph::from_tasks(&tasks);
        // completed tasks are not ready, their dependents now are
        assert_eq!(ids(&graph.ready_tasks()), vec!["2", "3"]);
    }

    #[test]
    fn unknown_task_queries_are_empty() {
        let tasks = vec![Task::new("a")];
        let graph = DependencyGraph::from_tasks(&tasks);

        assert!(!graph.contains("zzz"));
        assert!(graph.dependencies("zzz").is_empty());
        assert!(graph.dependents("zzz").is_empty());
    }

    #[test]
    fn performance_500_tasks() {
        use std::time::Instant;

        let tasks: Vec<Task> = (0..500)
            .map(|i| {
                let task = Task::new(TaskId::from(i as u64));
                if i > 0 {
                    task.with_dependency(TaskId::from((i - 1) as u64))
                } else {
                    task
                }
            })
            .collect();

        let start = Instant::now();
        let graph = DependencyGraph::from_tasks(&tasks);
        let _ready = graph.ready_tasks();
        let duration = start.elapsed();

        assert_eq!(graph.edge_count(), 499);
        assert!(duration.as_millis() < 200, "Ready query took {:?}", duration);
    }
}
