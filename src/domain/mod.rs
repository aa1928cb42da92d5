//! Domain models for opsgraph
//!
//! Contains the task model, dependency queries and the layout engine,
//! without any I/O concerns.

mod id;
mod task;
mod graph;
mod layout;
mod health;

pub use id::TaskId;
pub use task::{Task, TaskCategory, TaskStatus};
pub use graph::{DanglingRef, DependencyGraph, GraphError};
pub use layout::{
    generate_layout, GraphLayoutEngine, Layout, LayoutConfig, LayoutConfigError, LayoutEdge,
    PositionedNode,
};
pub use health::{dependency_blocks, DependencyBlock, ExecutionScore, HealthStatus};
