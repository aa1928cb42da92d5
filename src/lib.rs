//! opsgraph - dependency graph layout for startup task plans
//!
//! Takes the task snapshot served by the dashboard API and computes a
//! drawable layout: tasks are placed in rows by dependency depth and
//! connected by directed "do this before that" edges. The engine is a pure
//! function that tolerates cycles, dangling references and duplicate IDs.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    generate_layout, DependencyGraph, GraphLayoutEngine, Layout, LayoutConfig, LayoutEdge,
    PositionedNode, Task, TaskCategory, TaskId, TaskStatus,
};
