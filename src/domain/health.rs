//! Plan health: dependency blocks and the execution score

use serde::Serialize;

use super::graph::DependencyGraph;
use super::id::TaskId;
use super::task::TaskStatus;

const COMPLETION_WEIGHT: f64 = 0.6;
const PROGRESS_WEIGHT: f64 = 0.3;
const BLOCK_PENALTY: f64 = 0.1;

/// A waiting task held up by unfinished dependencies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyBlock {
    pub task_id: TaskId,
    pub title: String,
    /// Known dependencies that are not completed, in declaration order
    pub blocked_by: Vec<TaskId>,
}

/// Returns every pending or blocked task with at least one unfinished known dependency
pub fn dependency_blocks(graph: &DependencyGraph<'_>) -> Vec<DependencyBlock> {
    graph
        .tasks()
        .filter(|task| task.status.is_waiting())
        .filter_map(|task| {
            let mut blocked_by: Vec<TaskId> = Vec::new();
            for dep in graph.dependencies(task.id.as_str()) {
                if !dep.status.is_complete() && !blocked_by.contains(&dep.id) {
                    blocked_by.push(dep.id.clone());
                }
            }

            if blocked_by.is_empty() {
                None
            } else {
                Some(DependencyBlock {
                    task_id: task.id.clone(),
                    title: task.title.clone(),
                    blocked_by,
                })
            }
        })
        .collect()
}

/// Overall health band of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    AtRisk,
    Critical,
}

impl HealthStatus {
    fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            HealthStatus::Healthy
        } else if score >= 40.0 {
            HealthStatus::AtRisk
        } else {
            HealthStatus::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::AtRisk => "at_risk",
            HealthStatus::Critical => "critical",
        }
    }
}

/// Execution score from 0 to 100
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionScore {
    pub score: f64,
    pub status: HealthStatus,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub blocked_tasks: usize,
}

impl ExecutionScore {
    /// Scores a snapshot
    ///
    /// Completion counts 60%, progress (in-progress tasks at half weight)
    /// 30%, and each dependency-blocked task subtracts 10% of its share.
    pub fn compute(graph: &DependencyGraph<'_>) -> Self {
        let total = graph.len();
        let completed = graph
            .tasks()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let in_progress = graph.tasks().filter(|t| t.status.is_active()).count();
        let blocked = dependency_blocks(graph).len();

        let raw = if total == 0 {
            100.0
        } else {
            let total_f = total as f64;
            let completion = completed as f64 / total_f * 100.0;
            let progress = (completed as f64 + in_progress as f64 * 0.5) / total_f * 100.0;
            let penalty = blocked as f64 / total_f * 100.0;

            let weighted =
                completion * COMPLETION_WEIGHT + progress * PROGRESS_WEIGHT - penalty * BLOCK_PENALTY;
            weighted.clamp(0.0, 100.0)
        };

        // Bands use the unrounded score
        Self {
            score: (raw * 10.0).round() / 10.0,
            status: HealthStatus::from_score(raw),
            total_tasks: total,
            completed_tasks: completed,
            in_progress_tasks: in_progress,
            blocked_tasks: blocked,
        }
    }
}
