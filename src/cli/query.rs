//! Query commands (ready, blocked, status, check)

use std::path::Path;

use anyhow::{bail, Result};

use super::layout_cmd::load_tasks;
use super::output::Output;
use crate::domain::{
    dependency_blocks, DependencyGraph, ExecutionScore, GraphLayoutEngine, TaskStatus,
};

/// Show pending tasks whose dependencies are done
pub fn ready(output: &Output, path: &Path) -> Result<()> {
    let tasks = load_tasks(output, "ready", path)?;
    let graph = DependencyGraph::from_tasks(&tasks);
    let ready_tasks = graph.ready_tasks();

    output.verbose_ctx("ready", &format!("Found {} ready tasks", ready_tasks.len()));

    if output.is_json() {
        let items: Vec<_> = ready_tasks
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "title": t.title,
                    "category": t.category,
                    "priority": t.priority,
                })
            })
            .collect();
        output.data(&items);
    } else if ready_tasks.is_empty() {
        println!("No tasks ready to work on.");
    } else {
        println!("Ready tasks ({}):", ready_tasks.len());
        println!("{:<20} {:<12} TITLE", "ID", "CATEGORY");
        println!("{}", "-".repeat(60));
        for task in ready_tasks {
            println!("{:<20} {:<12} {}", task.id, task.category, task.title);
        }
    }

    Ok(())
}

/// Show tasks held up by unfinished dependencies
pub fn blocked(output: &Output, path: &Path) -> Result<()> {
    let tasks = load_tasks(output, "blocked", path)?;
    let graph = DependencyGraph::from_tasks(&tasks);
    let blocks = dependency_blocks(&graph);

    output.verbose_ctx("blocked", &format!("Found {} blocked tasks", blocks.len()));

    if output.is_json() {
        output.data(&blocks);
    } else if blocks.is_empty() {
        println!("No blocked tasks.");
    } else {
        println!("Blocked tasks ({}):", blocks.len());
        println!("{:<20} {:<30} BLOCKED BY", "ID", "TITLE");
        println!("{}", "-".repeat(80));
        for block in blocks {
            let blockers: Vec<String> = block.blocked_by.iter().map(|id| id.to_string()).collect();
            println!(
                "{:<20} {:<30} {}",
                block.task_id,
                block.title,
                blockers.join(", ")
            );
        }
    }

    Ok(())
}

/// Show plan status overview
pub fn status(output: &Output, engine: &GraphLayoutEngine, path: &Path) -> Result<()> {
    let tasks = load_tasks(output, "status", path)?;
    let graph = DependencyGraph::from_tasks(&tasks);
    let score = ExecutionScore::compute(&graph);
    let levels = engine.layout(&tasks).rows();
    let cycles = graph.cycles().len();
    let dangling = graph.dangling().len();

    let count = |status: TaskStatus| graph.tasks().filter(|t| t.status == status).count();
    let pending = count(TaskStatus::Pending);
    let marked_blocked = count(TaskStatus::Blocked);

    if output.is_json() {
        output.data(&serde_json::json!({
            "score": score.score,
            "health": score.status,
            "total_tasks": score.total_tasks,
            "pending_tasks": pending,
            "in_progress_tasks": score.in_progress_tasks,
            "completed_tasks": score.completed_tasks,
            "marked_blocked_tasks": marked_blocked,
            "dependency_blocked_tasks": score.blocked_tasks,
            "levels": levels,
            "cycles": cycles,
            "dangling_references": dangling,
        }));
    } else {
        println!("Plan Status");
        println!("{}", "=".repeat(40));
        println!();
        println!("Execution score: {:.1} ({})", score.score, score.status.label());
        println!();
        println!("Tasks: {} total", score.total_tasks);
        println!("  Pending:      {}", pending);
        println!("  In Progress:  {}", score.in_progress_tasks);
        println!("  Completed:    {}", score.completed_tasks);
        println!("  Blocked:      {}", marked_blocked);
        println!();
        println!("Dependency levels: {}", levels);
        println!("Waiting on dependencies: {}", score.blocked_tasks);
        if cycles > 0 || dangling > 0 {
            println!();
            println!(
                "Warning: {} cycle(s), {} dangling reference(s). Run 'opsgraph check' for details.",
                cycles, dangling
            );
        }
    }

    Ok(())
}

/// Report data-quality issues in a snapshot
pub fn check(output: &Output, path: &Path, strict: bool) -> Result<()> {
    let tasks = load_tasks(output, "check", path)?;
    let graph = DependencyGraph::from_tasks(&tasks);

    let dangling = graph.dangling();
    let duplicates = graph.duplicates();
    let cycles = graph.cycles();
    let issues = dangling.len() + duplicates.len() + cycles.len();

    output.verbose_ctx(
        "check",
        &format!(
            "{} dangling, {} duplicate(s), {} cycle(s)",
            dangling.len(),
            duplicates.len(),
            cycles.len()
        ),
    );

    if output.is_json() {
        let dangling_items: Vec<_> = dangling
            .iter()
            .map(|d| serde_json::json!({ "task": d.task, "missing": d.missing }))
            .collect();
        output.data(&serde_json::json!({
            "ok": issues == 0,
            "dangling": dangling_items,
            "duplicates": duplicates,
            "cycles": cycles,
        }));
    } else if issues == 0 {
        println!("No issues found in {} task(s).", graph.len());
    } else {
        if !dangling.is_empty() {
            println!("Dangling references ({}):", dangling.len());
            for d in dangling {
                println!("  {} -> {} (unknown task)", d.task, d.missing);
            }
        }
        if !duplicates.is_empty() {
            println!("Duplicate IDs ({}), last record wins:", duplicates.len());
            for id in duplicates {
                println!("  {}", id);
            }
        }
        if !cycles.is_empty() {
            println!("Dependency cycles ({}):", cycles.len());
            for cycle in &cycles {
                let ids: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
                println!("  {}", ids.join(" -> "));
            }
        }
    }

    if strict && issues > 0 {
        bail!("Snapshot has {} issue(s)", issues);
    }

    Ok(())
}
