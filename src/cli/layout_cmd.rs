//! Layout commands (layout, levels)

use std::path::Path;

use anyhow::Result;

use super::output::Output;
use crate::domain::{GraphLayoutEngine, Layout, Task};
use crate::storage::SnapshotStore;

/// Reads a snapshot, logging where it came from
pub(super) fn load_tasks(output: &Output, context: &str, path: &Path) -> Result<Vec<Task>> {
    let store = SnapshotStore::new(path);
    if store.is_stdin() {
        output.verbose_ctx(context, "Reading snapshot from stdin");
    } else {
        output.verbose_ctx(context, &format!("Reading snapshot: {}", path.display()));
    }

    let tasks = store.read_all()?;
    output.verbose_ctx(context, &format!("Loaded {} task record(s)", tasks.len()));
    Ok(tasks)
}

/// Prints a layout as rows of positioned tasks followed by its edges
pub(super) fn print_layout_text(layout: &Layout<'_>) {
    if layout.is_empty() {
        println!("No tasks to lay out.");
        return;
    }

    println!(
        "Layout: {} task(s), {} edge(s), {} level(s)",
        layout.nodes.len(),
        layout.edges.len(),
        layout.rows()
    );

    for row in layout.row_slices() {
        println!();
        println!("Level {}:", row[0].level);
        for node in row {
            println!(
                "  {:<20} x={:<9} y={:<9} {:<12} {}",
                node.id,
                node.x,
                node.y,
                node.task.status.label(),
                node.task.category
            );
        }
    }

    if !layout.edges.is_empty() {
        println!();
        println!("Edges:");
        for edge in &layout.edges {
            let marker = if edge.emphasized {
                " (blocked)"
            } else if edge.animated {
                " (in progress)"
            } else {
                ""
            };
            println!("  {} -> {}{}", edge.from_id, edge.to_id, marker);
        }
    }
}

/// Compute and print the layout
pub fn layout(
    output: &Output,
    engine: &GraphLayoutEngine,
    path: &Path,
    fingerprint_only: bool,
) -> Result<()> {
    let tasks = load_tasks(output, "layout", path)?;
    let layout = engine.layout(&tasks);
    output.verbose_ctx(
        "layout",
        &format!(
            "Placed {} node(s) on {} level(s) with {} edge(s)",
            layout.nodes.len(),
            layout.rows(),
            layout.edges.len()
        ),
    );

    if fingerprint_only {
        let fingerprint = layout.fingerprint();
        if output.is_json() {
            output.data(&serde_json::json!({ "fingerprint": fingerprint }));
        } else {
            println!("{}", fingerprint);
        }
    } else if output.is_json() {
        output.data(&layout);
    } else {
        print_layout_text(&layout);
    }

    Ok(())
}

/// Show the dependency level of every task
pub fn levels(output: &Output, engine: &GraphLayoutEngine, path: &Path) -> Result<()> {
    let tasks = load_tasks(output, "levels", path)?;
    let layout = engine.layout(&tasks);

    if output.is_json() {
        let items: Vec<_> = layout
            .nodes
            .iter()
            .map(|n| {
                serde_json::json!({
                    "id": n.id,
                    "level": n.level,
                    "category": n.task.category,
                    "status": n.task.status,
                    "title": n.task.title,
                })
            })
            .collect();
        output.data(&items);
    } else if layout.is_empty() {
        println!("No tasks.");
    } else {
        println!("{:<6} {:<20} {:<12} {:<12} TITLE", "LEVEL", "ID", "CATEGORY", "STATUS");
        println!("{}", "-".repeat(70));
        for node in &layout.nodes {
            println!(
                "{:<6} {:<20} {:<12} {:<12} {}",
                node.level,
                node.id,
                node.task.category,
                node.task.status,
                node.task.title
            );
        }
    }

    Ok(())
}
