//! Watch mode: recompute the layout when the snapshot changes
//!
//! The parent directory is watched rather than the file itself, so editors
//! and sync tools that replace the file by rename are still picked up.
//! A layout is printed only when its fingerprint differs from the last one.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};

use super::layout_cmd::print_layout_text;
use super::output::Output;
use crate::domain::GraphLayoutEngine;
use crate::storage::SnapshotStore;

/// Returns true if an event path refers to the watched snapshot
fn is_snapshot_event(event_path: &Path, snapshot: &Path) -> bool {
    event_path.file_name().is_some() && event_path.file_name() == snapshot.file_name()
}

/// Recomputes the layout, returning the new fingerprint if it changed
fn refresh(
    output: &Output,
    engine: &GraphLayoutEngine,
    store: &SnapshotStore,
    last: Option<&str>,
) -> Option<String> {
    let tasks = match store.read_all() {
        Ok(tasks) => tasks,
        Err(e) => {
            // Keep watching; the upstream writer may be mid-update
            output.error(&format!("{:#}", e));
            return None;
        }
    };

    let layout = engine.layout(&tasks);
    let fingerprint = layout.fingerprint();
    if last == Some(fingerprint.as_str()) {
        output.verbose_ctx("watch", "Layout unchanged");
        return None;
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "fingerprint": fingerprint,
            "layout": layout,
        }));
    } else {
        println!("# layout {}", fingerprint);
        print_layout_text(&layout);
        println!();
    }

    Some(fingerprint)
}

/// Watches a snapshot file until the watcher channel closes
pub fn run(
    output: &Output,
    engine: &GraphLayoutEngine,
    path: &Path,
    debounce: Duration,
) -> Result<()> {
    let store = SnapshotStore::new(path);
    if store.is_stdin() {
        bail!("watch needs a snapshot file, stdin cannot be watched");
    }

    let snapshot = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve snapshot path: {}", path.display()))?;
    let watch_dir = snapshot
        .parent()
        .with_context(|| format!("Snapshot has no parent directory: {}", snapshot.display()))?;

    let mut last = refresh(output, engine, &store, None);

    // Set up file watcher with debouncing
    let (tx, rx) = mpsc::channel::<DebounceEventResult>();
    let mut debouncer = new_debouncer(debounce, tx)?;
    debouncer
        .watcher()
        .watch(watch_dir, RecursiveMode::NonRecursive)?;

    output.verbose_ctx("watch", &format!("Watching {}", snapshot.display()));

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                if !events.iter().any(|e| is_snapshot_event(&e.path, &snapshot)) {
                    continue;
                }
                output.verbose_ctx("watch", "Snapshot changed");
                if let Some(fingerprint) = refresh(output, engine, &store, last.as_deref()) {
                    last = Some(fingerprint);
                }
            }
            Ok(Err(error)) => {
                output.error(&format!("Watch error: {:?}", error));
            }
            Err(e) => {
                output.verbose_ctx("watch", &format!("Channel closed: {}", e));
                break;
            }
        }
    }

    Ok(())
}
