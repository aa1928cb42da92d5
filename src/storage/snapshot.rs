//! Task snapshot loading
//!
//! A snapshot is the task list served by the dashboard API, saved to a file
//! or piped on stdin. Three shapes are accepted:
//!
//! - a JSON array of tasks
//! - a JSON object with a `tasks` array (the dashboard response)
//! - JSONL, one task per line (`.jsonl` files)
//!
//! Files are read under a shared lock so a concurrent writer using an
//! exclusive lock never hands us a half-written snapshot.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use fs2::FileExt;
use serde_json::Value;

use crate::domain::Task;

/// Reader for a task snapshot
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store for the given path (`-` reads stdin)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns true if the snapshot is read from stdin
    pub fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }

    fn is_jsonl(&self) -> bool {
        self.path.extension().map(|ext| ext == "jsonl").unwrap_or(false)
    }

    /// Reads all tasks in snapshot order
    pub fn read_all(&self) -> Result<Vec<Task>> {
        if self.is_stdin() {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read snapshot from stdin")?;
            return parse_document(&content).context("Failed to parse snapshot from stdin");
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open snapshot: {}", self.path.display()))?;

        // Acquire shared lock for reading
        FileExt::lock_shared(&file)
            .context("Failed to acquire read lock on snapshot")?;

        // Lock is released when file is dropped
        if self.is_jsonl() {
            parse_lines(BufReader::new(&file))
                .with_context(|| format!("Failed to parse snapshot: {}", self.path.display()))
        } else {
            let mut content = String::new();
            BufReader::new(&file)
                .read_to_string(&mut content)
                .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
            parse_document(&content)
                .with_context(|| format!("Failed to parse snapshot: {}", self.path.display()))
        }
    }
}

/// Parses a JSON array or dashboard object
///
/// Records are decoded one at a time so an error names the offending task.
pub fn parse_document(content: &str) -> Result<Vec<Task>> {
    let document: Value = serde_json::from_str(content).context("Snapshot is not valid JSON")?;

    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut envelope) => match envelope.remove("tasks") {
            Some(Value::Array(records)) => records,
            _ => bail!("Expected a JSON array of tasks or an object with a \"tasks\" array"),
        },
        _ => bail!("Expected a JSON array of tasks or an object with a \"tasks\" array"),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let id = record.get("id").map(|id| id.to_string());
            serde_json::from_value::<Task>(record).with_context(|| match id {
                Some(id) => format!("Failed to parse task #{} (id {})", i + 1, id),
                None => format!("Failed to parse task #{}", i + 1),
            })
        })
        .collect()
}

/// Parses one task per line, skipping blank lines
pub fn parse_lines(reader: impl BufRead) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

        if line.trim().is_empty() {
            continue;
        }

        let task: Task = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse task at line {}", line_num + 1))?;

        tasks.push(task);
    }

    Ok(tasks)
}
