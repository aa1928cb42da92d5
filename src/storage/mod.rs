//! # Storage Layer
//!
//! File access for opsgraph: task snapshots in, configuration around.
//!
//! ## Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Snapshot | JSON array, dashboard JSON object, or JSONL | any path, or `-` for stdin |
//! | Project config | TOML | `.opsgraph/config.toml` |
//! | Global config | TOML | platform config dir, `opsgraph/config.toml` |
//!
//! ## Key Types
//!
//! - [`SnapshotStore`] - Reads a task snapshot under a shared file lock
//! - [`Config`] - Project and global configuration

mod config;
mod snapshot;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, WatchConfig, PROJECT_DIR};
pub use snapshot::{parse_document, parse_lines, SnapshotStore};
