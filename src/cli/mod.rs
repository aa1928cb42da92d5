//! # Command-Line Interface
//!
//! User-facing commands that feed a task snapshot to the layout engine
//! and the dependency queries.
//!
//! ## Commands
//!
//! | Group | Purpose | Commands |
//! |-------|---------|----------|
//! | Setup | Project configuration | `init` |
//! | Layout | Positioned nodes and edges | `layout`, `levels`, `watch` |
//! | Query | Plan state | `ready`, `blocked`, `status`, `check` |
//!
//! Every command except `init` takes a snapshot path; `-` reads stdin.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! Without the flag, `default_format` from the global config applies.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output on stderr:
//! ```bash
//! opsgraph --verbose layout tasks.json
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod layout_cmd;
mod query;
mod watch;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
