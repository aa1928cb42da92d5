//! Main CLI application structure

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{layout_cmd, query, watch};
use crate::domain::GraphLayoutEngine;
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "opsgraph")]
#[command(author, version, about = "Dependency graph layout for startup task plans")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .opsgraph/config.toml with default settings
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Compute the graph layout (positioned nodes and edges)
    Layout {
        /// Snapshot file (JSON, dashboard JSON, or JSONL; `-` for stdin)
        snapshot: PathBuf,

        /// Print only the layout fingerprint
        #[arg(long)]
        fingerprint: bool,
    },

    /// Show the dependency level of every task
    Levels {
        /// Snapshot file (`-` for stdin)
        snapshot: PathBuf,
    },

    /// Show pending tasks whose dependencies are done
    Ready {
        /// Snapshot file (`-` for stdin)
        snapshot: PathBuf,
    },

    /// Show tasks held up by unfinished dependencies
    Blocked {
        /// Snapshot file (`-` for stdin)
        snapshot: PathBuf,
    },

    /// Show plan status and execution score
    Status {
        /// Snapshot file (`-` for stdin)
        snapshot: PathBuf,
    },

    /// Report dangling references, duplicate IDs and cycles
    Check {
        /// Snapshot file (`-` for stdin)
        snapshot: PathBuf,

        /// Fail when any issue is found
        #[arg(long)]
        strict: bool,
    },

    /// Recompute the layout whenever the snapshot file changes
    Watch {
        /// Snapshot file
        snapshot: PathBuf,

        /// Debounce delay in milliseconds (overrides config)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.command {
        // init must still work when an existing config is broken
        Commands::Init { .. } => Config::default(),
        _ => Config::load()?,
    };
    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format, cli.verbose);

    output.verbose("opsgraph starting");
    match &config.project_root {
        Some(root) => output.verbose(&format!("Using project config at: {}", root.display())),
        None => output.verbose("No project config found, using defaults"),
    }

    let engine = GraphLayoutEngine::new(config.project.layout.clone());

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path.display()));
            let config_path = Config::init_project(&path)?;
            output.success(&format!("Initialized opsgraph config at {}", config_path.display()));
        }

        Commands::Layout { snapshot, fingerprint } => {
            layout_cmd::layout(&output, &engine, &snapshot, fingerprint)?
        }
        Commands::Levels { snapshot } => layout_cmd::levels(&output, &engine, &snapshot)?,

        Commands::Ready { snapshot } => query::ready(&output, &snapshot)?,
        Commands::Blocked { snapshot } => query::blocked(&output, &snapshot)?,
        Commands::Status { snapshot } => query::status(&output, &engine, &snapshot)?,
        Commands::Check { snapshot, strict } => query::check(&output, &snapshot, strict)?,

        Commands::Watch { snapshot, debounce_ms } => {
            let millis = debounce_ms.unwrap_or(config.project.watch.debounce_millis);
            output.verbose_ctx("watch", &format!("Debounce: {}ms", millis));
            watch::run(&output, &engine, &snapshot, Duration::from_millis(millis))?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}
