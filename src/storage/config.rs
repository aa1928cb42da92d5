//! Configuration handling for opsgraph
//!
//! Configuration is stored in `.opsgraph/config.toml` (project) and
//! `~/.config/opsgraph/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::LayoutConfig;

/// Name of the per-project configuration directory
pub const PROJECT_DIR: &str = ".opsgraph";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Configuration for `opsgraph watch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period after the last change before the layout is recomputed
    pub debounce_millis: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_millis: 500,
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Layout geometry
    pub layout: LayoutConfig,

    /// Watch settings
    pub watch: WatchConfig,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for the current directory
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::load_from(&cwd)
    }

    /// Loads configuration, searching for a project upwards from `start`
    pub fn load_from(start: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project_root = Self::find_project_root_from(start);
        let project = match &project_root {
            Some(root) => Self::load_project_config(root)?,
            None => ProjectConfig::default(),
        };

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "opsgraph", "opsgraph")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads and validates project configuration from a specific root
    pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config
            .layout
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
            .with_context(|| format!("Invalid layout settings in {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for a `.opsgraph/` directory
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Creates `.opsgraph/config.toml` with defaults, keeping an existing file
    ///
    /// Returns the path of the config file.
    pub fn init_project(root: &Path) -> Result<PathBuf> {
        let dir = root.join(PROJECT_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {} directory: {}", PROJECT_DIR, dir.display()))?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() {
            let content = toml::to_string_pretty(&ProjectConfig::default())
                .context("Failed to serialize project config")?;
            let content = format!(
                "# opsgraph configuration\n# layout.category_offsets shifts a category within its row (must stay below half of row_spacing)\n\n{}",
                content
            );
            fs::write(&config_path, content)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::default();

        assert_eq!(config.project.layout.row_spacing, 150.0);
        assert_eq!(config.project.layout.column_spacing, 250.0);
        assert_eq!(config.project.watch.debounce_millis, 500);
        assert_eq!(config.global.default_format, OutputFormat::Text);
        assert!(config.project_root.is_none());
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
[layout]
row_spacing = 200.0

[layout.category_offsets]
marketing = 12.5

[watch]
debounce_millis = 50
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.layout.row_spacing, 200.0);
        assert_eq!(config.layout.column_spacing, 250.0);
        assert_eq!(config.layout.category_offsets.get("marketing"), Some(&12.5));
        assert_eq!(config.watch.debounce_millis, 50);
    }

    #[test]
    fn parse_global_config() {
        let config: GlobalConfig = toml::from_str(r#"default_format = "json""#).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn find_project_root_walks_up() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(PROJECT_DIR)).unwrap();

        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();

        let root = Config::find_project_root_from(&sub_dir);
        assert_eq!(root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn init_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();

        let path = Config::init_project(dir.path()).unwrap();
        assert!(path.is_file());

        let config = Config::load_project_config(dir.path()).unwrap();
        assert_eq!(config, ProjectConfig::default());

        // a second init keeps the existing file
        fs::write(&path, "[layout]\nrow_spacing = 90.0\n").unwrap();
        Config::init_project(dir.path()).unwrap();
        let config = Config::load_project_config(dir.path()).unwrap();
        assert_eq!(config.layout.row_spacing, 90.0);
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(PROJECT_DIR)).unwrap();
        fs::write(
            dir.path().join(PROJECT_DIR).join("config.toml"),
            "[layout]\nrow_spacing = 100.0\n\n[layout.category_offsets]\ntech = 60.0\n",
        )
        .unwrap();

        let err = Config::load_project_config(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid configuration"));
    }
}
