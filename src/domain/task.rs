//! Task domain model
//!
//! Tasks are the units of work in a startup plan. Each task names the tasks
//! it depends on; category and status only drive ordering and styling.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::id::TaskId;

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    /// Parses a status label, falling back to `Pending` for unknown labels
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "in_progress" | "in-progress" | "in progress" | "active" => TaskStatus::InProgress,
            "completed" | "complete" | "done" => TaskStatus::Completed,
            "blocked" => TaskStatus::Blocked,
            _ => TaskStatus::Pending,
        }
    }

    /// Returns the canonical snake_case label
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
        }
    }

    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Returns true if work on this task has not started
    pub fn is_waiting(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Blocked)
    }

    /// Returns true if this task is currently being worked on
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::InProgress)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl Serialize for TaskStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(TaskStatus::parse_lenient(&label))
    }
}

/// Department a task belongs to
///
/// Declaration order is the sort precedence used when laying out a level.
/// Unrecognized labels are kept verbatim and always sort last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskCategory {
    Product,
    Tech,
    Marketing,
    Finance,
    Other(String),
}

impl TaskCategory {
    /// Parses a category label (case-insensitive)
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "product" => TaskCategory::Product,
            "tech" => TaskCategory::Tech,
            "marketing" => TaskCategory::Marketing,
            "finance" => TaskCategory::Finance,
            _ => TaskCategory::Other(label.to_string()),
        }
    }

    /// Sort precedence within a level (lower sorts first)
    pub fn precedence(&self) -> u8 {
        match self {
            TaskCategory::Product => 0,
            TaskCategory::Tech => 1,
            TaskCategory::Marketing => 2,
            TaskCategory::Finance => 3,
            TaskCategory::Other(_) => u8::MAX,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskCategory::Product => "product",
            TaskCategory::Tech => "tech",
            TaskCategory::Marketing => "marketing",
            TaskCategory::Finance => "finance",
            TaskCategory::Other(label) => label,
        }
    }
}

impl Default for TaskCategory {
    fn default() -> Self {
        TaskCategory::Other(String::new())
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for TaskCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(TaskCategory::parse(&label))
    }
}

/// Treats an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_priority() -> u8 {
    1
}

fn default_estimated_days() -> f64 {
    1.0
}

fn null_as_default_priority<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u8>::deserialize(deserializer)?.unwrap_or_else(default_priority))
}

fn null_as_default_estimated_days<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_else(default_estimated_days))
}

/// A task as delivered by the dashboard snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Tasks that must be done before this one (may be dangling or cyclic)
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<TaskId>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub category: TaskCategory,

    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TaskStatus,

    /// Human-readable title
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Priority from 1 (lowest) to 5
    #[serde(
        default = "default_priority",
        deserialize_with = "null_as_default_priority"
    )]
    pub priority: u8,

    #[serde(
        default = "default_estimated_days",
        deserialize_with = "null_as_default_estimated_days"
    )]
    pub estimated_days: f64,
}

impl Task {
    /// Creates a pending task with no dependencies
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            category: TaskCategory::default(),
            status: TaskStatus::default(),
            title: String::new(),
            description: None,
            priority: default_priority(),
            estimated_days: default_estimated_days(),
        }
    }

    pub fn with_dependency(mut self, id: impl Into<TaskId>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns the title, or the ID when the title is empty
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            self.id.as_str()
        } else {
            &self.title
        }
    }
}
