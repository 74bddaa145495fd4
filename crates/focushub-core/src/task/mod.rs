//! Task records and the in-memory task list.

mod list;

pub use list::{EditSession, TaskList};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::gateway::{de_id, Record};

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Task category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Work,
    Personal,
}

/// A to-do item.
///
/// `completed` and `checked` always move together; both exist because the
/// backend schema carries both columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub checked: bool,
}

impl Record for Task {
    const TABLE: &'static str = "tasks";
    const ORDER: &'static str = "created_at.desc";

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// Insert payload: a task without an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
    pub checked: bool,
}

impl From<&Task> for NewTask {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            completed: task.completed,
            priority: task.priority,
            category: task.category,
            checked: task.checked,
        }
    }
}

/// Partial task update. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Dashboard tab filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Work,
    Personal,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Work => task.category == Category::Work,
            TaskFilter::Personal => task.category == Category::Personal,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "work" => Ok(TaskFilter::Work),
            "personal" => Ok(TaskFilter::Personal),
            other => Err(ValidationError::InvalidValue {
                field: "filter".into(),
                message: format!("unknown filter '{other}'"),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("unknown priority '{other}'"),
            }),
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            other => Err(ValidationError::InvalidValue {
                field: "category".into(),
                message: format!("unknown category '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
        };
        f.write_str(s)
    }
}

/// Starter tasks shown when the backend has none.
pub fn sample_tasks() -> Vec<Task> {
    let task = |id: &str, title: &str, priority, category| Task {
        id: id.into(),
        title: title.into(),
        completed: false,
        priority,
        category,
        checked: false,
    };
    vec![
        task("1", "Finalize Q3 Design System", Priority::High, Category::Work),
        task("2", "Reply to Sarah's email", Priority::Medium, Category::Work),
        task("3", "Walk the dog", Priority::Low, Category::Personal),
    ]
}
