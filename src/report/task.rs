//! Task records exported from the to-do tracker.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WorkbenchError};

/// Date format used by the task export
pub const TASK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Project label for tasks without a `【项目】` prefix
pub const DEFAULT_PROJECT: &str = "其他";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub content: String,
    pub date: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completion_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskFile {
    tasks: Vec<Value>,
}

impl Task {
    /// Planned day, if the date parses
    pub fn day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), TASK_DATE_FORMAT).ok()
    }

    pub fn completed_on(&self) -> Option<NaiveDate> {
        self.completion_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), TASK_DATE_FORMAT).ok())
    }

    /// Completed no later than its planned day
    pub fn is_on_time(&self) -> bool {
        if !self.is_completed {
            return false;
        }
        match (self.completed_on(), self.day()) {
            (Some(done), Some(planned)) => done <= planned,
            _ => false,
        }
    }

    /// Text before the first `】`, or the default project
    pub fn project(&self) -> &str {
        match self.content.split_once('】') {
            Some((prefix, _)) => prefix,
            None => DEFAULT_PROJECT,
        }
    }

    pub fn mentions_any(&self, keywords: &[String]) -> bool {
        keywords.iter().any(|k| !k.is_empty() && self.content.contains(k.as_str()))
    }
}

/// Parse a `{"tasks": [...]}` export.
///
/// Records that do not fit the task shape (a null `date`, a missing
/// `content`) are skipped with a warning.
pub fn parse_tasks(json: &str) -> Result<Vec<Task>> {
    let file: TaskFile = serde_json::from_str(json)?;
    let tasks = file
        .tasks
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value::<Task>(record) {
            Ok(task) => Some(task),
            Err(e) => {
                log::warn!("Skipping task #{}: {}", i, e);
                None
            }
        })
        .collect();
    Ok(tasks)
}

pub fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    if !path.exists() {
        return Err(WorkbenchError::InvalidInput(format!(
            "Task file not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    parse_tasks(&content)
}
