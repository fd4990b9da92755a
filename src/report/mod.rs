//! Weekly work report from a task tracker export.
//!
//! Tasks are filtered to a seven-day window, summarised into a handful of
//! metrics and written out as Markdown.

mod task;
mod weekly;

pub use task::{load_tasks, parse_tasks, Task, DEFAULT_PROJECT, TASK_DATE_FORMAT};
pub use weekly::{format_percent, WeekWindow, WeeklyMetrics, WeeklyReport, REPORT_DATE_FORMAT};
