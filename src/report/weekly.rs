//! Weekly metrics and the Markdown report built from them.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Days, NaiveDate};
use handlebars::Handlebars;
use serde::Serialize;

use super::task::Task;
use crate::blog::slugify;
use crate::config::ReportConfig;
use crate::error::{Result, WorkbenchError};

const REPORT_TEMPLATE: &str = include_str!("../../templates/weekly_report.md.hbs");
const REPORT_TEMPLATE_NAME: &str = "weekly_report";

/// Date format shown in the report body
pub const REPORT_DATE_FORMAT: &str = "%Y年%m月%d日";

const ANONYMOUS_REPORTER: &str = "未署名";

/// Seven inclusive days ending on `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    /// The week ending `weeks_ago` weeks before `today`.
    pub fn ending(today: NaiveDate, weeks_ago: u32) -> Result<Self> {
        let out_of_range = || WorkbenchError::InvalidInput(format!("weeks_ago out of range: {}", weeks_ago));
        let end = today
            .checked_sub_days(Days::new(7 * u64::from(weeks_ago)))
            .ok_or_else(out_of_range)?;
        let start = end.checked_sub_days(Days::new(6)).ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Tasks whose planned day falls in the window; unparseable dates are skipped
    pub fn select(&self, tasks: &[Task]) -> Vec<Task> {
        tasks
            .iter()
            .filter(|t| t.day().is_some_and(|d| self.contains(d)))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyMetrics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_ratio: f64,
    pub on_time_tasks: usize,
    pub on_time_ratio: f64,
    pub bug_tasks: usize,
    pub project_count: usize,
}

impl WeeklyMetrics {
    pub fn compute(tasks: &[Task], bug_keywords: &[String]) -> Self {
        let total_tasks = tasks.len();
        let completed_tasks = tasks.iter().filter(|t| t.is_completed).count();
        let on_time_tasks = tasks.iter().filter(|t| t.is_on_time()).count();
        let bug_tasks = tasks.iter().filter(|t| t.mentions_any(bug_keywords)).count();
        let project_count = tasks.iter().map(Task::project).collect::<BTreeSet<_>>().len();

        Self {
            total_tasks,
            completed_tasks,
            completion_ratio: ratio(completed_tasks, total_tasks),
            on_time_tasks,
            on_time_ratio: ratio(on_time_tasks, completed_tasks),
            bug_tasks,
            project_count,
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

/// Ratio as a percentage with one decimal, e.g. `66.7%`
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// A week's tasks and metrics, ready to render
#[derive(Debug, Clone)]
pub struct WeeklyReport {
    pub window: WeekWindow,
    pub report_date: NaiveDate,
    pub reporter: Option<String>,
    pub metrics: WeeklyMetrics,
    pub tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TaskLine<'a> {
    date: &'a str,
    content: &'a str,
    completed: bool,
    completion_date: Option<&'a str>,
}

#[derive(Serialize)]
struct ReportContext<'a> {
    reporter: &'a str,
    report_date: String,
    period_start: String,
    period_end: String,
    completion_ratio: String,
    on_time_ratio: String,
    bug_tasks: usize,
    project_count: usize,
    total_tasks: usize,
    completed_tasks: usize,
    open_tasks: usize,
    on_time_tasks: usize,
    tasks: Vec<TaskLine<'a>>,
}

impl WeeklyReport {
    /// Select the week's tasks and compute its metrics.
    ///
    /// A week without tasks is an error; there is nothing to report.
    pub fn build(tasks: &[Task], today: NaiveDate, weeks_ago: u32, config: &ReportConfig) -> Result<Self> {
        let window = WeekWindow::ending(today, weeks_ago)?;
        let mut selected = window.select(tasks);
        if selected.is_empty() {
            return Err(WorkbenchError::InvalidInput(format!(
                "No tasks between {} and {}",
                window.start, window.end
            )));
        }
        selected.sort_by_key(|t| t.day());

        log::debug!(
            "Selected {} of {} tasks for {}..={}",
            selected.len(),
            tasks.len(),
            window.start,
            window.end
        );

        Ok(Self {
            window,
            report_date: today,
            reporter: config.reporter.clone().filter(|r| !r.trim().is_empty()),
            metrics: WeeklyMetrics::compute(&selected, &config.bug_keywords),
            tasks: selected,
        })
    }

    /// `weekly_report_[<reporter>_]<start>-<end>.md`
    pub fn default_file_name(&self) -> String {
        let period = format!(
            "{}-{}",
            self.window.start.format("%Y%m%d"),
            self.window.end.format("%Y%m%d")
        );
        match self.reporter.as_deref().map(slugify).filter(|s| !s.is_empty()) {
            Some(slug) => format!("weekly_report_{}_{}.md", slug, period),
            None => format!("weekly_report_{}.md", period),
        }
    }

    pub fn render(&self) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(REPORT_TEMPLATE_NAME, REPORT_TEMPLATE)
            .map_err(|e| WorkbenchError::Template(format!("Failed to register report template: {}", e)))?;

        let m = &self.metrics;
        let context = ReportContext {
            reporter: self.reporter.as_deref().unwrap_or(ANONYMOUS_REPORTER),
            report_date: self.report_date.format(REPORT_DATE_FORMAT).to_string(),
            period_start: self.window.start.format(REPORT_DATE_FORMAT).to_string(),
            period_end: self.window.end.format(REPORT_DATE_FORMAT).to_string(),
            completion_ratio: format_percent(m.completion_ratio),
            on_time_ratio: format_percent(m.on_time_ratio),
            bug_tasks: m.bug_tasks,
            project_count: m.project_count,
            total_tasks: m.total_tasks,
            completed_tasks: m.completed_tasks,
            open_tasks: m.total_tasks - m.completed_tasks,
            on_time_tasks: m.on_time_tasks,
            tasks: self
                .tasks
                .iter()
                .map(|t| TaskLine {
                    date: &t.date,
                    content: &t.content,
                    completed: t.is_completed,
                    completion_date: t.completion_date.as_deref().filter(|d| !d.is_empty()),
                })
                .collect(),
        };

        handlebars
            .render(REPORT_TEMPLATE_NAME, &context)
            .map_err(|e| WorkbenchError::Template(format!("Failed to render report: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let markdown = self.render()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, markdown)?;
        log::info!("Wrote weekly report to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(content: &str, date: &str, done: bool, completion: Option<&str>) -> Task {
        Task {
            content: content.to_string(),
            date: date.to_string(),
            is_completed: done,
            completion_date: completion.map(|c| c.to_string()),
        }
    }

    fn sample_tasks() -> Vec<Task> {
        vec![
            task("【商城】修复支付回调 bug", "2024-03-04", true, Some("2024-03-04")),
            task("【商城】订单导出", "2024-03-05", true, Some("2024-03-07")),
            task("【后台】权限优化", "2024-03-06", false, None),
            task("写周报", "2024-03-08", true, Some("2024-03-08")),
            task("上周遗留", "2024-03-01", true, Some("2024-03-01")),
            task("日期缺失", "someday", true, None),
        ]
    }

    #[test]
    fn test_window_bounds() {
        let w = WeekWindow::ending(day(2024, 3, 10), 0).unwrap();
        assert_eq!(w.start, day(2024, 3, 4));
        assert_eq!(w.end, day(2024, 3, 10));
        assert!(w.contains(day(2024, 3, 4)));
        assert!(w.contains(day(2024, 3, 10)));
        assert!(!w.contains(day(2024, 3, 3)));

        let last = WeekWindow::ending(day(2024, 3, 10), 1).unwrap();
        assert_eq!(last.start, day(2024, 2, 26));
        assert_eq!(last.end, day(2024, 3, 3));
    }

    #[test]
    fn test_select_skips_other_weeks_and_bad_dates() {
        let w = WeekWindow::ending(day(2024, 3, 10), 0).unwrap();
        let selected = w.select(&sample_tasks());
        assert_eq!(selected.len(), 4);
        assert!(selected.iter().all(|t| t.content != "上周遗留" && t.content != "日期缺失"));
    }

    #[test]
    fn test_metrics() {
        let w = WeekWindow::ending(day(2024, 3, 10), 0).unwrap();
        let selected = w.select(&sample_tasks());
        let m = WeeklyMetrics::compute(&selected, &ReportConfig::default().bug_keywords);

        assert_eq!(m.total_tasks, 4);
        assert_eq!(m.completed_tasks, 3);
        assert!((m.completion_ratio - 0.75).abs() < 1e-9);
        assert_eq!(m.on_time_tasks, 2);
        assert!((m.on_time_ratio - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.bug_tasks, 2);
        assert_eq!(m.project_count, 3);
    }

    #[test]
    fn test_metrics_empty() {
        let m = WeeklyMetrics::compute(&[], &[]);
        assert_eq!(m.completion_ratio, 0.0);
        assert_eq!(m.on_time_ratio, 0.0);
        assert_eq!(m.project_count, 0);
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(2.0 / 3.0), "66.7%");
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(1.0), "100.0%");
    }

    #[test]
    fn test_empty_week_is_error() {
        let result = WeeklyReport::build(&sample_tasks(), day(2025, 1, 1), 0, &ReportConfig::default());
        assert!(matches!(result, Err(WorkbenchError::InvalidInput(_))));
    }

    #[test]
    fn test_default_file_name() {
        let mut config = ReportConfig::default();
        let report = WeeklyReport::build(&sample_tasks(), day(2024, 3, 10), 0, &config).unwrap();
        assert_eq!(report.default_file_name(), "weekly_report_20240304-20240310.md");

        config.reporter = Some("Ada Lovelace".to_string());
        let report = WeeklyReport::build(&sample_tasks(), day(2024, 3, 10), 0, &config).unwrap();
        assert_eq!(report.default_file_name(), "weekly_report_ada-lovelace_20240304-20240310.md");
    }

    #[test]
    fn test_render_markdown() {
        let config = ReportConfig {
            reporter: Some("张三".to_string()),
            ..Default::default()
        };
        let report = WeeklyReport::build(&sample_tasks(), day(2024, 3, 10), 0, &config).unwrap();
        let md = report.render().unwrap();

        assert!(md.contains("报告人：张三"));
        assert!(md.contains("报告日期：2024年03月10日"));
        assert!(md.contains("报告周期：2024年03月04日 至 2024年03月10日"));
        assert!(md.contains("| 75.0% | 66.7% | 2个 |"));
        assert!(md.contains("本迭代共 3 个需求"));
        assert!(md.contains("- [x] 2024-03-04 【商城】修复支付回调 bug"));
        assert!(md.contains("- [ ] 2024-03-06 【后台】权限优化"));
        assert!(!md.contains("上周遗留"));
    }

    #[test]
    fn test_render_anonymous() {
        let report = WeeklyReport::build(&sample_tasks(), day(2024, 3, 10), 0, &ReportConfig::default()).unwrap();
        assert!(report.render().unwrap().contains(ANONYMOUS_REPORTER));
    }
}
