//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use proofline_corrector::ProgressEvent;
use proofline_domain::{Correction, Task, TaskId, TaskStatus};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a task list.
    pub fn format_tasks(&self, tasks: &[Task]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json_tasks: Vec<serde_json::Value> = tasks.iter().map(task_json).collect();
                Ok(serde_json::to_string_pretty(&json_tasks)?)
            }
            OutputFormat::Table => Ok(self.format_tasks_table(tasks)),
            OutputFormat::Quiet => {
                let ids: Vec<String> = tasks.iter().map(|t| t.id.to_string()).collect();
                Ok(ids.join("\n"))
            }
        }
    }

    /// Format one task with its corrections.
    pub fn format_task(&self, task: &Task) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = task_json(task);
                value["result"] = task.result.iter().map(correction_json).collect();
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => Ok(self.format_task_table(task)),
            OutputFormat::Quiet => Ok(task.id.to_string()),
        }
    }

    fn format_tasks_table(&self, tasks: &[Task]) -> String {
        if tasks.is_empty() {
            return self.colorize("No tasks found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "File", "Status", "Progress", "Failed", "Created"]);

        for task in tasks {
            builder.push_record([
                task.id.to_string(),
                task.filename.clone(),
                self.status(task.status),
                progress_cell(task),
                task.failed_units.to_string(),
                task.created_at.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    fn format_task_table(&self, task: &Task) -> String {
        let mut lines = vec![
            format!("Task:      {}", task.id),
            format!("File:      {}", task.filename),
            format!("Status:    {}", self.status(task.status)),
            format!("Progress:  {}", progress_cell(task)),
            format!("Elapsed:   {:.1}s", task.elapsed_secs),
        ];
        if task.failed_units > 0 {
            lines.push(self.warning(&format!(
                "{} unit(s) could not be corrected",
                task.failed_units
            )));
        }
        if let Some(cause) = &task.error {
            lines.push(self.error(cause));
        }

        if task.status == TaskStatus::Completed {
            lines.push(String::new());
            lines.push(self.format_corrections_table(&task.result));
        }

        lines.join("\n")
    }

    fn format_corrections_table(&self, corrections: &[Correction]) -> String {
        if corrections.is_empty() {
            return self.success("No corrections needed.");
        }

        let mut builder = Builder::default();
        builder.push_record(["Unit", "Original", "Corrected", "Reason"]);

        for correction in corrections {
            builder.push_record([
                (correction.unit_index + 1).to_string(),
                correction.original.clone(),
                self.colorize(&correction.corrected, "green"),
                correction.reason.clone().unwrap_or_default(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// One line describing a progress event.
    pub fn progress_line(&self, event: &ProgressEvent) -> String {
        match event {
            ProgressEvent::Started { total_units, .. } => {
                self.info(&format!("Split into {} unit(s)", total_units))
            }
            ProgressEvent::Progress {
                processed_units,
                total_units,
                elapsed_seconds,
                estimated_remaining_seconds,
                percent,
                ..
            } => format!(
                "[{:>6.2}%] {}/{} units, {:.1}s elapsed, ~{:.0}s left",
                percent, processed_units, total_units, elapsed_seconds, estimated_remaining_seconds
            ),
            ProgressEvent::Completed {
                correction_count,
                failed_units,
                elapsed_seconds,
                ..
            } => {
                if *failed_units > 0 {
                    self.warning(&format!(
                        "Finished in {:.1}s with {} correction(s); {} unit(s) failed",
                        elapsed_seconds, correction_count, failed_units
                    ))
                } else {
                    self.success(&format!(
                        "Finished in {:.1}s with {} correction(s)",
                        elapsed_seconds, correction_count
                    ))
                }
            }
            ProgressEvent::Failed { cause, .. } => self.error(&format!("Task failed: {}", cause)),
        }
    }

    /// Format the result of a recovery pass.
    pub fn recovered(&self, task_ids: &[TaskId]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let ids: Vec<String> = task_ids.iter().map(|id| id.to_string()).collect();
                Ok(serde_json::to_string_pretty(&serde_json::json!({ "recovered": ids }))?)
            }
            OutputFormat::Table => {
                if task_ids.is_empty() {
                    Ok(self.info("No interrupted tasks"))
                } else {
                    Ok(self.success(&format!(
                        "Marked {} interrupted task(s) as failed",
                        task_ids.len()
                    )))
                }
            }
            OutputFormat::Quiet => {
                let ids: Vec<String> = task_ids.iter().map(|id| id.to_string()).collect();
                Ok(ids.join("\n"))
            }
        }
    }

    /// Format rules or prompt text.
    pub fn text_block(&self, key: &str, text: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({ key: text }))?),
            OutputFormat::Table | OutputFormat::Quiet => Ok(text.to_string()),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn status(&self, status: TaskStatus) -> String {
        let color = match status {
            TaskStatus::Pending => "white",
            TaskStatus::Running => "blue",
            TaskStatus::Completed => "green",
            TaskStatus::Failed => "red",
        };
        self.colorize(status.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "blue" => text.blue().to_string(),
            "cyan" => text.cyan().to_string(),
            "white" => text.white().to_string(),
            _ => text.to_string(),
        }
    }
}

fn progress_cell(task: &Task) -> String {
    format!(
        "{}/{} ({:.2}%)",
        task.processed_units,
        task.total_units,
        task.progress().percent()
    )
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id.to_string(),
        "filename": task.filename,
        "status": task.status.as_str(),
        "created_at": task.created_at,
        "started_at": task.started_at,
        "completed_at": task.completed_at,
        "updated_at": task.updated_at,
        "total_units": task.total_units,
        "processed_units": task.processed_units,
        "failed_units": task.failed_units,
        "percent": task.progress().percent(),
        "elapsed_seconds": task.elapsed_secs,
        "estimated_remaining_seconds": task.estimated_remaining_secs,
        "error": task.error,
    })
}

fn correction_json(correction: &Correction) -> serde_json::Value {
    serde_json::json!({
        "unit_index": correction.unit_index,
        "original": correction.original,
        "corrected": correction.corrected,
        "reason": correction.reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_task() -> Task {
        let mut task = Task::new("thesis.docx", 1_700_000_000);
        task.status = TaskStatus::Completed;
        task.total_units = 4;
        task.processed_units = 4;
        task.failed_units = 1;
        task.result = vec![
            Correction::new(0, "recieve", "receive").with_reason("spelling"),
            Correction::new(2, "there", "their"),
        ];
        task
    }

    #[test]
    fn test_task_json_includes_result() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_task(&completed_task()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["status"], "completed");
        assert_eq!(value["percent"], 100.0);
        assert_eq!(value["result"][0]["corrected"], "receive");
        assert_eq!(value["result"][1]["unit_index"], 2);
        assert!(value["result"][1]["reason"].is_null());
    }

    #[test]
    fn test_task_table_lists_corrections() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_task(&completed_task()).unwrap();

        assert!(output.contains("completed"));
        assert!(output.contains("4/4 (100.00%)"));
        assert!(output.contains("1 unit(s) could not be corrected"));
        assert!(output.contains("recieve"));
        assert!(output.contains("spelling"));
    }

    #[test]
    fn test_failed_task_shows_cause() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut task = Task::new("empty.txt", 0);
        task.status = TaskStatus::Failed;
        task.error = Some("empty document".into());

        let output = formatter.format_task(&task).unwrap();
        assert!(output.contains("✗ empty document"));
        assert!(!output.contains("No corrections needed"));
    }

    #[test]
    fn test_quiet_lists_ids() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let tasks = vec![Task::new("a.txt", 0), Task::new("b.txt", 0)];
        let output = formatter.format_tasks(&tasks).unwrap();

        assert_eq!(output, format!("{}\n{}", tasks[0].id, tasks[1].id));
    }

    #[test]
    fn test_empty_task_list() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.format_tasks(&[]).unwrap(), "No tasks found.");
    }

    #[test]
    fn test_progress_line() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let event = ProgressEvent::Progress {
            task_id: TaskId::new(),
            processed_units: 3,
            total_units: 4,
            elapsed_seconds: 6.0,
            estimated_remaining_seconds: 2.0,
            percent: 75.0,
        };
        assert_eq!(
            formatter.progress_line(&event),
            "[ 75.00%] 3/4 units, 6.0s elapsed, ~2s left"
        );
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("done"), "✓ done");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }
}
