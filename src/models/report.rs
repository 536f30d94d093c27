//! Per-task progress report fragments sent to notification targets.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskRunStatus {
    Completed,
    Failed,
}

impl TaskRunStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TaskRunStatus::Completed => "Completed",
            TaskRunStatus::Failed => "Failed",
        }
    }
}

/// Structured report for one task execution, broadcast through the agent's
/// update rules after the task ran (or failed).
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub agent_id: String,
    pub agent_name: String,
    pub task_type: String,
    /// RFC 3339 last-run stamp after this execution, when one exists.
    pub last_run: Option<String>,
    pub status: TaskRunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskReport {
    pub fn subject(&self) -> String {
        format!("Agent Progress Update - {}", self.agent_id)
    }

    pub fn render_text(&self) -> String {
        let mut lines = vec![
            format!("Agent {} ({}) progress report:", self.agent_name, self.agent_id),
            format!("Task: {}", self.task_type),
            format!(
                "  - Last Run: {}",
                self.last_run.as_deref().unwrap_or("never")
            ),
            format!("  - Status: {}", self.status.as_str()),
        ];
        if let Some(result) = &self.result {
            lines.push(format!("  - Result: {}", result));
        }
        if let Some(error) = &self.error {
            lines.push(format!("  - Error: {}", error));
        }
        lines.join("\n")
    }

    pub fn render_html(&self) -> String {
        let detail = match (&self.result, &self.error) {
            (Some(result), _) => format!("<p><strong>Result:</strong> {}</p>", result),
            (None, Some(error)) => format!("<p><strong>Error:</strong> {}</p>", error),
            (None, None) => String::new(),
        };

        format!(
            "<html>\n<body>\n\
             <h2>Agent Progress Report</h2>\n\
             <p><strong>Agent ID:</strong> {}</p>\n\
             <p><strong>Agent Name:</strong> {}</p>\n\
             <hr>\n\
             <h3>Task Details</h3>\n\
             <p><strong>Task:</strong> {}</p>\n\
             <p><strong>Last Run:</strong> {}</p>\n\
             <p><strong>Status:</strong> {}</p>\n\
             {}\n\
             <hr>\n\
             <p>Thank you,<br>Agentflow</p>\n\
             </body>\n</html>",
            self.agent_id,
            self.agent_name,
            self.task_type,
            self.last_run.as_deref().unwrap_or("never"),
            self.status.as_str(),
            detail,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> TaskReport {
        TaskReport {
            agent_id: "agent-001".to_string(),
            agent_name: "Morgan".to_string(),
            task_type: "post_creator".to_string(),
            last_run: Some("2025-06-01T09:00:00+00:00".to_string()),
            status: TaskRunStatus::Completed,
            result: Some("drafted 1 post".to_string()),
            error: None,
        }
    }

    #[test]
    fn text_rendering_includes_result() {
        let text = sample_report().render_text();
        assert!(text.contains("Task: post_creator"));
        assert!(text.contains("Status: Completed"));
        assert!(text.contains("Result: drafted 1 post"));
    }

    #[test]
    fn html_rendering_shows_error_on_failure() {
        let report = TaskReport {
            status: TaskRunStatus::Failed,
            result: None,
            error: Some("handler unavailable".to_string()),
            ..sample_report()
        };
        let html = report.render_html();
        assert!(html.contains("<strong>Status:</strong> Failed"));
        assert!(html.contains("<strong>Error:</strong> handler unavailable"));
    }
}
