//! Task summary documents
//!
//! A summary is either free text, written verbatim, or a structured
//! document rendered deterministically into markdown with a fixed section
//! order. Sections absent from the input are omitted, never rendered
//! empty.

use std::collections::BTreeMap;

use experiment_core::TaskId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A task summary: free text or a structured document
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// Written to `summary.md` exactly as given
    Text(String),

    /// Rendered to markdown section by section
    Document(SummaryDoc),
}

impl Summary {
    /// Render the summary for `task_id`
    pub fn render(&self, task_id: TaskId) -> String {
        match self {
            Summary::Text(text) => text.clone(),
            Summary::Document(doc) => doc.render(task_id),
        }
    }
}

impl From<&str> for Summary {
    fn from(text: &str) -> Self {
        Summary::Text(text.to_string())
    }
}

impl From<String> for Summary {
    fn from(text: String) -> Self {
        Summary::Text(text)
    }
}

impl From<SummaryDoc> for Summary {
    fn from(doc: SummaryDoc) -> Self {
        Summary::Document(doc)
    }
}

/// Structured summary document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryDoc {
    /// Title for the document header; "Summary" if unset
    pub title: Option<String>,

    /// Prose description of the task
    pub description: Option<String>,

    /// Key findings, one bullet each
    pub findings: Vec<String>,

    /// Named results, one `**key**: value` bullet each
    pub results: BTreeMap<String, Value>,

    /// References to saved figure files
    pub visualizations: Vec<String>,

    /// Free-text closing insights
    pub insights: Option<String>,
}

impl SummaryDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn finding<S: Into<String>>(mut self, finding: S) -> Self {
        self.findings.push(finding.into());
        self
    }

    pub fn result<S: Into<String>, V: Into<Value>>(mut self, key: S, value: V) -> Self {
        self.results.insert(key.into(), value.into());
        self
    }

    pub fn visualization<S: Into<String>>(mut self, reference: S) -> Self {
        self.visualizations.push(reference.into());
        self
    }

    pub fn insights<S: Into<String>>(mut self, insights: S) -> Self {
        self.insights = Some(insights.into());
        self
    }

    /// Render to markdown in fixed section order
    pub fn render(&self, task_id: TaskId) -> String {
        let mut lines = vec![format!(
            "# Task {}: {}\n",
            task_id,
            self.title.as_deref().unwrap_or("Summary")
        )];

        if let Some(description) = &self.description {
            lines.push(format!("\n## Description\n\n{}\n", description));
        }

        if !self.findings.is_empty() {
            lines.push("\n## Key Findings\n".to_string());
            for finding in &self.findings {
                lines.push(format!("- {}\n", finding));
            }
        }

        if !self.results.is_empty() {
            lines.push("\n## Results\n".to_string());
            for (key, value) in &self.results {
                lines.push(format!("- **{}**: {}\n", key, display_value(value)));
            }
        }

        if !self.visualizations.is_empty() {
            lines.push("\n## Visualizations\n".to_string());
            for reference in &self.visualizations {
                lines.push(format!("- `{}`\n", reference));
            }
        }

        if let Some(insights) = &self.insights {
            lines.push(format!("\n## Key Insights\n\n{}\n", insights));
        }

        lines.concat()
    }
}

/// Render a JSON value without quoting plain strings
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
