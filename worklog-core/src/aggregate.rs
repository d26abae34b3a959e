//! Assembly of classified lines into the Markdown document for one date.

use chrono::NaiveDate;

use crate::classify::LogLine;
use crate::settings::RenderOptions;

/// The rendered, redacted report for one date.
///
/// Holds only text that already went through the classifier; there is
/// no way back to the raw records. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedDocument {
    date: NaiveDate,
    text: String,
}

impl SanitizedDocument {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Result of assembling a day's lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembled {
    Document(SanitizedDocument),
    /// Neither section has a line; nothing must be written.
    NothingToPublish,
}

/// Render the document for `target_date`.
///
/// Calendar lines are ordered by local `HH:MM` (ties by text, so repeated
/// runs are byte-identical regardless of fetch order). Task lines keep
/// their fetch order.
pub fn assemble(
    mut calendar_lines: Vec<LogLine>,
    task_lines: Vec<LogLine>,
    target_date: NaiveDate,
    options: &RenderOptions,
) -> Assembled {
    if calendar_lines.is_empty() && task_lines.is_empty() {
        return Assembled::NothingToPublish;
    }

    calendar_lines.sort_by(|a, b| (&a.sort_key, &a.text).cmp(&(&b.sort_key, &b.text)));

    let mut out = String::new();
    out.push_str(&format!(
        "# {} {}\n",
        target_date.format("%Y-%m-%d"),
        options.title_suffix
    ));

    out.push_str("\n## Calendar\n\n");
    if calendar_lines.is_empty() {
        out.push_str(&options.no_events_placeholder);
        out.push('\n');
    }
    for line in &calendar_lines {
        let time = line.sort_key.as_deref().unwrap_or("--:--");
        out.push_str(&format!("- **{}**: {}\n", time, line.text));
    }

    out.push_str("\n## Tasks\n\n");
    if task_lines.is_empty() {
        out.push_str(&options.no_tasks_placeholder);
        out.push('\n');
    }
    for line in &task_lines {
        out.push_str(&format!("- {}\n", line.text));
    }

    Assembled::Document(SanitizedDocument {
        date: target_date,
        text: out,
    })
}
