//! Record classification: one raw record in, zero or one log line out.

use std::fmt;

use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

use crate::error::WorklogResult;
use crate::record::{Availability, RawEvent, RawTask};
use crate::redaction::RedactionRules;
use crate::settings::{RedactionConfig, RenderOptions};

/// Which section of the document a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Calendar,
    Task,
}

/// A sanitized line ready for the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub category: Category,
    /// Zero-padded local `HH:MM` for calendar lines, `None` for tasks.
    pub sort_key: Option<String>,
    pub text: String,
}

impl LogLine {
    fn calendar(sort_key: String, text: String) -> Self {
        LogLine {
            category: Category::Calendar,
            sort_key: Some(sort_key),
            text,
        }
    }

    fn task(text: String) -> Self {
        LogLine {
            category: Category::Task,
            sort_key: None,
            text,
        }
    }
}

/// Why a record contributed nothing to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Cancelled,
    /// Availability is "free" and free events are excluded.
    Free,
    NotCompleted,
    OutsideTargetDate { local_date: NaiveDate },
    MalformedTimestamp { value: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Cancelled => write!(f, "cancelled"),
            SkipReason::Free => write!(f, "free"),
            SkipReason::NotCompleted => write!(f, "not completed"),
            SkipReason::OutsideTargetDate { local_date } => {
                write!(f, "completed on {local_date}")
            }
            SkipReason::MalformedTimestamp { value } => {
                write!(f, "malformed timestamp '{value}'")
            }
        }
    }
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Include(LogLine),
    Skip(SkipReason),
}

impl Classification {
    pub fn into_line(self) -> Option<LogLine> {
        match self {
            Classification::Include(line) => Some(line),
            Classification::Skip(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Classification::Include(_) => None,
            Classification::Skip(reason) => Some(reason),
        }
    }
}

/// Applies the redaction rules and rendering options to raw records.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RedactionRules,
    render: RenderOptions,
    private_placeholder: String,
    no_subject_placeholder: String,
    utc_offset: FixedOffset,
}

impl Classifier {
    /// `utc_offset` converts provider-reported task completion times
    /// (UTC civil times) into the target local zone.
    pub fn new(
        redaction: &RedactionConfig,
        render: &RenderOptions,
        utc_offset: FixedOffset,
    ) -> WorklogResult<Self> {
        Ok(Classifier {
            rules: RedactionRules::new(redaction)?,
            render: render.clone(),
            private_placeholder: redaction.private_placeholder.clone(),
            no_subject_placeholder: redaction.no_subject_placeholder.clone(),
            utc_offset,
        })
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.render
    }

    /// Classify a calendar event the caller already restricted to the target day.
    ///
    /// The event's start is expected in the display zone requested from the
    /// provider, so its time of day is used as-is.
    pub fn classify_event(&self, event: &RawEvent) -> Classification {
        if event.is_cancelled {
            return Classification::Skip(SkipReason::Cancelled);
        }

        let Some(start) = event.start.to_naive() else {
            return Classification::Skip(SkipReason::MalformedTimestamp {
                value: event.start.date_time.clone(),
            });
        };
        let sort_key = start.format("%H:%M").to_string();

        if event.sensitivity.is_restricted() {
            return Classification::Include(LogLine::calendar(
                sort_key,
                self.private_placeholder.clone(),
            ));
        }

        let text = self.redact_or_default(event.subject.as_deref());

        if event.show_as == Availability::Free && !self.render.include_free_events {
            return Classification::Skip(SkipReason::Free);
        }

        Classification::Include(LogLine::calendar(sort_key, text))
    }

    /// Classify a task; only tasks completed on `target_date` (local) are kept.
    pub fn classify_task(&self, task: &RawTask, target_date: NaiveDate) -> Classification {
        let Some(completed) = &task.completed_date_time else {
            return Classification::Skip(SkipReason::NotCompleted);
        };

        let Some(reported) = completed.to_naive() else {
            return Classification::Skip(SkipReason::MalformedTimestamp {
                value: completed.date_time.clone(),
            });
        };

        let local_date = Utc
            .from_utc_datetime(&reported)
            .with_timezone(&self.utc_offset)
            .date_naive();

        if local_date != target_date {
            return Classification::Skip(SkipReason::OutsideTargetDate { local_date });
        }

        let title = self.redact_or_default(task.title.as_deref());

        let mut text = if self.render.completed_prefix.is_empty() {
            title
        } else {
            format!("{} {}", self.render.completed_prefix, title)
        };

        if self.render.include_task_list_name && !task.list_name.trim().is_empty() {
            text = format!("{} ({})", text, self.rules.redact(&task.list_name));
        }

        Classification::Include(LogLine::task(text))
    }

    fn redact_or_default(&self, text: Option<&str>) -> String {
        let text = text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(self.no_subject_placeholder.as_str());

        self.rules.redact(text)
    }
}
