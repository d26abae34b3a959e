//! Plain configuration values for the pipeline.
//!
//! These are constructed once at startup (usually deserialized from the
//! CLI's config file) and passed by reference into the classifier,
//! aggregator and leak guard. Nothing in the pipeline reads the process
//! environment.

use serde::{Deserialize, Serialize};

/// Redaction rule set configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Case-insensitive keywords; a hit replaces the whole text.
    pub keywords: Vec<String>,
    pub private_placeholder: String,
    pub internal_placeholder: String,
    pub contact_placeholder: String,
    pub no_subject_placeholder: String,
    /// Literal renames, applied in list order.
    pub remaps: Vec<Remap>,
}

/// A literal sensitive name and its approved generic replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remap {
    pub from: String,
    pub to: String,
}

impl Remap {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Remap {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        RedactionConfig {
            keywords: ["Salary", "Review", "Interview", "Confidential", "Offer", "HR", "Bank"]
                .into_iter()
                .map(String::from)
                .collect(),
            private_placeholder: "🔒 Private Meeting".to_string(),
            internal_placeholder: "💼 Internal Discussion".to_string(),
            contact_placeholder: "[Contact]".to_string(),
            no_subject_placeholder: "No Subject".to_string(),
            remaps: vec![
                Remap::new("Project DeathStar", "Infrastructure Upgrade"),
                Remap::new("Client CocaCola", "Retail Client"),
            ],
        }
    }
}

/// Document rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Keep events whose availability is "free".
    pub include_free_events: bool,
    /// Append the (redacted) task list name to each task line.
    pub include_task_list_name: bool,
    pub title_suffix: String,
    pub completed_prefix: String,
    pub no_events_placeholder: String,
    pub no_tasks_placeholder: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            include_free_events: false,
            include_task_list_name: false,
            title_suffix: "Work Log".to_string(),
            completed_prefix: "✅".to_string(),
            no_events_placeholder: "_No events._".to_string(),
            no_tasks_placeholder: "_No tasks completed._".to_string(),
        }
    }
}
