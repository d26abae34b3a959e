//! Raw records as reported by the scheduling provider.
//!
//! Field names follow the provider's JSON so the HTTP layer can decode
//! responses straight into these types. Records are fetched fresh each
//! run and dropped once classified.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A calendar event as fetched for the target day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub sensitivity: Sensitivity,
    #[serde(default)]
    pub show_as: Availability,
    pub start: ProviderDateTime,
}

/// A completed (or not yet completed) task from one task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed_date_time: Option<ProviderDateTime>,
    /// Display name of the owning list. Filled in by the fetcher, the
    /// task payload itself does not carry it.
    #[serde(default)]
    pub list_name: String,
}

/// How the event owner marked the event's visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sensitivity {
    #[default]
    Normal,
    Personal,
    Private,
    Confidential,
    /// Any value this build doesn't know about.
    #[serde(other)]
    Unknown,
}

impl Sensitivity {
    /// Whether the subject must never be read. Unknown values fail closed.
    pub fn is_restricted(self) -> bool {
        !matches!(self, Sensitivity::Normal)
    }
}

/// Free/busy status of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Availability {
    Free,
    Tentative,
    #[default]
    Busy,
    Oof,
    WorkingElsewhere,
    #[serde(other)]
    Unknown,
}

/// A civil date-time plus the zone name the provider reported it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDateTime {
    pub date_time: String,
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl ProviderDateTime {
    pub fn new(date_time: impl Into<String>) -> Self {
        ProviderDateTime {
            date_time: date_time.into(),
            time_zone: None,
        }
    }

    /// Parse as a naive civil timestamp, dropping any sub-second fraction.
    ///
    /// The provider pads fractions to seven digits (`2024-03-01T23:50:00.0000000`),
    /// which is why the fraction is cut off textually rather than parsed.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let trimmed = self.date_time.trim().trim_end_matches('Z');
        let whole_seconds = trimmed.split('.').next().unwrap_or(trimmed);

        NaiveDateTime::parse_from_str(whole_seconds, "%Y-%m-%dT%H:%M:%S").ok()
    }
}
