//! Core pipeline for the worklog ecosystem.
//!
//! This crate turns raw calendar events and completed tasks into a
//! sanitized Markdown document and decides whether it must be published:
//! - `redaction` and `classify` map one raw record to zero or one log line
//! - `aggregate` renders the document for one date
//! - `leak_guard` vets the rendered document against live secret values
//! - `publish` compares against the stored document and persists changes
//!
//! Nothing in here talks to the network; the CLI supplies records and a
//! `DocumentStore`.

pub mod aggregate;
pub mod classify;
pub mod error;
pub mod leak_guard;
pub mod pipeline;
pub mod publish;
pub mod record;
pub mod redaction;
pub mod settings;

pub use error::{WorklogError, WorklogResult};
