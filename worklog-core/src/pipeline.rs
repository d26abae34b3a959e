//! One day's run: classify → assemble → leak guard → publish gate.

use chrono::NaiveDate;

use crate::aggregate::{Assembled, SanitizedDocument, assemble};
use crate::classify::{Category, Classification, Classifier, LogLine, SkipReason};
use crate::error::WorklogResult;
use crate::leak_guard::{SecretSet, vet};
use crate::publish::{DocumentStore, PublishOutcome, publish};
use crate::record::{RawEvent, RawTask};

/// Raw input for one target date.
#[derive(Debug, Clone, Default)]
pub struct DayInput {
    pub events: Vec<RawEvent>,
    pub tasks: Vec<RawTask>,
}

/// A record that contributed nothing, by position in its fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub category: Category,
    pub index: usize,
    pub reason: SkipReason,
}

/// Include/skip decisions for every record of a run.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub calendar_lines: Vec<LogLine>,
    pub task_lines: Vec<LogLine>,
    pub skipped: Vec<SkippedRecord>,
}

impl Collected {
    pub fn skipped_with(&self, reason: &SkipReason) -> usize {
        self.skipped.iter().filter(|s| &s.reason == reason).count()
    }
}

/// Final result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NothingToPublish,
    NoChange,
    Published,
}

impl From<PublishOutcome> for RunOutcome {
    fn from(outcome: PublishOutcome) -> Self {
        match outcome {
            PublishOutcome::NoChange => RunOutcome::NoChange,
            PublishOutcome::Published => RunOutcome::Published,
        }
    }
}

/// Classify every record of `input` against `date`.
pub fn collect(classifier: &Classifier, input: &DayInput, date: NaiveDate) -> Collected {
    let mut collected = Collected::default();

    for (index, event) in input.events.iter().enumerate() {
        match classifier.classify_event(event) {
            Classification::Include(line) => collected.calendar_lines.push(line),
            Classification::Skip(reason) => {
                tracing::debug!(index, ?reason, "Skipped calendar event");
                collected.skipped.push(SkippedRecord {
                    category: Category::Calendar,
                    index,
                    reason,
                });
            }
        }
    }

    for (index, task) in input.tasks.iter().enumerate() {
        match classifier.classify_task(task, date) {
            Classification::Include(line) => collected.task_lines.push(line),
            Classification::Skip(reason) => {
                tracing::debug!(index, ?reason, "Skipped task");
                collected.skipped.push(SkippedRecord {
                    category: Category::Task,
                    index,
                    reason,
                });
            }
        }
    }

    collected
}

/// Classify and assemble, without any side effect.
///
/// Returns the skip decisions alongside the document so callers can report
/// on them.
pub fn build(
    classifier: &Classifier,
    input: &DayInput,
    date: NaiveDate,
) -> (Assembled, Vec<SkippedRecord>) {
    let Collected {
        calendar_lines,
        task_lines,
        skipped,
    } = collect(classifier, input, date);

    tracing::info!(
        %date,
        calendar = calendar_lines.len(),
        tasks = task_lines.len(),
        skipped = skipped.len(),
        "Classified records"
    );

    let assembled = assemble(calendar_lines, task_lines, date, classifier.render_options());
    (assembled, skipped)
}

/// Run the full pipeline for `date` against `store`.
///
/// An empty day never touches the store. A leak aborts before the store is
/// consulted at all.
pub fn run<S: DocumentStore + ?Sized>(
    classifier: &Classifier,
    input: &DayInput,
    date: NaiveDate,
    secrets: &SecretSet,
    store: &mut S,
) -> WorklogResult<RunOutcome> {
    let (assembled, _) = build(classifier, input, date);

    let document: SanitizedDocument = match assembled {
        Assembled::Document(document) => document,
        Assembled::NothingToPublish => {
            tracing::info!(%date, "Nothing to publish");
            return Ok(RunOutcome::NothingToPublish);
        }
    };

    let vetted = vet(document, secrets)?;

    Ok(publish(store, &vetted)?.into())
}
