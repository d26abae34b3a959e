//! Publish gate: persist a vetted document only when it changed.

use chrono::NaiveDate;

use crate::error::WorklogResult;
use crate::leak_guard::VettedDocument;

/// Version-controlled storage for daily documents, keyed by date.
///
/// `persist` is expected to write, stage, commit and push in one go; any
/// failure along the way is returned and ends the run.
pub trait DocumentStore {
    /// Content currently stored for `date`, if any.
    fn load(&self, date: NaiveDate) -> WorklogResult<Option<String>>;

    fn persist(&mut self, date: NaiveDate, content: &str, message: &str) -> WorklogResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    NoChange,
    Published,
}

/// Commit message used for the document of `date`.
pub fn commit_message(date: NaiveDate) -> String {
    format!("Log: {}", date.format("%Y-%m-%d"))
}

/// Compare against the stored document and persist on any difference,
/// including when nothing was stored before.
pub fn publish<S: DocumentStore + ?Sized>(
    store: &mut S,
    vetted: &VettedDocument,
) -> WorklogResult<PublishOutcome> {
    let document = vetted.document();
    let date = document.date();

    if store.load(date)?.as_deref() == Some(document.text()) {
        tracing::info!(%date, "Stored log is up to date");
        return Ok(PublishOutcome::NoChange);
    }

    store.persist(date, document.text(), &commit_message(date))?;
    tracing::info!(%date, "Published log");

    Ok(PublishOutcome::Published)
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;
    use crate::aggregate::{Assembled, assemble};
    use crate::classify::{Category, LogLine};
    use crate::error::WorklogError;
    use crate::leak_guard::{SecretSet, vet};
    use crate::settings::RenderOptions;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    fn vetted(text: &str) -> VettedDocument {
        let line = LogLine {
            category: Category::Calendar,
            sort_key: Some("09:00".to_string()),
            text: text.to_string(),
        };
        match assemble(vec![line], vec![], day(), &RenderOptions::default()) {
            Assembled::Document(doc) => vet(doc, &SecretSet::new()).unwrap(),
            Assembled::NothingToPublish => unreachable!(),
        }
    }

    #[test]
    fn test_commit_message_is_keyed_to_date() {
        assert_eq!(commit_message(day()), "Log: 2024-03-02");
    }

    #[test]
    fn test_new_document_is_published() {
        let mut store = MemoryStore::default();

        let outcome = publish(&mut store, &vetted("Standup")).unwrap();

        assert_eq!(outcome, PublishOutcome::Published);
        assert_eq!(store.commits, vec!["Log: 2024-03-02".to_string()]);
        assert!(store.documents[&day()].contains("Standup"));
    }

    #[test]
    fn test_identical_document_is_not_republished() {
        let mut store = MemoryStore::default();
        let doc = vetted("Standup");

        publish(&mut store, &doc).unwrap();
        let second = publish(&mut store, &doc).unwrap();

        assert_eq!(second, PublishOutcome::NoChange);
        assert_eq!(store.commits.len(), 1);
    }

    #[test]
    fn test_changed_document_is_published_again() {
        let mut store = MemoryStore::default();

        publish(&mut store, &vetted("Standup")).unwrap();
        let outcome = publish(&mut store, &vetted("Standup and retro")).unwrap();

        assert_eq!(outcome, PublishOutcome::Published);
        assert_eq!(store.commits.len(), 2);
    }

    #[test]
    fn test_persistence_failure_is_returned() {
        let mut store = MemoryStore {
            fail_persist: true,
            ..MemoryStore::default()
        };

        let result = publish(&mut store, &vetted("Standup"));

        assert!(matches!(result, Err(WorklogError::Persistence(_))));
    }
}
