//! Final gate between a rendered document and any persistence side effect.
//!
//! Only catches verbatim occurrences of the values it was given; encoded or
//! derived forms of a secret pass unnoticed.

use std::fmt;

use crate::aggregate::SanitizedDocument;
use crate::error::{WorklogError, WorklogResult};

/// The live secret values available to the process, keyed by a label that
/// is safe to print.
#[derive(Default, Clone)]
pub struct SecretSet {
    entries: Vec<(String, String)>,
}

impl SecretSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret. Empty or whitespace-only values are ignored.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.entries.push((label.into(), value));
        }
    }

    /// Register a secret if present.
    pub fn insert_opt(&mut self, label: impl Into<String>, value: Option<&str>) {
        if let Some(value) = value {
            self.insert(label, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }
}

// Values must never end up in logs or panic messages.
impl fmt::Debug for SecretSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSet")
            .field("labels", &self.labels().collect::<Vec<_>>())
            .finish()
    }
}

/// Fail if any registered secret occurs verbatim in `document`.
///
/// A value read from the environment may carry a stray newline, so the
/// trimmed form is checked as well.
pub fn check_leaks(document: &str, secrets: &SecretSet) -> WorklogResult<()> {
    for (label, value) in &secrets.entries {
        let trimmed = value.trim();
        if document.contains(value.as_str()) || document.contains(trimmed) {
            return Err(WorklogError::LeakDetected {
                label: label.clone(),
            });
        }
    }

    Ok(())
}

/// A document that passed [`check_leaks`]. Only [`vet`] can produce one,
/// and the publish gate accepts nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VettedDocument(SanitizedDocument);

impl VettedDocument {
    pub fn document(&self) -> &SanitizedDocument {
        &self.0
    }
}

/// Run the leak check and, if it passes, mark the document as publishable.
pub fn vet(document: SanitizedDocument, secrets: &SecretSet) -> WorklogResult<VettedDocument> {
    check_leaks(document.text(), secrets)?;
    Ok(VettedDocument(document))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> SecretSet {
        let mut secrets = SecretSet::new();
        secrets.insert("client secret", "s3cr3t-Value~xyz");
        secrets.insert("refresh token", "0.AAAArefreshTOKEN");
        secrets
    }

    #[test]
    fn test_clean_document_passes() {
        assert!(check_leaks("# 2024-03-02 Work Log\n- **09:00**: Standup\n", &secrets()).is_ok());
    }

    #[test]
    fn test_verbatim_secret_is_detected() {
        let doc = "- **09:00**: paste 0.AAAArefreshTOKEN here";

        match check_leaks(doc, &secrets()) {
            Err(WorklogError::LeakDetected { label }) => assert_eq!(label, "refresh token"),
            other => panic!("expected leak, got {other:?}"),
        }
    }

    #[test]
    fn test_error_message_does_not_contain_value() {
        let err = check_leaks("s3cr3t-Value~xyz", &secrets()).unwrap_err();

        assert!(!err.to_string().contains("s3cr3t"));
        assert!(err.to_string().contains("client secret"));
    }

    #[test]
    fn test_trailing_newline_in_secret_still_detected() {
        let mut secrets = SecretSet::new();
        secrets.insert("push token", "ghp_abc123\n");

        assert!(check_leaks("token ghp_abc123 end", &secrets).is_err());
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let mut secrets = SecretSet::new();
        secrets.insert("blank", "");
        secrets.insert("spaces", "   ");
        secrets.insert_opt("missing", None);

        assert!(secrets.is_empty());
        assert!(check_leaks("anything at all", &secrets).is_ok());
    }

    #[test]
    fn test_debug_hides_values() {
        let rendered = format!("{:?}", secrets());

        assert!(rendered.contains("client secret"));
        assert!(!rendered.contains("s3cr3t"));
        assert!(!rendered.contains("refreshTOKEN"));
    }
}
