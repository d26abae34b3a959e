//! Rule-based redaction of free text.
//!
//! Rules run in a fixed order:
//! 1. keyword suppression (short-circuits with the internal placeholder)
//! 2. literal remaps, in configuration order
//! 3. email-shaped substrings become the contact placeholder
//!
//! The result is checked once more before it is returned: if a keyword,
//! a sensitive literal or an email shape survived (e.g. formed across a
//! remap boundary), the whole text collapses to the internal placeholder.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{WorklogError, WorklogResult};
use crate::settings::{RedactionConfig, Remap};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+\-]+@[\w.\-]+\.\w+").expect("email pattern is a valid regex")
});

/// Compiled redaction rule set.
#[derive(Debug, Clone)]
pub struct RedactionRules {
    /// Lowercased, never empty.
    keywords: Vec<String>,
    remaps: Vec<Remap>,
    internal_placeholder: String,
    contact_placeholder: String,
}

impl RedactionRules {
    /// Compile a rule set, rejecting configurations whose own replacement
    /// texts would reintroduce something the rules are meant to remove.
    pub fn new(config: &RedactionConfig) -> WorklogResult<Self> {
        if let Some(remap) = config.remaps.iter().find(|r| r.from.is_empty()) {
            return Err(WorklogError::Config(format!(
                "remap to '{}' has an empty source name",
                remap.to
            )));
        }

        let rules = RedactionRules {
            keywords: config
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            remaps: config.remaps.clone(),
            internal_placeholder: config.internal_placeholder.clone(),
            contact_placeholder: config.contact_placeholder.clone(),
        };

        let placeholders = [
            ("internal_placeholder", config.internal_placeholder.as_str()),
            ("contact_placeholder", config.contact_placeholder.as_str()),
            ("private_placeholder", config.private_placeholder.as_str()),
        ];
        for (what, text) in placeholders {
            if !rules.is_clean(text) {
                return Err(WorklogError::Config(format!(
                    "{what} '{text}' contains a sensitive keyword, a remapped name or an email address"
                )));
            }
        }

        // A target may name a later source: remaps chain in order, and
        // `redact` re-checks whatever comes out.
        for remap in &config.remaps {
            if rules.contains_keyword(&remap.to) || EMAIL.is_match(&remap.to) {
                return Err(WorklogError::Config(format!(
                    "remap target '{}' contains a sensitive keyword or an email address",
                    remap.to
                )));
            }
        }

        Ok(rules)
    }

    /// Apply the full rule ordering to `text`.
    pub fn redact(&self, text: &str) -> String {
        if self.contains_keyword(text) {
            return self.internal_placeholder.clone();
        }

        let mut out = text.to_string();
        for remap in &self.remaps {
            out = out.replace(&remap.from, &remap.to);
        }

        let out = EMAIL
            .replace_all(&out, self.contact_placeholder.as_str())
            .into_owned();

        if self.is_clean(&out) {
            out
        } else {
            self.internal_placeholder.clone()
        }
    }

    fn contains_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    fn is_clean(&self, text: &str) -> bool {
        !self.contains_keyword(text)
            && !self.remaps.iter().any(|r| text.contains(&r.from))
            && !EMAIL.is_match(text)
    }
}

/// Whether `text` contains an email-shaped substring.
pub fn contains_email(text: &str) -> bool {
    EMAIL.is_match(text)
}
