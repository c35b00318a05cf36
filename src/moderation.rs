//! Content moderation for comment text.
//!
//! A comment is rejected when its lower-cased text contains any banned word.
//! Rejection never creates or changes a record: the form comes back with the
//! warning bound to its `text` field.

use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_BANNED_WORDS: &[&str] = &["редиска", "негодяй"];
pub const DEFAULT_WARNING: &str = "Не ругайтесь!";
pub const FIELD_REQUIRED: &str = "Обязательное поле.";

/// Name of the only user-editable comment field
pub const TEXT_FIELD: &str = "text";

#[derive(Debug, Clone)]
pub struct ModerationPolicy {
    banned_words: Vec<String>,
    warning: String,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_BANNED_WORDS.iter().map(|w| w.to_string()).collect(),
            DEFAULT_WARNING.to_string(),
        )
    }
}

impl ModerationPolicy {
    /// Blank entries are dropped; they would match every text.
    pub fn new(banned_words: Vec<String>, warning: String) -> Self {
        let banned_words = banned_words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            banned_words,
            warning,
        }
    }

    pub fn banned_words(&self) -> &[String] {
        &self.banned_words
    }

    pub fn warning(&self) -> &str {
        &self.warning
    }

    /// Returns the warning when `text` contains a banned word
    pub fn check(&self, text: &str) -> Result<(), &str> {
        let lowered = text.to_lowercase();
        if self.banned_words.iter().any(|w| lowered.contains(w.as_str())) {
            return Err(&self.warning);
        }
        Ok(())
    }
}

/// A bound comment form, as handed back to the page on both first render and
/// failed submission.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CommentForm {
    pub text: String,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl CommentForm {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bound(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            errors: BTreeMap::new(),
        }
    }

    /// Validate against `policy`, recording field errors. Returns true when
    /// the form can be saved.
    pub fn validate(&mut self, policy: &ModerationPolicy) -> bool {
        self.errors.clear();

        if self.text.trim().is_empty() {
            self.add_error(TEXT_FIELD, FIELD_REQUIRED);
        } else if let Err(warning) = policy.check(&self.text) {
            let warning = warning.to_string();
            self.add_error(TEXT_FIELD, warning);
        }

        self.errors.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }
}
