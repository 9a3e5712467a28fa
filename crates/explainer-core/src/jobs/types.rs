//! Job types and data structures for the explanation pipeline.

use serde::{Deserialize, Serialize};

/// One slide's extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Position in the source deck (0-based)
    pub index: usize,
    /// Extracted text, possibly empty
    pub content: String,
}

impl TextUnit {
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        Self {
            index,
            content: content.into(),
        }
    }

    /// Blank slides are skipped by the runner and never submitted.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Why a slide ended without an explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Quota exhausted or request rejected by the provider
    NonRetryable,
    /// Failure the client could not classify
    Unclassified,
    /// Every attempt was used up by rate limits or transient errors
    AttemptsExhausted,
}

/// Outcome of submitting one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ExplanationResult {
    /// The provider returned an explanation
    Explained { text: String },
    /// Terminal failure recorded in place of the explanation
    Failed {
        reason: FailureReason,
        message: String,
    },
}

impl ExplanationResult {
    pub fn explained(text: impl Into<String>) -> Self {
        Self::Explained { text: text.into() }
    }

    pub fn failed(reason: FailureReason, message: impl Into<String>) -> Self {
        Self::Failed {
            reason,
            message: message.into(),
        }
    }

    pub fn is_explained(&self) -> bool {
        matches!(self, Self::Explained { .. })
    }

    /// The explanation text, or the failure message.
    pub fn text(&self) -> &str {
        match self {
            Self::Explained { text } => text,
            Self::Failed { message, .. } => message,
        }
    }
}

/// Ordered results for every non-blank slide of one deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobOutcome {
    pub entries: Vec<ExplanationResult>,
}

impl JobOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ExplanationResult) {
        self.entries.push(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slides recorded as failures.
    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_explained()).count()
    }

    /// Entry texts in slide order.
    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(ExplanationResult::text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_detection_trims_whitespace() {
        assert!(TextUnit::new(0, "").is_blank());
        assert!(TextUnit::new(1, "  \n\t ").is_blank());
        assert!(!TextUnit::new(2, " x ").is_blank());
    }

    #[test]
    fn test_result_serializes_tagged() {
        let ok = serde_json::to_value(ExplanationResult::explained("hi")).unwrap();
        assert_eq!(ok, serde_json::json!({"status": "explained", "text": "hi"}));

        let failed = serde_json::to_value(ExplanationResult::failed(
            FailureReason::AttemptsExhausted,
            "gave up",
        ))
        .unwrap();
        assert_eq!(
            failed,
            serde_json::json!({
                "status": "failed",
                "reason": "attempts_exhausted",
                "message": "gave up"
            })
        );
    }

    #[test]
    fn test_outcome_is_a_plain_array() {
        let mut outcome = JobOutcome::new();
        outcome.push(ExplanationResult::explained("a"));
        outcome.push(ExplanationResult::failed(FailureReason::Unclassified, "b"));

        let value = serde_json::to_value(&outcome).unwrap();
        assert!(value.is_array());
        assert_eq!(outcome.failed_count(), 1);
        assert_eq!(outcome.texts(), vec!["a", "b"]);
    }
}
