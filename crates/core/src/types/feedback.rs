use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Feedback Types
// =============================================================================

/// User rating attached to an interaction after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackRating {
    Positive,
    Negative,
    Report,
}

/// Post-hoc feedback on a governed interaction.
///
/// Feedback is best-effort: a later event for the same interaction replaces
/// the earlier one and never touches the computed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: FeedbackRating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    /// Create feedback with no comment.
    pub fn new(rating: FeedbackRating) -> Self {
        Self {
            rating,
            comment: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a free-text comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}
