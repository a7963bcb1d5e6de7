//! User feedback on past decisions.

use std::sync::Arc;

use llm_governor_core::{Feedback, InteractionStore};
use llm_governor_governance::track_persistence_failure;

/// Attaches user feedback to stored interactions.
///
/// Feedback is annotation only. It never re-runs resolution and never
/// changes a stored status.
pub struct FeedbackRecorder {
    store: Arc<dyn InteractionStore>,
}

impl FeedbackRecorder {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store }
    }

    /// Record feedback, replacing any earlier feedback. Failures are logged.
    #[tracing::instrument(skip(self, feedback), fields(rating = ?feedback.rating))]
    pub async fn record_feedback(&self, interaction_id: &str, feedback: Feedback) {
        match self.store.save_feedback(interaction_id, &feedback).await {
            Ok(()) => tracing::debug!("Feedback recorded"),
            Err(e) => {
                track_persistence_failure("save_feedback");
                tracing::warn!(error = %e, "Failed to record feedback");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_governor_core::mocks::FailingInteractionStore;
    use llm_governor_core::FeedbackRating;

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let store = Arc::new(FailingInteractionStore::new());
        let recorder = FeedbackRecorder::new(store.clone());
        recorder
            .record_feedback("abc", Feedback::new(FeedbackRating::Negative))
            .await;
        assert_eq!(store.attempts(), 1);
    }
}
