//! Persistence adapter traits.

use async_trait::async_trait;
use tokio::sync::broadcast;
use crate::error::Result;
use crate::types::{BackendKind, Feedback, Interaction, InteractionStatus};

/// Change notification emitted by a store.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A completed interaction was written.
    InteractionSaved(Box<Interaction>),
    /// Feedback was recorded (possibly replacing earlier feedback).
    FeedbackRecorded {
        interaction_id: String,
        feedback: Feedback,
    },
    /// An operator resolved one violation.
    ViolationResolved {
        interaction_id: String,
        index: usize,
    },
}

/// Filter for listing interactions.
#[derive(Debug, Clone, Default)]
pub struct InteractionFilter {
    pub status: Option<InteractionStatus>,
    pub backend: Option<BackendKind>,
    /// Only interactions with at least one unresolved violation.
    pub unresolved_only: bool,
    pub limit: Option<usize>,
}

impl InteractionFilter {
    /// Check whether an interaction passes the filter (limit excluded).
    pub fn matches(&self, interaction: &Interaction) -> bool {
        self.status.map_or(true, |s| interaction.status == s)
            && self.backend.map_or(true, |b| interaction.backend == b)
            && (!self.unresolved_only || interaction.open_violations() > 0)
    }
}

/// Durable storage for governed interactions.
///
/// The governance core only writes through this trait; the query and
/// subscription operations serve downstream consumers.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Persist a completed interaction.
    async fn save(&self, interaction: &Interaction) -> Result<()>;

    /// Attach feedback to an interaction, replacing any earlier feedback.
    async fn save_feedback(&self, interaction_id: &str, feedback: &Feedback) -> Result<()>;

    /// List interactions, newest first.
    async fn list(&self, filter: InteractionFilter) -> Result<Vec<Interaction>>;

    /// Fetch one interaction with its latest feedback.
    async fn get_by_id(&self, interaction_id: &str) -> Result<Option<Interaction>>;

    /// Mark a violation resolved. Returns `false` if it was already resolved.
    async fn resolve_violation(&self, interaction_id: &str, index: usize) -> Result<bool>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
