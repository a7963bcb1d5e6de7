//! In-memory interaction store using DashMap.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;

use llm_governor_core::{
    traits::{InteractionFilter, InteractionStore, StoreEvent},
    types::{Feedback, Interaction},
    Error, Result,
};

/// Capacity of the change-notification channel.
pub const EVENT_CAPACITY: usize = 256;

/// In-memory interaction store for tests and single-process deployments.
///
/// Feedback is kept beside the interactions so that feedback arriving before
/// a detached write lands is not lost.
pub struct InMemoryInteractionStore {
    interactions: DashMap<String, Interaction>,
    feedback: DashMap<String, Feedback>,
    events: broadcast::Sender<StoreEvent>,
}

impl InMemoryInteractionStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            interactions: DashMap::new(),
            feedback: DashMap::new(),
            events,
        }
    }

    /// Get the number of stored interactions.
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    fn with_feedback(&self, mut interaction: Interaction) -> Interaction {
        if let Some(fb) = self.feedback.get(&interaction.id) {
            interaction.user_feedback = Some(fb.clone());
        }
        interaction
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for InMemoryInteractionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InteractionStore for InMemoryInteractionStore {
    async fn save(&self, interaction: &Interaction) -> Result<()> {
        self.interactions
            .insert(interaction.id.clone(), interaction.clone());
        tracing::debug!(interaction_id = %interaction.id, status = %interaction.status, "Interaction saved");
        self.publish(StoreEvent::InteractionSaved(Box::new(interaction.clone())));
        Ok(())
    }

    async fn save_feedback(&self, interaction_id: &str, feedback: &Feedback) -> Result<()> {
        self.feedback
            .insert(interaction_id.to_string(), feedback.clone());
        self.publish(StoreEvent::FeedbackRecorded {
            interaction_id: interaction_id.to_string(),
            feedback: feedback.clone(),
        });
        Ok(())
    }

    async fn list(&self, filter: InteractionFilter) -> Result<Vec<Interaction>> {
        let mut result: Vec<Interaction> = self
            .interactions
            .iter()
            .map(|r| self.with_feedback(r.value().clone()))
            .filter(|i| filter.matches(i))
            .collect();

        result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = filter.limit {
            result.truncate(limit);
        }
        Ok(result)
    }

    async fn get_by_id(&self, interaction_id: &str) -> Result<Option<Interaction>> {
        let found = self.interactions.get(interaction_id).map(|r| r.clone());
        Ok(found.map(|i| self.with_feedback(i)))
    }

    async fn resolve_violation(&self, interaction_id: &str, index: usize) -> Result<bool> {
        let changed = {
            let mut entry = self
                .interactions
                .get_mut(interaction_id)
                .ok_or_else(|| Error::NotFound(format!("interaction {}", interaction_id)))?;
            let violation = entry.violations.get_mut(index).ok_or_else(|| {
                Error::NotFound(format!("violation {} of interaction {}", index, interaction_id))
            })?;
            let changed = !violation.resolved;
            violation.resolved = true;
            changed
        };

        if changed {
            self.publish(StoreEvent::ViolationResolved {
                interaction_id: interaction_id.to_string(),
                index,
            });
        }
        Ok(changed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
