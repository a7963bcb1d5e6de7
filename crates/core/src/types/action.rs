use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Agent Action Types
// =============================================================================

/// What a pipeline stage did with the interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Flag,
    Block,
    Approve,
    Suggest,
    Log,
}

/// One entry of an interaction's action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    /// Internal stage or remote agent that produced the action.
    pub agent_name: String,
    /// Kind of action taken.
    pub action: ActionKind,
    /// Free-form details.
    pub details: String,
    /// When the action was recorded.
    pub timestamp: DateTime<Utc>,
}

impl AgentAction {
    /// Create an action stamped with the current time.
    pub fn new(agent_name: impl Into<String>, action: ActionKind, details: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            action,
            details: details.into(),
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for an informational `log` action.
    pub fn log(agent_name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(agent_name, ActionKind::Log, details)
    }
}
