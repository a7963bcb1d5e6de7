use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::action::AgentAction;
use super::feedback::Feedback;
use super::violation::Violation;

// =============================================================================
// Decision Types
// =============================================================================

/// Final decision for an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    /// Safe to release.
    Approved,
    /// Flagged for human review.
    Pending,
    /// Must not be released.
    Blocked,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity bucket derived from the worst violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBucket {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which analysis backend produced an interaction's violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// In-process rule engine.
    #[default]
    Local,
    /// Remote multi-agent analysis service.
    Remote,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Interaction
// =============================================================================

/// One governed prompt/response exchange and its decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Unique id, generated at ingestion.
    pub id: String,
    /// Original prompt.
    pub input: String,
    /// Model response.
    pub output: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Final decision.
    pub status: InteractionStatus,
    /// Bucket derived from the maximum violation severity.
    pub severity_bucket: SeverityBucket,
    /// Violations in detection order.
    #[serde(default)]
    pub violations: Vec<Violation>,
    /// Action log of the backend that ran.
    #[serde(default)]
    pub agent_actions: Vec<AgentAction>,
    /// Latest user feedback, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<Feedback>,
    /// Backend that produced the violations.
    #[serde(default)]
    pub backend: BackendKind,
}

impl Interaction {
    /// Allocate a new interaction with the `pending` working status.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            input: input.into(),
            output: output.into(),
            timestamp: Utc::now(),
            status: InteractionStatus::Pending,
            severity_bucket: SeverityBucket::Low,
            violations: Vec::new(),
            agent_actions: Vec::new(),
            user_feedback: None,
            backend: BackendKind::Local,
        }
    }

    /// Number of violations not yet resolved by an operator.
    pub fn open_violations(&self) -> usize {
        self.violations.iter().filter(|v| !v.resolved).count()
    }
}

/// Request handed to an analysis backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl AnalysisRequest {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Violations and actions returned by the remote analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteReport {
    pub violations: Vec<Violation>,
    pub agent_actions: Vec<AgentAction>,
}
