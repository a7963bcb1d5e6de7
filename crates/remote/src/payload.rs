//! Wire shapes of the remote analysis service and their mapping into core types.
//!
//! The service has shipped both snake_case and camelCase field names; both are
//! accepted. Anything that cannot be mapped is `RemoteAnalysisMalformed`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use llm_governor_core::{ActionKind, AgentAction, Error, RemoteReport, Result, Violation, ViolationType};

#[derive(Debug, Deserialize)]
pub(crate) struct AnalysisResponse {
    violations: Vec<WireViolation>,
    #[serde(default, alias = "agentActions")]
    agent_actions: Vec<WireAction>,
}

#[derive(Debug, Deserialize)]
struct WireViolation {
    #[serde(rename = "type")]
    violation_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    reason: Option<String>,
    severity: f64,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default, alias = "regulatoryFramework")]
    regulatory_framework: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAction {
    #[serde(alias = "agentName")]
    agent_name: String,
    action: String,
    #[serde(default)]
    details: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

fn default_confidence() -> f64 {
    1.0
}

fn parse_action(raw: &str) -> Option<ActionKind> {
    match raw.trim().to_lowercase().as_str() {
        "flag" => Some(ActionKind::Flag),
        "block" => Some(ActionKind::Block),
        "approve" => Some(ActionKind::Approve),
        "suggest" => Some(ActionKind::Suggest),
        "log" => Some(ActionKind::Log),
        _ => None,
    }
}

impl WireViolation {
    fn into_violation(self) -> Result<Violation> {
        if self.violation_type.trim().is_empty() {
            return Err(Error::malformed("violation with empty type"));
        }
        if !(0.0..=10.0).contains(&self.severity) {
            return Err(Error::malformed(format!(
                "violation '{}' has severity {} outside 0.0..=10.0",
                self.violation_type, self.severity
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::malformed(format!(
                "violation '{}' has confidence {} outside 0.0..=1.0",
                self.violation_type, self.confidence
            )));
        }

        let reason = self.reason.unwrap_or_else(|| self.description.clone());
        Ok(Violation {
            violation_type: ViolationType::from(self.violation_type),
            description: self.description,
            reason,
            severity: self.severity,
            confidence: self.confidence,
            regulatory_framework: self.regulatory_framework.unwrap_or_default(),
            resolved: false,
        })
    }
}

impl WireAction {
    fn into_action(self) -> Result<AgentAction> {
        let action = parse_action(&self.action).ok_or_else(|| {
            Error::malformed(format!("agent '{}' reported unknown action '{}'", self.agent_name, self.action))
        })?;
        Ok(AgentAction {
            agent_name: self.agent_name,
            action,
            details: self.details,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

impl AnalysisResponse {
    /// Decode a response body.
    pub(crate) fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::malformed(format!("undecodable body: {}", e)))
    }

    /// Map into core types, rejecting the whole report on the first bad entry.
    pub(crate) fn into_report(self) -> Result<RemoteReport> {
        let violations = self
            .violations
            .into_iter()
            .map(WireViolation::into_violation)
            .collect::<Result<Vec<_>>>()?;
        let agent_actions = self
            .agent_actions
            .into_iter()
            .map(WireAction::into_action)
            .collect::<Result<Vec<_>>>()?;
        Ok(RemoteReport {
            violations,
            agent_actions,
        })
    }
}
