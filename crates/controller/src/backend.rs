//! Analysis backend dispatch.

use std::sync::Arc;
use std::time::Duration;

use llm_governor_core::{
    ActionKind, AgentAction, AnalysisRequest, BackendKind, Error, RemoteAnalysis, RemoteReport,
    Result,
};
use llm_governor_governance::ViolationDetector;

/// Agent name of the local stage that reports the violation count.
pub const POLICY_ENFORCER: &str = "policy-enforcer";

/// One of the two ways an interaction can be analysed.
#[derive(Clone)]
pub enum AnalysisBackend {
    /// In-process pattern matcher. Cannot fail.
    LocalRuleEngine(Arc<ViolationDetector>),
    /// External multi-agent service. Every failure is recoverable.
    RemoteAgentService(Arc<dyn RemoteAnalysis>),
}

impl AnalysisBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::LocalRuleEngine(_) => BackendKind::Local,
            Self::RemoteAgentService(_) => BackendKind::Remote,
        }
    }

    /// Run the backend. The remote variant is bounded by `timeout`.
    pub async fn analyze(&self, request: &AnalysisRequest, timeout: Duration) -> Result<RemoteReport> {
        match self {
            Self::LocalRuleEngine(detector) => Ok(local_report(detector, request)),
            Self::RemoteAgentService(remote) => {
                match tokio::time::timeout(timeout, remote.analyze(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::remote_unavailable(format!(
                        "analysis timed out after {:?}",
                        timeout
                    ))),
                }
            }
        }
    }
}

fn local_report(detector: &ViolationDetector, request: &AnalysisRequest) -> RemoteReport {
    let violations = detector.detect(&request.input, &request.output);
    let enforcer = if violations.is_empty() {
        AgentAction::new(POLICY_ENFORCER, ActionKind::Approve, "No policy violations detected")
    } else {
        AgentAction::new(
            POLICY_ENFORCER,
            ActionKind::Flag,
            format!("Detected {} policy violation(s)", violations.len()),
        )
    };
    RemoteReport {
        violations,
        agent_actions: vec![enforcer],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_governor_core::mocks::{MockRemoteAnalysis, RemoteScript};

    #[tokio::test]
    async fn test_local_flags_violations() {
        let backend = AnalysisBackend::LocalRuleEngine(Arc::new(ViolationDetector::new()));
        let report = backend
            .analyze(
                &AnalysisRequest::new("how to kill my neighbor", "I can't help."),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(backend.kind(), BackendKind::Local);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.agent_actions[0].agent_name, POLICY_ENFORCER);
        assert_eq!(report.agent_actions[0].action, ActionKind::Flag);
    }

    #[tokio::test]
    async fn test_local_approves_clean_input() {
        let backend = AnalysisBackend::LocalRuleEngine(Arc::new(ViolationDetector::new()));
        let report = backend
            .analyze(
                &AnalysisRequest::new("What is the weather like today?", "It is sunny."),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert!(report.violations.is_empty());
        assert_eq!(report.agent_actions[0].action, ActionKind::Approve);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_timeout_is_unavailable() {
        let remote = Arc::new(MockRemoteAnalysis::new(vec![RemoteScript::Hang(
            Duration::from_secs(60),
        )]));
        let backend = AnalysisBackend::RemoteAgentService(remote);
        let err = backend
            .analyze(&AnalysisRequest::new("a", "b"), Duration::from_secs(15))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RemoteUnavailable(_)));
    }
}
