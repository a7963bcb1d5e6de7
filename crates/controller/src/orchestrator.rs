//! The governance pipeline: analyse, resolve, persist.

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

use llm_governor_core::config::PersistenceMode;
use llm_governor_core::{
    ActionKind, AgentAction, AnalysisRequest, BackendKind, Error, Interaction, InteractionStatus,
    InteractionStore, RemoteAnalysis,
};
use llm_governor_governance::{
    track_decision, track_fallback, track_persistence_failure, StatusResolver, ViolationDetector,
};

use crate::backend::AnalysisBackend;
use crate::operator::BackendSwitch;
use crate::state::GovernanceConfig;

/// Agent name on the fallback action.
pub const ORCHESTRATOR: &str = "Orchestrator";
/// Details of the fallback action.
pub const FALLBACK_DETAILS: &str = "fallback to local";
/// Agent name of the local stage that reports the final status.
pub const VERIFIER: &str = "verifier";

/// Default bound on one remote analysis call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

/// Drives each interaction through one backend, the resolver and the store.
///
/// A call always yields a decision. Remote failures fall back to the local
/// rule engine and storage failures are only logged.
pub struct Orchestrator {
    pub(crate) detector: Arc<ViolationDetector>,
    pub(crate) remote: Option<Arc<dyn RemoteAnalysis>>,
    pub(crate) resolver: StatusResolver,
    pub(crate) store: Arc<dyn InteractionStore>,
    pub(crate) config: Arc<GovernanceConfig>,
    pub(crate) switch: Option<Arc<BackendSwitch>>,
    pub(crate) remote_timeout: Duration,
    pub(crate) persistence: PersistenceMode,
}

impl Orchestrator {
    pub fn config(&self) -> &Arc<GovernanceConfig> {
        &self.config
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }

    fn local_backend(&self) -> AnalysisBackend {
        AnalysisBackend::LocalRuleEngine(Arc::clone(&self.detector))
    }

    fn select_backend(&self) -> AnalysisBackend {
        match &self.remote {
            Some(remote) if self.config.snapshot().use_remote() => {
                AnalysisBackend::RemoteAgentService(Arc::clone(remote))
            }
            _ => self.local_backend(),
        }
    }

    /// Govern one exchange.
    pub async fn process_interaction(
        &self,
        input: &str,
        output: &str,
        context: Option<serde_json::Value>,
    ) -> Interaction {
        let mut request = AnalysisRequest::new(input, output);
        request.context = context;
        self.process_request(request).await
    }

    /// Govern one exchange given as a request.
    #[tracing::instrument(
        skip_all,
        fields(interaction_id = tracing::field::Empty, backend = tracing::field::Empty)
    )]
    pub async fn process_request(&self, request: AnalysisRequest) -> Interaction {
        let start = Instant::now();
        let mut interaction = Interaction::new(request.input.clone(), request.output.clone());
        let span = tracing::Span::current();
        span.record("interaction_id", interaction.id.as_str());

        let mut backend = self.select_backend();
        let report = match backend.analyze(&request, self.remote_timeout).await {
            Ok(report) => report,
            Err(e) => {
                track_fallback(fallback_kind(&e));
                tracing::warn!(error = %e, "Remote analysis failed, falling back to local rules");
                interaction
                    .agent_actions
                    .push(AgentAction::log(ORCHESTRATOR, FALLBACK_DETAILS));
                backend = self.local_backend();
                match backend.analyze(&request, self.remote_timeout).await {
                    Ok(report) => report,
                    Err(e) => {
                        // The local engine cannot fail; keep the decision path total anyway.
                        tracing::error!(error = %e, "Local analysis failed");
                        Default::default()
                    }
                }
            }
        };

        interaction.backend = backend.kind();
        span.record("backend", interaction.backend.as_str());
        interaction.violations.extend(report.violations);
        interaction.agent_actions.extend(report.agent_actions);

        let resolution = self.resolver.resolve(&interaction.violations);
        interaction.status = resolution.status;
        interaction.severity_bucket = resolution.severity_bucket;

        if interaction.backend == BackendKind::Local {
            interaction.agent_actions.push(verifier_action(resolution.status));
        }

        tracing::info!(
            status = %interaction.status,
            severity = %interaction.severity_bucket.as_str(),
            violations = interaction.violations.len(),
            "Interaction governed"
        );
        track_decision(
            interaction.status,
            interaction.backend,
            start.elapsed().as_secs_f64(),
        );

        self.persist(&interaction).await;
        interaction
    }

    /// Govern several exchanges concurrently. Results keep request order.
    ///
    /// The probe cache is refreshed first if it has gone stale.
    pub async fn process_batch(&self, requests: Vec<AnalysisRequest>) -> Vec<Interaction> {
        if let Some(switch) = &self.switch {
            switch.refresh_if_stale().await;
        }
        tracing::debug!(count = requests.len(), "Processing batch");
        join_all(requests.into_iter().map(|r| self.process_request(r))).await
    }

    async fn persist(&self, interaction: &Interaction) {
        match self.persistence {
            PersistenceMode::Inline => save_logged(self.store.as_ref(), interaction).await,
            PersistenceMode::Detached => {
                let store = Arc::clone(&self.store);
                let interaction = interaction.clone();
                tokio::spawn(async move {
                    save_logged(store.as_ref(), &interaction).await;
                });
            }
        }
    }
}

async fn save_logged(store: &dyn InteractionStore, interaction: &Interaction) {
    if let Err(e) = store.save(interaction).await {
        track_persistence_failure("save");
        tracing::warn!(
            interaction_id = %interaction.id,
            status = %interaction.status,
            error = %e,
            "Failed to persist interaction"
        );
    }
}

fn fallback_kind(error: &Error) -> &'static str {
    match error {
        Error::RemoteUnavailable(msg) if msg.contains("timed out") => "timeout",
        Error::RemoteAnalysisMalformed(_) => "malformed",
        e if e.is_remote_failure() => "unavailable",
        _ => "other",
    }
}

fn verifier_action(status: InteractionStatus) -> AgentAction {
    match status {
        InteractionStatus::Blocked => {
            AgentAction::new(VERIFIER, ActionKind::Block, "Interaction blocked")
        }
        InteractionStatus::Pending => {
            AgentAction::new(VERIFIER, ActionKind::Flag, "Interaction held for review")
        }
        InteractionStatus::Approved => {
            AgentAction::new(VERIFIER, ActionKind::Approve, "Interaction approved")
        }
    }
}
