#![deny(unused)]
//! LLM Governor - governance decisions for language-model exchanges.
//!
//! Wires the detector, resolver, remote client, probe, store and orchestrator
//! from one [`AppConfig`]. A transport (HTTP handler, CLI) sits on top of
//! [`Governor`] and is not part of this crate.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use llm_governor_controller::{
    BackendStatus, BackendSwitch, FeedbackRecorder, GovernanceConfig, Orchestrator,
    OrchestratorBuilder,
};
use llm_governor_core::{
    AnalysisRequest, AvailabilityProbe, Feedback, Interaction, InteractionStore, RemoteAnalysis,
    Result,
};
use llm_governor_governance::{PrometheusHandle, RuleSet, StatusResolver, ViolationDetector};
use llm_governor_remote::{HttpAvailabilityProbe, RemoteAgentClient};

pub use llm_governor_core::config::AppConfig;

/// A fully wired governance pipeline.
pub struct Governor {
    orchestrator: Orchestrator,
    recorder: FeedbackRecorder,
    switch: Arc<BackendSwitch>,
    store: Arc<dyn InteractionStore>,
    probe_interval: Duration,
    metrics: Option<PrometheusHandle>,
}

impl Governor {
    /// Load layered configuration, install tracing and the Prometheus
    /// recorder, then build the pipeline.
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::load().context("Failed to load governor configuration")?;
        llm_governor_governance::configure_tracing(&config.logging)
            .context("Failed to initialize tracing")?;
        tracing::info!("Starting LLM Governor v{}", env!("CARGO_PKG_VERSION"));
        let metrics = llm_governor_governance::setup_metrics_recorder()
            .context("Failed to initialize metrics")?;
        let governor = Self::new(config).await.context("Failed to build governor")?;
        Ok(governor.with_metrics(metrics))
    }

    /// Build the pipeline and run the initial probe.
    ///
    /// Only configuration problems fail here; an unreachable remote is not
    /// an error.
    pub async fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let mut rules = RuleSet::builtin();
        if let Some(path) = &config.governance.rules_path {
            rules.merge(RuleSet::load(path)?);
            tracing::info!(path = %path, rules = rules.rules.len(), "Loaded rule overlay");
        }
        let detector = Arc::new(ViolationDetector::from_rules(&rules)?);
        tracing::info!(categories = ?detector.categories(), "Rule engine ready");
        let resolver = StatusResolver::with_thresholds(config.governance.thresholds.into());

        let store = llm_governor_store::open_store(&config.store)?;

        let mut remote: Option<Arc<dyn RemoteAnalysis>> = None;
        let mut probe: Option<Arc<dyn AvailabilityProbe>> = None;
        if config.remote.base_url.is_some() {
            remote = Some(Arc::new(RemoteAgentClient::from_settings(&config.remote)?));
            probe = Some(Arc::new(HttpAvailabilityProbe::from_settings(&config.remote)?));
        } else {
            tracing::info!("No remote analysis service configured, using local rules only");
        }

        let governance = Arc::new(GovernanceConfig::new(config.governance.prefer_remote));
        let switch = Arc::new(
            BackendSwitch::new(governance, probe)
                .with_staleness(Duration::from_secs(config.governance.probe_staleness_secs)),
        );

        let mut builder = OrchestratorBuilder::new()
            .with_detector(detector)
            .with_resolver(resolver)
            .with_store(Arc::clone(&store))
            .with_switch(Arc::clone(&switch))
            .with_remote_timeout(Duration::from_millis(config.remote.analysis_timeout_ms))
            .with_persistence(config.governance.persistence);
        if let Some(remote) = remote {
            builder = builder.with_remote(remote);
        }
        let orchestrator = builder.build()?;

        let status = switch.refresh().await;
        tracing::info!(
            prefer_remote = status.prefer_remote,
            remote_available = status.remote_available,
            "Governor ready"
        );

        Ok(Self {
            orchestrator,
            recorder: FeedbackRecorder::new(Arc::clone(&store)),
            switch,
            store,
            probe_interval: Duration::from_secs(config.governance.probe_interval_secs),
            metrics: None,
        })
    }

    /// Attach an installed Prometheus recorder so a transport can render it.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Start the periodic probe. `None` when the interval is zero.
    pub fn start_background_refresh(&self) -> Option<JoinHandle<()>> {
        if self.probe_interval.is_zero() {
            return None;
        }
        Some(self.switch.spawn_refresher(self.probe_interval))
    }

    /// Govern one exchange.
    pub async fn process(
        &self,
        input: &str,
        output: &str,
        context: Option<serde_json::Value>,
    ) -> Interaction {
        self.orchestrator.process_interaction(input, output, context).await
    }

    /// Govern several exchanges concurrently, in request order.
    pub async fn process_batch(&self, requests: Vec<AnalysisRequest>) -> Vec<Interaction> {
        self.orchestrator.process_batch(requests).await
    }

    /// Attach feedback to a past interaction.
    pub async fn record_feedback(&self, interaction_id: &str, feedback: Feedback) {
        self.recorder.record_feedback(interaction_id, feedback).await
    }

    pub fn status(&self) -> BackendStatus {
        self.switch.get_status()
    }

    pub async fn switch_backend(&self, prefer_remote: bool) -> BackendStatus {
        self.switch.switch_backend(prefer_remote).await
    }

    pub fn store(&self) -> &Arc<dyn InteractionStore> {
        &self.store
    }

    /// Prometheus text exposition, when a recorder is attached.
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics.as_ref().map(PrometheusHandle::render)
    }
}
