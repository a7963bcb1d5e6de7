//! Builder for Orchestrator.

use std::sync::Arc;
use std::time::Duration;

use llm_governor_core::config::PersistenceMode;
use llm_governor_core::{Error, InteractionStore, RemoteAnalysis, Result};
use llm_governor_governance::{StatusResolver, ViolationDetector};

use crate::operator::BackendSwitch;
use crate::orchestrator::{Orchestrator, DEFAULT_REMOTE_TIMEOUT};
use crate::state::GovernanceConfig;

/// Builder for constructing an Orchestrator.
pub struct OrchestratorBuilder {
    detector: Option<Arc<ViolationDetector>>,
    remote: Option<Arc<dyn RemoteAnalysis>>,
    resolver: StatusResolver,
    store: Option<Arc<dyn InteractionStore>>,
    config: Option<Arc<GovernanceConfig>>,
    switch: Option<Arc<BackendSwitch>>,
    remote_timeout: Duration,
    persistence: PersistenceMode,
}

impl OrchestratorBuilder {
    /// Create a new builder with the built-in rules and canonical thresholds.
    pub fn new() -> Self {
        Self {
            detector: None,
            remote: None,
            resolver: StatusResolver::new(),
            store: None,
            config: None,
            switch: None,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            persistence: PersistenceMode::default(),
        }
    }

    /// Set the local detector.
    pub fn with_detector(mut self, detector: Arc<ViolationDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Set the remote analysis service.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteAnalysis>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Set the status resolver.
    pub fn with_resolver(mut self, resolver: StatusResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the interaction store.
    pub fn with_store(mut self, store: Arc<dyn InteractionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share a backend-selection handle.
    pub fn with_config(mut self, config: Arc<GovernanceConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Attach the operator switch. Its config handle replaces any set earlier.
    pub fn with_switch(mut self, switch: Arc<BackendSwitch>) -> Self {
        self.config = Some(Arc::clone(switch.config()));
        self.switch = Some(switch);
        self
    }

    /// Bound each remote analysis call.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Choose detached or inline persistence.
    pub fn with_persistence(mut self, mode: PersistenceMode) -> Self {
        self.persistence = mode;
        self
    }

    /// Build the Orchestrator. A store is required.
    pub fn build(self) -> Result<Orchestrator> {
        let store = self
            .store
            .ok_or_else(|| Error::configuration("an interaction store is required"))?;

        Ok(Orchestrator {
            detector: self
                .detector
                .unwrap_or_else(|| Arc::new(ViolationDetector::new())),
            remote: self.remote,
            resolver: self.resolver,
            store,
            config: self
                .config
                .unwrap_or_else(|| Arc::new(GovernanceConfig::default())),
            switch: self.switch,
            remote_timeout: self.remote_timeout,
            persistence: self.persistence,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_governor_core::mocks::StaticProbe;
    use llm_governor_store::InMemoryInteractionStore;

    #[test]
    fn test_store_is_required() {
        assert!(matches!(
            OrchestratorBuilder::new().build(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_switch_shares_config() {
        let config = Arc::new(GovernanceConfig::new(true));
        let switch = Arc::new(BackendSwitch::new(
            config.clone(),
            Some(Arc::new(StaticProbe::new(true))),
        ));
        let orch = OrchestratorBuilder::new()
            .with_store(Arc::new(InMemoryInteractionStore::new()))
            .with_switch(switch)
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(orch.config(), &config));
    }
}
