//! Operator control over backend selection.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use llm_governor_core::AvailabilityProbe;
use llm_governor_governance::track_probe;

use crate::state::{BackendStatus, GovernanceConfig};

/// Default age after which a probe result is refreshed before a batch.
pub const DEFAULT_PROBE_STALENESS: Duration = Duration::from_secs(30);

/// Reads and flips the backend preference, and owns probing.
///
/// Without a probe (no remote configured) the remote is always reported
/// unavailable.
pub struct BackendSwitch {
    config: Arc<GovernanceConfig>,
    probe: Option<Arc<dyn AvailabilityProbe>>,
    staleness: Duration,
}

impl BackendSwitch {
    pub fn new(config: Arc<GovernanceConfig>, probe: Option<Arc<dyn AvailabilityProbe>>) -> Self {
        Self {
            config,
            probe,
            staleness: DEFAULT_PROBE_STALENESS,
        }
    }

    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    pub fn config(&self) -> &Arc<GovernanceConfig> {
        &self.config
    }

    pub fn get_status(&self) -> BackendStatus {
        self.config.snapshot()
    }

    /// Set the preference and re-probe.
    pub async fn switch_backend(&self, prefer_remote: bool) -> BackendStatus {
        self.config.set_prefer_remote(prefer_remote);
        tracing::info!(prefer_remote, "Backend preference changed");
        self.refresh().await
    }

    /// Probe now and cache the result.
    pub async fn refresh(&self) -> BackendStatus {
        let available = match &self.probe {
            Some(probe) => probe.is_remote_available().await,
            None => false,
        };
        let previous = self.config.snapshot().remote_available;
        self.config.record_probe(available);
        track_probe(available);
        if previous != available {
            tracing::info!(remote_available = available, "Remote availability changed");
        }
        self.config.snapshot()
    }

    /// Probe only if the cached result is older than the staleness bound.
    pub async fn refresh_if_stale(&self) -> BackendStatus {
        if self.config.is_stale(self.staleness) {
            self.refresh().await
        } else {
            self.config.snapshot()
        }
    }

    /// Re-probe every `interval` until the handle is aborted.
    pub fn spawn_refresher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let switch = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                switch.refresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_governor_core::mocks::StaticProbe;

    #[tokio::test]
    async fn test_switch_triggers_probe() {
        let probe = Arc::new(StaticProbe::new(true));
        let switch = BackendSwitch::new(Arc::new(GovernanceConfig::new(false)), Some(probe.clone()));

        let status = switch.get_status();
        assert!(!status.prefer_remote);
        assert!(!status.remote_available);

        let status = switch.switch_backend(true).await;
        assert_eq!(
            status,
            BackendStatus {
                prefer_remote: true,
                remote_available: true
            }
        );
        assert_eq!(probe.probe_count(), 1);
    }

    #[tokio::test]
    async fn test_no_probe_means_unavailable() {
        let switch = BackendSwitch::new(Arc::new(GovernanceConfig::new(true)), None);
        let status = switch.switch_backend(true).await;
        assert!(status.prefer_remote);
        assert!(!status.remote_available);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_if_stale() {
        let probe = Arc::new(StaticProbe::new(true));
        let switch = BackendSwitch::new(Arc::new(GovernanceConfig::default()), Some(probe.clone()))
            .with_staleness(Duration::from_secs(30));

        switch.refresh_if_stale().await;
        switch.refresh_if_stale().await;
        assert_eq!(probe.probe_count(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        switch.refresh_if_stale().await;
        assert_eq!(probe.probe_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_tracks_availability() {
        let probe = Arc::new(StaticProbe::new(true));
        let switch = Arc::new(BackendSwitch::new(
            Arc::new(GovernanceConfig::new(true)),
            Some(probe.clone()),
        ));
        let handle = switch.spawn_refresher(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(switch.get_status().remote_available);

        probe.set_available(false);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!switch.get_status().remote_available);
        assert!(probe.probe_count() >= 2);

        handle.abort();
    }
}
