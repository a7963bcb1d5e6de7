//! Shared backend-selection state.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const NEVER_PROBED: u64 = u64::MAX;

/// Operator-visible backend state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub prefer_remote: bool,
    pub remote_available: bool,
}

impl BackendStatus {
    /// The remote backend is used only when preferred and reachable.
    pub fn use_remote(&self) -> bool {
        self.prefer_remote && self.remote_available
    }
}

/// Process-wide handle read at the start of every governance call.
///
/// All fields are independent atomics. A reader may observe a preference
/// change before the matching probe result lands; that only affects which
/// backend one call uses.
#[derive(Debug)]
pub struct GovernanceConfig {
    prefer_remote: AtomicBool,
    remote_available: AtomicBool,
    /// Millis since `epoch` of the last probe, or `NEVER_PROBED`.
    last_probe_ms: AtomicU64,
    epoch: Instant,
}

impl GovernanceConfig {
    /// Start with the given preference and the remote marked unavailable.
    pub fn new(prefer_remote: bool) -> Self {
        Self {
            prefer_remote: AtomicBool::new(prefer_remote),
            remote_available: AtomicBool::new(false),
            last_probe_ms: AtomicU64::new(NEVER_PROBED),
            epoch: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> BackendStatus {
        BackendStatus {
            prefer_remote: self.prefer_remote.load(Ordering::Relaxed),
            remote_available: self.remote_available.load(Ordering::Relaxed),
        }
    }

    pub fn set_prefer_remote(&self, prefer_remote: bool) {
        self.prefer_remote.store(prefer_remote, Ordering::Relaxed);
    }

    /// Record a probe result and its time.
    pub fn record_probe(&self, available: bool) {
        self.remote_available.store(available, Ordering::Relaxed);
        let now = self.epoch.elapsed().as_millis() as u64;
        self.last_probe_ms.store(now, Ordering::Relaxed);
    }

    /// `true` if never probed or the last probe is older than `max_age`.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        let last = self.last_probe_ms.load(Ordering::Relaxed);
        if last == NEVER_PROBED {
            return true;
        }
        let now = self.epoch.elapsed().as_millis() as u64;
        now.saturating_sub(last) > max_age.as_millis() as u64
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_remote_requires_both_flags() {
        let config = GovernanceConfig::new(true);
        assert!(!config.snapshot().use_remote());
        config.record_probe(true);
        assert!(config.snapshot().use_remote());
        config.set_prefer_remote(false);
        assert!(!config.snapshot().use_remote());
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness() {
        let config = GovernanceConfig::default();
        assert!(config.is_stale(Duration::from_secs(30)));

        config.record_probe(false);
        assert!(!config.is_stale(Duration::from_secs(30)));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(config.is_stale(Duration::from_secs(30)));
    }
}
