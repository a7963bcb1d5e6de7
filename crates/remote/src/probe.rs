//! Liveness probe for the remote analysis service.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use url::Url;

use llm_governor_core::config::RemoteSettings;
use llm_governor_core::{AvailabilityProbe, Result};

use crate::client::endpoint;

/// Default probe bound.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// `GET {base}/health` with a short timeout. Fails closed.
pub struct HttpAvailabilityProbe {
    health_url: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpAvailabilityProbe {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            health_url: endpoint(base_url, "/health")?,
            client: reqwest::Client::new(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    /// Build from configuration. Requires `remote.base_url`.
    pub fn from_settings(settings: &RemoteSettings) -> Result<Self> {
        let base = settings.base_url.as_deref().ok_or_else(|| {
            llm_governor_core::Error::configuration("remote.base_url is required for the availability probe")
        })?;
        Ok(Self {
            health_url: endpoint(base, &settings.health_path)?,
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(settings.probe_timeout_ms),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share an existing connection pool.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn health_url(&self) -> &Url {
        &self.health_url
    }
}

#[async_trait]
impl AvailabilityProbe for HttpAvailabilityProbe {
    async fn is_remote_available(&self) -> bool {
        let start = Instant::now();
        let res = self
            .client
            .get(self.health_url.clone())
            .timeout(self.timeout)
            .send()
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match res {
            Ok(r) if r.status().is_success() => {
                tracing::debug!(url = %self.health_url, latency_ms, "Remote analysis service is up");
                true
            }
            Ok(r) => {
                tracing::warn!(url = %self.health_url, status = r.status().as_u16(), "Remote health check failed");
                false
            }
            Err(e) => {
                tracing::warn!(url = %self.health_url, latency_ms, error = %e, "Remote health check unreachable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_path_from_settings() {
        let settings = RemoteSettings {
            base_url: Some("http://agents:8080".into()),
            health_path: "/livez".into(),
            probe_timeout_ms: 250,
            ..Default::default()
        };
        let probe = HttpAvailabilityProbe::from_settings(&settings).unwrap();
        assert_eq!(probe.health_url().as_str(), "http://agents:8080/livez");
        assert_eq!(probe.timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let probe = HttpAvailabilityProbe::new("http://127.0.0.1:9")
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        assert!(!probe.is_remote_available().await);
    }
}
