//! HTTP client for the remote multi-agent analysis service.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use url::Url;

use llm_governor_core::config::RemoteSettings;
use llm_governor_core::{AnalysisRequest, Error, RemoteAnalysis, RemoteReport, Result};

use crate::payload::AnalysisResponse;

/// Default bound on a single analysis call.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(15);

/// Build `{base}{path}` as a validated URL.
pub(crate) fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| Error::configuration(format!("invalid remote endpoint '{}': {}", joined, e)))
}

/// Remote analysis client.
pub struct RemoteAgentClient {
    analyze_url: Url,
    client: reqwest::Client,
    api_key: Option<Secret<String>>,
    timeout: Duration,
}

impl RemoteAgentClient {
    /// Create a client posting to `{base_url}/analyze`.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            analyze_url: endpoint(base_url, "/analyze")?,
            client: reqwest::Client::new(),
            api_key: None,
            timeout: DEFAULT_ANALYSIS_TIMEOUT,
        })
    }

    /// Build from configuration. Requires `remote.base_url`.
    pub fn from_settings(settings: &RemoteSettings) -> Result<Self> {
        let base = settings
            .base_url
            .as_deref()
            .ok_or_else(|| Error::configuration("remote.base_url is required for the remote backend"))?;
        let mut client = Self::new(base)?
            .with_path(base, &settings.analyze_path)?
            .with_timeout(Duration::from_millis(settings.analysis_timeout_ms));
        client.api_key = settings.api_key.clone();
        Ok(client)
    }

    /// Override the analysis path.
    pub fn with_path(mut self, base_url: &str, path: &str) -> Result<Self> {
        self.analyze_url = endpoint(base_url, path)?;
        Ok(self)
    }

    /// Set the bearer token sent with each call.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(key.into()));
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share an existing connection pool.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn analyze_url(&self) -> &Url {
        &self.analyze_url
    }
}

#[async_trait]
impl RemoteAnalysis for RemoteAgentClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<RemoteReport> {
        let mut builder = self
            .client
            .post(self.analyze_url.clone())
            .json(request)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::remote_unavailable(format!("analysis timed out after {:?}", self.timeout))
            } else {
                Error::remote_unavailable(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::remote_unavailable(format!(
                "service returned {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::remote_unavailable(format!("failed to read body: {}", e)))?;

        let report = AnalysisResponse::from_slice(&body)?.into_report()?;
        tracing::debug!(
            violations = report.violations.len(),
            actions = report.agent_actions.len(),
            "Remote analysis completed"
        );
        Ok(report)
    }
}
