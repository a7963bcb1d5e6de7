use config::{Config, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub governance: GovernanceSettings,
    pub remote: RemoteSettings,
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

/// How the orchestrator hands interactions to the store.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    /// Spawn the write; the caller never waits on storage.
    #[default]
    Detached,
    /// Await the write before returning. Failures are still swallowed.
    Inline,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GovernanceSettings {
    /// Initial operator preference for the remote backend.
    pub prefer_remote: bool,
    /// Age after which the cached probe result is refreshed before a batch.
    pub probe_staleness_secs: u64,
    /// Period of the background probe refresher. Zero disables it.
    pub probe_interval_secs: u64,
    pub persistence: PersistenceMode,
    pub thresholds: ThresholdSettings,
    /// Optional YAML rule overlay merged over the built-in detector table.
    pub rules_path: Option<String>,
}

impl Default for GovernanceSettings {
    fn default() -> Self {
        Self {
            prefer_remote: false,
            probe_staleness_secs: 30,
            probe_interval_secs: 60,
            persistence: PersistenceMode::Detached,
            thresholds: ThresholdSettings::default(),
            rules_path: None,
        }
    }
}

/// Severity thresholds for the status resolver (inclusive lower bounds).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ThresholdSettings {
    pub blocked: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            blocked: 8.0,
            high: 6.0,
            medium: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RemoteSettings {
    /// Base URL of the multi-agent analysis service.
    pub base_url: Option<String>,
    pub api_key: Option<Secret<String>>,
    pub analyze_path: String,
    pub health_path: String,
    pub analysis_timeout_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            analyze_path: "/analyze".into(),
            health_path: "/health".into(),
            analysis_timeout_ms: 15_000,
            probe_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub sqlite_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info,llm_governor=debug".into(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load layered configuration from `config/` files and `GOVERNOR__*` env vars.
    pub fn load() -> Result<Self> {
        let env = std::env::var("GOVERNOR_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map GOVERNOR__REMOTE__BASE_URL=... to remote.base_url
            .add_source(Environment::with_prefix("GOVERNOR").separator("__"))
            .build()?;

        let cfg: Self = s.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check startup invariants. Any failure here is fatal.
    pub fn validate(&self) -> Result<()> {
        let t = &self.governance.thresholds;
        if !(t.blocked >= t.high && t.high >= t.medium) {
            return Err(Error::configuration(format!(
                "thresholds must be ordered blocked >= high >= medium (got {} / {} / {})",
                t.blocked, t.high, t.medium
            )));
        }
        if [t.blocked, t.high, t.medium].iter().any(|v| !(0.0..=10.0).contains(v)) {
            return Err(Error::configuration("thresholds must lie within 0.0..=10.0"));
        }

        match &self.remote.base_url {
            Some(base) => {
                url::Url::parse(base).map_err(|e| {
                    Error::configuration(format!("invalid remote.base_url '{}': {}", base, e))
                })?;
            }
            None if self.governance.prefer_remote => {
                return Err(Error::configuration(
                    "governance.prefer_remote is set but remote.base_url is missing",
                ));
            }
            None => {}
        }

        if self.remote.analysis_timeout_ms == 0 || self.remote.probe_timeout_ms == 0 {
            return Err(Error::configuration("remote timeouts must be non-zero"));
        }

        if self.store.backend == StoreBackend::Sqlite && self.store.sqlite_path.is_none() {
            return Err(Error::configuration(
                "store.backend is sqlite but store.sqlite_path is missing",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.governance.thresholds, ThresholdSettings::default());
        assert_eq!(cfg.remote.probe_timeout_ms, 5_000);
    }

    #[test]
    fn test_prefer_remote_requires_base_url() {
        let mut cfg = AppConfig::default();
        cfg.governance.prefer_remote = true;
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));

        cfg.remote.base_url = Some("http://agents.internal:8080".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut cfg = AppConfig::default();
        cfg.remote.base_url = Some("not a url".into());
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let mut cfg = AppConfig::default();
        cfg.governance.thresholds.high = 9.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_sqlite_requires_path() {
        let mut cfg = AppConfig::default();
        cfg.store.backend = StoreBackend::Sqlite;
        assert!(cfg.validate().is_err());
        cfg.store.sqlite_path = Some("/tmp/governor.db".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let cfg: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                "governance:\n  prefer_remote: true\n  persistence: inline\nremote:\n  base_url: http://localhost:9000\n",
                config::FileFormat::Yaml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(cfg.governance.prefer_remote);
        assert_eq!(cfg.governance.persistence, PersistenceMode::Inline);
        assert_eq!(cfg.remote.analyze_path, "/analyze");
        assert!(cfg.validate().is_ok());
    }
}
