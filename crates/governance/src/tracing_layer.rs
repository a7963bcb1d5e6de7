//! Structured logging configuration.

use llm_governor_core::config::LoggingSettings;
use llm_governor_core::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured filter. Fails if a global subscriber
/// is already set.
pub fn configure_tracing(settings: &LoggingSettings) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .map_err(|e| Error::configuration(format!("invalid log filter '{}': {}", settings.filter, e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if settings.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.map_err(|e| Error::internal(format!("Failed to install tracing subscriber: {}", e)))?;
    tracing::debug!(json = settings.json, "Tracing configured");
    Ok(())
}
