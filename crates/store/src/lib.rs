#![deny(unused)]
//! Persistence adapters for governed interactions.
//!
//! Both adapters implement [`InteractionStore`]: an in-memory store for tests
//! and single-process use, and a SQLite store with a tamper-evident audit log.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use llm_governor_core::config::{StoreBackend, StoreSettings};
use llm_governor_core::{Error, InteractionStore, Result};

pub use memory::InMemoryInteractionStore;
pub use sqlite::{AuditRecord, SqliteInteractionStore};

/// Build the configured store.
pub fn open_store(settings: &StoreSettings) -> Result<Arc<dyn InteractionStore>> {
    match settings.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory interaction store");
            Ok(Arc::new(InMemoryInteractionStore::new()))
        }
        StoreBackend::Sqlite => {
            let path = settings
                .sqlite_path
                .as_deref()
                .ok_or_else(|| Error::configuration("store.sqlite_path is required for the sqlite backend"))?;
            tracing::info!(path, "Using SQLite interaction store");
            Ok(Arc::new(SqliteInteractionStore::new(path)?))
        }
    }
}
