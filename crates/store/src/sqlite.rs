//! SQLite-backed interaction store with a hash-chained audit log.
//!
//! Every write appends an audit row whose hash covers the previous row's
//! hash, so edits to history are detectable with [`SqliteInteractionStore::verify_audit_chain`].

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

use llm_governor_core::{
    traits::{InteractionFilter, InteractionStore, StoreEvent},
    types::{Feedback, Interaction},
    Error, Result,
};

use crate::memory::EVENT_CAPACITY;

/// `previous_hash` of the first audit row.
const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// One row of the audit log.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub seq: i64,
    pub interaction_id: String,
    pub event: String,
    pub payload_hash: String,
    pub previous_hash: String,
    pub hash: String,
    pub recorded_at: String,
}

impl AuditRecord {
    fn compute_hash(
        previous_hash: &str,
        interaction_id: &str,
        event: &str,
        payload_hash: &str,
        recorded_at: &str,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(previous_hash.as_bytes());
        hasher.update(b"|");
        hasher.update(interaction_id.as_bytes());
        hasher.update(b"|");
        hasher.update(event.as_bytes());
        hasher.update(b"|");
        hasher.update(payload_hash.as_bytes());
        hasher.update(b"|");
        hasher.update(recorded_at.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn is_intact(&self) -> bool {
        self.hash
            == Self::compute_hash(
                &self.previous_hash,
                &self.interaction_id,
                &self.event,
                &self.payload_hash,
                &self.recorded_at,
            )
    }
}

fn db_err(context: &'static str) -> impl Fn(rusqlite::Error) -> Error {
    move |e| Error::persistence(format!("{}: {}", context, e))
}

fn join_err(e: tokio::task::JoinError) -> Error {
    Error::internal(format!("store task failed: {}", e))
}

fn append_audit(
    conn: &Connection,
    interaction_id: &str,
    event: &str,
    payload: &str,
) -> rusqlite::Result<()> {
    let previous_hash: String = conn
        .query_row(
            "SELECT hash FROM audit_log ORDER BY seq DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or_else(|| GENESIS_HASH.to_string());
    let payload_hash = hex::encode(Sha256::digest(payload.as_bytes()));
    let recorded_at = Utc::now().to_rfc3339();
    let hash = AuditRecord::compute_hash(
        &previous_hash,
        interaction_id,
        event,
        &payload_hash,
        &recorded_at,
    );

    conn.execute(
        "INSERT INTO audit_log (interaction_id, event, payload_hash, previous_hash, hash, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![interaction_id, event, payload_hash, previous_hash, hash, recorded_at],
    )?;
    Ok(())
}

fn decode_row(payload: String, feedback: Option<String>) -> Result<Interaction> {
    let mut interaction: Interaction = serde_json::from_str(&payload)?;
    if let Some(fb) = feedback {
        interaction.user_feedback = Some(serde_json::from_str(&fb)?);
    }
    Ok(interaction)
}

/// Durable interaction store on a single SQLite file.
pub struct SqliteInteractionStore {
    conn: Arc<tokio::sync::Mutex<Connection>>,
    events: broadcast::Sender<StoreEvent>,
}

impl SqliteInteractionStore {
    /// Open (or create) the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err("open"))?;
        Self::with_connection(conn)
    }

    /// Private in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("open"))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS interactions (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                severity_bucket TEXT NOT NULL,
                backend TEXT NOT NULL,
                timestamp_us INTEGER NOT NULL,
                payload TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_interactions_status ON interactions (status);
            CREATE INDEX IF NOT EXISTS idx_interactions_ts ON interactions (timestamp_us);
            CREATE TABLE IF NOT EXISTS feedback (
                interaction_id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS audit_log (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                interaction_id TEXT NOT NULL,
                event TEXT NOT NULL,
                payload_hash TEXT NOT NULL,
                previous_hash TEXT NOT NULL,
                hash TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );",
        )
        .map_err(db_err("schema"))?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            conn: Arc::new(tokio::sync::Mutex::new(conn)),
            events,
        })
    }

    fn publish(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }

    /// Audit rows in insertion order.
    pub async fn audit_log(&self) -> Result<Vec<AuditRecord>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<AuditRecord>> {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(
                    "SELECT seq, interaction_id, event, payload_hash, previous_hash, hash, recorded_at
                     FROM audit_log ORDER BY seq ASC",
                )
                .map_err(db_err("prepare"))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(AuditRecord {
                        seq: row.get(0)?,
                        interaction_id: row.get(1)?,
                        event: row.get(2)?,
                        payload_hash: row.get(3)?,
                        previous_hash: row.get(4)?,
                        hash: row.get(5)?,
                        recorded_at: row.get(6)?,
                    })
                })
                .map_err(db_err("query"))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(db_err("row"))?;
            Ok(rows)
        })
        .await
        .map_err(join_err)?
    }

    /// Recompute the audit chain. `false` if any row was altered or removed.
    pub async fn verify_audit_chain(&self) -> Result<bool> {
        let records = self.audit_log().await?;
        let mut expected_previous = GENESIS_HASH.to_string();
        for record in &records {
            if record.previous_hash != expected_previous || !record.is_intact() {
                tracing::warn!(seq = record.seq, "Audit chain broken");
                return Ok(false);
            }
            expected_previous = record.hash.clone();
        }
        Ok(true)
    }
}

#[async_trait]
impl InteractionStore for SqliteInteractionStore {
    async fn save(&self, interaction: &Interaction) -> Result<()> {
        let payload = serde_json::to_string(interaction)?;
        let id = interaction.id.clone();
        let status = interaction.status.as_str();
        let bucket = interaction.severity_bucket.as_str();
        let backend = interaction.backend.as_str();
        let ts = interaction.timestamp.timestamp_micros();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction().map_err(db_err("begin"))?;
            tx.execute(
                "INSERT OR REPLACE INTO interactions (id, status, severity_bucket, backend, timestamp_us, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, status, bucket, backend, ts, payload],
            )
            .map_err(db_err("insert interaction"))?;
            append_audit(&tx, &id, "interaction_saved", &payload).map_err(db_err("audit"))?;
            tx.commit().map_err(db_err("commit"))
        })
        .await
        .map_err(join_err)??;

        tracing::debug!(interaction_id = %interaction.id, status = %interaction.status, "Interaction persisted");
        self.publish(StoreEvent::InteractionSaved(Box::new(interaction.clone())));
        Ok(())
    }

    async fn save_feedback(&self, interaction_id: &str, feedback: &Feedback) -> Result<()> {
        let payload = serde_json::to_string(feedback)?;
        let id = interaction_id.to_string();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction().map_err(db_err("begin"))?;
            tx.execute(
                "INSERT OR REPLACE INTO feedback (interaction_id, payload, recorded_at) VALUES (?1, ?2, ?3)",
                params![id, payload, Utc::now().to_rfc3339()],
            )
            .map_err(db_err("insert feedback"))?;
            append_audit(&tx, &id, "feedback_recorded", &payload).map_err(db_err("audit"))?;
            tx.commit().map_err(db_err("commit"))
        })
        .await
        .map_err(join_err)??;

        self.publish(StoreEvent::FeedbackRecorded {
            interaction_id: interaction_id.to_string(),
            feedback: feedback.clone(),
        });
        Ok(())
    }

    async fn list(&self, filter: InteractionFilter) -> Result<Vec<Interaction>> {
        let status = filter.status.map(|s| s.as_str());
        let backend = filter.backend.map(|b| b.as_str());

        let conn = self.conn.clone();
        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<(String, Option<String>)>> {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(
                    "SELECT i.payload, f.payload FROM interactions i
                     LEFT JOIN feedback f ON f.interaction_id = i.id
                     WHERE (?1 IS NULL OR i.status = ?1) AND (?2 IS NULL OR i.backend = ?2)
                     ORDER BY i.timestamp_us DESC",
                )
                .map_err(db_err("prepare"))?;
            let rows = stmt
                .query_map(params![status, backend], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
                })
                .map_err(db_err("query"))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(db_err("row"))?;
            Ok(rows)
        })
        .await
        .map_err(join_err)??;

        let mut result = Vec::with_capacity(rows.len());
        for (payload, fb) in rows {
            let interaction = decode_row(payload, fb)?;
            if filter.matches(&interaction) {
                result.push(interaction);
            }
            if filter.limit.is_some_and(|l| result.len() >= l) {
                break;
            }
        }
        Ok(result)
    }

    async fn get_by_id(&self, interaction_id: &str) -> Result<Option<Interaction>> {
        let id = interaction_id.to_string();
        let conn = self.conn.clone();
        let row = tokio::task::spawn_blocking(move || -> Result<Option<(String, Option<String>)>> {
            let conn = conn.blocking_lock();
            conn.query_row(
                "SELECT i.payload, f.payload FROM interactions i
                 LEFT JOIN feedback f ON f.interaction_id = i.id
                 WHERE i.id = ?1",
                params![id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()
            .map_err(db_err("query"))
        })
        .await
        .map_err(join_err)??;

        row.map(|(payload, fb)| decode_row(payload, fb)).transpose()
    }

    async fn resolve_violation(&self, interaction_id: &str, index: usize) -> Result<bool> {
        let id = interaction_id.to_string();
        let conn = self.conn.clone();
        let changed = tokio::task::spawn_blocking(move || -> Result<bool> {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction().map_err(db_err("begin"))?;
            let payload: String = tx
                .query_row(
                    "SELECT payload FROM interactions WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err("query"))?
                .ok_or_else(|| Error::NotFound(format!("interaction {}", id)))?;

            let mut interaction: Interaction = serde_json::from_str(&payload)?;
            let violation = interaction.violations.get_mut(index).ok_or_else(|| {
                Error::NotFound(format!("violation {} of interaction {}", index, id))
            })?;
            if violation.resolved {
                return Ok(false);
            }
            violation.resolved = true;

            let updated = serde_json::to_string(&interaction)?;
            tx.execute(
                "UPDATE interactions SET payload = ?1 WHERE id = ?2",
                params![updated, id],
            )
            .map_err(db_err("update interaction"))?;
            append_audit(&tx, &id, "violation_resolved", &updated).map_err(db_err("audit"))?;
            tx.commit().map_err(db_err("commit"))?;
            Ok(true)
        })
        .await
        .map_err(join_err)??;

        if changed {
            self.publish(StoreEvent::ViolationResolved {
                interaction_id: interaction_id.to_string(),
                index,
            });
        }
        Ok(changed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
