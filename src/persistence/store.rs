//! State store behind an optional Postgres connection.
//!
//! The store is probed exactly once at startup. Every failure mode (no
//! credential file, malformed credentials, unreachable database) degrades to
//! [`StateStore::Disconnected`], which is a fully supported mode of
//! operation — the supervisor keeps running and simply skips persistence.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE master_state_snapshots (
//!     id         BIGSERIAL PRIMARY KEY,
//!     run_id     UUID NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     snapshot   JSONB NOT NULL
//! );
//! ```

use serde::Deserialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::snapshot::StateSnapshot;
use crate::error::{MasterError, Result};

/// Default location of the credential artifact probed at startup
pub const DEFAULT_CREDENTIALS_FILE: &str = "store-credentials.json";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Contents of the credential artifact
#[derive(Debug, Deserialize)]
struct StoreCredentials {
    /// PostgreSQL connection URL
    url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Durable snapshot store, or the lack of one.
pub enum StateStore {
    Connected(PgPool),
    Disconnected,
}

impl StateStore {
    /// Probe for credentials and try to connect. Never fails the caller:
    /// any problem is logged and yields `Disconnected`.
    pub async fn connect(credentials_path: &Path) -> Self {
        if !credentials_path.exists() {
            warn!(
                "Store credentials {} not found. Running without persistence.",
                credentials_path.display()
            );
            return Self::Disconnected;
        }

        let raw = match std::fs::read_to_string(credentials_path) {
            Ok(raw) => raw,
            Err(e) => {
                error!(
                    "Failed to read store credentials {}: {}",
                    credentials_path.display(),
                    e
                );
                return Self::Disconnected;
            }
        };

        let creds: StoreCredentials = match serde_json::from_str(&raw) {
            Ok(creds) => creds,
            Err(e) => {
                error!("Malformed store credentials: {}", e);
                return Self::Disconnected;
            }
        };

        match PgPoolOptions::new()
            .max_connections(creds.max_connections)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(&creds.url)
            .await
        {
            Ok(pool) => {
                info!("State store connected");
                Self::Connected(pool)
            }
            Err(e) => {
                error!("State store initialization failed: {}", e);
                Self::Disconnected
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Write one snapshot. Callers are expected to gate on
    /// [`is_connected`](Self::is_connected); invoking this while
    /// disconnected is an error, not a panic.
    pub async fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<i64> {
        let pool = match self {
            Self::Connected(pool) => pool,
            Self::Disconnected => return Err(MasterError::StoreUnavailable),
        };

        let payload = serde_json::to_value(snapshot)?;

        let row = sqlx::query(
            r#"
            INSERT INTO master_state_snapshots (run_id, created_at, snapshot)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(snapshot.run_id)
        .bind(snapshot.created_at)
        .bind(&payload)
        .fetch_one(pool)
        .await?;

        let id: i64 = row.get("id");
        debug!("Persisted state snapshot {}", id);
        Ok(id)
    }

    /// Latest snapshot from any previous run, if one exists.
    pub async fn load_latest(&self) -> Result<Option<StateSnapshot>> {
        let pool = match self {
            Self::Connected(pool) => pool,
            Self::Disconnected => return Err(MasterError::StoreUnavailable),
        };

        let row = sqlx::query(
            r#"
            SELECT snapshot
            FROM master_state_snapshots
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => {
                let payload: serde_json::Value = row.get("snapshot");
                Ok(Some(serde_json::from_value(payload)?))
            }
            None => Ok(None),
        }
    }

    /// Release the underlying connection pool.
    pub async fn close(&self) {
        if let Self::Connected(pool) = self {
            pool.close().await;
            info!("State store connection released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Write;
    use tokio_test::assert_err;
    use uuid::Uuid;

    fn empty_snapshot() -> StateSnapshot {
        StateSnapshot {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            supervisor_state: "running".to_string(),
            agents: vec![],
            metrics: crate::metrics::SystemMetrics::default(),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_degrade_to_disconnected() {
        let store = StateStore::connect(Path::new("/nonexistent/creds.json")).await;
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn test_malformed_credentials_degrade_to_disconnected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store-credentials.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"{ not json").unwrap();

        let store = StateStore::connect(&path).await;
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn test_disconnected_store_rejects_writes() {
        let store = StateStore::Disconnected;
        let err = assert_err!(store.save_snapshot(&empty_snapshot()).await);
        assert!(matches!(err, MasterError::StoreUnavailable));
        let err = assert_err!(store.load_latest().await);
        assert!(matches!(err, MasterError::StoreUnavailable));
    }
}
