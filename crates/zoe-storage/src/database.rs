// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle with PRAGMA setup and embedded migrations.
//!
//! Every statement runs on tokio-rusqlite's single background thread for the
//! connection, so writes are serialized without an explicit lock.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::{debug, info};

use zoe_config::StorageConfig;
use zoe_core::ZoeError;

/// Convert a tokio-rusqlite error into `ZoeError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> ZoeError {
    ZoeError::storage(e)
}

/// Cloneable handle to the Zoe SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL enabled.
    pub async fn open(path: &str) -> Result<Self, ZoeError> {
        Self::open_with(path, true).await
    }

    /// Open the database described by the `[storage]` config section.
    pub async fn open_with_config(config: &StorageConfig) -> Result<Self, ZoeError> {
        Self::open_with(&config.database_path, config.wal_mode).await
    }

    /// Open a private in-memory database, used by tests and one-shot CLI runs.
    pub async fn open_in_memory() -> Result<Self, ZoeError> {
        let conn = Connection::open_in_memory().await.map_err(ZoeError::storage)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn open_with(path: &str, wal_mode: bool) -> Result<Self, ZoeError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ZoeError::storage)?;
        }

        let conn = Connection::open(path).await.map_err(ZoeError::storage)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        info!(path, wal_mode, "database opened");
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), ZoeError> {
        let applied = self
            .conn
            .call(move |conn| {
                if wal_mode {
                    let mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    debug!(%mode, "journal mode set");
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(crate::migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)??;
        debug!(applied, "migrations up to date");
        Ok(())
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), ZoeError> {
        self.conn
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)
    }
}
