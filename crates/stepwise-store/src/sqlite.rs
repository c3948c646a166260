use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use stepwise_common::{Error, Result};
use stepwise_core::StorageBackend;
use tracing::{debug, info};

/// Cursor storage in a single-row SQLite table. Unlike the file backend it
/// keeps the label and the time of the last write.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

/// The persisted cursor row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorRecord {
    pub cursor: u64,
    pub label: String,
    pub updated_at: DateTime<Utc>,
}

impl SqliteBackend {
    pub fn open(db_path: &Path) -> Result<Self> {
        debug!("opening cursor database at {}", db_path.display());
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| Error::Storage(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| Error::Storage(format!("failed to set pragmas: {e}")))?;

        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.create_schema()?;
        Ok(backend)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("failed to open in-memory database: {e}")))?;

        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.create_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("cursor database lock poisoned".into()))
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _stepwise_cursor (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                cursor INTEGER NOT NULL,
                label TEXT NOT NULL DEFAULT '',
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .map_err(|e| Error::Storage(format!("failed to create cursor table: {e}")))?;
        Ok(())
    }

    /// The stored cursor row, if one has been written.
    pub fn record(&self) -> Result<Option<CursorRecord>> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT cursor, label, updated_at FROM _stepwise_cursor WHERE id = 1",
            [],
            |row| {
                Ok(CursorRecord {
                    cursor: row.get::<_, i64>(0)? as u64,
                    label: row.get(1)?,
                    updated_at: parse_datetime(row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(|e| Error::Storage(format!("failed to read cursor: {e}")))
    }

    fn upsert(conn: &Connection, index: u64, label: &str) -> Result<()> {
        let index = i64::try_from(index)
            .map_err(|_| Error::Storage(format!("cursor {index} does not fit in SQLite")))?;
        conn.execute(
            "INSERT INTO _stepwise_cursor (id, cursor, label, updated_at)
             VALUES (1, ?1, ?2, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
                cursor = excluded.cursor,
                label = excluded.label,
                updated_at = excluded.updated_at",
            params![index, label],
        )
        .map_err(|e| Error::Storage(format!("failed to save cursor: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn kind(&self) -> &str {
        "sqlite"
    }

    async fn save_index(&self, index: u64, label: &str) -> Result<()> {
        let conn = self.connection()?;
        Self::upsert(&conn, index, label)
    }

    async fn load_index(&self) -> Result<u64> {
        let conn = self.connection()?;
        let cursor: Option<i64> = conn
            .query_row(
                "SELECT cursor FROM _stepwise_cursor WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Storage(format!("failed to read cursor: {e}")))?;

        match cursor {
            Some(cursor) => u64::try_from(cursor)
                .map_err(|_| Error::Storage(format!("negative cursor {cursor} in database"))),
            None => {
                info!("initializing cursor table");
                Self::upsert(&conn, 0, "")?;
                Ok(0)
            }
        }
    }
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            // SQLite datetime('now') produces "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
                .unwrap_or_else(|_| Utc::now())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_database_loads_zero_and_writes_row() {
        let backend = SqliteBackend::in_memory().unwrap();
        assert!(backend.record().unwrap().is_none());

        assert_eq!(backend.load_index().await.unwrap(), 0);

        let record = backend.record().unwrap().unwrap();
        assert_eq!(record.cursor, 0);
        assert_eq!(record.label, "");
    }

    #[tokio::test]
    async fn save_overwrites_single_row_with_label() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.save_index(1, "a.yml").await.unwrap();
        backend.save_index(2, "b.yml").await.unwrap();

        assert_eq!(backend.load_index().await.unwrap(), 2);
        let record = backend.record().unwrap().unwrap();
        assert_eq!(record.label, "b.yml");

        let rows: i64 = backend
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM _stepwise_cursor", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn cursor_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cursor.db");

        SqliteBackend::open(&path)
            .unwrap()
            .save_index(5, "e.yml")
            .await
            .unwrap();

        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.load_index().await.unwrap(), 5);
        assert_eq!(reopened.record().unwrap().unwrap().label, "e.yml");
    }

    #[test]
    fn parses_sqlite_timestamps() {
        let dt = parse_datetime("2024-03-01 12:30:00".to_string());
        assert_eq!(dt.to_rfc3339(), "2024-03-01T12:30:00+00:00");
    }
}
