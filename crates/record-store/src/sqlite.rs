//! SQLite-backed record store (persistence across restarts).
//!
//! Each record is stored whole as a JSON document next to its version column, so
//! the compare-and-swap is a single `UPDATE ... WHERE version = ?`.

use crate::{Record, RecordFilter, RecordStore, StoreError};
use async_trait::async_trait;
use rusqlite::OptionalExtension;
use std::path::Path;

fn sql_err(e: rusqlite::Error) -> StoreError {
    StoreError::Other(e.to_string())
}

fn json_err(e: serde_json::Error) -> StoreError {
    StoreError::Other(format!("record encoding: {}", e))
}

/// SQLite-backed record store.
pub struct SqliteRecordStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) a store at the given path. `":memory:"` gives a private in-memory database.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path).map_err(sql_err)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_created ON records(created_at);
            "#,
        )
        .map_err(sql_err)?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, StoreError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Other(format!("failed to acquire lock: {}", e)))?;
        f(&conn)
    }

    fn current_version(conn: &rusqlite::Connection, id: &str) -> Result<Option<u64>, StoreError> {
        conn.query_row(
            "SELECT version FROM records WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(sql_err)
        .map(|v| v.map(|v| v as u64))
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, mut record: Record) -> Result<Record, StoreError> {
        record.version = 0;
        let body = serde_json::to_string(&record).map_err(json_err)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "INSERT OR IGNORE INTO records (id, version, body, created_at, updated_at) VALUES (?1, 0, ?2, ?3, ?4)",
                    rusqlite::params![record.id, body, record.created_at.to_rfc3339(), now],
                )
                .map_err(sql_err)?;
            if changed == 0 {
                let found = Self::current_version(conn, &record.id)?.unwrap_or(0);
                return Err(StoreError::Conflict {
                    id: record.id.clone(),
                    expected: 0,
                    found,
                });
            }
            Ok(())
        })?;
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let body: Option<String> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT body FROM records WHERE id = ?1",
                rusqlite::params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)
        })?;
        body.map(|b| serde_json::from_str(&b).map_err(json_err))
            .transpose()
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<Record>, StoreError> {
        let bodies: Vec<String> = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT body FROM records")
                .map_err(sql_err)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(sql_err)?;
            let bodies = rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)?;
            Ok(bodies)
        })?;
        let mut out = Vec::with_capacity(bodies.len());
        for body in bodies {
            let record: Record = serde_json::from_str(&body).map_err(json_err)?;
            if filter.matches(&record) {
                out.push(record);
            }
        }
        crate::sort_records(&mut out);
        Ok(out)
    }

    async fn replace(&self, mut record: Record, expected_version: u64) -> Result<Record, StoreError> {
        record.version = expected_version + 1;
        let body = serde_json::to_string(&record).map_err(json_err)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(sql_err)?;
            let changed = tx
                .execute(
                    "UPDATE records SET version = ?1, body = ?2, updated_at = ?3 WHERE id = ?4 AND version = ?5",
                    rusqlite::params![
                        record.version as i64,
                        body,
                        now,
                        record.id,
                        expected_version as i64,
                    ],
                )
                .map_err(sql_err)?;
            if changed == 0 {
                return match Self::current_version(&tx, &record.id)? {
                    None => Err(StoreError::NotFound(record.id.clone())),
                    Some(found) => Err(StoreError::Conflict {
                        id: record.id.clone(),
                        expected: expected_version,
                        found,
                    }),
                };
            }
            tx.commit().map_err(sql_err)
        })?;
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let changed = self.with_conn(|conn| {
            conn.execute("DELETE FROM records WHERE id = ?1", rusqlite::params![id])
                .map_err(sql_err)
        })?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
