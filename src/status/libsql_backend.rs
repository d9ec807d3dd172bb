//! libSQL backend — `StatusStore` over a named table.
//!
//! The table is created only by `create_table` (the `init-store` command).
//! Appending to a database without it is a configuration error, not a cue
//! to create it.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::config::validate_table_name;
use crate::error::StatusError;
use crate::status::traits::{StatusRecord, StatusStore};

const COLUMNS: &str = "complaint_id, received_at, status, updated_at, notes";

/// libSQL-backed status table.
pub struct LibSqlStatusStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    table: String,
}

impl LibSqlStatusStore {
    /// Open (or create) a local database file. Does not touch the schema.
    pub async fn new_local(path: &Path, table: &str) -> Result<Self, StatusError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StatusError::Open(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StatusError::Open(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db, table)?;
        info!(path = %path.display(), table = %store.table, "Status store opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory(table: &str) -> Result<Self, StatusError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StatusError::Open(format!("Failed to create in-memory database: {e}")))?;
        Self::from_database(db, table)
    }

    fn from_database(db: LibSqlDatabase, table: &str) -> Result<Self, StatusError> {
        validate_table_name(table).map_err(|e| StatusError::Open(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| StatusError::Open(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the status table if it does not exist.
    pub async fn create_table(&self) -> Result<(), StatusError> {
        let sql = format!(
            r#"CREATE TABLE IF NOT EXISTS "{}" (
                complaint_id TEXT NOT NULL,
                received_at TEXT NOT NULL,
                status TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT ''
            )"#,
            self.table
        );
        self.conn
            .execute(&sql, ())
            .await
            .map_err(|e| StatusError::Query(format!("create_table: {e}")))?;
        info!(table = %self.table, "Status table ready");
        Ok(())
    }

    /// Whether the status table exists.
    pub async fn table_exists(&self) -> Result<bool, StatusError> {
        let mut rows = self
            .conn
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![self.table.clone()],
            )
            .await
            .map_err(|e| StatusError::Query(format!("table_exists: {e}")))?;

        match rows.next().await {
            Ok(row) => Ok(row.is_some()),
            Err(e) => Err(StatusError::Query(format!("table_exists: {e}"))),
        }
    }

    async fn ensure_table(&self) -> Result<(), StatusError> {
        if self.table_exists().await? {
            Ok(())
        } else {
            Err(StatusError::TableMissing {
                table: self.table.clone(),
            })
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp written by this store.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn row_to_record(row: &libsql::Row) -> Result<StatusRecord, libsql::Error> {
    let received_str: String = row.get(1)?;
    let updated_str: String = row.get(3)?;
    Ok(StatusRecord {
        complaint_id: row.get(0)?,
        received_at: parse_datetime(&received_str),
        status: row.get(2)?,
        updated_at: parse_datetime(&updated_str),
        notes: row.get::<String>(4).unwrap_or_default(),
    })
}

#[async_trait]
impl StatusStore for LibSqlStatusStore {
    async fn append(&self, record: &StatusRecord) -> Result<(), StatusError> {
        self.ensure_table().await?;

        self.conn
            .execute(
                &format!(r#"INSERT INTO "{}" ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"#, self.table),
                params![
                    record.complaint_id.clone(),
                    record.received_at.to_rfc3339(),
                    record.status.clone(),
                    record.updated_at.to_rfc3339(),
                    record.notes.clone()
                ],
            )
            .await
            .map_err(|e| StatusError::Query(format!("append: {e}")))?;

        debug!(complaint_id = %record.complaint_id, table = %self.table, "Status row appended");
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StatusRecord>, StatusError> {
        self.ensure_table().await?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut rows = self
            .conn
            .query(
                &format!(r#"SELECT {COLUMNS} FROM "{}" ORDER BY rowid DESC LIMIT ?1"#, self.table),
                params![limit],
            )
            .await
            .map_err(|e| StatusError::Query(format!("recent: {e}")))?;

        let mut records = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => records.push(
                    row_to_record(&row)
                        .map_err(|e| StatusError::Query(format!("recent row parse: {e}")))?,
                ),
                Ok(None) => break,
                Err(e) => return Err(StatusError::Query(format!("recent: {e}"))),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::ids::build_complaint_id;

    async fn test_store() -> LibSqlStatusStore {
        let store = LibSqlStatusStore::new_memory("Complaint_Status").await.unwrap();
        store.create_table().await.unwrap();
        store
    }

    fn record(minute: u32) -> StatusRecord {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 10, minute, 0).unwrap();
        StatusRecord::received(&build_complaint_id("CC", &at), at)
    }

    #[tokio::test]
    async fn append_and_read_back() {
        let store = test_store().await;
        let rec = record(1);

        store.append(&rec).await.unwrap();

        let rows = store.recent(10).await.unwrap();
        assert_eq!(rows, vec![rec]);
        assert_eq!(rows[0].status, "Received");
        assert_eq!(rows[0].notes, "");
    }

    #[tokio::test]
    async fn missing_table_fails_append() {
        let store = LibSqlStatusStore::new_memory("Complaint_Status").await.unwrap();
        assert!(!store.table_exists().await.unwrap());

        let err = store.append(&record(1)).await.unwrap_err();
        assert!(matches!(err, StatusError::TableMissing { ref table } if table == "Complaint_Status"));
    }

    #[tokio::test]
    async fn create_table_is_idempotent() {
        let store = test_store().await;
        store.create_table().await.unwrap();
        assert!(store.table_exists().await.unwrap());
    }

    #[tokio::test]
    async fn duplicates_are_appended_not_merged() {
        let store = test_store().await;
        store.append(&record(2)).await.unwrap();
        store.append(&record(2)).await.unwrap();
        assert_eq!(store.recent(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_limited() {
        let store = test_store().await;
        for minute in 1..=3 {
            store.append(&record(minute)).await.unwrap();
        }

        let rows = store.recent(2).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.complaint_id.as_str()).collect();
        assert_eq!(ids, vec!["CC-20260501-1003", "CC-20260501-1002"]);
    }

    #[tokio::test]
    async fn invalid_table_name_rejected() {
        let result = LibSqlStatusStore::new_memory("bad name").await;
        assert!(matches!(result, Err(StatusError::Open(_))));
    }

    #[tokio::test]
    async fn local_file_persists_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/status.db");

        {
            let store = LibSqlStatusStore::new_local(&path, "Complaint_Status").await.unwrap();
            store.create_table().await.unwrap();
            store.append(&record(4)).await.unwrap();
        }

        let reopened = LibSqlStatusStore::new_local(&path, "Complaint_Status").await.unwrap();
        assert_eq!(reopened.recent(5).await.unwrap().len(), 1);
    }
}
