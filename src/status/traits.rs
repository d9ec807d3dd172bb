//! `StatusStore` trait and the row it stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StatusError;
use crate::ids::ComplaintId;

/// Status label written by the relay. Later states are set downstream.
pub const STATUS_RECEIVED: &str = "Received";

/// A row in the status table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub complaint_id: String,
    pub received_at: DateTime<Utc>,
    pub status: String,
    pub updated_at: DateTime<Utc>,
    pub notes: String,
}

impl StatusRecord {
    /// Fresh "Received" row with empty notes.
    pub fn received(id: &ComplaintId, at: DateTime<Utc>) -> Self {
        Self {
            complaint_id: id.to_string(),
            received_at: at,
            status: STATUS_RECEIVED.to_string(),
            updated_at: at,
            notes: String::new(),
        }
    }
}

/// Append-only tabular store for submission status.
///
/// The relay never reads back or updates rows; `recent` exists for
/// operators inspecting the table.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Append one row. Fails if the backing table is missing.
    async fn append(&self, record: &StatusRecord) -> Result<(), StatusError>;

    /// Most recent rows, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<StatusRecord>, StatusError>;
}
