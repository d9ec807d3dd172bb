//! Wire shape of the `repository_dispatch` event.

use serde::{Deserialize, Serialize};

use crate::form::Section;

/// Body of `POST /repos/{owner}/{repo}/dispatches`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchEvent {
    pub event_type: String,
    pub client_payload: ClientPayload,
}

/// Data the pipeline reads from `github.event.client_payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPayload {
    pub submission_id: String,
    pub complaint_id: String,
    /// RFC 3339.
    pub submission_timestamp: String,
    /// Internal address first, then the submitter.
    pub email_to: Vec<String>,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_title: Option<String>,
}
