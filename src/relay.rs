//! Submission relay. The straight-line flow for one event:
//!
//! 1. Build sections from the form snapshot and answers
//! 2. Extract the submitter email (fail before any side effect if missing)
//! 3. Append a "Received" status row
//! 4. Dispatch the event to the pipeline
//!
//! A dispatch failure after step 3 leaves the status row in place. Nothing
//! is retried or rolled back.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::dispatch::{ClientPayload, DispatchEvent, Dispatcher};
use crate::error::{PreconditionError, Result};
use crate::form::{Section, SubmissionEvent, build_recipients, build_sections, extract_email};
use crate::ids::ComplaintId;
use crate::status::{LibSqlStatusStore, StatusRecord, StatusStore};

/// Non-secret settings the relay needs per event.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub internal_email: String,
    pub id_prefix: String,
    pub event_type: String,
}

impl From<&RelayConfig> for RelaySettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            internal_email: config.internal_email.clone(),
            id_prefix: config.id_prefix.clone(),
            event_type: config.dispatch.event_type.clone(),
        }
    }
}

/// What a successful relay produced.
#[derive(Debug, Clone, Serialize)]
pub struct RelayOutcome {
    pub complaint_id: ComplaintId,
    pub submission_id: String,
    pub recipients: Vec<String>,
}

/// Relays submissions to the status store and the dispatcher.
pub struct Relay {
    settings: RelaySettings,
    store: Arc<dyn StatusStore>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Relay {
    pub fn new(
        settings: RelaySettings,
        store: Arc<dyn StatusStore>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            settings,
            store,
            dispatcher,
        }
    }

    /// Process one submission event.
    pub async fn process(&self, event: &SubmissionEvent) -> Result<RelayOutcome> {
        let (sections, submitter) = sections_and_submitter(event)?;

        let now = Utc::now();
        let complaint_id = ComplaintId::now(&self.settings.id_prefix);
        let submission_id = event
            .response
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let submission_timestamp = event.response.submitted_at.unwrap_or(now).to_rfc3339();
        let recipients = build_recipients(&self.settings.internal_email, &submitter);

        self.store
            .append(&StatusRecord::received(&complaint_id, now))
            .await?;
        info!(%complaint_id, "Status row recorded");

        let dispatch = DispatchEvent {
            event_type: self.settings.event_type.clone(),
            client_payload: ClientPayload {
                submission_id: submission_id.clone(),
                complaint_id: complaint_id.to_string(),
                submission_timestamp,
                email_to: recipients.clone(),
                sections,
                form_title: event
                    .form
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            },
        };
        self.dispatcher.dispatch(&dispatch).await?;

        info!(
            %complaint_id,
            %submission_id,
            dispatcher = self.dispatcher.name(),
            sections = dispatch.client_payload.sections.len(),
            "Submission relayed"
        );

        Ok(RelayOutcome {
            complaint_id,
            submission_id,
            recipients,
        })
    }
}

/// Relay one event into the local libSQL store its destination resolves to.
/// The database is opened only once the submission has a submitter email.
pub async fn relay_to_local_store(
    config: &RelayConfig,
    event: &SubmissionEvent,
    dispatcher: Arc<dyn Dispatcher>,
) -> Result<RelayOutcome> {
    sections_and_submitter(event)?;

    let destination = config
        .status
        .resolve_destination(event.form.destination.as_deref())?;
    let store = LibSqlStatusStore::new_local(Path::new(&destination), &config.status.table).await?;

    Relay::new(RelaySettings::from(config), Arc::new(store), dispatcher)
        .process(event)
        .await
}

fn sections_and_submitter(event: &SubmissionEvent) -> Result<(Vec<Section>, String)> {
    let sections = build_sections(&event.form, &event.response);

    let submitter = extract_email(&sections);
    if submitter.is_empty() {
        warn!(
            sections = sections.len(),
            "Submission has no email answer; nothing recorded or dispatched"
        );
        return Err(PreconditionError::MissingEmail.into());
    }
    Ok((sections, submitter))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{DispatchError, Error};
    use crate::form::{Answer, FormItem, FormStructure, ItemResponse, ResponseSet};

    /// Records dispatched events; optionally rejects them.
    struct RecordingDispatcher {
        sent: Mutex<Vec<DispatchEvent>>,
        reject_with: Option<u16>,
    }

    impl RecordingDispatcher {
        fn accepting() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                reject_with: None,
            }
        }

        fn rejecting(status: u16) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                reject_with: Some(status),
            }
        }

        fn sent(&self) -> Vec<DispatchEvent> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        fn name(&self) -> &str {
            "recording"
        }

        async fn dispatch(&self, event: &DispatchEvent) -> std::result::Result<(), DispatchError> {
            if let Some(status) = self.reject_with {
                return Err(DispatchError::Rejected {
                    status,
                    body: r#"{"message":"Bad credentials"}"#.into(),
                });
            }
            self.sent.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn settings() -> RelaySettings {
        RelaySettings {
            internal_email: "lab@acme.test".into(),
            id_prefix: "CC".into(),
            event_type: "complaint_submitted".into(),
        }
    }

    fn event(email: Option<&str>) -> SubmissionEvent {
        let mut answers = vec![ItemResponse::new("name", "", Answer::text("Jane"))];
        if let Some(email) = email {
            answers.push(ItemResponse::new("email", "", Answer::text(email)));
        }
        SubmissionEvent {
            form: FormStructure {
                title: Some("Customer Complaint".into()),
                destination: None,
                items: vec![
                    FormItem::page_break("p1", "Contact"),
                    FormItem::question("name", "Full Name"),
                    FormItem::question("email", "Email Address"),
                ],
            },
            response: ResponseSet {
                id: Some("resp-42".into()),
                submitted_at: None,
                answers,
            },
        }
    }

    async fn store() -> Arc<LibSqlStatusStore> {
        let store = LibSqlStatusStore::new_memory("Complaint_Status").await.unwrap();
        store.create_table().await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn relays_recorded_and_dispatched() {
        let store = store().await;
        let dispatcher = Arc::new(RecordingDispatcher::accepting());
        let relay = Relay::new(settings(), store.clone(), dispatcher.clone());

        let outcome = relay.process(&event(Some("jane@example.com"))).await.unwrap();

        assert!(outcome.complaint_id.as_str().starts_with("CC-"));
        assert_eq!(outcome.submission_id, "resp-42");
        assert_eq!(outcome.recipients, vec!["lab@acme.test", "jane@example.com"]);

        let rows = store.recent(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].complaint_id, outcome.complaint_id.as_str());
        assert_eq!(rows[0].status, "Received");

        let sent = dispatcher.sent();
        assert_eq!(sent.len(), 1);
        let payload = &sent[0].client_payload;
        assert_eq!(sent[0].event_type, "complaint_submitted");
        assert_eq!(payload.complaint_id, outcome.complaint_id.as_str());
        assert_eq!(payload.sections[0].title, "Contact");
        assert_eq!(payload.sections[0].rows.len(), 2);
        assert_eq!(payload.form_title.as_deref(), Some("Customer Complaint"));
    }

    #[tokio::test]
    async fn missing_email_has_no_side_effects() {
        let store = store().await;
        let dispatcher = Arc::new(RecordingDispatcher::accepting());
        let relay = Relay::new(settings(), store.clone(), dispatcher.clone());

        let err = relay.process(&event(None)).await.unwrap_err();

        assert!(matches!(err, Error::Precondition(PreconditionError::MissingEmail)));
        assert!(store.recent(10).await.unwrap().is_empty());
        assert!(dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn rejected_dispatch_leaves_status_row() {
        let store = store().await;
        let dispatcher = Arc::new(RecordingDispatcher::rejecting(401));
        let relay = Relay::new(settings(), store.clone(), dispatcher);

        let err = relay
            .process(&event(Some("jane@example.com")))
            .await
            .unwrap_err();

        match err {
            Error::Dispatch(DispatchError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("Bad credentials"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_table_stops_before_dispatch() {
        let store = Arc::new(LibSqlStatusStore::new_memory("Complaint_Status").await.unwrap());
        let dispatcher = Arc::new(RecordingDispatcher::accepting());
        let relay = Relay::new(settings(), store, dispatcher.clone());

        let err = relay
            .process(&event(Some("jane@example.com")))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status(_)));
        assert!(dispatcher.sent().is_empty());
    }

    fn local_config(db_path: &Path) -> RelayConfig {
        let db = db_path.to_string_lossy().into_owned();
        RelayConfig::from_lookup(move |key: &str| match key {
            "GITHUB_TOKEN" => Some("ghp_test".into()),
            "GITHUB_OWNER" => Some("acme".into()),
            "GITHUB_REPO" => Some("complaints".into()),
            "RELAY_INTERNAL_EMAIL" => Some("lab@acme.test".into()),
            "RELAY_STATUS_DB" => Some(db.clone()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn missing_email_leaves_no_database_behind() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("relay").join("status.db");
        let dispatcher = Arc::new(RecordingDispatcher::accepting());

        let err = relay_to_local_store(&local_config(&db_path), &event(None), dispatcher.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Precondition(PreconditionError::MissingEmail)));
        assert!(!db_path.parent().unwrap().exists());
        assert!(dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn local_store_is_opened_once_email_is_present() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("status.db");
        let config = local_config(&db_path);

        let store = LibSqlStatusStore::new_local(&db_path, &config.status.table)
            .await
            .unwrap();
        store.create_table().await.unwrap();

        let dispatcher = Arc::new(RecordingDispatcher::accepting());
        let outcome =
            relay_to_local_store(&config, &event(Some("jane@example.com")), dispatcher.clone())
                .await
                .unwrap();

        let rows = store.recent(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].complaint_id, outcome.complaint_id.as_str());
        assert_eq!(dispatcher.sent().len(), 1);
    }

    #[tokio::test]
    async fn generates_submission_id_when_host_has_none() {
        let store = store().await;
        let dispatcher = Arc::new(RecordingDispatcher::accepting());
        let relay = Relay::new(settings(), store, dispatcher.clone());

        let mut ev = event(Some("jane@example.com"));
        ev.response.id = None;
        let outcome = relay.process(&ev).await.unwrap();

        assert!(Uuid::parse_str(&outcome.submission_id).is_ok());
        assert_eq!(dispatcher.sent()[0].client_payload.submission_id, outcome.submission_id);
    }

    #[tokio::test]
    async fn submitter_equal_to_internal_address_is_not_repeated() {
        let store = store().await;
        let dispatcher = Arc::new(RecordingDispatcher::accepting());
        let relay = Relay::new(settings(), store, dispatcher.clone());

        let outcome = relay.process(&event(Some("Lab@acme.test"))).await.unwrap();

        assert_eq!(outcome.recipients, vec!["lab@acme.test"]);
    }
}
