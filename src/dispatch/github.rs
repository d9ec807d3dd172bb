//! GitHub `repository_dispatch` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use super::Dispatcher;
use super::types::DispatchEvent;
use crate::config::DispatchConfig;
use crate::error::DispatchError;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts events to `/repos/{owner}/{repo}/dispatches`.
pub struct GithubDispatcher {
    config: DispatchConfig,
    client: reqwest::Client,
}

impl GithubDispatcher {
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        // A redirected POST comes back as a GET, so a 3xx must surface as-is.
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DispatchError::Request(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn url(&self) -> String {
        self.config.dispatch_url()
    }
}

#[async_trait]
impl Dispatcher for GithubDispatcher {
    fn name(&self) -> &str {
        "github"
    }

    async fn dispatch(&self, event: &DispatchEvent) -> Result<(), DispatchError> {
        let url = self.url();

        let resp = self
            .client
            .post(&url)
            .header(
                AUTHORIZATION,
                format!("token {}", self.config.token.expose_secret()),
            )
            .header(ACCEPT, ACCEPT_GITHUB_JSON)
            .header(API_VERSION_HEADER, API_VERSION)
            .header(
                USER_AGENT,
                concat!("complaint-relay/", env!("CARGO_PKG_VERSION")),
            )
            .json(event)
            .send()
            .await
            .map_err(|e| DispatchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(status = status.as_u16(), error = %e, "Failed to read rejection body");
                    String::new()
                }
            };
            warn!(status = status.as_u16(), %url, "repository_dispatch rejected");
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            complaint_id = %event.client_payload.complaint_id,
            event_type = %event.event_type,
            status = status.as_u16(),
            "repository_dispatch sent"
        );
        Ok(())
    }
}
