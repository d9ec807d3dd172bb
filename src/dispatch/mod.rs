//! Outbound dispatch — hands a normalized submission to the pipeline.

pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::DispatchError;

pub use github::GithubDispatcher;
pub use types::{ClientPayload, DispatchEvent};

/// Sends one event to the downstream pipeline. No retries.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Target name for logging (e.g. "github").
    fn name(&self) -> &str;

    /// Deliver the event. Non-success responses are errors.
    async fn dispatch(&self, event: &DispatchEvent) -> Result<(), DispatchError>;
}
