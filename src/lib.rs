//! Complaint relay: normalizes form submissions and forwards them to a
//! GitHub `repository_dispatch` pipeline.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod ids;
pub mod relay;
pub mod server;
pub mod status;
