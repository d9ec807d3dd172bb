//! Error types for the complaint relay.

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Status store error: {0}")]
    Status(#[from] StatusError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Submission content that makes the relay refuse to run.
#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
    #[error("No email address found among the submitted answers; the form must require an email question")]
    MissingEmail,
}

/// Status store errors.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Failed to open status store: {0}")]
    Open(String),

    #[error("Status table '{table}' does not exist (run `complaint-relay init-store`)")]
    TableMissing { table: String },

    #[error("Query failed: {0}")]
    Query(String),
}

/// Outbound dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Dispatch request failed: {0}")]
    Request(String),

    #[error("Dispatch rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Errors reading a submission event from the trigger host.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Malformed submission event: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
