//! Configuration types.
//!
//! Everything is read once at startup into explicit structs. Nothing here is
//! mutated after construction.

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_EVENT_TYPE: &str = "complaint_submitted";
pub const DEFAULT_ID_PREFIX: &str = "CC";
pub const DEFAULT_STATUS_TABLE: &str = "Complaint_Status";

/// Target of the outbound `repository_dispatch` call.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// GitHub API base URL (overridable for GitHub Enterprise and tests).
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Personal access token sent as `Authorization: token <PAT>`.
    pub token: SecretString,
    /// `event_type` of the dispatched event.
    pub event_type: String,
}

impl DispatchConfig {
    /// Full URL of the dispatches endpoint.
    pub fn dispatch_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/dispatches",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

/// Where status rows are appended.
#[derive(Debug, Clone)]
pub struct StatusConfig {
    /// Explicit database path. Takes precedence over the form's destination.
    pub destination: Option<String>,
    pub table: String,
}

impl StatusConfig {
    /// Status settings from process environment variables. Needs no dispatch
    /// credentials, so store commands can run without them.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table = trimmed(&lookup, "RELAY_STATUS_TABLE")
            .unwrap_or_else(|| DEFAULT_STATUS_TABLE.to_string());
        validate_table_name(&table)?;
        Ok(Self {
            destination: trimmed(&lookup, "RELAY_STATUS_DB"),
            table,
        })
    }

    /// Pick the destination for a form: configured override first, then the
    /// destination the form itself is linked to.
    pub fn resolve_destination(&self, form_destination: Option<&str>) -> Result<String, ConfigError> {
        self.destination
            .as_deref()
            .or(form_destination)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "RELAY_STATUS_DB".into(),
                hint: "Set RELAY_STATUS_DB or link the form to a status destination.".into(),
            })
    }
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub dispatch: DispatchConfig,
    pub status: StatusConfig,
    /// Internal address that always receives the notification.
    pub internal_email: String,
    /// Prefix of locally generated complaint ids.
    pub id_prefix: String,
}

impl RelayConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| trimmed(&lookup, key);
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let dispatch = DispatchConfig {
            api_base: get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            owner: require("GITHUB_OWNER")?,
            repo: require("GITHUB_REPO")?,
            token: SecretString::from(require("GITHUB_TOKEN")?),
            event_type: get("RELAY_EVENT_TYPE").unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
        };

        let internal_email = require("RELAY_INTERNAL_EMAIL")?;
        if !internal_email.contains('@') {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_INTERNAL_EMAIL".into(),
                message: format!("'{internal_email}' is not an email address"),
            });
        }

        Ok(Self {
            dispatch,
            status: StatusConfig::from_lookup(&lookup)?,
            internal_email,
            id_prefix: get("RELAY_ID_PREFIX").unwrap_or_else(|| DEFAULT_ID_PREFIX.to_string()),
        })
    }
}

/// Blank values count as unset.
fn trimmed<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_table_name(table: &str) -> Result<(), ConfigError> {
    let valid = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: "RELAY_STATUS_TABLE".into(),
            message: format!("'{table}' is not a plain identifier"),
        })
    }
}
