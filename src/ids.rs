//! Complaint correlation ids.
//!
//! Format: `PREFIX-YYYYMMDD-HHMM` in local wall-clock time. Two submissions in
//! the same minute get the same id. The id only ties a status row to its
//! dispatched event; the authoritative complaint number is assigned by the
//! pipeline.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Locally generated correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplaintId(String);

impl ComplaintId {
    /// Id for the current local minute.
    pub fn now(prefix: &str) -> Self {
        build_complaint_id(prefix, &Local::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ComplaintId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the id for a given instant, formatted in that instant's timezone.
pub fn build_complaint_id<Tz>(prefix: &str, at: &DateTime<Tz>) -> ComplaintId
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    ComplaintId(format!("{}-{}", prefix, at.format("%Y%m%d-%H%M")))
}
