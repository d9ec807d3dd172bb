//! Input types delivered by the trigger host.

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

// ── Form structure ──────────────────────────────────────────────────

/// Static structure of a form: its items in authored order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormStructure {
    /// Form title, forwarded to the pipeline for report headings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Status store the form is linked to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default)]
    pub items: Vec<FormItem>,
}

/// One entry in the form's item list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
}

impl FormItem {
    pub fn question(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ItemKind::Question,
        }
    }

    pub fn page_break(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ItemKind::PageBreak,
        }
    }
}

/// Whether an item opens a new section or collects an answer.
///
/// Only page breaks are markers; every other item type the form host reports
/// (text, paragraph, choice, grid, ...) is treated as a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[serde(alias = "section_break", alias = "PAGE_BREAK")]
    PageBreak,
    #[default]
    #[serde(other)]
    Question,
}

// ── Responses ───────────────────────────────────────────────────────

/// The answers of one submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseSet {
    /// Host-assigned response id, if the host provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answers: Vec<ItemResponse>,
}

/// A single answered question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item_id: String,
    /// Question title as carried by the response itself. Only used when the
    /// item is missing from the form structure.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub answer: Answer,
}

impl ItemResponse {
    pub fn new(item_id: impl Into<String>, title: impl Into<String>, answer: Answer) -> Self {
        Self {
            item_id: item_id.into(),
            title: title.into(),
            answer,
        }
    }
}

/// Raw answer value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    #[default]
    Empty,
    List(Vec<Answer>),
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Self::Text(v.into())).collect())
    }

    /// Render the answer as row text. Lists are joined with `", "`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::List(items) => items
                .iter()
                .map(Self::to_text)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Flag(b) => b.to_string(),
        }
    }
}

// ── Event ───────────────────────────────────────────────────────────

/// One triggering event: the form snapshot plus the submitted answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionEvent {
    pub form: FormStructure,
    pub response: ResponseSet,
}

impl SubmissionEvent {
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read an event from a reader (stdin or a file).
    pub fn from_reader<R: Read>(mut reader: R, source: &str) -> Result<Self, InputError> {
        let mut buf = String::new();
        reader
            .read_to_string(&mut buf)
            .map_err(|e| InputError::Read {
                path: source.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_json(&buf)
    }
}
