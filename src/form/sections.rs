//! Section builder: groups answers under the page break that precedes them.
//!
//! Two passes, no schema:
//! 1. Walk the form items once, remembering for every question its label and
//!    the section title in effect at that point.
//! 2. Walk the answers once, resolving each to `(label, section)` and
//!    appending a row to that section. Sections open in the order their
//!    titles are first seen among the answers.
//!
//! Pure string work. Never fails.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::{FormStructure, ItemKind, ResponseSet};

/// Section title in effect before the first page break.
pub const DEFAULT_SECTION_TITLE: &str = "Form Details";
/// Label used for questions without a usable title.
pub const UNTITLED_QUESTION: &str = "Untitled Question";

/// A named group of answered questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub rows: Vec<Row>,
}

impl Section {
    fn new(title: String) -> Self {
        Self {
            title,
            rows: Vec::new(),
        }
    }
}

/// One answered question rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub label: String,
    pub value: String,
}

/// Where a question lands: its display label and owning section.
struct Placement<'a> {
    label: &'a str,
    section: &'a str,
}

/// Build the ordered sections for one submission.
pub fn build_sections(form: &FormStructure, responses: &ResponseSet) -> Vec<Section> {
    let placements = index_questions(form);

    let mut sections: Vec<Section> = Vec::new();
    let mut by_title: HashMap<String, usize> = HashMap::new();

    for response in &responses.answers {
        let (label, section_title) = match placements.get(response.item_id.as_str()) {
            Some(placement) => (placement.label.to_string(), placement.section),
            // Item removed or renamed since the form snapshot was taken.
            None => (
                or_default(&response.title, UNTITLED_QUESTION).to_string(),
                DEFAULT_SECTION_TITLE,
            ),
        };

        let idx = match by_title.get(section_title) {
            Some(&idx) => idx,
            None => {
                sections.push(Section::new(section_title.to_string()));
                by_title.insert(section_title.to_string(), sections.len() - 1);
                sections.len() - 1
            }
        };

        sections[idx].rows.push(Row {
            label,
            value: response.answer.to_text(),
        });
    }

    sections
}

/// First pass: question id → placement. First occurrence of an id wins.
fn index_questions(form: &FormStructure) -> HashMap<&str, Placement<'_>> {
    let mut placements = HashMap::new();
    let mut current = DEFAULT_SECTION_TITLE;

    for item in &form.items {
        match item.kind {
            ItemKind::PageBreak => current = or_default(&item.title, DEFAULT_SECTION_TITLE),
            ItemKind::Question => {
                placements.entry(item.id.as_str()).or_insert(Placement {
                    label: or_default(&item.title, UNTITLED_QUESTION),
                    section: current,
                });
            }
        }
    }

    placements
}

fn or_default<'a>(title: &'a str, fallback: &'a str) -> &'a str {
    match title.trim() {
        "" => fallback,
        trimmed => trimmed,
    }
}
