//! Submitter address lookup and recipient list.

use super::sections::Section;

/// Find the submitter's email address among the rows.
///
/// Matches on label (contains "email", any case) and value (contains `@`),
/// so renamed or reordered questions still resolve. Returns an empty string
/// when nothing matches; callers treat that as fatal.
pub fn extract_email(sections: &[Section]) -> String {
    sections
        .iter()
        .flat_map(|section| &section.rows)
        .find(|row| row.label.to_lowercase().contains("email") && row.value.contains('@'))
        .map(|row| row.value.trim().to_string())
        .unwrap_or_default()
}

/// Internal address first, then the submitter. Blank and repeated addresses
/// (compared case-insensitively) are dropped.
pub fn build_recipients(internal: &str, submitter: &str) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::new();
    for address in [internal, submitter] {
        let address = address.trim();
        if address.is_empty() {
            continue;
        }
        if recipients.iter().any(|r| r.eq_ignore_ascii_case(address)) {
            continue;
        }
        recipients.push(address.to_string());
    }
    recipients
}
