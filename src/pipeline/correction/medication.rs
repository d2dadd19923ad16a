//! Splitting the model's medication list into name + dosage.

use std::sync::LazyLock;

use regex::Regex;

use super::types::MedicationEntry;

/// Separator the model uses between medications.
pub const ENTRY_SEPARATOR: &str = ", ";

/// Name is the leading non-digit run; everything from the first digit is dosage.
static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^([^\d]+)(.*)$").unwrap());
static PARENTHETICAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*?\)").unwrap());
static HEDGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(likely|possibly)\b").unwrap());

impl MedicationEntry {
    /// Split one entry. `None` when the entry starts with a digit or is blank,
    /// in which case it is kept verbatim by the caller.
    pub fn parse(entry: &str) -> Option<Self> {
        let caps = ENTRY_RE.captures(entry)?;
        let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        let dosage = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        Some(Self {
            name: name.to_string(),
            dosage: clean_dosage(dosage),
        })
    }
}

/// Drop parentheticals and hedge words, then normalize whitespace.
pub fn clean_dosage(dosage: &str) -> String {
    let without_parens = PARENTHETICAL_RE.replace_all(dosage, "");
    let without_hedges = HEDGE_RE.replace_all(&without_parens, "");
    without_hedges.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a comma-separated medication list, dropping empty entries.
pub fn split_medication_list(list: &str) -> Vec<&str> {
    list.split(ENTRY_SEPARATOR)
        .filter(|entry| !entry.trim().is_empty())
        .collect()
}
