//! Best-effort parsing of the model's four-line answer.
//!
//! The model is asked for:
//!
//! ```text
//! - Disease/Symptoms: ...
//! - Medications: ...
//! - Additional Notes: ...
//! - Healthcare Provider: ...
//! ```
//!
//! but nothing enforces it, so each field is located independently and falls back to
//! a placeholder when absent. Medications are cut positionally between two literal
//! markers because models like to spread them over bullet lines.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::types::{InterpretedFields, NO_MEDICATIONS, NO_NOTES, UNKNOWN_DISEASE};

pub const DISEASE_LABEL: &str = "Disease/Symptoms:";
pub const PROVIDER_LABEL: &str = "Healthcare Provider:";
pub const MEDICATIONS_MARKER: &str = "- Medications:";
pub const ADDITIONAL_NOTES_MARKER: &str = "- Additional Notes:";

/// Medications inferred from the raw answer when the list itself came back empty.
const FALLBACK_KEYWORDS: &[(&str, &str)] = &[("Diane", "Diane-35"), ("Penicillin", "Penicillin")];

static DISEASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Disease/Symptoms:[ \t*]*(.*)").unwrap());
static NOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Additional Notes:[ \t*]*(.*)").unwrap());
static PROVIDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Healthcare Provider:[ \t*]*(.*)").unwrap());
/// `- Medications:`, also as `- **Medications:**`.
static MEDICATIONS_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-[ \t]*\*{0,2}Medications:\*{0,2}").unwrap());
static NOTES_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-[ \t]*\*{0,2}Additional Notes:\*{0,2}").unwrap());

/// Parse the language model's answer into its four fields.
pub fn parse_structured_response(text: &str) -> InterpretedFields {
    let disease = capture_line(&DISEASE_RE, text).unwrap_or_else(|| UNKNOWN_DISEASE.to_string());
    let notes = capture_line(&NOTES_RE, text).unwrap_or_else(|| NO_NOTES.to_string());
    let provider = capture_line(&PROVIDER_RE, text).unwrap_or_default();

    let mut medications = extract_medications_block(text)
        .map(|block| flatten_bullets(&block))
        .unwrap_or_default();

    if medications.is_empty() || medications.eq_ignore_ascii_case(NO_MEDICATIONS) {
        medications = keyword_fallback(text).unwrap_or_else(|| NO_MEDICATIONS.to_string());
    }

    InterpretedFields {
        disease,
        medications,
        notes,
        provider,
    }
}

/// First capture of `re`, trimmed; `None` when absent or blank.
fn capture_line(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Text between `- Medications:` and the following `- Additional Notes:`
/// (either marker may be bold).
///
/// When the notes marker is missing the block ends at the end of the medications line.
fn extract_medications_block(text: &str) -> Option<String> {
    let start = MEDICATIONS_MARKER_RE.find(text)?.end();
    let rest = &text[start..];
    let end = NOTES_MARKER_RE
        .find(rest)
        .map(|m| m.start())
        .or_else(|| rest.find('\n'))
        .unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

/// Collapse `* item` lines into `item, item`. Blocks without bullets pass through.
fn flatten_bullets(block: &str) -> String {
    if !block.contains('*') {
        return block.to_string();
    }

    let items: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('*'))
        .map(|line| line.trim_start_matches('*').trim())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        block.to_string()
    } else {
        items.join(", ")
    }
}

fn keyword_fallback(text: &str) -> Option<String> {
    let found: Vec<&str> = FALLBACK_KEYWORDS
        .iter()
        .filter(|(keyword, _)| text.contains(keyword))
        .map(|(_, medication)| *medication)
        .collect();

    if found.is_empty() {
        None
    } else {
        Some(found.join(", "))
    }
}

/// Suggested record title from what the note contains.
pub fn synthesize_title(fields: &InterpretedFields, date: NaiveDate) -> String {
    let date = format_record_date(date);
    if fields.has_known_disease() {
        format!("{} - {date}", fields.disease)
    } else if fields.has_medications() {
        format!("Prescription - {date}")
    } else {
        format!("Medical Note - {date}")
    }
}

/// US short date (`M/D/YYYY`), no zero padding.
pub fn format_record_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed() -> &'static str {
        "- Disease/Symptoms: Secondary amenorrhea\n\
         - Medications: Diane-35 daily, Penicillin 1+1+1\n\
         - Additional Notes: Patient is a 19-year-old female\n\
         - Healthcare Provider: Dr. Smith, City Hospital"
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn parses_exact_four_label_format() {
        let fields = parse_structured_response(well_formed());
        assert_eq!(
            fields,
            InterpretedFields {
                disease: "Secondary amenorrhea".into(),
                medications: "Diane-35 daily, Penicillin 1+1+1".into(),
                notes: "Patient is a 19-year-old female".into(),
                provider: "Dr. Smith, City Hospital".into(),
            }
        );
    }

    #[test]
    fn bullet_medications_are_joined() {
        let text = "- Disease/Symptoms: Fever\n\
                    - Medications:\n\
                    * Paracetamol 500 mg\n\
                    \n\
                    * Ibuprofen 200 mg (possibly)\n\
                    - Additional Notes: Rest\n";
        let fields = parse_structured_response(text);
        assert_eq!(fields.medications, "Paracetamol 500 mg, Ibuprofen 200 mg (possibly)");
        assert_eq!(fields.notes, "Rest");
    }

    #[test]
    fn missing_labels_use_placeholders() {
        let fields = parse_structured_response("I could not read this note.");
        assert_eq!(fields, InterpretedFields::default());
        assert_eq!(fields.disease, "Unknown");
        assert_eq!(fields.medications, "None");
        assert_eq!(fields.notes, "None");
        assert_eq!(fields.provider, "");
    }

    #[test]
    fn keyword_fallback_when_medications_empty() {
        let text = "- Disease/Symptoms: Unknown\n\
                    - Medications: None\n\
                    - Additional Notes: Mentions Diane and Penicillin\n";
        let fields = parse_structured_response(text);
        assert_eq!(fields.medications, "Diane-35, Penicillin");
    }

    #[test]
    fn keyword_fallback_only_lists_present_keywords() {
        let text = "- Medications:\n- Additional Notes: penicillin allergy, Penicillin V\n";
        assert_eq!(parse_structured_response(text).medications, "Penicillin");
    }

    #[test]
    fn empty_block_without_keywords_is_none() {
        let text = "- Medications:   \n- Additional Notes: nothing\n";
        assert_eq!(parse_structured_response(text).medications, "None");
    }

    #[test]
    fn missing_notes_marker_ends_block_at_line_end() {
        let text = "- Disease/Symptoms: Fever\n- Medications: Paracetamol 500 mg\n- Healthcare Provider: Dr. Ade\n";
        let fields = parse_structured_response(text);
        assert_eq!(fields.medications, "Paracetamol 500 mg");
        assert_eq!(fields.provider, "Dr. Ade");
        assert_eq!(fields.notes, "None");
    }

    #[test]
    fn tolerates_bold_labels() {
        let text = "**Disease/Symptoms:** Fever\n";
        assert_eq!(parse_structured_response(text).disease, "Fever");
    }

    #[test]
    fn bold_markers_still_bound_medications() {
        let text = "- **Disease/Symptoms:** Fever\n\
                    - **Medications:** Paracetamol 500 mg, Ibuprofen 200 mg\n\
                    - **Additional Notes:** Rest\n";
        let fields = parse_structured_response(text);
        assert_eq!(fields.disease, "Fever");
        assert_eq!(fields.medications, "Paracetamol 500 mg, Ibuprofen 200 mg");
        assert_eq!(fields.notes, "Rest");
    }

    #[test]
    fn blank_disease_value_is_unknown() {
        let text = "- Disease/Symptoms:   \n- Medications: Ibuprofen 200 mg\n- Additional Notes: x";
        let fields = parse_structured_response(text);
        assert_eq!(fields.disease, "Unknown");
        assert!(!fields.has_known_disease());
    }

    #[test]
    fn title_prefers_disease() {
        let fields = parse_structured_response(well_formed());
        assert_eq!(synthesize_title(&fields, date()), "Secondary amenorrhea - 3/7/2024");
    }

    #[test]
    fn title_falls_back_to_prescription() {
        let fields = InterpretedFields {
            medications: "Ibuprofen 200 mg".into(),
            ..InterpretedFields::default()
        };
        assert_eq!(synthesize_title(&fields, date()), "Prescription - 3/7/2024");
    }

    #[test]
    fn title_falls_back_to_medical_note() {
        let fields = InterpretedFields::default();
        assert_eq!(synthesize_title(&fields, date()), "Medical Note - 3/7/2024");
    }

    #[test]
    fn date_format_has_no_padding() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        assert_eq!(format_record_date(d), "12/25/2025");
    }
}
