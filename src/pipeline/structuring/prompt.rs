//! Interpretation prompt. The output format requested here is exactly what
//! `parser::parse_structured_response` understands; change both together.

use super::parser::{
    ADDITIONAL_NOTES_MARKER, DISEASE_LABEL, MEDICATIONS_MARKER, PROVIDER_LABEL,
};

const INTERPRETATION_INSTRUCTIONS: &str = r#"Interpret this text and extract the following:
- Disease or symptoms mentioned (e.g., secondary amenorrhea, fever).
- Medication names, dosages, and instructions (e.g., Penicillin 1+1+1, Phenergan 25 mg I/D).
- Any additional notes or instructions.
- Healthcare provider/doctor name and hospital/clinic if mentioned.

If the text is unclear or ambiguous:
1. Use the mentioned disease or symptoms to infer likely medications. For secondary amenorrhea, consider Progesterone, Medroxyprogesterone, Norethindrone, or Phenergan.
2. If a medication name is unclear, suggest the most likely medication based on common prescriptions.
3. If unsure, provide a confidence level (e.g., 'Likely Penicillin, 80% confidence')."#;

/// Build the interpretation prompt around the raw OCR text.
pub fn build_interpretation_prompt(ocr_text: &str) -> String {
    format!(
        "You are a medical transcription expert specializing in handwritten prescriptions. \
The following text was extracted from a doctor's handwritten medical note or prescription using OCR:

\"{ocr_text}\"

{INTERPRETATION_INSTRUCTIONS}

Output the interpretation in this exact structured format WITHOUT indentation or bullet points:
- {DISEASE_LABEL} Secondary amenorrhea
{MEDICATIONS_MARKER} Diane-35 daily, Penicillin 1+1+1
{ADDITIONAL_NOTES_MARKER} Patient is a 19-year-old female
- {PROVIDER_LABEL} Dr. Smith, City Hospital"
    )
}
