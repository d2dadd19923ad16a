use serde::{Deserialize, Serialize};

use super::StructuringError;

/// Placeholder when the model names no disease or symptom.
pub const UNKNOWN_DISEASE: &str = "Unknown";
/// Placeholder when no medication list could be extracted.
pub const NO_MEDICATIONS: &str = "None";
/// Placeholder when the model gives no additional notes.
pub const NO_NOTES: &str = "None";

/// Fields pulled out of the language model's four-line answer.
///
/// Every field always holds a value: unmatched labels fall back to the placeholders
/// above (provider falls back to the empty string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretedFields {
    pub disease: String,
    /// Comma-separated medication list, still uncorrected.
    pub medications: String,
    pub notes: String,
    pub provider: String,
}

impl Default for InterpretedFields {
    fn default() -> Self {
        Self {
            disease: UNKNOWN_DISEASE.to_string(),
            medications: NO_MEDICATIONS.to_string(),
            notes: NO_NOTES.to_string(),
            provider: String::new(),
        }
    }
}

impl InterpretedFields {
    pub fn has_known_disease(&self) -> bool {
        !self.disease.is_empty() && self.disease != UNKNOWN_DISEASE
    }

    pub fn has_medications(&self) -> bool {
        !self.medications.is_empty() && self.medications != NO_MEDICATIONS
    }
}

/// Text-generation service abstraction (allows mocking)
pub trait LlmClient: Send + Sync {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, StructuringError>;
}
