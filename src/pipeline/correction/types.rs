use std::fmt;

use serde::{Deserialize, Serialize};

use super::TerminologyError;

/// One medication as written: leading non-digit run is the name, the rest is dosage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    /// Free text, already stripped of parentheticals and hedge words.
    pub dosage: String,
}

/// Which step of the resolver chain produced the final name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionSource {
    DiseaseDictionary,
    Terminology,
    CorrectionDictionary,
    Unchanged,
}

/// A medication entry after name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectedMedicationEntry {
    pub original_name: String,
    pub name: String,
    pub dosage: String,
    pub source: CorrectionSource,
}

impl fmt::Display for CorrectedMedicationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dosage.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.dosage)
        }
    }
}

/// Drug terminology service abstraction (RxNav in production, mock in tests).
///
/// Two calls mirror the service: name → concept identifier, identifier → canonical name.
pub trait TerminologyClient: Send + Sync {
    /// Concept identifier (RxCUI) for an informal drug name, if any.
    fn find_concept_id(&self, name: &str) -> Result<Option<String>, TerminologyError>;

    /// Canonical name property for a concept identifier, if any.
    fn canonical_name(&self, concept_id: &str) -> Result<Option<String>, TerminologyError>;
}
