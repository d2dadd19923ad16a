use serde::{Deserialize, Serialize};

use super::handwriting::PipelineResult;

/// Record categories offered when saving a recognized note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicalRecordType {
    Prescription,
    LabResult,
    DoctorNote,
    Imaging,
    Other,
}

const PRESCRIPTION_HINTS: &[&str] = &["prescription", "medications:", "diane", "penicillin"];

/// Pre-selected record type for a recognized text.
pub fn suggest_record_type(text: &str) -> MedicalRecordType {
    let lower = text.to_lowercase();
    if PRESCRIPTION_HINTS.iter().any(|hint| lower.contains(hint)) {
        MedicalRecordType::Prescription
    } else {
        MedicalRecordType::DoctorNote
    }
}

/// Record type for a pipeline result; advisory messages are never prescriptions.
pub fn suggest_for_result(result: &PipelineResult) -> MedicalRecordType {
    if result.is_advisory() {
        MedicalRecordType::DoctorNote
    } else {
        suggest_record_type(&result.text)
    }
}
