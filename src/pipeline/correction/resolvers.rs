use std::sync::Arc;
use std::thread;

use super::dictionary::{lookup_name_correction, match_disease_candidate};
use super::medication::{split_medication_list, ENTRY_SEPARATOR};
use super::types::{
    CorrectedMedicationEntry, CorrectionSource, MedicationEntry, TerminologyClient,
};
use crate::pipeline::structuring::NO_MEDICATIONS;

/// Names shorter than this are too ambiguous to correct.
pub const MIN_CORRECTABLE_NAME_LEN: usize = 3;

/// One step of the correction chain. `None` passes the name to the next step.
pub trait MedicationResolver: Send + Sync {
    fn source(&self) -> CorrectionSource;
    fn resolve(&self, name: &str, disease: &str) -> Option<String>;
}

/// Disease-specific candidate list. A hit skips the terminology lookup entirely.
pub struct DiseaseDictionaryResolver;

impl MedicationResolver for DiseaseDictionaryResolver {
    fn source(&self) -> CorrectionSource {
        CorrectionSource::DiseaseDictionary
    }

    fn resolve(&self, name: &str, disease: &str) -> Option<String> {
        match_disease_candidate(name, disease).map(str::to_string)
    }
}

/// Canonical name from the drug terminology service. Any failure is a miss.
pub struct TerminologyResolver {
    client: Arc<dyn TerminologyClient>,
}

impl TerminologyResolver {
    pub fn new(client: Arc<dyn TerminologyClient>) -> Self {
        Self { client }
    }
}

impl MedicationResolver for TerminologyResolver {
    fn source(&self) -> CorrectionSource {
        CorrectionSource::Terminology
    }

    fn resolve(&self, name: &str, _disease: &str) -> Option<String> {
        let lookup = self
            .client
            .find_concept_id(name)
            .and_then(|id| match id {
                Some(id) => self.client.canonical_name(&id),
                None => Ok(None),
            });

        match lookup {
            Ok(value) => value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Terminology lookup failed, falling through");
                None
            }
        }
    }
}

/// Static substring corrections for names the terminology service misses.
pub struct CorrectionDictionaryResolver;

impl MedicationResolver for CorrectionDictionaryResolver {
    fn source(&self) -> CorrectionSource {
        CorrectionSource::CorrectionDictionary
    }

    fn resolve(&self, name: &str, _disease: &str) -> Option<String> {
        lookup_name_correction(name).map(str::to_string)
    }
}

/// Ordered resolver chain applied to every medication entry.
pub struct MedicationCorrector {
    resolvers: Vec<Box<dyn MedicationResolver>>,
}

impl MedicationCorrector {
    pub fn new(resolvers: Vec<Box<dyn MedicationResolver>>) -> Self {
        Self { resolvers }
    }

    /// Disease dictionary → terminology service → static corrections.
    pub fn standard(terminology: Arc<dyn TerminologyClient>) -> Self {
        Self::new(vec![
            Box::new(DiseaseDictionaryResolver),
            Box::new(TerminologyResolver::new(terminology)),
            Box::new(CorrectionDictionaryResolver),
        ])
    }

    /// Resolve a single medication name. First resolver with an answer wins.
    pub fn correct_name(&self, name: &str, disease: &str) -> (String, CorrectionSource) {
        if name.chars().count() < MIN_CORRECTABLE_NAME_LEN {
            return (name.to_string(), CorrectionSource::Unchanged);
        }

        self.resolvers
            .iter()
            .find_map(|r| r.resolve(name, disease).map(|n| (n, r.source())))
            .unwrap_or_else(|| (name.to_string(), CorrectionSource::Unchanged))
    }

    /// Correct one raw entry such as `"Diane 1 tab daily"`.
    ///
    /// Entries that cannot be split (leading digit) come back verbatim.
    pub fn correct_entry(&self, raw: &str, disease: &str) -> Option<CorrectedMedicationEntry> {
        let entry = MedicationEntry::parse(raw)?;
        let (name, source) = self.correct_name(&entry.name, disease);

        tracing::debug!(
            original = %entry.name,
            corrected = %name,
            source = ?source,
            "Medication name resolved"
        );

        Some(CorrectedMedicationEntry {
            original_name: entry.name,
            name,
            dosage: entry.dosage,
            source,
        })
    }

    /// Correct a whole `", "`-separated list, all entries concurrently.
    ///
    /// Output order matches input order. An entry whose correction panics is kept
    /// as written. `"None"` passes through untouched.
    pub fn correct_list(&self, medications: &str, disease: &str) -> String {
        let trimmed = medications.trim();
        if trimmed.is_empty() || trimmed == NO_MEDICATIONS {
            return NO_MEDICATIONS.to_string();
        }

        let entries = split_medication_list(trimmed);

        let corrected: Vec<String> = thread::scope(|scope| {
            let handles: Vec<_> = entries
                .iter()
                .map(|raw| {
                    let raw = *raw;
                    scope.spawn(move || {
                        self.correct_entry(raw, disease)
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| raw.to_string())
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(entries.iter())
                .map(|(handle, raw)| {
                    handle.join().unwrap_or_else(|_| {
                        tracing::warn!("Medication correction panicked, keeping entry as written");
                        raw.to_string()
                    })
                })
                .collect()
        });

        if corrected.is_empty() {
            NO_MEDICATIONS.to_string()
        } else {
            corrected.join(ENTRY_SEPARATOR)
        }
    }
}
