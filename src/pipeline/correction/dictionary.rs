//! Static correction tables used before and after the terminology lookup.

/// Likely medications per (lowercase) disease. A candidate matches when its first four
/// letters appear in the handwritten name.
///
/// Order matters: `Medroxyprogesterone` must precede `Progesterone`, otherwise the
/// "prog" prefix would claim it.
const DISEASE_MEDICATIONS: &[(&str, &[&str])] = &[
    (
        "secondary amenorrhea",
        &[
            "Medroxyprogesterone",
            "Progesterone",
            "Norethindrone",
            "Phenergan",
            "Diane-35",
        ],
    ),
    ("fever", &["Paracetamol", "Ibuprofen"]),
];

/// Substring corrections for names the terminology service does not know.
/// Checked in order against the lowercased name; longer keys first.
const NAME_CORRECTIONS: &[(&str, &str)] = &[
    ("diane 35", "Diane-35"),
    ("diane35", "Diane-35"),
    ("diane", "Diane-35"),
    ("wh. penicillin", "Penicillin V"),
    ("penichet", "Penicillin"),
    ("medroxyprogesterone", "Medroxyprogesterone"),
    ("progesterone", "Progesterone"),
    ("norethindrone", "Norethindrone"),
    ("phenergan", "Phenergan"),
];

/// Number of leading candidate characters that must appear in the written name.
const CANDIDATE_PREFIX_LEN: usize = 4;

/// Candidate medications for a disease, empty when the disease is not mapped.
pub fn disease_candidates(disease: &str) -> &'static [&'static str] {
    let key = disease.trim().to_lowercase();
    DISEASE_MEDICATIONS
        .iter()
        .find(|(d, _)| *d == key)
        .map(|(_, meds)| *meds)
        .unwrap_or(&[])
}

/// First candidate for `disease` whose prefix occurs in `name` (case-insensitive).
pub fn match_disease_candidate(name: &str, disease: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    disease_candidates(disease).iter().copied().find(|candidate| {
        let prefix: String = candidate
            .to_lowercase()
            .chars()
            .take(CANDIDATE_PREFIX_LEN)
            .collect();
        lower.contains(&prefix)
    })
}

/// Static substring correction for `name`, if any key occurs in it.
pub fn lookup_name_correction(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    NAME_CORRECTIONS
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, corrected)| *corrected)
}
