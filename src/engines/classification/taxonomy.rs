//! Fixed symptom-to-taxonomy mapping table.
//!
//! This table is immutable regulatory content, compiled in and shared
//! process-wide as read-only data. Codes follow the two-axis scheme: a device
//! problem code (A-series) and an optional patient-harm code (E-series).

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::evidence::HarmLevel;

#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyEntry {
    pub device_problem_code: &'static str,
    pub device_problem_term: &'static str,
    pub harm_code: Option<&'static str>,
    pub harm_term: &'static str,
    pub default_severity: HarmLevel,
    pub requires_context_adjudication: bool,
}

pub(crate) const NO_HARM_TERM: &str = "No patient harm";
pub(crate) const INJURY_HARM_CODE: &str = "E1801";
pub(crate) const INJURY_HARM_TERM: &str = "Injury";

const ENTRIES: &[(&str, TaxonomyEntry)] = &[
    (
        "breakage",
        TaxonomyEntry {
            device_problem_code: "A0901",
            device_problem_term: "Break",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Minor,
            requires_context_adjudication: true,
        },
    ),
    (
        "fracture",
        TaxonomyEntry {
            device_problem_code: "A0902",
            device_problem_term: "Fracture",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Minor,
            requires_context_adjudication: true,
        },
    ),
    (
        "electricalshock",
        TaxonomyEntry {
            device_problem_code: "A0605",
            device_problem_term: "Electrical Shock Hazard",
            harm_code: Some(INJURY_HARM_CODE),
            harm_term: INJURY_HARM_TERM,
            default_severity: HarmLevel::Serious,
            requires_context_adjudication: true,
        },
    ),
    (
        "electrical",
        TaxonomyEntry {
            device_problem_code: "A0604",
            device_problem_term: "Electrical Problem",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Minor,
            requires_context_adjudication: true,
        },
    ),
    (
        "contamination",
        TaxonomyEntry {
            device_problem_code: "A1401",
            device_problem_term: "Contamination",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Minor,
            requires_context_adjudication: true,
        },
    ),
    (
        "overheating",
        TaxonomyEntry {
            device_problem_code: "A2301",
            device_problem_term: "Overheating",
            harm_code: Some("E1501"),
            harm_term: "Burn",
            default_severity: HarmLevel::Serious,
            requires_context_adjudication: true,
        },
    ),
    (
        "leak",
        TaxonomyEntry {
            device_problem_code: "A1005",
            device_problem_term: "Fluid Leak",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Minor,
            requires_context_adjudication: false,
        },
    ),
    (
        "alarmfailure",
        TaxonomyEntry {
            device_problem_code: "A0401",
            device_problem_term: "Alarm Failure",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Serious,
            requires_context_adjudication: false,
        },
    ),
    (
        "softwareerror",
        TaxonomyEntry {
            device_problem_code: "A1101",
            device_problem_term: "Software Issue",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Minor,
            requires_context_adjudication: false,
        },
    ),
    (
        "batteryfailure",
        TaxonomyEntry {
            device_problem_code: "A0701",
            device_problem_term: "Battery Failure",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Minor,
            requires_context_adjudication: false,
        },
    ),
    (
        "labelingerror",
        TaxonomyEntry {
            device_problem_code: "A1601",
            device_problem_term: "Labeling Issue",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Negligible,
            requires_context_adjudication: false,
        },
    ),
    (
        "packagingdamage",
        TaxonomyEntry {
            device_problem_code: "A1701",
            device_problem_term: "Packaging Damaged",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Negligible,
            requires_context_adjudication: false,
        },
    ),
    (
        "infection",
        TaxonomyEntry {
            device_problem_code: "A1402",
            device_problem_term: "Microbial Contamination",
            harm_code: Some("E0801"),
            harm_term: "Infection",
            default_severity: HarmLevel::Serious,
            requires_context_adjudication: false,
        },
    ),
    (
        "allergicreaction",
        TaxonomyEntry {
            device_problem_code: "A2101",
            device_problem_term: "Biocompatibility Issue",
            harm_code: Some("E0601"),
            harm_term: "Allergic Reaction",
            default_severity: HarmLevel::Serious,
            requires_context_adjudication: false,
        },
    ),
    (
        "malfunction",
        TaxonomyEntry {
            device_problem_code: "A0101",
            device_problem_term: "Device Malfunction",
            harm_code: None,
            harm_term: NO_HARM_TERM,
            default_severity: HarmLevel::Minor,
            requires_context_adjudication: false,
        },
    ),
];

const FALLBACK: TaxonomyEntry = TaxonomyEntry {
    device_problem_code: "A9999",
    device_problem_term: "Other Device Problem",
    harm_code: None,
    harm_term: NO_HARM_TERM,
    default_severity: HarmLevel::Minor,
    requires_context_adjudication: false,
};

fn table() -> &'static BTreeMap<&'static str, &'static TaxonomyEntry> {
    static TABLE: OnceLock<BTreeMap<&'static str, &'static TaxonomyEntry>> = OnceLock::new();
    TABLE.get_or_init(|| ENTRIES.iter().map(|(key, entry)| (*key, entry)).collect())
}

/// Normalize a symptom code for lookup: lowercase, separators stripped.
pub(crate) fn normalize_symptom(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .collect()
}

/// Exact-key lookup over the fixed table.
pub(crate) fn lookup_exact(normalized: &str) -> Option<&'static TaxonomyEntry> {
    table().get(normalized).copied()
}

/// Substring containment fallback when no exact key matches. Keys are checked
/// in sorted order so ties resolve deterministically.
pub(crate) fn lookup_substring(normalized: &str) -> Option<&'static TaxonomyEntry> {
    if normalized.is_empty() {
        return None;
    }
    table()
        .iter()
        .find(|(key, _)| normalized.contains(*key) || key.contains(normalized))
        .map(|(_, entry)| *entry)
}

/// Catch-all entry used when nothing in the table matches.
pub(crate) fn fallback() -> &'static TaxonomyEntry {
    &FALLBACK
}

/// Reclassification target for failures with an external/packaging cause.
pub(crate) fn external_cause_entry() -> &'static TaxonomyEntry {
    table()
        .get("packagingdamage")
        .copied()
        .unwrap_or(&FALLBACK)
}
