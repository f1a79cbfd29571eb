use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::EvidenceRecord;
use crate::output::{DataQualityIssue, IssueKind};

/// Closed harm scale; once assigned, a harm level is always one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmLevel {
    None,
    Negligible,
    Minor,
    Serious,
    Critical,
    Death,
}

impl HarmLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Negligible => "Negligible",
            Self::Minor => "Minor",
            Self::Serious => "Serious",
            Self::Critical => "Critical",
            Self::Death => "Death",
        }
    }

    /// Normalize free text into the closed set; unrecognized text maps to
    /// `None` rather than failing.
    pub fn from_text(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return None;
        }
        Some(match normalized.as_str() {
            "negligible" => Self::Negligible,
            "minor" | "low" => Self::Minor,
            "serious" | "major" | "severe" => Self::Serious,
            "critical" | "life-threatening" | "life threatening" => Self::Critical,
            "death" | "fatal" | "fatality" => Self::Death,
            _ => Self::None,
        })
    }
}

/// Investigation confirmation, normalized from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Confirmed,
    NotConfirmed,
    #[default]
    Unknown,
}

impl ConfirmationStatus {
    pub fn from_text(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "confirmed" | "defect confirmed" => Self::Confirmed,
            "no" | "n" | "false" | "not confirmed" | "unconfirmed" | "ruled out" => {
                Self::NotConfirmed
            }
            _ => Self::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::NotConfirmed => "Not Confirmed",
            Self::Unknown => "Unknown",
        }
    }
}

/// Yes/no answer captured inconsistently upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    #[default]
    Unspecified,
}

impl Answer {
    pub fn from_text(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Self::Yes,
            "no" | "n" | "false" | "none" => Self::No,
            _ => Self::Unspecified,
        }
    }
}

/// Investigation outcome fields attached to a complaint once closed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub confirmation: ConfirmationStatus,
    pub findings: Option<String>,
    pub corrective_action: Option<String>,
    pub root_cause: Option<String>,
}

impl Investigation {
    /// Combined investigation narrative used for keyword classification.
    pub fn narrative(&self) -> String {
        [&self.findings, &self.root_cause, &self.corrective_action]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase()
    }
}

/// One normalized complaint or serious-incident record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub id: String,
    pub device_code: String,
    pub date: NaiveDate,
    pub description: String,
    pub severity: Option<HarmLevel>,
    pub harm: Option<HarmLevel>,
    pub category: Option<String>,
    pub symptom_code: Option<String>,
    pub investigation: Option<Investigation>,
    pub product_id: Option<String>,
    pub lot_id: Option<String>,
    pub region: Option<String>,
    pub patient_involved: Answer,
    pub medical_attention: Answer,
}

impl ComplaintRecord {
    pub fn new(
        id: impl Into<String>,
        device_code: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            device_code: device_code.into(),
            date,
            description: description.into(),
            severity: None,
            harm: None,
            category: None,
            symptom_code: None,
            investigation: None,
            product_id: None,
            lot_id: None,
            region: None,
            patient_involved: Answer::Unspecified,
            medical_attention: Answer::Unspecified,
        }
    }

    /// Build a complaint from an ingestion field bag.
    ///
    /// Returns `None` when the event date is missing or unparseable, since a
    /// dateless record cannot be placed in any reporting window; the condition
    /// is recorded instead of raised.
    pub fn from_evidence(
        record: &EvidenceRecord,
        issues: &mut Vec<DataQualityIssue>,
    ) -> Option<Self> {
        let date_raw = record.field(&["complaint_date", "event_date", "date_received", "date"]);
        let date = match date_raw {
            Some(raw) => match super::fields::parse_date(raw) {
                Some(date) => date,
                None => {
                    issues.push(DataQualityIssue::new(
                        IssueKind::MalformedDate,
                        record.id.clone(),
                        format!("unparseable event date {raw:?}; record excluded from period"),
                    ));
                    return None;
                }
            },
            None => {
                issues.push(DataQualityIssue::new(
                    IssueKind::MissingValue,
                    record.id.clone(),
                    "no event date field present; record excluded from period",
                ));
                return None;
            }
        };

        let device_code = record
            .field_or(&["device_code", "device", "product_code", "udi"], "unknown")
            .to_string();
        let description = record
            .field_or(&["description", "complaint_text", "narrative", "event_description"], "")
            .to_string();

        let investigation = {
            let confirmation = record
                .field(&["confirmed", "defect_confirmed", "investigation_conclusion"])
                .map(ConfirmationStatus::from_text)
                .unwrap_or_default();
            let findings = record
                .field(&["investigation_findings", "findings"])
                .map(str::to_string);
            let corrective_action = record
                .field(&["corrective_action", "capa", "action_taken"])
                .map(str::to_string);
            let root_cause = record.field(&["root_cause", "cause"]).map(str::to_string);
            if confirmation == ConfirmationStatus::Unknown
                && findings.is_none()
                && corrective_action.is_none()
                && root_cause.is_none()
            {
                None
            } else {
                Some(Investigation {
                    confirmation,
                    findings,
                    corrective_action,
                    root_cause,
                })
            }
        };

        Some(Self {
            id: record.id.clone(),
            device_code,
            date,
            description,
            severity: record
                .field(&["severity", "severity_level"])
                .and_then(HarmLevel::from_text),
            harm: record
                .field(&["harm", "harm_level", "patient_harm"])
                .and_then(HarmLevel::from_text),
            category: record
                .field(&["category", "complaint_category", "problem_category"])
                .map(str::to_string),
            symptom_code: record
                .field(&["symptom_code", "symptom", "problem_code"])
                .map(str::to_string),
            investigation,
            product_id: record
                .field(&["product_id", "product", "model"])
                .map(str::to_string),
            lot_id: record
                .field(&["lot_id", "lot_number", "lot", "batch"])
                .map(str::to_string),
            region: record
                .field(&["region", "country", "market"])
                .map(str::to_string),
            patient_involved: record
                .field(&["patient_involvement", "patient_involved"])
                .map(Answer::from_text)
                .unwrap_or_default(),
            medical_attention: record
                .field(&["additional_medical_attention", "medical_attention"])
                .map(Answer::from_text)
                .unwrap_or_default(),
        })
    }

    /// Confirmation status, `Unknown` when no investigation was recorded.
    pub fn confirmation(&self) -> ConfirmationStatus {
        self.investigation
            .as_ref()
            .map(|inv| inv.confirmation)
            .unwrap_or_default()
    }
}
