use serde::{Deserialize, Serialize};

use crate::engines::EXTERNAL_CAUSE_KEYWORDS;
use crate::evidence::{ComplaintRecord, ConfirmationStatus};

/// Attribution bucket for a complaint after investigation review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintTier {
    Confirmed,
    Unconfirmed,
    ExternalCause,
}

/// Per-tier counts and rates. The raw combined rate stays the regulator-facing
/// headline; the confirmed rate is the attributable safety signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRates {
    pub confirmed_count: usize,
    pub unconfirmed_count: usize,
    pub external_cause_count: usize,
    pub confirmed_rate: f64,
    pub unconfirmed_rate: f64,
    pub external_cause_rate: f64,
}

/// Deterministic tier assignment. A confirmed defect stays confirmed even when
/// the narrative also mentions handling; the keyword classifier only settles
/// records the investigation did not.
pub(crate) fn classify_tier(complaint: &ComplaintRecord) -> ComplaintTier {
    match complaint.confirmation() {
        ConfirmationStatus::Confirmed => ComplaintTier::Confirmed,
        ConfirmationStatus::NotConfirmed | ConfirmationStatus::Unknown => {
            let narrative = complaint
                .investigation
                .as_ref()
                .map(|inv| inv.narrative())
                .unwrap_or_default();
            if EXTERNAL_CAUSE_KEYWORDS
                .iter()
                .any(|keyword| narrative.contains(keyword))
            {
                ComplaintTier::ExternalCause
            } else {
                ComplaintTier::Unconfirmed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Investigation;
    use chrono::NaiveDate;

    fn complaint(confirmation: ConfirmationStatus, findings: Option<&str>) -> ComplaintRecord {
        let mut record = ComplaintRecord::new(
            "C-1",
            "DX-100",
            NaiveDate::from_ymd_opt(2025, 2, 1).expect("valid date"),
            "device failed",
        );
        record.investigation = Some(Investigation {
            confirmation,
            findings: findings.map(str::to_string),
            corrective_action: None,
            root_cause: None,
        });
        record
    }

    #[test]
    fn confirmed_defect_wins_over_keywords() {
        let record = complaint(
            ConfirmationStatus::Confirmed,
            Some("seal failed, aggravated by user error"),
        );
        assert_eq!(classify_tier(&record), ComplaintTier::Confirmed);
    }

    #[test]
    fn external_cause_keywords_settle_unconfirmed_records() {
        let record = complaint(
            ConfirmationStatus::NotConfirmed,
            Some("Carton crushed in transit: shipping damage"),
        );
        assert_eq!(classify_tier(&record), ComplaintTier::ExternalCause);
    }

    #[test]
    fn records_without_investigation_stay_unconfirmed() {
        let mut record = complaint(ConfirmationStatus::Unknown, None);
        record.investigation = None;
        assert_eq!(classify_tier(&record), ComplaintTier::Unconfirmed);
    }
}
