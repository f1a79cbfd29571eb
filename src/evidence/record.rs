use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::fields;

/// Record-type tag assigned by the ingestion collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Complaint,
    SeriousIncident,
    Sales,
    Literature,
    FollowUpStudy,
}

impl RecordType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Complaint => "Complaint",
            Self::SeriousIncident => "Serious Incident",
            Self::Sales => "Sales",
            Self::Literature => "Literature",
            Self::FollowUpStudy => "Follow-up Study",
        }
    }
}

/// Normalized evidence record as delivered by the ingestion layer: a stable
/// identifier, a type tag, and a field bag with upstream-flavored keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: String,
    pub record_type: RecordType,
    pub fields: BTreeMap<String, String>,
}

impl EvidenceRecord {
    pub fn new(id: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            id: id.into(),
            record_type,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(fields::normalize_key(key), value.into());
        self
    }

    /// First non-empty value among the candidate field names.
    pub fn field(&self, names: &[&str]) -> Option<&str> {
        fields::first_present(&self.fields, names)
    }

    pub fn field_or<'a>(&'a self, names: &[&str], default: &'a str) -> &'a str {
        fields::first_present_or(&self.fields, names, default)
    }

    pub fn number(&self, names: &[&str]) -> Option<f64> {
        self.field(names).and_then(fields::parse_number)
    }

    pub fn date(&self, names: &[&str]) -> Option<NaiveDate> {
        self.field(names).and_then(fields::parse_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_tolerates_upstream_name_drift() {
        let record = EvidenceRecord::new("C-001", RecordType::Complaint)
            .with_field("Device Code", "DX-100")
            .with_field("Date Received", "2025-02-10")
            .with_field("Qty", "$1,200");

        assert_eq!(record.field(&["device", "device_code"]), Some("DX-100"));
        assert_eq!(
            record.date(&["complaint_date", "date_received"]),
            NaiveDate::from_ymd_opt(2025, 2, 10)
        );
        assert_eq!(record.number(&["quantity", "qty"]), Some(1200.0));
        assert_eq!(record.field(&["lot_number"]), None);
    }
}
