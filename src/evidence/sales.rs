use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::period::ReportingPeriod;
use super::record::EvidenceRecord;
use crate::output::{DataQualityIssue, IssueKind};

/// One sales/shipment line used as the exposure denominator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub device_code: String,
    pub quantity: f64,
    pub region: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SalesRecord {
    /// Build a sales record from an ingestion field bag. A missing or
    /// unparseable quantity becomes zero with a recorded condition; the record
    /// is kept so region coverage stays visible.
    pub fn from_evidence(
        record: &EvidenceRecord,
        issues: &mut Vec<DataQualityIssue>,
    ) -> Option<Self> {
        let start = record.date(&["period_start", "start_date", "from", "date"]);
        let end = record.date(&["period_end", "end_date", "to", "date"]);
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start.min(end), start.max(end)),
            _ => {
                issues.push(DataQualityIssue::new(
                    IssueKind::MalformedDate,
                    record.id.clone(),
                    "sales record lacks a parseable covered period; excluded from exposure",
                ));
                return None;
            }
        };

        let quantity = match record.field(&["quantity", "units_sold", "units", "qty", "volume"]) {
            Some(raw) => match super::fields::parse_number(raw) {
                Some(value) if value >= 0.0 => value,
                Some(value) => {
                    issues.push(DataQualityIssue::new(
                        IssueKind::UnparseableNumber,
                        record.id.clone(),
                        format!("negative quantity {value} clamped to 0"),
                    ));
                    0.0
                }
                None => {
                    issues.push(DataQualityIssue::new(
                        IssueKind::UnparseableNumber,
                        record.id.clone(),
                        format!("unparseable quantity {raw:?}; substituted 0"),
                    ));
                    0.0
                }
            },
            None => {
                issues.push(DataQualityIssue::new(
                    IssueKind::MissingValue,
                    record.id.clone(),
                    "no quantity field present; substituted 0",
                ));
                0.0
            }
        };

        Some(Self {
            device_code: record
                .field_or(&["device_code", "device", "product_code"], "unknown")
                .to_string(),
            quantity,
            region: record
                .field_or(&["region", "country", "market"], "unknown")
                .to_string(),
            start,
            end,
        })
    }
}

fn dedupe_key(record: &SalesRecord) -> (String, u64, NaiveDate, NaiveDate) {
    (
        record.region.clone(),
        record.quantity.to_bits(),
        record.start,
        record.end,
    )
}

/// Total exposure across the reporting window.
///
/// Records are counted on inclusive range overlap, and identical
/// `(region, quantity, period)` tuples are deduplicated so a shipment reported
/// by multiple sources is not double counted.
pub fn total_exposure(records: &[SalesRecord], period: &ReportingPeriod) -> f64 {
    let mut seen = BTreeSet::new();
    records
        .iter()
        .filter(|record| period.overlaps(record.start, record.end))
        .filter(|record| seen.insert(dedupe_key(record)))
        .map(|record| record.quantity)
        .sum()
}

/// Deduplicated exposure per region, for segment denominators.
pub fn exposure_by_region(records: &[SalesRecord], period: &ReportingPeriod) -> BTreeMap<String, f64> {
    let mut seen = BTreeSet::new();
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|record| period.overlaps(record.start, record.end))
        .filter(|record| seen.insert(dedupe_key(record)))
    {
        *totals.entry(record.region.clone()).or_insert(0.0) += record.quantity;
    }
    totals
}
