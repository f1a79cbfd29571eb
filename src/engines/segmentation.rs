//! Slices complaints by region, product, manufacturing lot, and calendar
//! quarter against the baseline rate, surfacing localized signals the
//! aggregate rate hides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evidence::{
    self, quarter_label, ComplaintRecord, ConfirmationStatus, ReportingPeriod, SalesRecord,
};
use crate::output::{round4, CellValue, DataQualityIssue, Diagnostics, IssueKind, ReportTable};

const RATE_RATIO_ALERT: f64 = 2.0;
const MIN_SEGMENT_COMPLAINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    Region,
    Product,
    Lot,
    Quarter,
}

impl SegmentType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Region => "Region",
            Self::Product => "Product",
            Self::Lot => "Manufacturing Lot",
            Self::Quarter => "Quarter",
        }
    }
}

/// Metrics for one segment slice against the baseline expected rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetrics {
    pub segment_type: SegmentType,
    pub segment_id: String,
    pub event_count: usize,
    pub confirmed_count: usize,
    pub exposure_count: f64,
    pub observed_rate: f64,
    pub expected_rate: f64,
    pub rate_ratio: f64,
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationAnalysis {
    pub diagnostics: Diagnostics,
    pub segments: Vec<SegmentMetrics>,
    pub flagged_segments: Vec<SegmentMetrics>,
    pub tables: Vec<ReportTable>,
    pub contributing_record_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentationEngine;

impl SegmentationEngine {
    /// Compute all four segment groupings for the reporting window.
    ///
    /// `baseline_rate` is the rate engine's combined rate per 1,000 units;
    /// `total_exposure` is the deduplicated exposure denominator for the same
    /// window.
    pub fn segment(
        &self,
        complaints: &[ComplaintRecord],
        sales: &[SalesRecord],
        period: &ReportingPeriod,
        baseline_rate: f64,
        total_exposure: f64,
    ) -> SegmentationAnalysis {
        let mut issues = Vec::new();

        let in_period: Vec<&ComplaintRecord> = complaints
            .iter()
            .filter(|complaint| period.contains(complaint.date))
            .collect();

        if total_exposure <= 0.0 {
            issues.push(DataQualityIssue::new(
                IssueKind::MissingExposure,
                "exposure",
                "no exposure available; segment rates reported as 0",
            ));
        }

        let mut segments = Vec::new();

        let region_exposure = evidence::exposure_by_region(sales, period);
        segments.extend(grouped_segments(
            SegmentType::Region,
            &in_period,
            baseline_rate,
            |complaint| complaint.region.clone(),
            |region| region_exposure.get(region).copied().unwrap_or(0.0),
        ));

        // Product segments share the device-level exposure denominator; a
        // per-product split is not available upstream.
        segments.extend(grouped_segments(
            SegmentType::Product,
            &in_period,
            baseline_rate,
            |complaint| {
                complaint
                    .product_id
                    .clone()
                    .or_else(|| Some(complaint.device_code.clone()))
            },
            |_| total_exposure,
        ));

        let lot_groups = group_by(&in_period, |complaint| complaint.lot_id.clone());
        // Lot-level exposure is rarely reported separately; fall back to an
        // even split across the lots that have complaints.
        let lot_exposure = if lot_groups.is_empty() {
            0.0
        } else {
            total_exposure / lot_groups.len() as f64
        };
        for (lot, records) in lot_groups {
            let mut metrics = build_metrics(
                SegmentType::Lot,
                lot,
                &records,
                lot_exposure,
                baseline_rate,
            );
            // Lot clustering implies a batch defect, so the flag fires on more
            // than one complaint regardless of the rate ratio.
            metrics.flagged = metrics.event_count > 1;
            segments.push(metrics);
        }

        for (quarter, records) in group_by(&in_period, |complaint| Some(quarter_label(complaint.date)))
        {
            let mut metrics = build_metrics(
                SegmentType::Quarter,
                quarter,
                &records,
                total_exposure,
                baseline_rate,
            );
            // Quarterly slices are for trend visibility only; they never alert.
            metrics.flagged = false;
            segments.push(metrics);
        }

        let flagged_segments: Vec<SegmentMetrics> = segments
            .iter()
            .filter(|segment| segment.flagged)
            .cloned()
            .collect();

        let contributing_record_ids: Vec<String> =
            in_period.iter().map(|complaint| complaint.id.clone()).collect();
        let tables = build_tables(&segments, &flagged_segments);

        SegmentationAnalysis {
            diagnostics: Diagnostics::completed(issues),
            segments,
            flagged_segments,
            tables,
            contributing_record_ids,
        }
    }
}

fn group_by<'a, F>(
    in_period: &[&'a ComplaintRecord],
    key: F,
) -> BTreeMap<String, Vec<&'a ComplaintRecord>>
where
    F: Fn(&ComplaintRecord) -> Option<String>,
{
    let mut groups: BTreeMap<String, Vec<&ComplaintRecord>> = BTreeMap::new();
    for complaint in in_period {
        if let Some(value) = key(complaint) {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                groups.entry(trimmed).or_default().push(complaint);
            }
        }
    }
    groups
}

fn grouped_segments<'a, K, E>(
    segment_type: SegmentType,
    in_period: &[&'a ComplaintRecord],
    baseline_rate: f64,
    key: K,
    exposure_for: E,
) -> Vec<SegmentMetrics>
where
    K: Fn(&ComplaintRecord) -> Option<String>,
    E: Fn(&str) -> f64,
{
    group_by(in_period, key)
        .into_iter()
        .map(|(id, records)| {
            let exposure = exposure_for(&id);
            let mut metrics = build_metrics(segment_type, id, &records, exposure, baseline_rate);
            metrics.flagged = metrics.rate_ratio > RATE_RATIO_ALERT
                && metrics.event_count >= MIN_SEGMENT_COMPLAINTS;
            metrics
        })
        .collect()
}

fn build_metrics(
    segment_type: SegmentType,
    segment_id: String,
    records: &[&ComplaintRecord],
    exposure: f64,
    expected_rate: f64,
) -> SegmentMetrics {
    let event_count = records.len();
    let confirmed_count = records
        .iter()
        .filter(|complaint| complaint.confirmation() == ConfirmationStatus::Confirmed)
        .count();
    let observed_rate = if exposure <= 0.0 {
        0.0
    } else {
        event_count as f64 / exposure * 1000.0
    };
    // An unknown expected rate reads as "no elevation", not infinite elevation.
    let rate_ratio = if expected_rate <= 0.0 {
        0.0
    } else {
        observed_rate / expected_rate
    };

    SegmentMetrics {
        segment_type,
        segment_id,
        event_count,
        confirmed_count,
        exposure_count: exposure,
        observed_rate: round4(observed_rate),
        expected_rate: round4(expected_rate),
        rate_ratio: round4(rate_ratio),
        flagged: false,
    }
}

fn build_tables(segments: &[SegmentMetrics], flagged: &[SegmentMetrics]) -> Vec<ReportTable> {
    let mut detail = ReportTable::new(
        "Segment Metrics",
        &[
            "Segment Type",
            "Segment",
            "Events",
            "Confirmed",
            "Observed Rate",
            "Rate Ratio",
        ],
    )
    .with_formula("rate_ratio = observed_rate / expected_rate");
    for segment in segments {
        detail.push_row(vec![
            CellValue::text(segment.segment_type.label()),
            CellValue::text(segment.segment_id.clone()),
            CellValue::count(segment.event_count),
            CellValue::count(segment.confirmed_count),
            CellValue::number(segment.observed_rate),
            CellValue::number(segment.rate_ratio),
        ]);
    }
    detail.push_footnote(
        "Lot exposure is approximated by splitting total exposure evenly across lots with complaints.",
    );

    let mut alerts = ReportTable::new(
        "Flagged Segments",
        &["Segment Type", "Segment", "Events", "Rate Ratio"],
    );
    for segment in flagged {
        alerts.push_row(vec![
            CellValue::text(segment.segment_type.label()),
            CellValue::text(segment.segment_id.clone()),
            CellValue::count(segment.event_count),
            CellValue::number(segment.rate_ratio),
        ]);
    }
    alerts.push_footnote(
        "Region/product segments alert on rate ratio > 2.0 with at least 3 complaints; lots alert on more than one complaint.",
    );

    vec![detail, alerts]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn period() -> ReportingPeriod {
        ReportingPeriod::new(date(2025, 1, 1), date(2025, 6, 30))
    }

    fn complaint_in_lot(id: &str, lot: &str) -> ComplaintRecord {
        let mut record =
            ComplaintRecord::new(id, "DX-100", date(2025, 2, 10), "seal leaked");
        record.lot_id = Some(lot.to_string());
        record
    }

    #[test]
    fn lot_with_two_complaints_is_always_flagged() {
        let complaints = vec![
            complaint_in_lot("C-1", "LOT-A"),
            complaint_in_lot("C-2", "LOT-A"),
            complaint_in_lot("C-3", "LOT-B"),
        ];
        let analysis =
            SegmentationEngine.segment(&complaints, &[], &period(), 100.0, 10_000.0);

        let lot_a = analysis
            .segments
            .iter()
            .find(|segment| segment.segment_type == SegmentType::Lot && segment.segment_id == "LOT-A")
            .expect("lot A present");
        assert!(lot_a.flagged);

        let lot_b = analysis
            .segments
            .iter()
            .find(|segment| segment.segment_type == SegmentType::Lot && segment.segment_id == "LOT-B")
            .expect("lot B present");
        assert!(!lot_b.flagged, "single-complaint lot never alerts");
    }

    #[test]
    fn zero_expected_rate_yields_zero_ratio() {
        let complaints = vec![complaint_in_lot("C-1", "LOT-A")];
        let analysis = SegmentationEngine.segment(&complaints, &[], &period(), 0.0, 1_000.0);
        assert!(analysis
            .segments
            .iter()
            .all(|segment| segment.rate_ratio == 0.0));
    }

    #[test]
    fn quarter_segments_never_alert() {
        let complaints: Vec<ComplaintRecord> = (0..6)
            .map(|index| {
                ComplaintRecord::new(
                    format!("C-{index}"),
                    "DX-100",
                    date(2025, 2, 1 + index),
                    "failure",
                )
            })
            .collect();
        let analysis = SegmentationEngine.segment(&complaints, &[], &period(), 0.01, 100.0);
        assert!(analysis
            .segments
            .iter()
            .filter(|segment| segment.segment_type == SegmentType::Quarter)
            .all(|segment| !segment.flagged));
    }
}
