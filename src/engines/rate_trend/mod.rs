//! Exposure-normalized complaint rates, control-limit trend detection, and the
//! heightened trend-reporting determination.

mod spc;
mod thresholds;
mod tiers;

pub use spc::ControlLimits;
pub use thresholds::{BreachLevel, CategoryThreshold, RateThresholds, ThresholdBreach};
pub use tiers::{ComplaintTier, TierRates};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evidence::{ComplaintRecord, ReportingPeriod};
use crate::output::{
    round2, round4, CellValue, DataQualityIssue, Diagnostics, IssueKind, ReportTable,
};

/// One monthly point in the trend series, zero-filled for quiet months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub year: i32,
    pub month: u32,
    pub event_count: usize,
    pub rate: f64,
    pub exposure_denominator: f64,
    pub contributing_record_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTrendConfig {
    pub thresholds: RateThresholds,
}

/// Whether heightened trend reporting is triggered, with every contributing
/// reason enumerated for the justification narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightenedReporting {
    pub required: bool,
    pub reasons: Vec<String>,
}

/// Counts sliced along the three regulatory axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateBreakdown {
    pub by_category: BTreeMap<String, usize>,
    pub by_harm: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTrendAnalysis {
    pub diagnostics: Diagnostics,
    pub total_complaints: usize,
    pub exposure: f64,
    pub rate_per_thousand: f64,
    pub breakdown: RateBreakdown,
    pub trend: Vec<TrendPoint>,
    pub control_limits: ControlLimits,
    pub excursion_periods: Vec<String>,
    pub slope: f64,
    pub is_increasing: bool,
    pub is_statistically_significant: bool,
    pub category_rates: BTreeMap<String, f64>,
    pub threshold_breaches: Vec<ThresholdBreach>,
    pub heightened_reporting: HeightenedReporting,
    pub tiers: TierRates,
    pub tables: Vec<ReportTable>,
    pub contributing_record_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RateTrendEngine {
    config: RateTrendConfig,
}

impl RateTrendEngine {
    pub fn new(config: RateTrendConfig) -> Self {
        Self { config }
    }

    /// Run the full rate/trend analysis for one reporting window.
    ///
    /// `historical` points are prepended to the current monthly series before
    /// control limits and slope are computed, so a short current window still
    /// sits on a stable baseline.
    pub fn analyze(
        &self,
        complaints: &[ComplaintRecord],
        period: &ReportingPeriod,
        exposure: f64,
        historical: &[TrendPoint],
    ) -> RateTrendAnalysis {
        let mut issues = Vec::new();

        let exposure = if exposure.is_finite() && exposure >= 0.0 {
            exposure
        } else {
            tracing::warn!(exposure, "invalid exposure denominator substituted with 0");
            issues.push(DataQualityIssue::new(
                IssueKind::UnparseableNumber,
                "exposure",
                format!("invalid exposure denominator {exposure}; substituted 0"),
            ));
            0.0
        };
        if exposure == 0.0 {
            issues.push(DataQualityIssue::new(
                IssueKind::MissingExposure,
                "exposure",
                "exposure denominator is zero; all rates reported as 0",
            ));
        }

        let in_period: Vec<&ComplaintRecord> = complaints
            .iter()
            .filter(|complaint| period.contains(complaint.date))
            .collect();
        let total_complaints = in_period.len();
        let rate = rate_per_thousand(total_complaints as f64, exposure);

        let breakdown = build_breakdown(&in_period);
        let trend = build_trend(&in_period, period, exposure);

        let series: Vec<f64> = historical
            .iter()
            .map(|point| point.rate)
            .chain(trend.iter().map(|point| point.rate))
            .collect();
        let control_limits = spc::control_limits(&series);
        let excursion_periods: Vec<String> = trend
            .iter()
            .filter(|point| point.rate > control_limits.ucl)
            .map(|point| point.period.clone())
            .collect();

        let slope = spc::ols_slope(&series);
        let is_increasing = slope > 0.0;
        let last_three_above_mean = series.len() >= 3
            && series
                .iter()
                .rev()
                .take(3)
                .all(|value| *value > control_limits.mean);
        // The compound rule is fixed regulatory content: slope alone is never
        // enough, and a single excursion is always enough.
        let is_statistically_significant =
            (is_increasing && last_three_above_mean) || !excursion_periods.is_empty();

        let category_rates: BTreeMap<String, f64> = breakdown
            .by_category
            .iter()
            .map(|(category, count)| {
                (
                    category.clone(),
                    round4(rate_per_thousand(*count as f64, exposure)),
                )
            })
            .collect();
        let threshold_breaches = thresholds::evaluate(&category_rates, &self.config.thresholds);

        let mut reasons = Vec::new();
        if is_increasing && last_three_above_mean {
            reasons.push(format!(
                "increasing trend (slope {:.4} per month) with the last three monthly rates above the process mean",
                slope
            ));
        }
        if !excursion_periods.is_empty() {
            reasons.push(format!(
                "monthly rate exceeded the upper control limit in {}",
                excursion_periods.join(", ")
            ));
        }
        for breach in threshold_breaches
            .iter()
            .filter(|breach| breach.level == BreachLevel::Action)
        {
            reasons.push(format!(
                "category '{}' rate {:.2} per 1,000 exceeded the action threshold {:.2}",
                breach.category, breach.rate, breach.threshold
            ));
        }
        let heightened_reporting = HeightenedReporting {
            required: !reasons.is_empty(),
            reasons,
        };

        let tiers = build_tiers(&in_period, exposure);

        let contributing_record_ids: Vec<String> =
            in_period.iter().map(|complaint| complaint.id.clone()).collect();

        let tables = build_tables(
            total_complaints,
            exposure,
            rate,
            &trend,
            &tiers,
            &control_limits,
        );

        RateTrendAnalysis {
            diagnostics: Diagnostics::completed(issues),
            total_complaints,
            exposure,
            rate_per_thousand: round4(rate),
            breakdown,
            trend,
            control_limits,
            excursion_periods,
            slope,
            is_increasing,
            is_statistically_significant,
            category_rates,
            threshold_breaches,
            heightened_reporting,
            tiers,
            tables,
            contributing_record_ids,
        }
    }
}

/// Exposure-normalized rate; a zero denominator yields 0, never a division
/// error.
fn rate_per_thousand(count: f64, exposure: f64) -> f64 {
    if exposure <= 0.0 {
        0.0
    } else {
        count / exposure * 1000.0
    }
}

fn build_breakdown(in_period: &[&ComplaintRecord]) -> RateBreakdown {
    let mut breakdown = RateBreakdown::default();
    for complaint in in_period {
        let category = complaint
            .category
            .as_deref()
            .unwrap_or("uncategorized")
            .trim()
            .to_ascii_lowercase();
        *breakdown.by_category.entry(category).or_insert(0) += 1;
        if let Some(harm) = complaint.harm {
            *breakdown
                .by_harm
                .entry(harm.label().to_string())
                .or_insert(0) += 1;
        }
        if let Some(severity) = complaint.severity {
            *breakdown
                .by_severity
                .entry(severity.label().to_string())
                .or_insert(0) += 1;
        }
    }
    breakdown
}

fn build_trend(
    in_period: &[&ComplaintRecord],
    period: &ReportingPeriod,
    exposure: f64,
) -> Vec<TrendPoint> {
    let months = period.months();
    if months.is_empty() {
        return Vec::new();
    }
    // Uniform distribution of exposure across months is a fixed simplifying
    // assumption, not a measured value.
    let monthly_exposure = exposure / months.len() as f64;

    months
        .iter()
        .map(|month| {
            let contributing: Vec<String> = in_period
                .iter()
                .filter(|complaint| month.contains(complaint.date))
                .map(|complaint| complaint.id.clone())
                .collect();
            let event_count = contributing.len();
            TrendPoint {
                period: month.label(),
                year: month.year,
                month: month.month,
                event_count,
                rate: round4(rate_per_thousand(event_count as f64, monthly_exposure)),
                exposure_denominator: round2(monthly_exposure),
                contributing_record_ids: contributing,
            }
        })
        .collect()
}

fn build_tiers(in_period: &[&ComplaintRecord], exposure: f64) -> TierRates {
    let mut confirmed = 0usize;
    let mut unconfirmed = 0usize;
    let mut external = 0usize;
    for complaint in in_period {
        match tiers::classify_tier(complaint) {
            ComplaintTier::Confirmed => confirmed += 1,
            ComplaintTier::Unconfirmed => unconfirmed += 1,
            ComplaintTier::ExternalCause => external += 1,
        }
    }
    TierRates {
        confirmed_count: confirmed,
        unconfirmed_count: unconfirmed,
        external_cause_count: external,
        confirmed_rate: round4(rate_per_thousand(confirmed as f64, exposure)),
        unconfirmed_rate: round4(rate_per_thousand(unconfirmed as f64, exposure)),
        external_cause_rate: round4(rate_per_thousand(external as f64, exposure)),
    }
}

fn build_tables(
    total_complaints: usize,
    exposure: f64,
    rate: f64,
    trend: &[TrendPoint],
    tiers: &TierRates,
    control_limits: &ControlLimits,
) -> Vec<ReportTable> {
    let mut summary = ReportTable::new("Complaint Rate Summary", &["Metric", "Value"])
        .with_formula("rate = (complaints / exposure) x 1,000");
    summary.push_row(vec![
        CellValue::text("Complaints in period"),
        CellValue::count(total_complaints),
    ]);
    summary.push_row(vec![
        CellValue::text("Exposure (units)"),
        CellValue::number(exposure),
    ]);
    summary.push_row(vec![
        CellValue::text("Rate per 1,000 units"),
        CellValue::number(rate),
    ]);
    if exposure == 0.0 {
        summary.push_footnote(
            "Exposure denominator was zero; rates are reported as 0 and flagged as a data-quality condition.",
        );
    }

    let mut monthly = ReportTable::new(
        "Monthly Complaint Trend",
        &["Period", "Events", "Rate per 1,000", "Exposure"],
    );
    for point in trend {
        monthly.push_row(vec![
            CellValue::text(point.period.clone()),
            CellValue::count(point.event_count),
            CellValue::number(point.rate),
            CellValue::number(point.exposure_denominator),
        ]);
    }
    monthly.push_footnote(
        "Monthly exposure assumes uniform distribution of total exposure across calendar months.",
    );
    monthly.push_footnote(format!(
        "Control limits: mean {:.4}, UCL {:.4}, LCL {:.4}.",
        control_limits.mean, control_limits.ucl, control_limits.lcl
    ));

    let mut tier_table = ReportTable::new(
        "Confirmation Tier Rates",
        &["Tier", "Complaints", "Rate per 1,000"],
    );
    tier_table.push_row(vec![
        CellValue::text("Confirmed defect"),
        CellValue::count(tiers.confirmed_count),
        CellValue::number(tiers.confirmed_rate),
    ]);
    tier_table.push_row(vec![
        CellValue::text("Unconfirmed"),
        CellValue::count(tiers.unconfirmed_count),
        CellValue::number(tiers.unconfirmed_rate),
    ]);
    tier_table.push_row(vec![
        CellValue::text("External cause"),
        CellValue::count(tiers.external_cause_count),
        CellValue::number(tiers.external_cause_rate),
    ]);
    tier_table.push_footnote(
        "The combined rate is the regulator-facing headline; the confirmed rate is the attributable safety signal.",
    );

    vec![summary, monthly, tier_table]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn complaint(id: &str, day: NaiveDate) -> ComplaintRecord {
        ComplaintRecord::new(id, "DX-100", day, "device stopped working")
    }

    #[test]
    fn zero_exposure_yields_zero_rate_and_recorded_condition() {
        let period = ReportingPeriod::new(date(2025, 1, 1), date(2025, 3, 31));
        let complaints = vec![complaint("C-1", date(2025, 2, 2))];
        let analysis = RateTrendEngine::default().analyze(&complaints, &period, 0.0, &[]);

        assert!(analysis.diagnostics.success);
        assert_eq!(analysis.rate_per_thousand, 0.0);
        assert!(analysis
            .diagnostics
            .errors
            .iter()
            .any(|issue| issue.kind == IssueKind::MissingExposure));
        assert!(analysis.trend.iter().all(|point| point.rate == 0.0));
    }

    #[test]
    fn tier_counts_partition_the_period_total() {
        let period = ReportingPeriod::new(date(2025, 1, 1), date(2025, 3, 31));
        let mut confirmed = complaint("C-1", date(2025, 1, 10));
        confirmed.investigation = Some(crate::evidence::Investigation {
            confirmation: crate::evidence::ConfirmationStatus::Confirmed,
            findings: None,
            corrective_action: None,
            root_cause: None,
        });
        let mut external = complaint("C-2", date(2025, 2, 10));
        external.investigation = Some(crate::evidence::Investigation {
            confirmation: crate::evidence::ConfirmationStatus::NotConfirmed,
            findings: Some("damage consistent with user error".to_string()),
            corrective_action: None,
            root_cause: None,
        });
        let unconfirmed = complaint("C-3", date(2025, 3, 10));

        let analysis = RateTrendEngine::default().analyze(
            &[confirmed, external, unconfirmed],
            &period,
            1_000.0,
            &[],
        );
        let tiers = &analysis.tiers;
        assert_eq!(
            tiers.confirmed_count + tiers.unconfirmed_count + tiers.external_cause_count,
            analysis.total_complaints
        );
        assert_eq!(tiers.confirmed_count, 1);
        assert_eq!(tiers.external_cause_count, 1);
    }

    #[test]
    fn records_outside_the_period_are_ignored() {
        let period = ReportingPeriod::new(date(2025, 1, 1), date(2025, 3, 31));
        let complaints = vec![
            complaint("C-1", date(2024, 12, 31)),
            complaint("C-2", date(2025, 1, 1)),
            complaint("C-3", date(2025, 4, 1)),
        ];
        let analysis = RateTrendEngine::default().analyze(&complaints, &period, 1_000.0, &[]);
        assert_eq!(analysis.total_complaints, 1);
        assert_eq!(analysis.contributing_record_ids, vec!["C-2".to_string()]);
    }

    #[test]
    fn action_threshold_breach_triggers_heightened_reporting() {
        let period = ReportingPeriod::new(date(2025, 1, 1), date(2025, 3, 31));
        let mut complaints = Vec::new();
        for index in 0..5 {
            let mut record = complaint(&format!("C-{index}"), date(2025, 2, 5));
            record.category = Some("Mechanical".to_string());
            complaints.push(record);
        }
        // 5 complaints / 1,000 units = 5.0 per 1,000, past the default action
        // threshold of 1.0.
        let analysis = RateTrendEngine::default().analyze(&complaints, &period, 1_000.0, &[]);
        assert!(analysis.heightened_reporting.required);
        assert!(analysis
            .heightened_reporting
            .reasons
            .iter()
            .any(|reason| reason.contains("mechanical")));
        assert!(analysis
            .threshold_breaches
            .iter()
            .any(|breach| breach.level == BreachLevel::Action));
    }
}
