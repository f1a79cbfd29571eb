//! End-to-end rate and trend analysis over a full reporting window built from
//! sales exposure and complaint records.

use chrono::NaiveDate;
use vigilance_core::engines::rate_trend::{RateTrendEngine, TrendPoint};
use vigilance_core::evidence::{total_exposure, ComplaintRecord, ReportingPeriod, SalesRecord};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn half_year() -> ReportingPeriod {
    ReportingPeriod::new(date(2025, 1, 1), date(2025, 6, 30))
}

fn sales_thousand_units() -> Vec<SalesRecord> {
    vec![SalesRecord {
        device_code: "DX-100".to_string(),
        quantity: 1_000.0,
        region: "EU".to_string(),
        start: date(2025, 1, 1),
        end: date(2025, 6, 30),
    }]
}

/// Two complaints in every month of the half-year, each in its own category so
/// no single category crosses a threshold.
fn steady_complaints() -> Vec<ComplaintRecord> {
    let mut complaints = Vec::new();
    for month in 1..=6u32 {
        for (slot, day) in [5u32, 20].into_iter().enumerate() {
            let mut record = ComplaintRecord::new(
                format!("CPL-{month}-{slot}"),
                "DX-100",
                date(2025, month, day),
                "device stopped during use",
            );
            record.category = Some(format!("category-{month}-{slot}"));
            complaints.push(record);
        }
    }
    complaints
}

#[test]
fn steady_series_is_flat_and_not_significant() {
    let period = half_year();
    let exposure = total_exposure(&sales_thousand_units(), &period);
    assert_eq!(exposure, 1_000.0);

    let analysis =
        RateTrendEngine::default().analyze(&steady_complaints(), &period, exposure, &[]);

    assert_eq!(analysis.total_complaints, 12);
    assert!((analysis.rate_per_thousand - 12.0).abs() < 1e-9);

    // 2 events against a 166.67-unit monthly share is 12.0 per 1,000 in every
    // month, so the control chart is flat.
    assert_eq!(analysis.trend.len(), 6);
    for point in &analysis.trend {
        assert_eq!(point.event_count, 2);
        assert!((point.rate - 12.0).abs() < 1e-9);
    }
    assert!(analysis.excursion_periods.is_empty());
    assert_eq!(analysis.slope, 0.0);
    assert!(!analysis.is_increasing);
    assert!(!analysis.is_statistically_significant);
}

#[test]
fn spike_against_quiet_history_is_an_excursion() {
    let period = ReportingPeriod::new(date(2025, 4, 1), date(2025, 4, 30));
    let historical: Vec<TrendPoint> = (1..=3u32)
        .map(|month| TrendPoint {
            period: format!("2025-{month:02}"),
            year: 2025,
            month,
            event_count: 1,
            rate: 1.0 + 0.1 * month as f64,
            exposure_denominator: 1_000.0,
            contributing_record_ids: vec![format!("H-{month}")],
        })
        .collect();

    let complaints: Vec<ComplaintRecord> = (0..20)
        .map(|index| {
            ComplaintRecord::new(
                format!("CPL-{index}"),
                "DX-100",
                date(2025, 4, 10),
                "seal failure",
            )
        })
        .collect();

    let analysis = RateTrendEngine::default().analyze(&complaints, &period, 1_000.0, &historical);

    // 20 events / 1,000 units = 20 per 1,000 against a baseline near 1.1.
    assert_eq!(analysis.excursion_periods, vec!["2025-04".to_string()]);
    assert!(analysis.is_statistically_significant);
    assert!(analysis.heightened_reporting.required);
    assert!(analysis
        .heightened_reporting
        .reasons
        .iter()
        .any(|reason| reason.contains("upper control limit")));
}

#[test]
fn monthly_points_carry_their_contributing_records() {
    let period = half_year();
    let analysis =
        RateTrendEngine::default().analyze(&steady_complaints(), &period, 1_000.0, &[]);

    let march = analysis
        .trend
        .iter()
        .find(|point| point.period == "2025-03")
        .expect("march present");
    assert_eq!(
        march.contributing_record_ids,
        vec!["CPL-3-0".to_string(), "CPL-3-1".to_string()]
    );

    // Every in-period record appears in exactly one month.
    let total_from_months: usize = analysis.trend.iter().map(|point| point.event_count).sum();
    assert_eq!(total_from_months, analysis.total_complaints);
}

#[test]
fn summary_table_reports_the_rate_formula() {
    let period = half_year();
    let analysis =
        RateTrendEngine::default().analyze(&steady_complaints(), &period, 1_000.0, &[]);

    let summary = analysis
        .tables
        .iter()
        .find(|table| table.title == "Complaint Rate Summary")
        .expect("summary table present");
    assert_eq!(
        summary.formula.as_deref(),
        Some("rate = (complaints / exposure) x 1,000")
    );
}
