//! Full pipeline run over a quarter of evidence, from raw records through the
//! benefit-risk determination.

use chrono::NaiveDate;
use vigilance_core::config::EngineSettings;
use vigilance_core::engines::classification::ClassificationMethod;
use vigilance_core::engines::decision::{
    ClinicalBenefit, Determination, DeviceProfile, LiteratureConclusions, LiteratureInputs,
    RatioChange, RiskClass, RiskManagementInputs, RiskProfileInputs, StateOfArtInputs,
};
use vigilance_core::engines::rate_trend::RateTrendConfig;
use vigilance_core::evidence::{Answer, ComplaintRecord, ReportingPeriod, SalesRecord};
use vigilance_core::pipeline::{SurveillanceContext, SurveillancePipeline};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn quarter_context() -> SurveillanceContext {
    let period = ReportingPeriod::new(date(2025, 1, 1), date(2025, 3, 31));

    let mut battery = ComplaintRecord::new(
        "CPL-1",
        "DX-100",
        date(2025, 1, 14),
        "device shut down unexpectedly",
    );
    battery.symptom_code = Some("battery_failure".to_string());
    battery.category = Some("power".to_string());
    battery.region = Some("EU".to_string());

    let mut shock = ComplaintRecord::new(
        "CPL-2",
        "DX-100",
        date(2025, 2, 6),
        "operator reported a shock during bench cleaning",
    );
    shock.symptom_code = Some("electrical_shock".to_string());
    shock.category = Some("electrical".to_string());
    shock.region = Some("US".to_string());
    shock.patient_involved = Answer::No;
    shock.medical_attention = Answer::No;

    let mut unknown = ComplaintRecord::new(
        "CPL-3",
        "DX-100",
        date(2025, 3, 19),
        "customer dissatisfied with device colour",
    );
    unknown.category = Some("cosmetic".to_string());
    unknown.region = Some("EU".to_string());

    let sales = vec![
        SalesRecord {
            device_code: "DX-100".to_string(),
            quantity: 800.0,
            region: "EU".to_string(),
            start: date(2025, 1, 1),
            end: date(2025, 3, 31),
        },
        SalesRecord {
            device_code: "DX-100".to_string(),
            quantity: 1_200.0,
            region: "US".to_string(),
            start: date(2025, 1, 1),
            end: date(2025, 3, 31),
        },
    ];

    SurveillanceContext {
        period,
        complaints: vec![battery, shock, unknown],
        sales,
        historical_trend: Vec::new(),
        device: DeviceProfile {
            device_code: "DX-100".to_string(),
            risk_class: RiskClass::ClassIIa,
            is_implantable: false,
            is_novel: false,
            is_life_sustaining: false,
            contains_nanomaterial: false,
            uses_animal_tissue: false,
        },
        risk_profile: RiskProfileInputs::default(),
        literature: LiteratureInputs {
            sufficient_clinical_evidence: true,
            evidence_gap_count: 0,
        },
        state_of_art: StateOfArtInputs {
            aligned_with_state_of_art: true,
            notes: None,
        },
        benefit: ClinicalBenefit {
            magnitude: 0.6,
            population: 10_000.0,
            description: "continuous glucose visibility".to_string(),
        },
        risk_management: RiskManagementInputs {
            all_risks_mitigated: true,
            residual_risk_acceptable: true,
        },
        literature_conclusions: LiteratureConclusions {
            new_risks_identified: false,
            consistent_with_state_of_art: true,
            safety_profile_stable: true,
        },
        previous_ratio: Some(1_900.0),
        complaint_rate_threshold: 2.0,
        serious_incident_limit: 5,
    }
}

#[tokio::test]
async fn quiet_quarter_ends_favorable_without_follow_up() {
    let pipeline =
        SurveillancePipeline::deterministic(&EngineSettings::default(), RateTrendConfig::default());
    let assessment = pipeline.run(&quarter_context()).await;

    // 3 complaints over 2,000 units.
    assert_eq!(assessment.rate_trend.total_complaints, 3);
    assert!((assessment.rate_trend.rate_per_thousand - 1.5).abs() < 1e-9);
    assert!(!assessment.rate_trend.is_statistically_significant);
    assert!(!assessment.rate_trend.heightened_reporting.required);

    // One complaint per region or lot never clusters.
    assert!(assessment.segmentation.flagged_segments.is_empty());

    let methods: Vec<ClassificationMethod> = assessment
        .classification
        .classifications
        .iter()
        .map(|classification| classification.method)
        .collect();
    assert_eq!(
        methods,
        vec![
            ClassificationMethod::Deterministic,
            ClassificationMethod::ContextResolved,
            ClassificationMethod::DefaultFallback,
        ]
    );
    assert_eq!(assessment.classification.adjudicated_count, 0);

    assert!(!assessment.follow_up.required);
    assert_eq!(assessment.follow_up.automatic_trigger, None);

    // 0.6 x 10,000 benefit over 3 risk events = 2,000, inside the 10% band of
    // the prior 1,900.
    assert_eq!(assessment.benefit_risk.determination, Determination::Favorable);
    assert!((assessment.benefit_risk.ratio - 2_000.0).abs() < 1e-9);
    assert_eq!(
        assessment.benefit_risk.change_from_previous,
        Some(RatioChange::Unchanged)
    );

    // Every engine completed without data-quality conditions.
    assert!(assessment.rate_trend.diagnostics.success);
    assert!(assessment.rate_trend.diagnostics.errors.is_empty());
    assert!(assessment.classification.diagnostics.errors.is_empty());
}

#[tokio::test]
async fn implantable_device_forces_follow_up_even_in_a_quiet_quarter() {
    let mut context = quarter_context();
    context.device.is_implantable = true;

    let pipeline =
        SurveillancePipeline::deterministic(&EngineSettings::default(), RateTrendConfig::default());
    let assessment = pipeline.run(&context).await;

    assert!(assessment.follow_up.required);
    assert!(assessment
        .follow_up
        .automatic_trigger
        .as_deref()
        .expect("trigger recorded")
        .contains("implantable"));
    // The benefit-risk determination is independent of the follow-up decision.
    assert_eq!(assessment.benefit_risk.determination, Determination::Favorable);
}

#[tokio::test]
async fn assessment_serializes_for_the_report_renderer() {
    let pipeline =
        SurveillancePipeline::deterministic(&EngineSettings::default(), RateTrendConfig::default());
    let assessment = pipeline.run(&quarter_context()).await;

    let json = serde_json::to_value(&assessment).expect("assessment serializes");
    assert_eq!(json["rate_trend"]["total_complaints"], 3);
    assert_eq!(json["benefit_risk"]["determination"], "favorable");
    let tables = json["rate_trend"]["tables"]
        .as_array()
        .expect("tables array");
    assert!(!tables.is_empty());
    assert_eq!(tables[0]["title"], "Complaint Rate Summary");
}

#[tokio::test]
async fn missing_sales_degrade_but_never_fail_the_run() {
    let mut context = quarter_context();
    context.sales.clear();

    let pipeline =
        SurveillancePipeline::deterministic(&EngineSettings::default(), RateTrendConfig::default());
    let assessment = pipeline.run(&context).await;

    assert!(assessment.rate_trend.diagnostics.success);
    assert!(assessment.rate_trend.diagnostics.is_degraded());
    assert_eq!(assessment.rate_trend.rate_per_thousand, 0.0);
    assert!(assessment
        .segmentation
        .segments
        .iter()
        .all(|segment| segment.observed_rate == 0.0));
}
