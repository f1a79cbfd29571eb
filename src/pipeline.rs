//! Composes the five engines over one read-only evidence context.
//!
//! Ordering is the only coordination required: the rate engine runs first
//! because segmentation needs its baseline rate, and the two decision engines
//! fold over the aggregated outputs. The single await point is the bounded
//! adjudication call inside classification.

use serde::{Deserialize, Serialize};

use crate::config::EngineSettings;
use crate::engines::classification::{
    AdjudicationGateway, ClassificationAnalysis, ClassificationEngine, NoAdjudication,
};
use crate::engines::decision::{
    BenefitRiskDecision, BenefitRiskEngine, ClinicalBenefit, DeviceProfile, FollowUpDecision,
    FollowUpEngine, LiteratureConclusions, LiteratureInputs, RiskManagementInputs,
    RiskProfileInputs, SafetyMetrics, StateOfArtInputs,
};
use crate::engines::rate_trend::{RateTrendAnalysis, RateTrendConfig, RateTrendEngine, TrendPoint};
use crate::engines::segmentation::{SegmentationAnalysis, SegmentationEngine};
use crate::evidence::{total_exposure, ComplaintRecord, ReportingPeriod, SalesRecord};

/// Read-only composed inputs for one surveillance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveillanceContext {
    pub period: ReportingPeriod,
    pub complaints: Vec<ComplaintRecord>,
    pub sales: Vec<SalesRecord>,
    pub historical_trend: Vec<TrendPoint>,
    pub device: DeviceProfile,
    pub risk_profile: RiskProfileInputs,
    pub literature: LiteratureInputs,
    pub state_of_art: StateOfArtInputs,
    pub benefit: ClinicalBenefit,
    pub risk_management: RiskManagementInputs,
    pub literature_conclusions: LiteratureConclusions,
    pub previous_ratio: Option<f64>,
    pub complaint_rate_threshold: f64,
    pub serious_incident_limit: u64,
}

/// Immutable, non-recomputable facts handed onward to narrative generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveillanceAssessment {
    pub rate_trend: RateTrendAnalysis,
    pub segmentation: SegmentationAnalysis,
    pub classification: ClassificationAnalysis,
    pub follow_up: FollowUpDecision,
    pub benefit_risk: BenefitRiskDecision,
}

pub struct SurveillancePipeline<A = NoAdjudication> {
    rate_engine: RateTrendEngine,
    segmentation_engine: SegmentationEngine,
    classification_engine: ClassificationEngine<A>,
    follow_up_engine: FollowUpEngine,
    benefit_risk_engine: BenefitRiskEngine,
}

impl SurveillancePipeline<NoAdjudication> {
    /// Pipeline without an adjudication collaborator.
    pub fn deterministic(settings: &EngineSettings, rate_config: RateTrendConfig) -> Self {
        Self {
            rate_engine: RateTrendEngine::new(rate_config),
            segmentation_engine: SegmentationEngine,
            classification_engine: ClassificationEngine::deterministic(),
            follow_up_engine: FollowUpEngine,
            benefit_risk_engine: BenefitRiskEngine::new(settings.favorable_ratio_threshold),
        }
    }
}

impl<A: AdjudicationGateway> SurveillancePipeline<A> {
    pub fn new(settings: &EngineSettings, rate_config: RateTrendConfig, gateway: A) -> Self {
        Self {
            rate_engine: RateTrendEngine::new(rate_config),
            segmentation_engine: SegmentationEngine,
            classification_engine: ClassificationEngine::new(
                gateway,
                settings.adjudication_timeout,
            ),
            follow_up_engine: FollowUpEngine,
            benefit_risk_engine: BenefitRiskEngine::new(settings.favorable_ratio_threshold),
        }
    }

    pub async fn run(&self, context: &SurveillanceContext) -> SurveillanceAssessment {
        let exposure = total_exposure(&context.sales, &context.period);

        let rate_trend = self.rate_engine.analyze(
            &context.complaints,
            &context.period,
            exposure,
            &context.historical_trend,
        );

        let segmentation = self.segmentation_engine.segment(
            &context.complaints,
            &context.sales,
            &context.period,
            rate_trend.rate_per_thousand,
            exposure,
        );

        let classification = self.classification_engine.classify(&context.complaints).await;

        let follow_up = self.follow_up_engine.decide(
            &context.device,
            &context.risk_profile,
            &context.literature,
            &context.state_of_art,
        );

        let safety = SafetyMetrics::from_analysis(
            &rate_trend,
            context.complaint_rate_threshold,
            context.serious_incident_limit,
        );
        let benefit_risk = self.benefit_risk_engine.determine(
            &context.benefit,
            &safety,
            &context.risk_management,
            &context.literature_conclusions,
            context.previous_ratio,
        );

        SurveillanceAssessment {
            rate_trend,
            segmentation,
            classification,
            follow_up,
            benefit_risk,
        }
    }
}
