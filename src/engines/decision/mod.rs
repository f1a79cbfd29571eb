//! Weighted, auditable decision engines.
//!
//! Both engines reduce to the same atomic unit: an ordered list of
//! [`DecisionFactor`] values plus a verdict, so every determination can be
//! replayed factor by factor in an audit.

mod benefit_risk;
mod followup;

pub use benefit_risk::{
    BenefitRiskDecision, BenefitRiskEngine, CheckSeverity, ClinicalBenefit, ConditionCheck,
    Determination, LiteratureConclusions, RatioChange, RiskManagementInputs, SafetyMetrics,
};
pub use followup::{
    DeviceProfile, FollowUpDecision, FollowUpEngine, LiteratureInputs, RiskClass,
    RiskProfileInputs, StateOfArtInputs,
};

use serde::{Deserialize, Serialize};

/// Direction a factor pushes the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorScore {
    RequiresAction,
    SupportsNoAction,
    Neutral,
}

impl FactorScore {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RequiresAction => "Requires Action",
            Self::SupportsNoAction => "Supports No Action",
            Self::Neutral => "Neutral",
        }
    }
}

/// Atomic unit of every weighted decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionFactor {
    pub name: String,
    pub score: FactorScore,
    pub weight: u32,
    pub rationale: String,
    pub supporting_record_ids: Vec<String>,
}

impl DecisionFactor {
    pub fn new(
        name: impl Into<String>,
        score: FactorScore,
        weight: u32,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            score,
            weight,
            rationale: rationale.into(),
            supporting_record_ids: Vec::new(),
        }
    }
}

/// Result of folding a factor list against a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedVerdict {
    pub score: f64,
    pub threshold: f64,
    pub triggered: bool,
}

/// The shared fold: `score = Σ(weight where RequiresAction) / Σ(all weights)`.
/// Neutral factors contribute weight to the denominator only.
pub(crate) fn weighted_verdict(factors: &[DecisionFactor], threshold: f64) -> WeightedVerdict {
    let total_weight: u32 = factors.iter().map(|factor| factor.weight).sum();
    let requiring_weight: u32 = factors
        .iter()
        .filter(|factor| factor.score == FactorScore::RequiresAction)
        .map(|factor| factor.weight)
        .sum();
    let score = if total_weight == 0 {
        0.0
    } else {
        requiring_weight as f64 / total_weight as f64
    };
    WeightedVerdict {
        score,
        threshold,
        triggered: score >= threshold,
    }
}

/// One step of the ordered decision trace kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub step: String,
    pub outcome: String,
}

impl TraceEntry {
    pub fn new(step: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            outcome: outcome.into(),
        }
    }
}
