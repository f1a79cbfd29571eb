//! Post-market follow-up requirement decision.
//!
//! A fixed list of automatic triggers is checked first; any one forces a YES
//! regardless of the weighted factors. There is deliberately no discretionary
//! override path.

use serde::{Deserialize, Serialize};

use super::{weighted_verdict, DecisionFactor, FactorScore, TraceEntry, WeightedVerdict};
use crate::output::{CellValue, Diagnostics, ReportTable};

const DECISION_THRESHOLD: f64 = 0.6;

const WEIGHT_NOVELTY: u32 = 5;
const WEIGHT_RISK_PROFILE: u32 = 5;
const WEIGHT_LITERATURE: u32 = 4;
const WEIGHT_STATE_OF_ART: u32 = 3;
const WEIGHT_EVIDENCE_GAPS: u32 = 4;

/// Regulatory risk classification of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    ClassI,
    ClassIIa,
    ClassIIb,
    ClassIII,
}

impl RiskClass {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ClassI => "Class I",
            Self::ClassIIa => "Class IIa",
            Self::ClassIIb => "Class IIb",
            Self::ClassIII => "Class III",
        }
    }

    pub const fn is_highest_tier(self) -> bool {
        matches!(self, Self::ClassIII)
    }
}

/// Device characteristics supplied by the regulatory context collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub device_code: String,
    pub risk_class: RiskClass,
    pub is_implantable: bool,
    pub is_novel: bool,
    pub is_life_sustaining: bool,
    pub contains_nanomaterial: bool,
    pub uses_animal_tissue: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskProfileInputs {
    pub new_risks_identified: bool,
    pub risk_profile_changed: bool,
    pub new_risk_descriptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteratureInputs {
    pub sufficient_clinical_evidence: bool,
    pub evidence_gap_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateOfArtInputs {
    pub aligned_with_state_of_art: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpDecision {
    pub diagnostics: Diagnostics,
    pub required: bool,
    pub automatic_trigger: Option<String>,
    pub verdict: WeightedVerdict,
    pub factors: Vec<DecisionFactor>,
    pub trace: Vec<TraceEntry>,
    pub tables: Vec<ReportTable>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FollowUpEngine;

impl FollowUpEngine {
    pub fn decide(
        &self,
        device: &DeviceProfile,
        risk: &RiskProfileInputs,
        literature: &LiteratureInputs,
        state_of_art: &StateOfArtInputs,
    ) -> FollowUpDecision {
        let mut trace = Vec::new();

        let triggers: [(&str, bool); 7] = [
            (
                "device risk class is the highest tier",
                device.risk_class.is_highest_tier(),
            ),
            ("device is implantable", device.is_implantable),
            ("device is novel with no equivalent device", device.is_novel),
            ("new risks identified in the period", risk.new_risks_identified),
            ("device is life-sustaining", device.is_life_sustaining),
            ("device contains nanomaterial", device.contains_nanomaterial),
            ("device uses animal tissue", device.uses_animal_tissue),
        ];

        let mut automatic_trigger = None;
        for (name, fired) in triggers {
            trace.push(TraceEntry::new(
                format!("automatic trigger: {name}"),
                if fired { "TRIGGERED" } else { "not triggered" },
            ));
            if fired && automatic_trigger.is_none() {
                automatic_trigger = Some(name.to_string());
            }
        }

        let factors = build_factors(device, risk, literature, state_of_art);
        let verdict = weighted_verdict(&factors, DECISION_THRESHOLD);
        for factor in &factors {
            trace.push(TraceEntry::new(
                format!("factor: {} (weight {})", factor.name, factor.weight),
                format!("{} — {}", factor.score.label(), factor.rationale),
            ));
        }

        let required = automatic_trigger.is_some() || verdict.triggered;
        trace.push(TraceEntry::new(
            "final determination",
            match &automatic_trigger {
                Some(trigger) => format!("YES (automatic trigger: {trigger})"),
                None if verdict.triggered => format!(
                    "YES (weighted score {:.2} >= {:.2})",
                    verdict.score, verdict.threshold
                ),
                None => format!(
                    "NO (weighted score {:.2} < {:.2})",
                    verdict.score, verdict.threshold
                ),
            },
        ));

        let tables = build_tables(&factors, &verdict, automatic_trigger.as_deref());

        FollowUpDecision {
            diagnostics: Diagnostics::completed(Vec::new()),
            required,
            automatic_trigger,
            verdict,
            factors,
            trace,
            tables,
        }
    }
}

fn build_factors(
    device: &DeviceProfile,
    risk: &RiskProfileInputs,
    literature: &LiteratureInputs,
    state_of_art: &StateOfArtInputs,
) -> Vec<DecisionFactor> {
    let mut factors = Vec::new();

    factors.push(if device.is_novel {
        DecisionFactor::new(
            "device novelty",
            FactorScore::RequiresAction,
            WEIGHT_NOVELTY,
            "device is novel; no equivalent post-market history exists",
        )
    } else {
        DecisionFactor::new(
            "device novelty",
            FactorScore::SupportsNoAction,
            WEIGHT_NOVELTY,
            "established device with equivalent history",
        )
    });

    factors.push(
        if risk.risk_profile_changed || risk.new_risks_identified {
            let mut factor = DecisionFactor::new(
                "risk profile change",
                FactorScore::RequiresAction,
                WEIGHT_RISK_PROFILE,
                "risk profile changed during the reporting period",
            );
            factor.supporting_record_ids = risk.new_risk_descriptions.clone();
            factor
        } else {
            DecisionFactor::new(
                "risk profile change",
                FactorScore::SupportsNoAction,
                WEIGHT_RISK_PROFILE,
                "risk profile unchanged",
            )
        },
    );

    factors.push(if literature.sufficient_clinical_evidence {
        DecisionFactor::new(
            "literature sufficiency",
            FactorScore::SupportsNoAction,
            WEIGHT_LITERATURE,
            "published clinical evidence is sufficient",
        )
    } else {
        DecisionFactor::new(
            "literature sufficiency",
            FactorScore::RequiresAction,
            WEIGHT_LITERATURE,
            "published clinical evidence is insufficient",
        )
    });

    factors.push(if state_of_art.aligned_with_state_of_art {
        DecisionFactor::new(
            "state of the art",
            FactorScore::SupportsNoAction,
            WEIGHT_STATE_OF_ART,
            "device remains aligned with the state of the art",
        )
    } else {
        DecisionFactor::new(
            "state of the art",
            FactorScore::RequiresAction,
            WEIGHT_STATE_OF_ART,
            "device has fallen behind the state of the art",
        )
    });

    factors.push(match literature.evidence_gap_count {
        0 => DecisionFactor::new(
            "evidence gaps",
            FactorScore::SupportsNoAction,
            WEIGHT_EVIDENCE_GAPS,
            "no open evidence gaps",
        ),
        1..=2 => DecisionFactor::new(
            "evidence gaps",
            FactorScore::Neutral,
            WEIGHT_EVIDENCE_GAPS,
            format!("{} open evidence gap(s)", literature.evidence_gap_count),
        ),
        count => DecisionFactor::new(
            "evidence gaps",
            FactorScore::RequiresAction,
            WEIGHT_EVIDENCE_GAPS,
            format!("{count} open evidence gaps"),
        ),
    });

    factors
}

fn build_tables(
    factors: &[DecisionFactor],
    verdict: &WeightedVerdict,
    automatic_trigger: Option<&str>,
) -> Vec<ReportTable> {
    let mut table = ReportTable::new(
        "Follow-up Requirement Factors",
        &["Factor", "Weight", "Score", "Rationale"],
    )
    .with_formula("score = sum(weights where Requires Action) / sum(all weights)");
    for factor in factors {
        table.push_row(vec![
            CellValue::text(factor.name.clone()),
            CellValue::count(factor.weight as usize),
            CellValue::text(factor.score.label()),
            CellValue::text(factor.rationale.clone()),
        ]);
    }
    table.push_footnote(format!(
        "Weighted score {:.2} against threshold {:.2}.",
        verdict.score, verdict.threshold
    ));
    if let Some(trigger) = automatic_trigger {
        table.push_footnote(format!(
            "Automatic trigger fired ({trigger}); the weighted score is recorded for audit only."
        ));
    }
    vec![table]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_device() -> DeviceProfile {
        DeviceProfile {
            device_code: "DX-100".to_string(),
            risk_class: RiskClass::ClassIIa,
            is_implantable: false,
            is_novel: false,
            is_life_sustaining: false,
            contains_nanomaterial: false,
            uses_animal_tissue: false,
        }
    }

    fn favorable_inputs() -> (RiskProfileInputs, LiteratureInputs, StateOfArtInputs) {
        (
            RiskProfileInputs::default(),
            LiteratureInputs {
                sufficient_clinical_evidence: true,
                evidence_gap_count: 0,
            },
            StateOfArtInputs {
                aligned_with_state_of_art: true,
                notes: None,
            },
        )
    }

    #[test]
    fn novelty_trigger_dominates_favorable_factors() {
        let mut device = quiet_device();
        device.is_novel = true;
        let (risk, literature, state_of_art) = favorable_inputs();

        let decision = FollowUpEngine.decide(&device, &risk, &literature, &state_of_art);
        assert!(decision.required);
        assert!(decision
            .automatic_trigger
            .as_deref()
            .expect("trigger recorded")
            .contains("novel"));
    }

    #[test]
    fn all_favorable_inputs_yield_no() {
        let (risk, literature, state_of_art) = favorable_inputs();
        let decision = FollowUpEngine.decide(&quiet_device(), &risk, &literature, &state_of_art);
        assert!(!decision.required);
        assert_eq!(decision.automatic_trigger, None);
        assert_eq!(decision.verdict.score, 0.0);
    }

    #[test]
    fn weighted_path_requires_sixty_percent() {
        // Requires: risk profile (5), literature (4), evidence gaps (4) = 13 of 21.
        let device = quiet_device();
        let risk = RiskProfileInputs {
            new_risks_identified: false,
            risk_profile_changed: true,
            new_risk_descriptions: Vec::new(),
        };
        let literature = LiteratureInputs {
            sufficient_clinical_evidence: false,
            evidence_gap_count: 4,
        };
        let state_of_art = StateOfArtInputs {
            aligned_with_state_of_art: true,
            notes: None,
        };

        let decision = FollowUpEngine.decide(&device, &risk, &literature, &state_of_art);
        assert!(decision.required);
        assert_eq!(decision.automatic_trigger, None);
        assert!((decision.verdict.score - 13.0 / 21.0).abs() < 1e-9);
    }

    #[test]
    fn trace_records_every_trigger_and_factor() {
        let (risk, literature, state_of_art) = favorable_inputs();
        let decision = FollowUpEngine.decide(&quiet_device(), &risk, &literature, &state_of_art);
        // 7 triggers + 5 factors + final determination.
        assert_eq!(decision.trace.len(), 13);
        assert!(decision.trace.last().expect("trace non-empty").outcome.starts_with("NO"));
    }
}
