//! Benefit-risk determination.
//!
//! Nine fixed condition checks, each tagged critical/major/minor, combined
//! with a quantified benefit-risk ratio into a three-way determination.

use serde::{Deserialize, Serialize};

use super::{DecisionFactor, FactorScore};
use crate::engines::rate_trend::RateTrendAnalysis;
use crate::evidence::HarmLevel;
use crate::output::{round2, CellValue, Diagnostics, ReportTable};

const RATIO_CHANGE_BAND: f64 = 0.10;
const FACTOR_WEIGHT_CRITICAL: u32 = 5;
const FACTOR_WEIGHT_MAJOR: u32 = 3;
const FACTOR_WEIGHT_MINOR: u32 = 1;

/// Quantified clinical benefit delivered by the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalBenefit {
    pub magnitude: f64,
    pub population: f64,
    pub description: String,
}

/// Period safety metrics consumed by the checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyMetrics {
    pub total_risk_events: u64,
    pub deaths: u64,
    pub serious_incidents: u64,
    pub serious_incident_limit: u64,
    pub complaint_rate: f64,
    pub complaint_rate_threshold: f64,
    pub control_limit_excursions: usize,
    pub heightened_reporting_required: bool,
}

impl SafetyMetrics {
    /// Derive the safety picture from a completed rate/trend analysis.
    pub fn from_analysis(
        analysis: &RateTrendAnalysis,
        complaint_rate_threshold: f64,
        serious_incident_limit: u64,
    ) -> Self {
        let deaths = analysis
            .breakdown
            .by_harm
            .get(HarmLevel::Death.label())
            .copied()
            .unwrap_or(0) as u64;
        let serious_incidents = analysis
            .breakdown
            .by_harm
            .get(HarmLevel::Serious.label())
            .copied()
            .unwrap_or(0) as u64
            + analysis
                .breakdown
                .by_harm
                .get(HarmLevel::Critical.label())
                .copied()
                .unwrap_or(0) as u64;
        Self {
            total_risk_events: analysis.total_complaints as u64,
            deaths,
            serious_incidents,
            serious_incident_limit,
            complaint_rate: analysis.rate_per_thousand,
            complaint_rate_threshold,
            control_limit_excursions: analysis.excursion_periods.len(),
            heightened_reporting_required: analysis.heightened_reporting.required,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskManagementInputs {
    pub all_risks_mitigated: bool,
    pub residual_risk_acceptable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiteratureConclusions {
    pub new_risks_identified: bool,
    pub consistent_with_state_of_art: bool,
    pub safety_profile_stable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSeverity {
    Critical,
    Major,
    Minor,
}

impl CheckSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Major => "Major",
            Self::Minor => "Minor",
        }
    }

    const fn factor_weight(self) -> u32 {
        match self {
            Self::Critical => FACTOR_WEIGHT_CRITICAL,
            Self::Major => FACTOR_WEIGHT_MAJOR,
            Self::Minor => FACTOR_WEIGHT_MINOR,
        }
    }
}

/// One of the nine fixed condition checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionCheck {
    pub name: String,
    pub severity: CheckSeverity,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Determination {
    Favorable,
    Acceptable,
    Unfavorable,
}

impl Determination {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Favorable => "FAVORABLE",
            Self::Acceptable => "ACCEPTABLE",
            Self::Unfavorable => "UNFAVORABLE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioChange {
    Improved,
    Deteriorated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitRiskDecision {
    pub diagnostics: Diagnostics,
    pub ratio: f64,
    pub determination: Determination,
    pub checks: Vec<ConditionCheck>,
    pub factors: Vec<DecisionFactor>,
    pub change_from_previous: Option<RatioChange>,
    pub tables: Vec<ReportTable>,
}

#[derive(Debug, Clone)]
pub struct BenefitRiskEngine {
    favorable_threshold: f64,
}

impl BenefitRiskEngine {
    pub fn new(favorable_threshold: f64) -> Self {
        Self {
            favorable_threshold,
        }
    }

    pub fn determine(
        &self,
        benefit: &ClinicalBenefit,
        safety: &SafetyMetrics,
        risk_management: &RiskManagementInputs,
        literature: &LiteratureConclusions,
        previous_ratio: Option<f64>,
    ) -> BenefitRiskDecision {
        let ratio = benefit_risk_ratio(benefit, safety);
        let checks = run_checks(safety, risk_management, literature);

        let critical_failures = checks
            .iter()
            .filter(|check| !check.passed && check.severity == CheckSeverity::Critical)
            .count();
        let major_failures = checks
            .iter()
            .filter(|check| !check.passed && check.severity == CheckSeverity::Major)
            .count();
        let all_passed = checks.iter().all(|check| check.passed);

        let determination = if critical_failures > 0 {
            Determination::Unfavorable
        } else if all_passed && ratio >= self.favorable_threshold {
            Determination::Favorable
        } else if major_failures <= 1 {
            Determination::Acceptable
        } else {
            Determination::Unfavorable
        };

        let change_from_previous = previous_ratio.map(|previous| ratio_change(ratio, previous));

        let factors: Vec<DecisionFactor> = checks
            .iter()
            .map(|check| {
                DecisionFactor::new(
                    check.name.clone(),
                    if check.passed {
                        FactorScore::SupportsNoAction
                    } else {
                        FactorScore::RequiresAction
                    },
                    check.severity.factor_weight(),
                    check.detail.clone(),
                )
            })
            .collect();

        let tables = build_tables(ratio, determination, &checks, change_from_previous);

        BenefitRiskDecision {
            diagnostics: Diagnostics::completed(Vec::new()),
            ratio,
            determination,
            checks,
            factors,
            change_from_previous,
            tables,
        }
    }
}

/// `ratio = (benefit magnitude x population) / max(risk events, 1)`, with an
/// infinite ratio when nonzero benefit meets zero risk events.
fn benefit_risk_ratio(benefit: &ClinicalBenefit, safety: &SafetyMetrics) -> f64 {
    let total_benefit = benefit.magnitude * benefit.population;
    if safety.total_risk_events == 0 && total_benefit > 0.0 {
        return f64::INFINITY;
    }
    total_benefit / safety.total_risk_events.max(1) as f64
}

fn ratio_change(current: f64, previous: f64) -> RatioChange {
    if current.is_infinite() && previous.is_infinite() {
        return RatioChange::Unchanged;
    }
    if current.is_infinite() {
        return RatioChange::Improved;
    }
    if previous.is_infinite() {
        return RatioChange::Deteriorated;
    }
    if current > previous * (1.0 + RATIO_CHANGE_BAND) {
        RatioChange::Improved
    } else if current < previous * (1.0 - RATIO_CHANGE_BAND) {
        RatioChange::Deteriorated
    } else {
        RatioChange::Unchanged
    }
}

fn run_checks(
    safety: &SafetyMetrics,
    risk_management: &RiskManagementInputs,
    literature: &LiteratureConclusions,
) -> Vec<ConditionCheck> {
    vec![
        ConditionCheck {
            name: "zero deaths".to_string(),
            severity: CheckSeverity::Critical,
            passed: safety.deaths == 0,
            detail: format!("{} death(s) in period", safety.deaths),
        },
        ConditionCheck {
            name: "no new risks from literature".to_string(),
            severity: CheckSeverity::Critical,
            passed: !literature.new_risks_identified,
            detail: if literature.new_risks_identified {
                "literature review identified new risks".to_string()
            } else {
                "no new risks identified in literature".to_string()
            },
        },
        ConditionCheck {
            name: "heightened reporting not triggered".to_string(),
            severity: CheckSeverity::Critical,
            passed: !safety.heightened_reporting_required,
            detail: if safety.heightened_reporting_required {
                "heightened trend reporting was triggered".to_string()
            } else {
                "no heightened trend reporting obligation".to_string()
            },
        },
        ConditionCheck {
            name: "complaint rate within threshold".to_string(),
            severity: CheckSeverity::Major,
            passed: safety.complaint_rate <= safety.complaint_rate_threshold,
            detail: format!(
                "rate {:.2} per 1,000 against threshold {:.2}",
                safety.complaint_rate, safety.complaint_rate_threshold
            ),
        },
        ConditionCheck {
            name: "no control-limit excursions".to_string(),
            severity: CheckSeverity::Major,
            passed: safety.control_limit_excursions == 0,
            detail: format!("{} excursion(s) above UCL", safety.control_limit_excursions),
        },
        ConditionCheck {
            name: "serious incidents within limit".to_string(),
            severity: CheckSeverity::Major,
            passed: safety.serious_incidents <= safety.serious_incident_limit,
            detail: format!(
                "{} serious incident(s) against limit {}",
                safety.serious_incidents, safety.serious_incident_limit
            ),
        },
        ConditionCheck {
            name: "consistent with state of the art".to_string(),
            severity: CheckSeverity::Minor,
            passed: literature.consistent_with_state_of_art,
            detail: "state-of-the-art comparison from literature review".to_string(),
        },
        ConditionCheck {
            name: "safety profile stable".to_string(),
            severity: CheckSeverity::Minor,
            passed: literature.safety_profile_stable,
            detail: "safety profile stability from literature review".to_string(),
        },
        ConditionCheck {
            name: "risks mitigated acceptably".to_string(),
            severity: CheckSeverity::Minor,
            passed: risk_management.all_risks_mitigated
                && risk_management.residual_risk_acceptable,
            detail: "risk management file mitigation status".to_string(),
        },
    ]
}

fn build_tables(
    ratio: f64,
    determination: Determination,
    checks: &[ConditionCheck],
    change: Option<RatioChange>,
) -> Vec<ReportTable> {
    let mut summary = ReportTable::new("Benefit-Risk Determination", &["Metric", "Value"])
        .with_formula("ratio = (benefit magnitude x population) / max(risk events, 1)");
    summary.push_row(vec![
        CellValue::text("Benefit-risk ratio"),
        if ratio.is_infinite() {
            CellValue::text("unbounded (no risk events)")
        } else {
            CellValue::number(round2(ratio))
        },
    ]);
    summary.push_row(vec![
        CellValue::text("Determination"),
        CellValue::text(determination.label()),
    ]);
    if let Some(change) = change {
        summary.push_row(vec![
            CellValue::text("Change from previous period"),
            CellValue::text(match change {
                RatioChange::Improved => "Improved",
                RatioChange::Deteriorated => "Deteriorated",
                RatioChange::Unchanged => "Unchanged",
            }),
        ]);
        summary.push_footnote("Change uses a +/-10% band on the ratio versus the prior period.");
    }

    let mut check_table = ReportTable::new(
        "Benefit-Risk Condition Checks",
        &["Check", "Severity", "Result", "Detail"],
    );
    for check in checks {
        check_table.push_row(vec![
            CellValue::text(check.name.clone()),
            CellValue::text(check.severity.label()),
            CellValue::text(if check.passed { "Pass" } else { "Fail" }),
            CellValue::text(check.detail.clone()),
        ]);
    }
    check_table.push_footnote(
        "Any critical failure forces UNFAVORABLE; a single major failure with no critical failure is ACCEPTABLE.",
    );

    vec![summary, check_table]
}
