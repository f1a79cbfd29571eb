//! Two-stage deterministic mapping of complaints onto the fixed
//! device-problem / patient-harm taxonomy.
//!
//! Stage 1 is a pure table lookup with substring and catch-all fallbacks.
//! Stage 2 resolves harm context for the entries where harm depends on the
//! circumstances of the failure, and only the residual ambiguous cases are
//! escalated to the external adjudication collaborator. Adjudication failure
//! never blocks classification.

mod adjudication;
mod context;
mod taxonomy;

pub use adjudication::{
    AdjudicatedOutcome, AdjudicationCase, AdjudicationError, AdjudicationGateway, NoAdjudication,
};
pub use taxonomy::TaxonomyEntry;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::evidence::{ComplaintRecord, HarmLevel};
use crate::output::{CellValue, DataQualityIssue, Diagnostics, IssueKind, ReportTable};

const EXACT_MATCH_CONFIDENCE: f64 = 0.95;
const SUBSTRING_MATCH_CONFIDENCE: f64 = 0.7;
const FALLBACK_CONFIDENCE: f64 = 0.3;
const AMBIGUOUS_CONTEXT_CONFIDENCE: f64 = 0.6;
const ESCALATION_THRESHOLD: f64 = 0.8;

/// How a classification was produced, for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    Deterministic,
    ContextResolved,
    Adjudicated,
    DefaultFallback,
}

impl ClassificationMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Deterministic => "Deterministic",
            Self::ContextResolved => "Context-Resolved",
            Self::Adjudicated => "Adjudicated",
            Self::DefaultFallback => "Default Fallback",
        }
    }
}

/// Final taxonomy assignment for one complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub record_id: String,
    pub device_problem_code: String,
    pub device_problem_term: String,
    pub harm_code: Option<String>,
    pub harm_term: String,
    pub severity: HarmLevel,
    pub confidence: f64,
    pub method: ClassificationMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationAnalysis {
    pub diagnostics: Diagnostics,
    pub classifications: Vec<Classification>,
    pub escalated_count: usize,
    pub adjudicated_count: usize,
    pub tables: Vec<ReportTable>,
    pub contributing_record_ids: Vec<String>,
}

/// Classification engine with an optional adjudication collaborator.
#[derive(Debug, Clone)]
pub struct ClassificationEngine<A = NoAdjudication> {
    gateway: Option<A>,
    timeout: Duration,
}

impl ClassificationEngine<NoAdjudication> {
    /// Engine without a collaborator; everything resolves deterministically.
    pub fn deterministic() -> Self {
        Self {
            gateway: None,
            timeout: Duration::from_millis(0),
        }
    }
}

impl<A: AdjudicationGateway> ClassificationEngine<A> {
    pub fn new(gateway: A, timeout: Duration) -> Self {
        Self {
            gateway: Some(gateway),
            timeout,
        }
    }

    /// Stage 1 + stage 2 for a single record; pure and synchronous.
    pub fn classify_one(&self, complaint: &ComplaintRecord) -> Classification {
        let source = complaint
            .symptom_code
            .as_deref()
            .unwrap_or(&complaint.description);
        let normalized = taxonomy::normalize_symptom(source);

        let (entry, confidence, method) = match taxonomy::lookup_exact(&normalized) {
            Some(entry) => (entry, EXACT_MATCH_CONFIDENCE, ClassificationMethod::Deterministic),
            None => match taxonomy::lookup_substring(&normalized) {
                Some(entry) => (
                    entry,
                    SUBSTRING_MATCH_CONFIDENCE,
                    ClassificationMethod::Deterministic,
                ),
                None => (
                    taxonomy::fallback(),
                    FALLBACK_CONFIDENCE,
                    ClassificationMethod::DefaultFallback,
                ),
            },
        };

        let mut classification = Classification {
            record_id: complaint.id.clone(),
            device_problem_code: entry.device_problem_code.to_string(),
            device_problem_term: entry.device_problem_term.to_string(),
            harm_code: entry.harm_code.map(str::to_string),
            harm_term: entry.harm_term.to_string(),
            severity: entry.default_severity,
            confidence,
            method,
        };

        if entry.requires_context_adjudication {
            match context::resolve(complaint) {
                context::ContextOutcome::NoHarm => {
                    classification.harm_code = None;
                    classification.harm_term = taxonomy::NO_HARM_TERM.to_string();
                    classification.severity = HarmLevel::None;
                    classification.confidence = 0.9;
                    classification.method = ClassificationMethod::ContextResolved;
                }
                context::ContextOutcome::ExternalCause => {
                    let external = taxonomy::external_cause_entry();
                    classification.device_problem_code = external.device_problem_code.to_string();
                    classification.device_problem_term = external.device_problem_term.to_string();
                    classification.harm_code = None;
                    classification.harm_term = taxonomy::NO_HARM_TERM.to_string();
                    classification.severity = external.default_severity;
                    classification.confidence = 0.9;
                    classification.method = ClassificationMethod::ContextResolved;
                }
                context::ContextOutcome::Injury => {
                    classification.harm_code = Some(taxonomy::INJURY_HARM_CODE.to_string());
                    classification.harm_term = taxonomy::INJURY_HARM_TERM.to_string();
                    classification.severity = HarmLevel::Serious;
                    classification.confidence = 0.85;
                    classification.method = ClassificationMethod::ContextResolved;
                }
                context::ContextOutcome::Ambiguous => {
                    // Harm still unknown; cap the confidence so the record is
                    // eligible for adjudication.
                    classification.confidence =
                        classification.confidence.min(AMBIGUOUS_CONTEXT_CONFIDENCE);
                }
            }
        }

        classification
    }

    /// Classify a batch, escalating residual ambiguous cases to the
    /// collaborator when one is wired in.
    pub async fn classify(&self, complaints: &[ComplaintRecord]) -> ClassificationAnalysis {
        let mut issues = Vec::new();
        let mut classifications: Vec<Classification> =
            complaints.iter().map(|record| self.classify_one(record)).collect();

        let ambiguous: Vec<usize> = classifications
            .iter()
            .enumerate()
            .filter(|(_, classification)| {
                classification.confidence < ESCALATION_THRESHOLD
                    && classification.method != ClassificationMethod::DefaultFallback
            })
            .map(|(index, _)| index)
            .collect();
        let escalated_count = ambiguous.len();
        let mut adjudicated_count = 0;

        if let Some(gateway) = &self.gateway {
            if !ambiguous.is_empty() {
                let cases: Vec<AdjudicationCase> = ambiguous
                    .iter()
                    .map(|&index| {
                        let complaint = &complaints[index];
                        AdjudicationCase {
                            record_id: complaint.id.clone(),
                            symptom_code: complaint
                                .symptom_code
                                .clone()
                                .unwrap_or_else(|| complaint.description.clone()),
                            description: complaint.description.clone(),
                            deterministic: classifications[index].clone(),
                        }
                    })
                    .collect();

                match tokio::time::timeout(self.timeout, gateway.adjudicate(&cases)).await {
                    Ok(Ok(outcomes)) => {
                        let by_id: BTreeMap<&str, &AdjudicatedOutcome> = outcomes
                            .iter()
                            .map(|outcome| (outcome.record_id.as_str(), outcome))
                            .collect();
                        for &index in &ambiguous {
                            if let Some(outcome) = by_id.get(classifications[index].record_id.as_str())
                            {
                                let slot = &mut classifications[index];
                                slot.device_problem_code = outcome.device_problem_code.clone();
                                slot.device_problem_term = outcome.device_problem_term.clone();
                                slot.harm_code = outcome.harm_code.clone();
                                slot.harm_term = outcome.harm_term.clone();
                                slot.severity = outcome.severity;
                                slot.confidence = outcome.confidence;
                                slot.method = ClassificationMethod::Adjudicated;
                                adjudicated_count += 1;
                            }
                        }
                    }
                    Ok(Err(error)) => {
                        tracing::debug!(%error, "adjudication failed; deterministic results kept");
                        issues.push(DataQualityIssue::new(
                            IssueKind::CollaboratorUnavailable,
                            "adjudication",
                            format!("{error}; deterministic results kept for {escalated_count} record(s)"),
                        ));
                    }
                    Err(_) => {
                        tracing::debug!(
                            timeout_ms = self.timeout.as_millis() as u64,
                            "adjudication timed out; deterministic results kept"
                        );
                        issues.push(DataQualityIssue::new(
                            IssueKind::CollaboratorUnavailable,
                            "adjudication",
                            format!(
                                "timed out after {:?}; deterministic results kept for {escalated_count} record(s)",
                                self.timeout
                            ),
                        ));
                    }
                }
            }
        }

        let contributing_record_ids: Vec<String> = classifications
            .iter()
            .map(|classification| classification.record_id.clone())
            .collect();
        let tables = build_tables(&classifications);

        ClassificationAnalysis {
            diagnostics: Diagnostics::completed(issues),
            classifications,
            escalated_count,
            adjudicated_count,
            tables,
            contributing_record_ids,
        }
    }
}

fn build_tables(classifications: &[Classification]) -> Vec<ReportTable> {
    let mut by_method: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut by_code: BTreeMap<(String, String), usize> = BTreeMap::new();
    for classification in classifications {
        *by_method.entry(classification.method.label()).or_insert(0) += 1;
        *by_code
            .entry((
                classification.device_problem_code.clone(),
                classification.device_problem_term.clone(),
            ))
            .or_insert(0) += 1;
    }

    let mut method_table = ReportTable::new("Classification Methods", &["Method", "Records"]);
    for (method, count) in by_method {
        method_table.push_row(vec![CellValue::text(method), CellValue::count(count)]);
    }

    let mut code_table = ReportTable::new(
        "Device Problem Distribution",
        &["Code", "Term", "Records"],
    );
    for ((code, term), count) in by_code {
        code_table.push_row(vec![
            CellValue::text(code),
            CellValue::text(term),
            CellValue::count(count),
        ]);
    }
    code_table.push_footnote("Codes follow the fixed two-axis regulatory taxonomy.");

    vec![method_table, code_table]
}
