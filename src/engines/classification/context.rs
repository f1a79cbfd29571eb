use crate::engines::EXTERNAL_CAUSE_KEYWORDS;
use crate::evidence::{Answer, ComplaintRecord};

const INJURY_KEYWORDS: &[&str] = &[
    "injury",
    "injured",
    "hospitalization",
    "hospitalized",
    "medical attention",
    "emergency",
    "treatment required",
    "wound",
];

/// Outcome of the deterministic context pass for entries whose harm depends on
/// the circumstances of the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContextOutcome {
    /// No patient involvement and no medical attention: classify as no harm.
    NoHarm,
    /// Investigation points at an external/packaging cause.
    ExternalCause,
    /// Explicit injury or medical-attention language: escalate severity.
    Injury,
    /// Nothing decisive; leave to adjudication.
    Ambiguous,
}

/// Resolve harm context without escalation wherever the record is unambiguous.
/// The checks run in fixed order so the result is reproducible.
pub(crate) fn resolve(complaint: &ComplaintRecord) -> ContextOutcome {
    if complaint.patient_involved == Answer::No && complaint.medical_attention == Answer::No {
        return ContextOutcome::NoHarm;
    }

    let narrative = complaint
        .investigation
        .as_ref()
        .map(|inv| inv.narrative())
        .unwrap_or_default();
    if EXTERNAL_CAUSE_KEYWORDS
        .iter()
        .any(|keyword| narrative.contains(keyword))
    {
        return ContextOutcome::ExternalCause;
    }

    let description = complaint.description.to_ascii_lowercase();
    if complaint.medical_attention == Answer::Yes
        || INJURY_KEYWORDS
            .iter()
            .any(|keyword| description.contains(keyword) || narrative.contains(keyword))
    {
        return ContextOutcome::Injury;
    }

    ContextOutcome::Ambiguous
}
