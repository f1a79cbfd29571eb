use std::future::Future;

use serde::{Deserialize, Serialize};

use super::Classification;

/// One ambiguous case handed to the external adjudication collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjudicationCase {
    pub record_id: String,
    pub symptom_code: String,
    pub description: String,
    pub deterministic: Classification,
}

/// Refined classification returned per record by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjudicatedOutcome {
    pub record_id: String,
    pub device_problem_code: String,
    pub device_problem_term: String,
    pub harm_code: Option<String>,
    pub harm_term: String,
    pub severity: crate::evidence::HarmLevel,
    pub confidence: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum AdjudicationError {
    #[error("adjudication collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("adjudication collaborator rejected the batch: {0}")]
    Rejected(String),
}

/// Port to the external adjudication collaborator.
///
/// The classification engine invokes this under a bounded timeout and falls
/// back to its deterministic result on any failure, so implementations are
/// free to fail fast; partial responses are applied record by record.
pub trait AdjudicationGateway: Send + Sync {
    fn adjudicate(
        &self,
        cases: &[AdjudicationCase],
    ) -> impl Future<Output = Result<Vec<AdjudicatedOutcome>, AdjudicationError>> + Send;
}

/// Gateway used when no collaborator is wired in; every batch is declined and
/// the deterministic results stand.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdjudication;

impl AdjudicationGateway for NoAdjudication {
    async fn adjudicate(
        &self,
        _cases: &[AdjudicationCase],
    ) -> Result<Vec<AdjudicatedOutcome>, AdjudicationError> {
        Ok(Vec::new())
    }
}
