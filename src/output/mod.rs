//! Shared result envelope for every engine.
//!
//! Engines never raise for malformed input. A run is always "complete but
//! possibly degraded": safe defaults are substituted, and each substitution is
//! enumerated as a [`DataQualityIssue`] so nothing is dropped silently.

mod table;

pub(crate) use table::{round2, round4};
pub use table::{CellValue, ReportTable, TableRow};

use serde::{Deserialize, Serialize};

/// Category of a tolerated input defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingValue,
    MalformedDate,
    UnparseableNumber,
    MissingExposure,
    CollaboratorUnavailable,
}

impl IssueKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MissingValue => "Missing Value",
            Self::MalformedDate => "Malformed Date",
            Self::UnparseableNumber => "Unparseable Number",
            Self::MissingExposure => "Missing Exposure Denominator",
            Self::CollaboratorUnavailable => "External Collaborator Unavailable",
        }
    }
}

/// One tolerated defect, pointing at the field or record that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityIssue {
    pub kind: IssueKind,
    pub subject: String,
    pub detail: String,
}

impl DataQualityIssue {
    pub fn new(kind: IssueKind, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}

/// Completion envelope carried by every engine result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub success: bool,
    pub errors: Vec<DataQualityIssue>,
}

impl Diagnostics {
    /// A run that produced its metrics; `errors` lists every substitution made
    /// along the way.
    pub fn completed(errors: Vec<DataQualityIssue>) -> Self {
        Self {
            success: true,
            errors,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_run_reports_degradation_without_failing() {
        let diagnostics = Diagnostics::completed(vec![DataQualityIssue::new(
            IssueKind::MissingExposure,
            "exposure",
            "exposure denominator was zero; rates reported as 0",
        )]);
        assert!(diagnostics.success);
        assert!(diagnostics.is_degraded());
        assert_eq!(diagnostics.errors[0].kind, IssueKind::MissingExposure);
    }
}
