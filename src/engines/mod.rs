//! The five deterministic surveillance engines.

pub mod classification;
pub mod decision;
pub mod rate_trend;
pub mod segmentation;

/// Investigation-text markers for failures caused outside the device itself.
/// Shared by the confirmation tiering and the classification context pass so
/// the two never drift apart.
pub(crate) const EXTERNAL_CAUSE_KEYWORDS: &[&str] = &[
    "shipping damage",
    "transport damage",
    "storage damage",
    "user error",
    "misuse",
    "mishandling",
    "improper use",
    "handling damage",
    "dropped by user",
];
