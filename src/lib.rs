//! Deterministic evidence-to-judgment engines for post-market medical-device
//! surveillance.
//!
//! The crate turns normalized surveillance evidence (complaints, incidents,
//! sales volumes, literature findings, follow-up studies) into reproducible,
//! regulator-auditable statistical judgments. Five engines make up the core:
//!
//! - [`engines::rate_trend`] — exposure-normalized rates, control-limit trend
//!   detection, and the heightened trend-reporting determination.
//! - [`engines::segmentation`] — region/product/lot/quarter slices against the
//!   baseline rate to surface localized safety signals.
//! - [`engines::classification`] — deterministic two-stage mapping of symptom
//!   descriptions onto the fixed device-problem / patient-harm taxonomy.
//! - [`engines::decision`] — the weighted follow-up requirement decision and
//!   the benefit-risk determination, each reducible to an auditable factor
//!   list.
//!
//! All engines are pure functions over evidence collections plus small
//! configuration objects; none perform I/O. The single suspension point is the
//! optional adjudication call inside the classification engine, which runs
//! under a bounded timeout and degrades to the deterministic result on any
//! failure. Malformed input never panics an engine: safe defaults are
//! substituted and every substitution is surfaced in the result diagnostics.

pub mod config;
pub mod engines;
pub mod error;
pub mod evidence;
pub mod output;
pub mod pipeline;

pub use error::EngineError;
