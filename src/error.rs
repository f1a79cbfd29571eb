use crate::config::SettingsError;

/// Errors raised for caller contract violations.
///
/// Degraded-input conditions never surface here; they are reported as
/// [`crate::output::DataQualityIssue`] values inside engine results so a run
/// always completes.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Settings(#[from] SettingsError),
    #[error("invalid threshold for category {category}: warning {warning} exceeds action {action}")]
    InvalidThreshold {
        category: String,
        warning: f64,
        action: f64,
    },
}
