use std::env;
use std::time::Duration;

const DEFAULT_FAVORABLE_RATIO: f64 = 1.0;
const DEFAULT_ADJUDICATION_TIMEOUT_MS: u64 = 2_000;

/// Tunable knobs for the surveillance engines.
///
/// Only the two dials the regulatory procedure leaves open are configurable:
/// the benefit-risk ratio above which a determination may be FAVORABLE, and
/// the bound on the external adjudication call. Every statistical formula,
/// taxonomy code, and decision weight is fixed content and compiled in.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub favorable_ratio_threshold: f64,
    pub adjudication_timeout: Duration,
}

impl EngineSettings {
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let favorable_ratio_threshold = match env::var("VIGILANCE_FAVORABLE_RATIO") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value > 0.0)
                .ok_or(SettingsError::InvalidFavorableRatio)?,
            Err(_) => DEFAULT_FAVORABLE_RATIO,
        };

        let adjudication_timeout_ms = match env::var("VIGILANCE_ADJUDICATION_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(SettingsError::InvalidAdjudicationTimeout)?,
            Err(_) => DEFAULT_ADJUDICATION_TIMEOUT_MS,
        };

        Ok(Self {
            favorable_ratio_threshold,
            adjudication_timeout: Duration::from_millis(adjudication_timeout_ms),
        })
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            favorable_ratio_threshold: DEFAULT_FAVORABLE_RATIO,
            adjudication_timeout: Duration::from_millis(DEFAULT_ADJUDICATION_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("VIGILANCE_FAVORABLE_RATIO must be a positive finite number")]
    InvalidFavorableRatio,
    #[error("VIGILANCE_ADJUDICATION_TIMEOUT_MS must be a positive integer")]
    InvalidAdjudicationTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("VIGILANCE_FAVORABLE_RATIO");
        env::remove_var("VIGILANCE_ADJUDICATION_TIMEOUT_MS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let settings = EngineSettings::load().expect("settings load with defaults");
        assert_eq!(settings.favorable_ratio_threshold, DEFAULT_FAVORABLE_RATIO);
        assert_eq!(settings.adjudication_timeout, Duration::from_millis(2_000));
    }

    #[test]
    fn load_rejects_non_positive_ratio() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VIGILANCE_FAVORABLE_RATIO", "-1.5");
        let error = EngineSettings::load().expect_err("negative ratio rejected");
        assert!(matches!(error, SettingsError::InvalidFavorableRatio));
        reset_env();
    }

    #[test]
    fn load_accepts_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VIGILANCE_FAVORABLE_RATIO", "2.5");
        env::set_var("VIGILANCE_ADJUDICATION_TIMEOUT_MS", "500");
        let settings = EngineSettings::load().expect("settings load");
        assert_eq!(settings.favorable_ratio_threshold, 2.5);
        assert_eq!(settings.adjudication_timeout, Duration::from_millis(500));
        reset_env();
    }
}
