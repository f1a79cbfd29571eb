use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

const DEFAULT_WARNING_PER_THOUSAND: f64 = 0.5;
const DEFAULT_ACTION_PER_THOUSAND: f64 = 1.0;

/// Warning/action rate limits for one complaint category, per 1,000 units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryThreshold {
    pub warning: f64,
    pub action: f64,
}

/// Category-keyed threshold table with a mandatory `"default"` fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateThresholds {
    categories: BTreeMap<String, CategoryThreshold>,
    default: CategoryThreshold,
}

impl Default for RateThresholds {
    fn default() -> Self {
        Self {
            categories: BTreeMap::new(),
            default: CategoryThreshold {
                warning: DEFAULT_WARNING_PER_THOUSAND,
                action: DEFAULT_ACTION_PER_THOUSAND,
            },
        }
    }
}

impl RateThresholds {
    pub fn with_category(
        mut self,
        category: &str,
        warning: f64,
        action: f64,
    ) -> Result<Self, EngineError> {
        if warning > action {
            return Err(EngineError::InvalidThreshold {
                category: category.to_string(),
                warning,
                action,
            });
        }
        self.categories.insert(
            category.trim().to_ascii_lowercase(),
            CategoryThreshold { warning, action },
        );
        Ok(self)
    }

    pub fn for_category(&self, category: &str) -> CategoryThreshold {
        self.categories
            .get(&category.trim().to_ascii_lowercase())
            .copied()
            .unwrap_or(self.default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachLevel {
    Warning,
    Action,
}

impl BreachLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::Action => "Action",
        }
    }
}

/// One category rate exceeding its configured limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBreach {
    pub category: String,
    pub rate: f64,
    pub threshold: f64,
    pub level: BreachLevel,
}

/// Compare per-category rates against the table. A rate past the action limit
/// reports a single action breach, not a warning breach as well.
pub(crate) fn evaluate(
    category_rates: &BTreeMap<String, f64>,
    thresholds: &RateThresholds,
) -> Vec<ThresholdBreach> {
    let mut breaches = Vec::new();
    for (category, rate) in category_rates {
        let limits = thresholds.for_category(category);
        if *rate > limits.action {
            breaches.push(ThresholdBreach {
                category: category.clone(),
                rate: *rate,
                threshold: limits.action,
                level: BreachLevel::Action,
            });
        } else if *rate > limits.warning {
            breaches.push(ThresholdBreach {
                category: category.clone(),
                rate: *rate,
                threshold: limits.warning,
                level: BreachLevel::Warning,
            });
        }
    }
    breaches
}
