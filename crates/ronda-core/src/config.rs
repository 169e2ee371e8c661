//! Analysis configuration.
//!
//! Every knob that the driver scripts used to hard-code (and disagree on) is
//! an explicit, caller-supplied option here: the minimum-sample threshold,
//! the correlation method, basket size, and the significance ladder.

use crate::error::{Result, RondaError};
use crate::types::Horizon;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Correlation method for information-coefficient calculations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Rank correlation. The default for cross-sectional ICs.
    #[default]
    Spearman,
    /// Linear correlation.
    Pearson,
}

impl FromStr for CorrelationMethod {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "spearman" => Ok(Self::Spearman),
            "pearson" => Ok(Self::Pearson),
            other => Err(RondaError::Config(format!(
                "unknown correlation method: {other}"
            ))),
        }
    }
}

/// P-value thresholds for significance stars.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignificanceThresholds {
    /// Threshold for `***`.
    pub three_stars: f64,
    /// Threshold for `**`.
    pub two_stars: f64,
    /// Threshold for `*`.
    pub one_star: f64,
}

impl Default for SignificanceThresholds {
    fn default() -> Self {
        Self {
            three_stars: 0.001,
            two_stars: 0.01,
            one_star: 0.05,
        }
    }
}

impl SignificanceThresholds {
    /// Map a p-value to its star rating. NaN maps to no stars.
    pub fn stars(&self, p_value: f64) -> &'static str {
        if !p_value.is_finite() {
            ""
        } else if p_value < self.three_stars {
            "***"
        } else if p_value < self.two_stars {
            "**"
        } else if p_value < self.one_star {
            "*"
        } else {
            ""
        }
    }
}

/// Configuration shared by the backtest, correlation, and cohort analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Number of entities in each of the long and short baskets.
    pub basket_size: usize,
    /// Forward-return horizons to evaluate.
    pub horizons: Vec<Horizon>,
    /// Minimum observations for a cohort, month bucket, or daily IC to count.
    pub min_samples: usize,
    /// Trailing window length (in calendar days) for rolling statistics.
    pub rolling_window: usize,
    /// Significance-star thresholds.
    pub thresholds: SignificanceThresholds,
    /// Correlation method for IC calculations.
    pub ranking_metric: CorrelationMethod,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            basket_size: 10,
            horizons: Horizon::ALL.to_vec(),
            min_samples: 15,
            rolling_window: 90,
            thresholds: SignificanceThresholds::default(),
            ranking_metric: CorrelationMethod::Spearman,
        }
    }
}

impl EvalConfig {
    /// Validate the configuration, returning a fatal error on caller misuse.
    pub fn validate(&self) -> Result<()> {
        if self.basket_size == 0 {
            return Err(RondaError::Config(
                "basket size must be positive".to_string(),
            ));
        }
        if self.horizons.is_empty() {
            return Err(RondaError::Config(
                "at least one horizon is required".to_string(),
            ));
        }
        if self.min_samples < 2 {
            return Err(RondaError::Config(
                "min_samples must be at least 2".to_string(),
            ));
        }
        if self.rolling_window < 2 {
            return Err(RondaError::Config(
                "rolling window must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}
