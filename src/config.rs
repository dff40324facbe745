//! Runtime settings for forecasting runs

use crate::backtest::BacktestConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunable settings shared by training and backtesting entry points.
///
/// Quick mode trades fidelity for speed: a shorter horizon, fewer folds and
/// a capped group count, for fast feedback while iterating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Period label of the panel (weekly by convention)
    pub frequency: String,
    /// Forecast horizon in periods
    pub horizon: usize,
    /// Rolling folds per group
    pub folds: usize,
    /// Seasonal period for seasonal models and the MASE baseline
    pub seasonal_period: usize,
    /// Whether the gradient-boosted model joins the candidate set
    pub use_gbt: bool,
    /// Quick-iteration mode
    pub quick_mode: bool,
    /// Horizon used in quick mode
    pub quick_horizon: usize,
    /// Fold count used in quick mode
    pub quick_folds: usize,
    /// Cap on evaluated groups in quick mode
    pub max_groups: usize,
    /// Test share for the single-split variant
    pub test_fraction: f64,
    /// Minimum test rows for the single-split variant
    pub min_test_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frequency: "W".to_string(),
            horizon: 12,
            folds: 4,
            seasonal_period: 52,
            use_gbt: true,
            quick_mode: false,
            quick_horizon: 4,
            quick_folds: 2,
            max_groups: 10,
            test_fraction: 0.2,
            min_test_rows: 10,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; absent fields fall back to defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&text)?;
        Ok(settings)
    }

    /// Horizon after applying the quick-mode switch.
    pub fn effective_horizon(&self) -> usize {
        if self.quick_mode {
            self.quick_horizon
        } else {
            self.horizon
        }
    }

    /// Fold count after applying the quick-mode switch.
    pub fn effective_folds(&self) -> usize {
        if self.quick_mode {
            self.quick_folds
        } else {
            self.folds
        }
    }

    /// Build the backtest configuration these settings describe.
    pub fn backtest_config(&self) -> Result<BacktestConfig> {
        Ok(
            BacktestConfig::new(self.effective_horizon(), self.effective_folds())?
                .with_seasonal_period(self.seasonal_period),
        )
    }
}
