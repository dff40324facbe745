//! Forecasting models behind a uniform fit/predict contract
//!
//! Every model family, however different internally, is driven through the
//! [`Forecaster`] trait so the backtest engine can treat them uniformly. A
//! model owns its hyperparameters and fitted state; the engine clones a
//! pristine prototype per fold, fits it, and asks for a forecast.

use crate::data::FeatureMatrix;
use crate::error::{ForecastError, Result};
use std::fmt::Debug;

/// Point forecast with symmetric uncertainty bands.
#[derive(Debug, Clone)]
pub struct ForecastIntervals {
    /// Mean forecast
    pub mean: Vec<f64>,
    /// Lower band
    pub lower: Vec<f64>,
    /// Upper band
    pub upper: Vec<f64>,
}

/// Common interface for forecasting models.
pub trait Forecaster: Debug {
    /// Name of the model, used to tag result rows.
    fn name(&self) -> &str;

    /// Fit on an ordered target series and optional aligned features.
    fn fit(&mut self, y: &[f64], x: Option<&FeatureMatrix>) -> Result<()>;

    /// Forecast `horizon` future values. Once `fit` has succeeded this must
    /// return exactly `horizon` numeric values for any `horizon >= 1`;
    /// only terminal configuration errors (e.g. a feature-driven model asked
    /// to predict without future features) may fail.
    fn predict(&self, horizon: usize, x_future: Option<&FeatureMatrix>) -> Result<Vec<f64>>;

    /// Standard deviation of in-sample one-step residuals, when the model
    /// tracks them. Drives the default interval estimate.
    fn residual_std(&self) -> Option<f64> {
        None
    }

    /// Forecast with naive normal-theory intervals around the point forecast.
    fn predict_with_intervals(
        &self,
        horizon: usize,
        x_future: Option<&FeatureMatrix>,
        alpha: f64,
    ) -> Result<ForecastIntervals> {
        if alpha <= 0.0 || alpha >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Alpha must be between 0 and 1".to_string(),
            ));
        }

        let mean = self.predict(horizon, x_future)?;
        let se = self.residual_std().unwrap_or(1.0);
        let z = normal_z(alpha);

        let lower = mean.iter().map(|m| m - z * se).collect();
        let upper = mean.iter().map(|m| m + z * se).collect();

        Ok(ForecastIntervals { mean, lower, upper })
    }

    /// Clone into a boxed trait object, used by the engine to get a fresh
    /// unfitted model per fold.
    fn clone_box(&self) -> Box<dyn Forecaster>;
}

impl Clone for Box<dyn Forecaster> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Two-sided z critical value for a significance level.
pub(crate) fn normal_z(alpha: f64) -> f64 {
    match alpha {
        a if a <= 0.01 => 2.576,
        a if a <= 0.05 => 1.96,
        a if a <= 0.10 => 1.645,
        _ => 1.0,
    }
}

/// Sample standard deviation of residuals; falls back to 1.0 when too few
/// residuals are available to estimate anything useful.
pub(crate) fn residual_std_or_default(residuals: &[f64]) -> f64 {
    if residuals.len() < 10 {
        return 1.0;
    }
    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    let var = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

pub mod ets;
pub mod gradient_boosting;
pub mod seasonal_regression;
