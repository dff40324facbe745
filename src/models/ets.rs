//! Exponential smoothing (Holt-Winters) for weekly demand series

use crate::data::FeatureMatrix;
use crate::error::{ForecastError, Result};
use crate::models::{residual_std_or_default, Forecaster};

/// Additive Holt-Winters: level + trend, with optional additive seasonality.
///
/// Seasonality is automatically disabled when the training series is shorter
/// than two full seasonal cycles; the remaining Holt recursion still yields a
/// usable trend forecast on short histories.
#[derive(Debug, Clone)]
pub struct EtsForecaster {
    name: String,
    /// Level smoothing
    alpha: f64,
    /// Trend smoothing
    beta: f64,
    /// Seasonal smoothing
    gamma: f64,
    seasonal: bool,
    seasonal_periods: usize,
    state: Option<EtsState>,
}

#[derive(Debug, Clone)]
struct EtsState {
    level: f64,
    trend: f64,
    /// Seasonal indices; empty when seasonality is disabled for this fit
    seasonal: Vec<f64>,
    n_obs: usize,
    residual_std: f64,
}

impl EtsForecaster {
    /// Create a seasonal model with explicit smoothing parameters.
    pub fn new(alpha: f64, beta: f64, gamma: f64, seasonal_periods: usize) -> Result<Self> {
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if value <= 0.0 || value >= 1.0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be between 0 and 1",
                    name
                )));
            }
        }
        if seasonal_periods < 2 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be at least 2".to_string(),
            ));
        }

        Ok(Self {
            name: "ETS".to_string(),
            alpha,
            beta,
            gamma,
            seasonal: true,
            seasonal_periods,
            state: None,
        })
    }

    /// Weekly-annual configuration (period 52) with conventional smoothing.
    pub fn weekly() -> Self {
        Self {
            name: "ETS".to_string(),
            alpha: 0.3,
            beta: 0.1,
            gamma: 0.1,
            seasonal: true,
            seasonal_periods: 52,
            state: None,
        }
    }

    /// Disable the seasonal component regardless of history length.
    pub fn without_seasonality(mut self) -> Self {
        self.seasonal = false;
        self
    }

    /// Whether the last fit actually used a seasonal component.
    pub fn fitted_seasonally(&self) -> bool {
        self.state
            .as_ref()
            .map(|s| !s.seasonal.is_empty())
            .unwrap_or(false)
    }

    fn state(&self) -> Result<&EtsState> {
        self.state.as_ref().ok_or_else(|| {
            ForecastError::FitError("ETS model has not been fitted".to_string())
        })
    }
}

impl Forecaster for EtsForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, y: &[f64], _x: Option<&FeatureMatrix>) -> Result<()> {
        if y.len() < 2 {
            return Err(ForecastError::FitError(
                "ETS needs at least 2 observations".to_string(),
            ));
        }

        let m = self.seasonal_periods;
        let use_seasonal = self.seasonal && y.len() >= 2 * m;

        let mut residuals = Vec::new();

        let state = if use_seasonal {
            // Initialize from the first two full cycles.
            let first_cycle = &y[..m];
            let second_cycle = &y[m..2 * m];
            let first_mean = first_cycle.iter().sum::<f64>() / m as f64;
            let second_mean = second_cycle.iter().sum::<f64>() / m as f64;

            let mut level = first_mean;
            let mut trend = (second_mean - first_mean) / m as f64;
            let mut seasonal: Vec<f64> = first_cycle.iter().map(|v| v - first_mean).collect();

            for (t, &value) in y.iter().enumerate().skip(m) {
                let s = seasonal[t % m];
                let fitted = level + trend + s;
                residuals.push(value - fitted);

                let new_level = self.alpha * (value - s) + (1.0 - self.alpha) * (level + trend);
                seasonal[t % m] = self.gamma * (value - new_level) + (1.0 - self.gamma) * s;
                trend = self.beta * (new_level - level) + (1.0 - self.beta) * trend;
                level = new_level;
            }

            EtsState {
                level,
                trend,
                seasonal,
                n_obs: y.len(),
                residual_std: 0.0,
            }
        } else {
            // Holt's linear method.
            let mut level = y[0];
            let mut trend = y[1] - y[0];

            for &value in &y[1..] {
                let fitted = level + trend;
                residuals.push(value - fitted);

                let new_level = self.alpha * value + (1.0 - self.alpha) * (level + trend);
                trend = self.beta * (new_level - level) + (1.0 - self.beta) * trend;
                level = new_level;
            }

            EtsState {
                level,
                trend,
                seasonal: Vec::new(),
                n_obs: y.len(),
                residual_std: 0.0,
            }
        };

        let residual_std = residual_std_or_default(&residuals);
        self.state = Some(EtsState {
            residual_std,
            ..state
        });

        Ok(())
    }

    fn predict(&self, horizon: usize, _x_future: Option<&FeatureMatrix>) -> Result<Vec<f64>> {
        let state = self.state()?;
        let m = self.seasonal_periods;

        let values = (1..=horizon)
            .map(|k| {
                let mut value = state.level + k as f64 * state.trend;
                if !state.seasonal.is_empty() {
                    value += state.seasonal[(state.n_obs + k - 1) % m];
                }
                value
            })
            .collect();

        Ok(values)
    }

    fn residual_std(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.residual_std)
    }

    fn clone_box(&self) -> Box<dyn Forecaster> {
        Box::new(self.clone())
    }
}
