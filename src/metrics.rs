//! Forecast accuracy metrics
//!
//! All metrics compare a true series against a predicted series of the same
//! length and return `Result<f64>`; mismatched or empty inputs are a caller
//! contract violation and produce a [`ForecastError::ValidationError`] rather
//! than a silently truncated value.

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Guard against division by zero in scale denominators.
pub const EPS: f64 = 1e-8;

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() || y_true.is_empty() {
        return Err(ForecastError::ValidationError(format!(
            "True and predicted series must have the same non-zero length (got {} and {})",
            y_true.len(),
            y_pred.len()
        )));
    }
    Ok(())
}

/// Weighted mean absolute percentage error.
///
/// `sum(|true - pred|) / (sum(|true|) + EPS)`. Zero for a perfect fit;
/// finite even when the true series sums to zero.
pub fn wmape(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let abs_err: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum();
    let denom: f64 = y_true.iter().map(|t| t.abs()).sum::<f64>() + EPS;

    Ok(abs_err / denom)
}

/// Symmetric mean absolute percentage error.
///
/// Elementwise `2|true - pred| / (|true| + |pred| + EPS)`, averaged. Bounded
/// in [0, 2] apart from the epsilon correction at zero/zero points.
pub fn smape(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| 2.0 * (t - p).abs() / (t.abs() + p.abs() + EPS))
        .sum();

    Ok(sum / y_true.len() as f64)
}

/// Mean signed forecast error, `mean(pred - true)`.
///
/// Positive values indicate over-forecasting.
pub fn bias(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let sum: f64 = y_true.iter().zip(y_pred.iter()).map(|(t, p)| p - t).sum();

    Ok(sum / y_true.len() as f64)
}

/// Mean absolute scaled error against a seasonal-naive baseline.
///
/// Returns `Ok(f64::NAN)` when the true series has fewer than
/// `seasonal_period + 2` points: there is not enough history to form the
/// seasonal-naive baseline. Callers must treat NaN as "insufficient history
/// to evaluate", not as zero.
pub fn mase(y_true: &[f64], y_pred: &[f64], seasonal_period: usize) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    if y_true.len() <= seasonal_period + 1 {
        return Ok(f64::NAN);
    }

    let seasonal_diffs: f64 = (seasonal_period..y_true.len())
        .map(|t| (y_true[t] - y_true[t - seasonal_period]).abs())
        .sum();
    let scale = seasonal_diffs / (y_true.len() - seasonal_period) as f64 + EPS;

    let mae: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64;

    Ok(mae / scale)
}

/// The full metric set computed for one scored forecast window.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ForecastMetrics {
    /// Weighted mean absolute percentage error
    pub wmape: f64,
    /// Symmetric mean absolute percentage error
    pub smape: f64,
    /// Mean signed error (positive = over-forecast)
    pub bias: f64,
    /// Mean absolute scaled error, NaN when history is too short
    pub mase: f64,
}

impl std::fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  WMAPE: {:.4}", self.wmape)?;
        writeln!(f, "  SMAPE: {:.4}", self.smape)?;
        writeln!(f, "  Bias:  {:.4}", self.bias)?;
        writeln!(f, "  MASE:  {:.4}", self.mase)?;
        Ok(())
    }
}

/// Compute all four accuracy metrics for one (true, predicted) pair.
pub fn evaluate(y_true: &[f64], y_pred: &[f64], seasonal_period: usize) -> Result<ForecastMetrics> {
    Ok(ForecastMetrics {
        wmape: wmape(y_true, y_pred)?,
        smape: smape(y_true, y_pred)?,
        bias: bias(y_true, y_pred)?,
        mase: mase(y_true, y_pred, seasonal_period)?,
    })
}
