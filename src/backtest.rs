//! Rolling-origin backtesting of forecasting models
//!
//! For each group and each candidate model, the engine produces a
//! forward-looking accuracy estimate by repeatedly fitting on a growing
//! training window and scoring the next `horizon` observations. The output
//! is a flat, append-only table of [`ModelResult`] rows: one per
//! (group, model, fold) combination that produced a scoreable forecast.
//!
//! Failure semantics follow a strict taxonomy: groups or folds with too
//! little history are silently skipped (observable as absence, never as a
//! sentinel value); a model erroring on one fold is logged and skipped
//! without touching sibling models or folds; a model *succeeding* but
//! returning the wrong number of predictions is a contract violation and
//! aborts the run loudly.

use crate::data::{FeatureMatrix, GroupKey, GroupSeries, SalesPanel};
use crate::error::{ForecastError, Result};
use crate::metrics::{self, ForecastMetrics};
use crate::models::Forecaster;
use serde::Serialize;
use tracing::{debug, warn};

/// Parameters of the rolling evaluation protocol.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// Number of future periods scored per fold
    pub horizon: usize,
    /// Number of rolling folds requested per group
    pub folds: usize,
    /// Seasonal period used by the MASE baseline
    pub seasonal_period: usize,
}

impl BacktestConfig {
    /// Create a config with the default weekly-annual MASE period.
    pub fn new(horizon: usize, folds: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least 1".to_string(),
            ));
        }
        if folds == 0 {
            return Err(ForecastError::InvalidParameter(
                "Fold count must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            horizon,
            folds,
            seasonal_period: 52,
        })
    }

    /// Override the MASE seasonal period.
    pub fn with_seasonal_period(mut self, seasonal_period: usize) -> Self {
        self.seasonal_period = seasonal_period;
        self
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            horizon: 12,
            folds: 4,
            seasonal_period: 52,
        }
    }
}

/// One scored (group, model, fold) combination.
#[derive(Debug, Clone, Serialize)]
pub struct ModelResult {
    /// Group the fold belongs to
    pub group: GroupKey,
    /// Model name
    pub model: String,
    /// Fold index within the group
    pub fold: usize,
    /// Accuracy metrics for the fold's test window
    pub metrics: ForecastMetrics,
}

/// Index partition of one fold: train is `[0, train_end)`, test is
/// `[test_start, test_end)` with `test_start == train_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fold {
    /// Exclusive end of the training window
    pub train_end: usize,
    /// Inclusive start of the test window
    pub test_start: usize,
    /// Exclusive end of the test window
    pub test_end: usize,
}

/// Compute the rolling fold plan for a series of `n` observations.
///
/// Returns an empty plan when `n <= horizon * (folds + 1)` — there is not
/// enough history for even one valid fold. Folds whose test window would be
/// truncated are omitted rather than scored partially.
pub fn fold_boundaries(n: usize, horizon: usize, folds: usize) -> Vec<Fold> {
    if horizon == 0 || folds == 0 || n <= horizon * (folds + 1) {
        return Vec::new();
    }

    let fold_size = horizon.max(n / (folds + 1));
    let mut specs = Vec::with_capacity(folds);
    for f in 0..folds {
        let offset = (folds - f) * fold_size;
        if offset >= n {
            continue;
        }
        let split = n - offset;
        if split + horizon > n {
            continue;
        }
        specs.push(Fold {
            train_end: split,
            test_start: split,
            test_end: split + horizon,
        });
    }

    specs
}

/// Run the rolling protocol over every group in the panel.
///
/// Models are passed as pristine prototypes; the engine clones one per
/// (group, model, fold) so fitted state never leaks between folds.
pub fn rolling_backtest(
    panel: &SalesPanel,
    models: &[Box<dyn Forecaster>],
    config: &BacktestConfig,
) -> Result<Vec<ModelResult>> {
    let mut results = Vec::new();
    for series in panel.groups() {
        let rows = backtest_group(series, models, config)?;
        if rows.is_empty() {
            debug!(group = %series.key, n = series.len(), "group skipped: insufficient history");
        }
        results.extend(rows);
    }
    Ok(results)
}

/// Evaluate one group against every model. Pure per-group function with no
/// shared state; callers may map it over groups in parallel and concatenate.
pub fn backtest_group(
    series: &GroupSeries,
    models: &[Box<dyn Forecaster>],
    config: &BacktestConfig,
) -> Result<Vec<ModelResult>> {
    let specs = fold_boundaries(series.len(), config.horizon, config.folds);
    let has_exog = series.exog.n_cols() > 0;
    let mut rows = Vec::new();

    for (fold, spec) in specs.iter().enumerate() {
        let y_train = &series.target[..spec.train_end];
        let y_test = &series.target[spec.test_start..spec.test_end];
        let x_train = has_exog.then(|| series.exog.slice(0, spec.train_end));
        let x_test = has_exog.then(|| series.exog.slice(spec.test_start, spec.test_end));

        for prototype in models {
            let predictions = match fit_and_predict(
                prototype.as_ref(),
                y_train,
                x_train.as_ref(),
                config.horizon,
                x_test.as_ref(),
            ) {
                Ok(predictions) => predictions,
                Err(err) => {
                    warn!(
                        group = %series.key,
                        model = prototype.name(),
                        fold,
                        error = %err,
                        "model failed on fold; skipping"
                    );
                    continue;
                }
            };

            if predictions.len() != config.horizon {
                return Err(ForecastError::ValidationError(format!(
                    "Model '{}' returned {} predictions for horizon {}",
                    prototype.name(),
                    predictions.len(),
                    config.horizon
                )));
            }

            rows.push(ModelResult {
                group: series.key.clone(),
                model: prototype.name().to_string(),
                fold,
                metrics: metrics::evaluate(y_test, &predictions, config.seasonal_period)?,
            });
        }
    }

    Ok(rows)
}

/// Clone, fit and predict one model on one fold. Kept as an explicit
/// `Result`-returning step so failure causes stay inspectable at the call
/// site instead of disappearing into a catch-all.
fn fit_and_predict(
    prototype: &dyn Forecaster,
    y_train: &[f64],
    x_train: Option<&FeatureMatrix>,
    horizon: usize,
    x_test: Option<&FeatureMatrix>,
) -> Result<Vec<f64>> {
    let mut model = prototype.clone_box();
    model.fit(y_train, x_train)?;
    model.predict(horizon, x_test)
}

/// Single-split approximation of the rolling protocol, for quick iteration.
///
/// Each group gets one deterministic split at `n * (1 - test_fraction)`; the
/// whole remainder is the test window and its length the forecast horizon.
/// Groups whose test partition has fewer than `min_test_rows` rows are
/// skipped. Emitted rows carry fold index 0. This is a fast approximation,
/// not a replacement for [`rolling_backtest`] in final evaluation.
pub fn single_split_backtest(
    panel: &SalesPanel,
    models: &[Box<dyn Forecaster>],
    config: &BacktestConfig,
    test_fraction: f64,
    min_test_rows: usize,
) -> Result<Vec<ModelResult>> {
    if test_fraction <= 0.0 || test_fraction >= 1.0 {
        return Err(ForecastError::InvalidParameter(
            "Test fraction must be between 0 and 1".to_string(),
        ));
    }

    let mut results = Vec::new();
    for series in panel.groups() {
        let n = series.len();
        let split = (n as f64 * (1.0 - test_fraction)) as usize;
        let test_len = n - split;
        if split == 0 || test_len < min_test_rows {
            debug!(group = %series.key, n, "group skipped: test partition too small");
            continue;
        }

        let has_exog = series.exog.n_cols() > 0;
        let y_train = &series.target[..split];
        let y_test = &series.target[split..];
        let x_train = has_exog.then(|| series.exog.slice(0, split));
        let x_test = has_exog.then(|| series.exog.slice(split, n));

        for prototype in models {
            let predictions = match fit_and_predict(
                prototype.as_ref(),
                y_train,
                x_train.as_ref(),
                test_len,
                x_test.as_ref(),
            ) {
                Ok(predictions) => predictions,
                Err(err) => {
                    warn!(
                        group = %series.key,
                        model = prototype.name(),
                        error = %err,
                        "model failed on split; skipping"
                    );
                    continue;
                }
            };

            if predictions.len() != test_len {
                return Err(ForecastError::ValidationError(format!(
                    "Model '{}' returned {} predictions for horizon {}",
                    prototype.name(),
                    predictions.len(),
                    test_len
                )));
            }

            results.push(ModelResult {
                group: series.key.clone(),
                model: prototype.name().to_string(),
                fold: 0,
                metrics: metrics::evaluate(y_test, &predictions, config.seasonal_period)?,
            });
        }
    }

    Ok(results)
}
