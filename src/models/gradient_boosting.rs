//! Gradient-boosted regression stumps over engineered features
//!
//! The tree model has no intrinsic notion of time: it regresses the target
//! purely on the engineered feature columns (lags, rolling stats, calendar
//! flags) supplied by the caller, and therefore needs future feature rows to
//! predict at all.

use crate::data::FeatureMatrix;
use crate::error::{ForecastError, Result};
use crate::models::{residual_std_or_default, Forecaster};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Boosted-stump regressor, the gradient-boosted-trees slot of the model set.
#[derive(Debug, Clone)]
pub struct GradientBoostedTreesForecaster {
    name: String,
    n_trees: usize,
    learning_rate: f64,
    subsample: f64,
    min_leaf: usize,
    seed: u64,
    fitted: Option<FittedEnsemble>,
}

#[derive(Debug, Clone)]
struct Stump {
    feature: usize,
    threshold: f64,
    left_value: f64,
    right_value: f64,
}

impl Stump {
    fn predict(&self, row: &[f64]) -> f64 {
        if row[self.feature] <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

#[derive(Debug, Clone)]
struct FittedEnsemble {
    base: f64,
    learning_rate: f64,
    stumps: Vec<Stump>,
    n_features: usize,
    residual_std: f64,
}

impl GradientBoostedTreesForecaster {
    /// Create a model with explicit boosting hyperparameters.
    pub fn new(n_trees: usize, learning_rate: f64, subsample: f64, seed: u64) -> Result<Self> {
        if n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "Tree count must be positive".to_string(),
            ));
        }
        if learning_rate <= 0.0 || learning_rate > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Learning rate must be in (0, 1]".to_string(),
            ));
        }
        if subsample <= 0.0 || subsample > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Subsample ratio must be in (0, 1]".to_string(),
            ));
        }

        Ok(Self {
            name: "GradientBoostedTrees".to_string(),
            n_trees,
            learning_rate,
            subsample,
            min_leaf: 3,
            seed,
            fitted: None,
        })
    }

    /// Conventional configuration: 200 stumps, 0.05 learning rate.
    pub fn default_params() -> Self {
        Self {
            name: "GradientBoostedTrees".to_string(),
            n_trees: 200,
            learning_rate: 0.05,
            subsample: 0.9,
            min_leaf: 3,
            seed: 42,
            fitted: None,
        }
    }

    fn fitted(&self) -> Result<&FittedEnsemble> {
        self.fitted.as_ref().ok_or_else(|| {
            ForecastError::FitError("Gradient boosted model has not been fitted".to_string())
        })
    }

    /// Best SSE split of `residuals` on one feature, or None when every
    /// candidate leaves a side smaller than `min_leaf`.
    fn best_split_on_feature(
        &self,
        x: &FeatureMatrix,
        rows: &[usize],
        residuals: &[f64],
        feature: usize,
    ) -> Option<(Stump, f64)> {
        let mut pairs: Vec<(f64, f64)> = rows
            .iter()
            .map(|&i| (x.row(i)[feature], residuals[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let step = (pairs.len() / 10).max(1);
        let mut best: Option<(Stump, f64)> = None;

        for split_idx in (0..pairs.len()).step_by(step) {
            let threshold = pairs[split_idx].0;
            let (left, right): (Vec<&(f64, f64)>, Vec<&(f64, f64)>) =
                pairs.iter().partition(|(v, _)| *v <= threshold);

            if left.len() < self.min_leaf || right.len() < self.min_leaf {
                continue;
            }

            let left_mean = left.iter().map(|(_, r)| r).sum::<f64>() / left.len() as f64;
            let right_mean = right.iter().map(|(_, r)| r).sum::<f64>() / right.len() as f64;
            let sse: f64 = left
                .iter()
                .map(|(_, r)| (r - left_mean).powi(2))
                .chain(right.iter().map(|(_, r)| (r - right_mean).powi(2)))
                .sum();

            if best.as_ref().map(|(_, s)| sse < *s).unwrap_or(true) {
                best = Some((
                    Stump {
                        feature,
                        threshold,
                        left_value: left_mean,
                        right_value: right_mean,
                    },
                    sse,
                ));
            }
        }

        best
    }
}

impl Forecaster for GradientBoostedTreesForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, y: &[f64], x: Option<&FeatureMatrix>) -> Result<()> {
        let x = x.ok_or_else(|| {
            ForecastError::ValidationError(
                "Gradient boosted model requires engineered features".to_string(),
            )
        })?;
        if x.n_cols() == 0 {
            return Err(ForecastError::ValidationError(
                "Gradient boosted model requires at least one feature column".to_string(),
            ));
        }
        if x.n_rows() != y.len() {
            return Err(ForecastError::ValidationError(format!(
                "Feature rows ({}) don't match target length ({})",
                x.n_rows(),
                y.len()
            )));
        }
        if y.len() < 2 * self.min_leaf {
            return Err(ForecastError::FitError(format!(
                "Gradient boosted model needs at least {} observations",
                2 * self.min_leaf
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = y.len();
        let n_features = x.n_cols();
        let base = y.iter().sum::<f64>() / n as f64;

        let mut predictions = vec![base; n];
        let mut stumps = Vec::with_capacity(self.n_trees);

        for _ in 0..self.n_trees {
            let residuals: Vec<f64> = y
                .iter()
                .zip(predictions.iter())
                .map(|(value, pred)| value - pred)
                .collect();

            let rows: Vec<usize> = if self.subsample < 1.0 {
                let take = ((n as f64 * self.subsample).round() as usize).max(2 * self.min_leaf);
                let mut sampled: Vec<usize> =
                    (0..take.min(n)).map(|_| rng.gen_range(0..n)).collect();
                sampled.sort_unstable();
                sampled
            } else {
                (0..n).collect()
            };

            let features_to_try = (n_features / 3).clamp(1, n_features.min(10));
            let mut best: Option<(Stump, f64)> = None;
            for _ in 0..features_to_try {
                let feature = rng.gen_range(0..n_features);
                if let Some((stump, sse)) = self.best_split_on_feature(x, &rows, &residuals, feature)
                {
                    if best.as_ref().map(|(_, s)| sse < *s).unwrap_or(true) {
                        best = Some((stump, sse));
                    }
                }
            }

            let Some((stump, _)) = best else { break };
            for i in 0..n {
                predictions[i] += self.learning_rate * stump.predict(x.row(i));
            }
            stumps.push(stump);
        }

        let residuals: Vec<f64> = y
            .iter()
            .zip(predictions.iter())
            .map(|(value, pred)| value - pred)
            .collect();

        self.fitted = Some(FittedEnsemble {
            base,
            learning_rate: self.learning_rate,
            stumps,
            n_features,
            residual_std: residual_std_or_default(&residuals),
        });

        Ok(())
    }

    fn predict(&self, horizon: usize, x_future: Option<&FeatureMatrix>) -> Result<Vec<f64>> {
        let fitted = self.fitted()?;
        let x_future = x_future.ok_or_else(|| {
            ForecastError::ValidationError(
                "Gradient boosted model requires future features to predict".to_string(),
            )
        })?;
        if x_future.n_cols() != fitted.n_features {
            return Err(ForecastError::ValidationError(format!(
                "Future feature columns ({}) don't match fitted columns ({})",
                x_future.n_cols(),
                fitted.n_features
            )));
        }
        if x_future.n_rows() != horizon {
            return Err(ForecastError::ValidationError(format!(
                "Future feature rows ({}) don't match horizon ({})",
                x_future.n_rows(),
                horizon
            )));
        }

        let values = (0..horizon)
            .map(|i| {
                let row = x_future.row(i);
                fitted.base
                    + fitted
                        .stumps
                        .iter()
                        .map(|s| fitted.learning_rate * s.predict(row))
                        .sum::<f64>()
            })
            .collect();

        Ok(values)
    }

    fn residual_std(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.residual_std)
    }

    fn clone_box(&self) -> Box<dyn Forecaster> {
        Box::new(self.clone())
    }
}
