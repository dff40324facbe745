//! Seasonal regression with exogenous regressors
//!
//! Linear model of the target on an intercept, a linear trend, Fourier
//! seasonal harmonics and any supplied exogenous columns. Fitting solves
//! ridge-regularized normal equations by Gaussian elimination; nothing here
//! depends on the calendar beyond the configured period.

use crate::data::FeatureMatrix;
use crate::error::{ForecastError, Result};
use crate::models::{residual_std_or_default, Forecaster};

/// Seasonal + exogenous linear forecaster, the SARIMAX slot of the model set.
#[derive(Debug, Clone)]
pub struct SeasonalRegressionForecaster {
    name: String,
    period: usize,
    harmonics: usize,
    ridge: f64,
    fitted: Option<FittedRegression>,
}

#[derive(Debug, Clone)]
struct FittedRegression {
    coefficients: Vec<f64>,
    n_obs: usize,
    /// Whether seasonal terms were included for this fit
    use_seasonal: bool,
    n_exog: usize,
    residual_std: f64,
}

impl SeasonalRegressionForecaster {
    /// Create a model with explicit period, harmonic count and ridge penalty.
    pub fn new(period: usize, harmonics: usize, ridge: f64) -> Result<Self> {
        if period < 2 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be at least 2".to_string(),
            ));
        }
        if harmonics == 0 || harmonics > period / 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Harmonics must be in 1..={} for period {}",
                period / 2,
                period
            )));
        }
        if ridge < 0.0 {
            return Err(ForecastError::InvalidParameter(
                "Ridge penalty must be non-negative".to_string(),
            ));
        }

        Ok(Self {
            name: "SeasonalRegression".to_string(),
            period,
            harmonics,
            ridge,
            fitted: None,
        })
    }

    /// Weekly-annual configuration: period 52, three harmonics.
    pub fn weekly() -> Self {
        Self {
            name: "SeasonalRegression".to_string(),
            period: 52,
            harmonics: 3,
            ridge: 1e-3,
            fitted: None,
        }
    }

    fn fitted(&self) -> Result<&FittedRegression> {
        self.fitted.as_ref().ok_or_else(|| {
            ForecastError::FitError("Seasonal regression has not been fitted".to_string())
        })
    }

    /// Design-matrix row for (0-based) time index `t`.
    fn design_row(&self, t: usize, use_seasonal: bool, exog: Option<&[f64]>) -> Vec<f64> {
        let mut row = vec![1.0, t as f64];
        if use_seasonal {
            let omega = 2.0 * std::f64::consts::PI / self.period as f64;
            for k in 1..=self.harmonics {
                let angle = omega * k as f64 * t as f64;
                row.push(angle.sin());
                row.push(angle.cos());
            }
        }
        if let Some(values) = exog {
            row.extend_from_slice(values);
        }
        row
    }
}

impl Forecaster for SeasonalRegressionForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, y: &[f64], x: Option<&FeatureMatrix>) -> Result<()> {
        if y.len() < 3 {
            return Err(ForecastError::FitError(
                "Seasonal regression needs at least 3 observations".to_string(),
            ));
        }
        let n_exog = x.map(|m| m.n_cols()).unwrap_or(0);
        if let Some(matrix) = x {
            if matrix.n_rows() != y.len() {
                return Err(ForecastError::ValidationError(format!(
                    "Feature rows ({}) don't match target length ({})",
                    matrix.n_rows(),
                    y.len()
                )));
            }
        }

        let use_seasonal = y.len() >= 2 * self.period;
        let design: Vec<Vec<f64>> = (0..y.len())
            .map(|t| self.design_row(t, use_seasonal, x.map(|m| m.row(t))))
            .collect();

        let coefficients = ridge_least_squares(&design, y, self.ridge)?;

        let residuals: Vec<f64> = design
            .iter()
            .zip(y.iter())
            .map(|(row, &value)| value - dot(row, &coefficients))
            .collect();

        self.fitted = Some(FittedRegression {
            coefficients,
            n_obs: y.len(),
            use_seasonal,
            n_exog,
            residual_std: residual_std_or_default(&residuals),
        });

        Ok(())
    }

    fn predict(&self, horizon: usize, x_future: Option<&FeatureMatrix>) -> Result<Vec<f64>> {
        let fitted = self.fitted()?;

        if fitted.n_exog > 0 {
            let matrix = x_future.ok_or_else(|| {
                ForecastError::ValidationError(
                    "Model was fitted with exogenous features but none were supplied for the horizon"
                        .to_string(),
                )
            })?;
            if matrix.n_cols() != fitted.n_exog {
                return Err(ForecastError::ValidationError(format!(
                    "Future feature columns ({}) don't match fitted columns ({})",
                    matrix.n_cols(),
                    fitted.n_exog
                )));
            }
            if matrix.n_rows() != horizon {
                return Err(ForecastError::ValidationError(format!(
                    "Future feature rows ({}) don't match horizon ({})",
                    matrix.n_rows(),
                    horizon
                )));
            }
        }

        let values = (0..horizon)
            .map(|k| {
                let exog_row = if fitted.n_exog > 0 {
                    x_future.map(|m| m.row(k))
                } else {
                    None
                };
                let row = self.design_row(fitted.n_obs + k, fitted.use_seasonal, exog_row);
                dot(&row, &fitted.coefficients)
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

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Solve `(X'X + ridge*I) beta = X'y` by Gaussian elimination with partial
/// pivoting. The intercept column is left unpenalized.
fn ridge_least_squares(design: &[Vec<f64>], y: &[f64], ridge: f64) -> Result<Vec<f64>> {
    let p = design[0].len();

    let mut gram = vec![vec![0.0; p]; p];
    let mut rhs = vec![0.0; p];
    for (row, &value) in design.iter().zip(y.iter()) {
        for i in 0..p {
            rhs[i] += row[i] * value;
            for j in 0..p {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    for (i, row) in gram.iter_mut().enumerate().skip(1) {
        row[i] += ridge;
    }

    gaussian_solve(gram, rhs)
}

fn gaussian_solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if a[pivot_row][col].abs() < 1e-12 {
            return Err(ForecastError::FitError(
                "Singular design matrix in seasonal regression".to_string(),
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (b[row] - tail) / a[row][row];
    }

    Ok(solution)
}
