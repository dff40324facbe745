//! # Demand Forecast
//!
//! A Rust library for per-SKU, per-region weekly demand forecasting and
//! model selection.
//!
//! ## Features
//!
//! - Long-format sales panel handling (group keys, date, target, exogenous
//!   numeric features)
//! - Forecasting models behind one `Forecaster` contract: exponential
//!   smoothing (Holt-Winters), seasonal regression with exogenous
//!   regressors, gradient-boosted regression stumps
//! - Rolling-origin backtesting with per-fold accuracy metrics
//!   (WMAPE, SMAPE, bias, MASE)
//! - Best-model selection per group and an aggregate model leaderboard
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::models::ets::EtsForecaster;
//! use demand_forecast::models::seasonal_regression::SeasonalRegressionForecaster;
//! use demand_forecast::{
//!     create_leaderboard, rolling_backtest, select_best_model_per_group, BacktestConfig,
//!     Forecaster, PanelSchema, SalesPanel,
//! };
//!
//! fn main() -> demand_forecast::error::Result<()> {
//!     // Load the weekly sales panel
//!     let panel = SalesPanel::from_csv("data/sales.csv", PanelSchema::weekly_sales())?;
//!
//!     // Candidate models
//!     let models: Vec<Box<dyn Forecaster>> = vec![
//!         Box::new(EtsForecaster::weekly()),
//!         Box::new(SeasonalRegressionForecaster::weekly()),
//!     ];
//!
//!     // Rolling backtest: 12-week horizon, 4 folds per group
//!     let config = BacktestConfig::new(12, 4)?;
//!     let results = rolling_backtest(&panel, &models, &config)?;
//!
//!     // Decision artifacts
//!     let best = select_best_model_per_group(&results);
//!     let leaderboard = create_leaderboard(&results);
//!     for entry in &leaderboard {
//!         println!("#{} {} wmape={:.4}", entry.rank, entry.model, entry.wmape.mean);
//!     }
//!     for row in &best {
//!         println!("{} -> {}", row.group, row.model);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod select;

// Re-export commonly used types
pub use crate::backtest::{
    fold_boundaries, rolling_backtest, single_split_backtest, BacktestConfig, Fold,
    ModelResult,
};
pub use crate::config::Settings;
pub use crate::data::{FeatureMatrix, GroupKey, GroupSeries, PanelSchema, SalesPanel};
pub use crate::error::ForecastError;
pub use crate::metrics::ForecastMetrics;
pub use crate::models::{Forecaster, ForecastIntervals};
pub use crate::select::{
    create_leaderboard, select_best_model, select_best_model_per_group, BestModel,
    LeaderboardEntry, MetricSummary,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
