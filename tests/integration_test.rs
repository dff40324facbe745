use chrono::{Duration, NaiveDate};
use demand_forecast::models::ets::EtsForecaster;
use demand_forecast::models::gradient_boosting::GradientBoostedTreesForecaster;
use demand_forecast::models::seasonal_regression::SeasonalRegressionForecaster;
use demand_forecast::{
    create_leaderboard, rolling_backtest, select_best_model, select_best_model_per_group,
    BacktestConfig, Forecaster, PanelSchema, SalesPanel, Settings,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Two SKUs, 120 weeks each, with a mild trend, an annual wave and two
/// engineered feature columns the tree model can lean on.
fn write_sales_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "sku_id,region_id,date,units,promo_flag,weekofyear").unwrap();

    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    for (sku, base) in [("SKU-1", 40.0), ("SKU-2", 90.0)] {
        for t in 0..120 {
            let date = start + Duration::weeks(t);
            let promo = if t % 9 == 0 { 1.0 } else { 0.0 };
            let week = (t % 52 + 1) as f64;
            let units = base
                + 0.1 * t as f64
                + 10.0 * (2.0 * std::f64::consts::PI * t as f64 / 52.0).sin()
                + 5.0 * promo;
            writeln!(
                file,
                "{},{},{},{:.3},{},{}",
                sku,
                "NORTH",
                date.format("%Y-%m-%d"),
                units,
                promo,
                week
            )
            .unwrap();
        }
    }

    file
}

#[test]
fn test_full_backtest_and_selection_workflow() {
    // 1. Load the panel
    let file = write_sales_csv();
    let panel =
        SalesPanel::from_csv(file.path().to_str().unwrap(), PanelSchema::weekly_sales()).unwrap();
    assert_eq!(panel.groups().len(), 2);
    assert_eq!(panel.exog_cols().len(), 2);

    // 2. Candidate models, one per family
    let models: Vec<Box<dyn Forecaster>> = vec![
        Box::new(EtsForecaster::weekly()),
        Box::new(SeasonalRegressionForecaster::weekly()),
        Box::new(GradientBoostedTreesForecaster::default_params()),
    ];

    // 3. Rolling backtest: 8-week horizon, 3 folds per group
    let config = BacktestConfig::new(8, 3).unwrap();
    let results = rolling_backtest(&panel, &models, &config).unwrap();

    // 2 groups x 3 models x 3 folds
    assert_eq!(results.len(), 18);
    for row in &results {
        assert!(row.metrics.wmape.is_finite());
        assert!(row.metrics.wmape >= 0.0);
        assert!(row.fold < 3);
    }

    // 4. Per-group winners: exactly one per group
    let best = select_best_model_per_group(&results);
    assert_eq!(best.len(), 2);
    for winner in &best {
        assert!(models.iter().any(|m| m.name() == winner.model));
    }

    // 5. Leaderboard covers all models with ranks from 1
    let leaderboard = create_leaderboard(&results);
    assert_eq!(leaderboard.len(), 3);
    let ranks: Vec<usize> = leaderboard.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(leaderboard.iter().map(|e| e.count).sum::<usize>(), 18);
    for pair in leaderboard.windows(2) {
        assert!(pair[0].wmape.mean <= pair[1].wmape.mean);
    }

    // 6. Overall winner agrees with the top of the leaderboard
    assert_eq!(
        select_best_model(&results).as_deref(),
        Some(leaderboard[0].model.as_str())
    );
}

#[test]
fn test_settings_round_trip_and_quick_mode() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", r#"{"horizon": 6, "quick_mode": true}"#).unwrap();

    let settings = Settings::from_json_file(file.path()).unwrap();
    assert_eq!(settings.horizon, 6);
    assert_eq!(settings.folds, 4);
    assert!(settings.quick_mode);

    // Quick mode shortens the protocol
    assert_eq!(settings.effective_horizon(), settings.quick_horizon);
    assert_eq!(settings.effective_folds(), settings.quick_folds);

    let config = settings.backtest_config().unwrap();
    assert_eq!(config.horizon, 4);
    assert_eq!(config.folds, 2);
    assert_eq!(config.seasonal_period, 52);

    let defaults = Settings::default();
    assert_eq!(defaults.effective_horizon(), 12);
    assert_eq!(defaults.test_fraction, 0.2);
}
