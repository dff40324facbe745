use demand_forecast::models::ets::EtsForecaster;
use demand_forecast::models::gradient_boosting::GradientBoostedTreesForecaster;
use demand_forecast::models::seasonal_regression::SeasonalRegressionForecaster;
use demand_forecast::{
    create_leaderboard, rolling_backtest, select_best_model_per_group, single_split_backtest,
    BacktestConfig, Forecaster, PanelSchema, SalesPanel, Settings,
};
use polars::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Demand Forecast: Backtest and Model Selection Example");
    println!("=====================================================\n");

    // Build a synthetic weekly sales panel: 3 SKUs x 1 region, 156 weeks
    println!("Creating sample panel...");
    let panel = create_sample_panel()?;
    println!(
        "Sample panel created: {} rows, {} groups, exogenous columns {:?}\n",
        panel.n_rows(),
        panel.groups().len(),
        panel.exog_cols()
    );

    // Candidate models, one per family
    let models: Vec<Box<dyn Forecaster>> = vec![
        Box::new(EtsForecaster::weekly()),
        Box::new(SeasonalRegressionForecaster::weekly()),
        Box::new(GradientBoostedTreesForecaster::default_params()),
    ];

    // Full rolling protocol
    let settings = Settings::default();
    let config = settings.backtest_config()?;
    println!(
        "Running rolling backtest (horizon={}, folds={})...",
        config.horizon, config.folds
    );
    let results = rolling_backtest(&panel, &models, &config)?;
    println!("Backtest produced {} result rows\n", results.len());

    // Leaderboard across all groups and folds
    println!("Model leaderboard (mean WMAPE ascending):");
    for entry in create_leaderboard(&results) {
        println!(
            "  #{} {:<22} wmape={:.4} (+/-{:.4})  smape={:.4}  bias={:+.3}  n={}",
            entry.rank,
            entry.model,
            entry.wmape.mean,
            entry.wmape.std,
            entry.smape.mean,
            entry.bias.mean,
            entry.count
        );
    }

    // Winner per group
    println!("\nBest model per group:");
    for winner in select_best_model_per_group(&results) {
        println!(
            "  {:<12} -> {:<22} wmape={:.4}",
            winner.group.to_string(),
            winner.model,
            winner.metrics.wmape
        );
    }

    // Quick single-split pass for comparison
    println!("\nRunning single-split backtest (quick approximation)...");
    let quick = single_split_backtest(
        &panel,
        &models,
        &BacktestConfig::new(settings.horizon, settings.folds)?,
        settings.test_fraction,
        settings.min_test_rows,
    )?;
    println!("Single-split produced {} result rows", quick.len());

    println!("\nDone.");
    Ok(())
}

/// Three SKUs with different seasonal strength, trend and promo lift.
fn create_sample_panel() -> Result<SalesPanel, Box<dyn std::error::Error>> {
    let shapes = [
        ("SKU-1", 60.0, 0.15, 12.0, 8.0),
        ("SKU-2", 140.0, -0.05, 25.0, 3.0),
        ("SKU-3", 25.0, 0.30, 4.0, 12.0),
    ];

    let mut skus: Vec<String> = Vec::new();
    let mut regions: Vec<String> = Vec::new();
    let mut dates: Vec<i64> = Vec::new();
    let mut units: Vec<f64> = Vec::new();
    let mut promo: Vec<f64> = Vec::new();
    let mut weekofyear: Vec<f64> = Vec::new();

    for (sku, base, trend, wave, lift) in shapes {
        for t in 0..156i64 {
            let on_promo = if (t + sku.len() as i64) % 11 == 0 { 1.0 } else { 0.0 };
            let season = wave * (2.0 * std::f64::consts::PI * t as f64 / 52.0).sin();
            skus.push(sku.to_string());
            regions.push("NORTH".to_string());
            dates.push(t);
            units.push((base + trend * t as f64 + season + lift * on_promo).max(0.0));
            promo.push(on_promo);
            weekofyear.push((t % 52 + 1) as f64);
        }
    }

    let df = DataFrame::new(vec![
        Series::new("sku_id", skus),
        Series::new("region_id", regions),
        Series::new("date", dates),
        Series::new("units", units),
        Series::new("promo_flag", promo),
        Series::new("weekofyear", weekofyear),
    ])?;

    Ok(SalesPanel::new(df, PanelSchema::weekly_sales())?)
}
