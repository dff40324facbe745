use assert_approx_eq::assert_approx_eq;
use demand_forecast::backtest::ModelResult;
use demand_forecast::data::GroupKey;
use demand_forecast::metrics::ForecastMetrics;
use demand_forecast::select::{
    create_leaderboard, select_best_model, select_best_model_per_group,
};
use pretty_assertions::assert_eq;

fn row(group: &str, model: &str, fold: usize, wmape: f64) -> ModelResult {
    ModelResult {
        group: GroupKey(vec![group.to_string()]),
        model: model.to_string(),
        fold,
        metrics: ForecastMetrics {
            wmape,
            smape: wmape * 1.5,
            bias: 0.1,
            mase: wmape * 10.0,
        },
    }
}

#[test]
fn test_best_model_per_group_picks_the_lowest_wmape() {
    let results = vec![
        row("A", "ETS", 0, 0.10),
        row("A", "SeasonalRegression", 0, 0.05),
    ];

    let best = select_best_model_per_group(&results);

    assert_eq!(best.len(), 1);
    assert_eq!(best[0].group.to_string(), "A");
    assert_eq!(best[0].model, "SeasonalRegression");
    assert_approx_eq!(best[0].metrics.wmape, 0.05, 1e-12);
}

#[test]
fn test_best_model_per_group_aggregates_folds_before_selecting() {
    // ETS is lucky on one fold but erratic; the regression is consistently
    // better on the mean and must win
    let results = vec![
        row("A", "ETS", 0, 0.01),
        row("A", "ETS", 1, 0.50),
        row("A", "SeasonalRegression", 0, 0.10),
        row("A", "SeasonalRegression", 1, 0.10),
    ];

    let best = select_best_model_per_group(&results);

    assert_eq!(best.len(), 1);
    assert_eq!(best[0].model, "SeasonalRegression");
    assert_approx_eq!(best[0].metrics.wmape, 0.10, 1e-12);
}

#[test]
fn test_best_model_per_group_emits_one_entry_per_group() {
    let results = vec![
        row("A", "ETS", 0, 0.10),
        row("B", "ETS", 0, 0.20),
        row("B", "SeasonalRegression", 0, 0.30),
        row("C", "SeasonalRegression", 0, 0.15),
    ];

    let best = select_best_model_per_group(&results);

    let groups: Vec<String> = best.iter().map(|b| b.group.to_string()).collect();
    assert_eq!(groups, vec!["A", "B", "C"]);
    assert_eq!(best[1].model, "ETS");
}

#[test]
fn test_leaderboard_ranks_ascending_by_mean_wmape() {
    let results = vec![
        row("A", "Y", 0, 0.08),
        row("A", "X", 0, 0.02),
        row("B", "Y", 0, 0.08),
        row("B", "X", 0, 0.02),
    ];

    let leaderboard = create_leaderboard(&results);

    assert_eq!(leaderboard.len(), 2);
    assert_eq!(leaderboard[0].model, "X");
    assert_eq!(leaderboard[0].rank, 1);
    assert_approx_eq!(leaderboard[0].wmape.mean, 0.02, 1e-12);
    assert_eq!(leaderboard[1].model, "Y");
    assert_eq!(leaderboard[1].rank, 2);
    assert_eq!(leaderboard[0].count, 2);
}

#[test]
fn test_leaderboard_excludes_nan_mase_from_aggregates() {
    let mut short = row("A", "ETS", 0, 0.10);
    short.metrics.mase = f64::NAN;
    let mut long = row("A", "ETS", 1, 0.20);
    long.metrics.mase = 1.0;

    let leaderboard = create_leaderboard(&[short, long]);

    assert_eq!(leaderboard.len(), 1);
    assert_eq!(leaderboard[0].count, 2);
    assert_approx_eq!(leaderboard[0].mase.mean, 1.0, 1e-12);
    // But wmape aggregates over both rows
    assert_approx_eq!(leaderboard[0].wmape.mean, 0.15, 1e-12);
}

#[test]
fn test_leaderboard_std_is_undefined_for_a_single_row() {
    let leaderboard = create_leaderboard(&[row("A", "ETS", 0, 0.10)]);

    assert_eq!(leaderboard[0].count, 1);
    assert!(leaderboard[0].wmape.std.is_nan());
}

#[test]
fn test_leaderboard_ties_keep_first_appearance_order() {
    let results = vec![
        row("A", "First", 0, 0.10),
        row("A", "Second", 0, 0.10),
    ];

    let leaderboard = create_leaderboard(&results);

    assert_eq!(leaderboard[0].model, "First");
    assert_eq!(leaderboard[0].rank, 1);
    assert_eq!(leaderboard[1].model, "Second");
    assert_eq!(leaderboard[1].rank, 2);
}

#[test]
fn test_empty_results_produce_empty_outputs() {
    let results: Vec<ModelResult> = Vec::new();

    assert!(select_best_model_per_group(&results).is_empty());
    assert!(create_leaderboard(&results).is_empty());
    assert_eq!(select_best_model(&results), None);
}

#[test]
fn test_overall_winner_follows_the_leaderboard() {
    let results = vec![
        row("A", "Y", 0, 0.08),
        row("A", "X", 0, 0.02),
    ];

    assert_eq!(select_best_model(&results), Some("X".to_string()));
}
