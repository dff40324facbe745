//! Model selection and leaderboards from backtest results
//!
//! Turns the raw [`ModelResult`] table into decision artifacts: the winning
//! model per group and an aggregate ranking across all groups. Both
//! functions return empty output for an empty input table; callers must
//! check emptiness before assuming a winner exists.

use crate::backtest::ModelResult;
use crate::data::GroupKey;
use crate::metrics::ForecastMetrics;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Winning model for one group, with its own aggregated metrics.
#[derive(Debug, Clone, Serialize)]
pub struct BestModel {
    /// Group the selection applies to
    pub group: GroupKey,
    /// Winning model name
    pub model: String,
    /// The winner's per-group metric means over its folds
    pub metrics: ForecastMetrics,
}

/// Mean and sample standard deviation of one metric, NaN values excluded.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSummary {
    /// NaN-excluding mean
    pub mean: f64,
    /// NaN-excluding sample standard deviation; NaN with fewer than 2 values
    pub std: f64,
}

/// Aggregate standing of one model across all groups and folds.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    /// Model name
    pub model: String,
    /// WMAPE summary (the primary ranking metric)
    pub wmape: MetricSummary,
    /// SMAPE summary
    pub smape: MetricSummary,
    /// Bias summary
    pub bias: MetricSummary,
    /// MASE summary; undefined folds are excluded
    pub mase: MetricSummary,
    /// Number of result rows behind the aggregates
    pub count: usize,
    /// 1 = best by mean WMAPE
    pub rank: usize,
}

/// `a` is a strictly better (lower) primary metric than `b`; NaN never wins.
fn better(a: f64, b: f64) -> bool {
    !a.is_nan() && (b.is_nan() || a < b)
}

fn nan_mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.iter().mean()
}

fn nan_summary(values: &[f64]) -> MetricSummary {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return MetricSummary {
            mean: f64::NAN,
            std: f64::NAN,
        };
    }
    let std = if finite.len() > 1 {
        finite.iter().std_dev()
    } else {
        f64::NAN
    };
    MetricSummary {
        mean: finite.iter().mean(),
        std,
    }
}

/// Bucket rows by a key, preserving first-appearance order.
fn bucket_by<'a, K, F>(results: &'a [ModelResult], key_fn: F) -> Vec<(K, Vec<&'a ModelResult>)>
where
    K: std::hash::Hash + Eq + Clone,
    F: Fn(&ModelResult) -> K,
{
    let mut order: Vec<K> = Vec::new();
    let mut buckets: HashMap<K, Vec<&ModelResult>> = HashMap::new();
    for row in results {
        let key = key_fn(row);
        let bucket = buckets.entry(key.clone()).or_insert_with(Vec::new);
        if bucket.is_empty() {
            order.push(key);
        }
        bucket.push(row);
    }
    order
        .into_iter()
        .map(|key| {
            let rows = buckets.remove(&key).unwrap_or_default();
            (key, rows)
        })
        .collect()
}

/// Per-model metric means within one set of rows, in first-appearance order.
fn aggregate_by_model(rows: &[&ModelResult]) -> Vec<(String, ForecastMetrics)> {
    let mut order: Vec<&str> = Vec::new();
    let mut per_model: HashMap<&str, Vec<&ForecastMetrics>> = HashMap::new();
    for row in rows {
        let bucket = per_model.entry(row.model.as_str()).or_insert_with(Vec::new);
        if bucket.is_empty() {
            order.push(row.model.as_str());
        }
        bucket.push(&row.metrics);
    }

    order
        .into_iter()
        .map(|model| {
            let metrics = &per_model[model];
            let collect = |f: fn(&ForecastMetrics) -> f64| -> Vec<f64> {
                metrics.iter().map(|m| f(m)).collect()
            };
            (
                model.to_string(),
                ForecastMetrics {
                    wmape: nan_mean(&collect(|m| m.wmape)),
                    smape: nan_mean(&collect(|m| m.smape)),
                    bias: nan_mean(&collect(|m| m.bias)),
                    mase: nan_mean(&collect(|m| m.mase)),
                },
            )
        })
        .collect()
}

/// Pick the winning model per group.
///
/// Metrics are aggregated per model within the group (NaN-excluding mean
/// over folds) before taking the minimum mean WMAPE, so a model that was
/// lucky on a single fold cannot beat one that is consistently better. The
/// reported metrics are the winner's per-group aggregates. Exactly one entry
/// is produced per group that has at least one result row; an empty input
/// yields an empty output.
pub fn select_best_model_per_group(results: &[ModelResult]) -> Vec<BestModel> {
    bucket_by(results, |row| row.group.clone())
        .into_iter()
        .filter_map(|(group, rows)| {
            let aggregated = aggregate_by_model(&rows);
            let winner = aggregated.into_iter().reduce(|best, candidate| {
                if better(candidate.1.wmape, best.1.wmape) {
                    candidate
                } else {
                    best
                }
            });
            winner.map(|(model, metrics)| BestModel {
                group,
                model,
                metrics,
            })
        })
        .collect()
}

/// Aggregate ranking of models across all groups and folds.
///
/// Sorted ascending by mean WMAPE with ranks assigned from 1. The sort is
/// stable: models with equal means keep first-appearance order, and NaN
/// aggregates sort last.
pub fn create_leaderboard(results: &[ModelResult]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = bucket_by(results, |row| row.model.clone())
        .into_iter()
        .map(|(model, rows)| {
            let collect = |f: fn(&ForecastMetrics) -> f64| -> Vec<f64> {
                rows.iter().map(|r| f(&r.metrics)).collect()
            };
            LeaderboardEntry {
                model,
                wmape: nan_summary(&collect(|m| m.wmape)),
                smape: nan_summary(&collect(|m| m.smape)),
                bias: nan_summary(&collect(|m| m.bias)),
                mase: nan_summary(&collect(|m| m.mase)),
                count: rows.len(),
                rank: 0,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        if better(a.wmape.mean, b.wmape.mean) {
            std::cmp::Ordering::Less
        } else if better(b.wmape.mean, a.wmape.mean) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    entries
}

/// Overall winner across the whole result table, by leaderboard rank.
///
/// Returns `None` for an empty table; absence of results is never masked by
/// a default model name.
pub fn select_best_model(results: &[ModelResult]) -> Option<String> {
    create_leaderboard(results).into_iter().next().map(|e| e.model)
}
