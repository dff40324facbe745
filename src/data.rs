//! Panel data handling for grouped demand series
//!
//! The backtest engine consumes a long-format table: one row per
//! (group key columns..., date, target, zero or more numeric exogenous
//! columns), sorted ascending by date within each group. Gap filling and
//! schema normalization happen upstream; this module only validates the
//! ordering invariant and extracts plain numeric series per group.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Column naming for a sales panel.
#[derive(Debug, Clone)]
pub struct PanelSchema {
    /// Columns that jointly identify a series (e.g. sku_id, region_id)
    pub group_cols: Vec<String>,
    /// Date column, strictly increasing within each group
    pub date_col: String,
    /// Target column (units sold)
    pub target_col: String,
}

impl PanelSchema {
    /// Create a schema with explicit column names.
    pub fn new(group_cols: Vec<String>, date_col: &str, target_col: &str) -> Self {
        Self {
            group_cols,
            date_col: date_col.to_string(),
            target_col: target_col.to_string(),
        }
    }

    /// The conventional weekly sales layout: sku_id x region_id, date, units.
    pub fn weekly_sales() -> Self {
        Self::new(
            vec!["sku_id".to_string(), "region_id".to_string()],
            "date",
            "units",
        )
    }
}

/// Identifies one series within a panel, one part per group column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey(pub Vec<String>);

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Row-major numeric feature matrix with named columns.
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Create a matrix from column names and row-major values.
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        for row in &rows {
            if row.len() != names.len() {
                return Err(ForecastError::ValidationError(format!(
                    "Feature row width ({}) doesn't match column count ({})",
                    row.len(),
                    names.len()
                )));
            }
        }
        Ok(Self { names, rows })
    }

    /// A matrix with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    /// One row of feature values.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    /// Values of one column, gathered across rows.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[j]).collect()
    }

    /// A copy of rows `start..end`, keeping all columns.
    pub fn slice(&self, start: usize, end: usize) -> FeatureMatrix {
        FeatureMatrix {
            names: self.names.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }
}

/// One extracted series: key, ordered timestamps, target and features.
#[derive(Debug, Clone)]
pub struct GroupSeries {
    /// Group identity
    pub key: GroupKey,
    /// Ordinal timestamps (epoch-scaled, used for ordering only)
    pub timestamps: Vec<i64>,
    /// Target values
    pub target: Vec<f64>,
    /// Numeric exogenous features aligned to the target, nulls filled with 0.0
    pub exog: FeatureMatrix,
}

impl GroupSeries {
    /// Number of observations.
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// A validated long-format sales panel.
#[derive(Debug, Clone)]
pub struct SalesPanel {
    df: DataFrame,
    schema: PanelSchema,
    exog_cols: Vec<String>,
    groups: Vec<GroupSeries>,
}

impl SalesPanel {
    /// Load a panel from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P, schema: PanelSchema) -> Result<Self> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::new(df, schema)
    }

    /// Wrap an existing DataFrame, validating the schema and ordering.
    pub fn new(df: DataFrame, schema: PanelSchema) -> Result<Self> {
        for col in schema
            .group_cols
            .iter()
            .chain([&schema.date_col, &schema.target_col])
        {
            if df.column(col).is_err() {
                return Err(ForecastError::DataError(format!(
                    "Required column '{}' not found in panel",
                    col
                )));
            }
        }
        if schema.group_cols.is_empty() {
            return Err(ForecastError::DataError(
                "Panel schema needs at least one group column".to_string(),
            ));
        }

        let exog_cols = detect_exog_columns(&df, &schema);
        let groups = extract_groups(&df, &schema, &exog_cols)?;

        Ok(Self {
            df,
            schema,
            exog_cols,
            groups,
        })
    }

    /// The underlying DataFrame.
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// The panel's column naming.
    pub fn schema(&self) -> &PanelSchema {
        &self.schema
    }

    /// Names of the numeric exogenous columns.
    pub fn exog_cols(&self) -> &[String] {
        &self.exog_cols
    }

    /// Extracted series, in order of first appearance in the panel.
    pub fn groups(&self) -> &[GroupSeries] {
        &self.groups
    }

    /// Total number of rows across all groups.
    pub fn n_rows(&self) -> usize {
        self.df.height()
    }

    /// Whether the panel has no rows.
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}

/// Numeric columns other than the target; group keys and date are excluded
/// whatever their dtype, non-numeric columns are dropped.
fn detect_exog_columns(df: &DataFrame, schema: &PanelSchema) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|s| {
            let name = s.name();
            name != schema.target_col
                && name != schema.date_col
                && !schema.group_cols.iter().any(|g| g == name)
                && s.dtype().is_numeric()
        })
        .map(|s| s.name().to_string())
        .collect()
}

fn extract_groups(
    df: &DataFrame,
    schema: &PanelSchema,
    exog_cols: &[String],
) -> Result<Vec<GroupSeries>> {
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let key_parts: Vec<Vec<String>> = schema
        .group_cols
        .iter()
        .map(|c| column_as_key_strings(df, c))
        .collect::<Result<_>>()?;
    let timestamps = column_as_ordinal(df, &schema.date_col)?;
    let target = column_as_f64(df, &schema.target_col)?;
    let exog_values: Vec<Vec<f64>> = exog_cols
        .iter()
        .map(|c| column_as_f64_filled(df, c))
        .collect::<Result<_>>()?;

    // Bucket row indices per key, keeping first-appearance order.
    let mut order: Vec<GroupKey> = Vec::new();
    let mut buckets: HashMap<GroupKey, Vec<usize>> = HashMap::new();
    for i in 0..df.height() {
        let key = GroupKey(key_parts.iter().map(|col| col[i].clone()).collect());
        let indices = buckets.entry(key.clone()).or_insert_with(Vec::new);
        if indices.is_empty() {
            order.push(key);
        }
        indices.push(i);
    }

    let mut groups = Vec::with_capacity(order.len());
    for key in order {
        let indices = &buckets[&key];
        let ts: Vec<i64> = indices.iter().map(|&i| timestamps[i]).collect();
        for w in ts.windows(2) {
            if w[1] <= w[0] {
                return Err(ForecastError::DataError(format!(
                    "Timestamps for group '{}' are not strictly increasing",
                    key
                )));
            }
        }
        let y: Vec<f64> = indices.iter().map(|&i| target[i]).collect();
        let rows: Vec<Vec<f64>> = indices
            .iter()
            .map(|&i| exog_values.iter().map(|col| col[i]).collect())
            .collect();
        let exog = FeatureMatrix::new(exog_cols.to_vec(), rows)?;

        groups.push(GroupSeries {
            key,
            timestamps: ts,
            target: y,
            exog,
        });
    }

    Ok(groups)
}

/// Read a group key column as strings; string and integer dtypes supported.
fn column_as_key_strings(df: &DataFrame, column_name: &str) -> Result<Vec<String>> {
    let col = df.column(column_name)?;
    let null_err = || {
        ForecastError::DataError(format!("Null value in group column '{}'", column_name))
    };

    match col.dtype() {
        DataType::Utf8 => col
            .utf8()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|s| s.to_string()).ok_or_else(null_err))
            .collect(),
        DataType::Int64 => col
            .i64()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x.to_string()).ok_or_else(null_err))
            .collect(),
        DataType::Int32 => col
            .i32()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x.to_string()).ok_or_else(null_err))
            .collect(),
        DataType::UInt64 => col
            .u64()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x.to_string()).ok_or_else(null_err))
            .collect(),
        DataType::UInt32 => col
            .u32()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x.to_string()).ok_or_else(null_err))
            .collect(),
        other => Err(ForecastError::DataError(format!(
            "Group column '{}' has unsupported dtype {:?}",
            column_name, other
        ))),
    }
}

/// Read the date column as an ordinal: temporal dtypes use their epoch value,
/// integers pass through, strings are parsed as ISO dates.
fn column_as_ordinal(df: &DataFrame, column_name: &str) -> Result<Vec<i64>> {
    let col = df.column(column_name)?;
    let null_err =
        || ForecastError::DataError(format!("Null value in date column '{}'", column_name));

    match col.dtype() {
        DataType::Date => col
            .date()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|d| d as i64).ok_or_else(null_err))
            .collect(),
        DataType::Datetime(_, _) => col
            .datetime()
            .unwrap()
            .into_iter()
            .map(|v| v.ok_or_else(null_err))
            .collect(),
        DataType::Int64 => col
            .i64()
            .unwrap()
            .into_iter()
            .map(|v| v.ok_or_else(null_err))
            .collect(),
        DataType::Int32 => col
            .i32()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x as i64).ok_or_else(null_err))
            .collect(),
        DataType::Utf8 => col
            .utf8()
            .unwrap()
            .into_iter()
            .map(|v| {
                let s = v.ok_or_else(null_err)?;
                let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                    ForecastError::DataError(format!(
                        "Cannot parse date '{}' in column '{}': {}",
                        s, column_name, e
                    ))
                })?;
                Ok(date
                    .signed_duration_since(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
                    .num_days())
            })
            .collect(),
        other => Err(ForecastError::DataError(format!(
            "Date column '{}' has unsupported dtype {:?}",
            column_name, other
        ))),
    }
}

/// Read a numeric column as f64, erroring on nulls.
fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
    let values = column_as_f64_options(df, column_name)?;
    values
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                ForecastError::DataError(format!("Null value in column '{}'", column_name))
            })
        })
        .collect()
}

/// Read a numeric column as f64, filling nulls with 0.0.
fn column_as_f64_filled(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
    let values = column_as_f64_options(df, column_name)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

fn column_as_f64_options(df: &DataFrame, column_name: &str) -> Result<Vec<Option<f64>>> {
    let col = df.column(column_name)?;

    match col.dtype() {
        DataType::Float64 => Ok(col.f64().unwrap().into_iter().collect()),
        DataType::Float32 => Ok(col
            .f32()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x as f64))
            .collect()),
        DataType::Int64 => Ok(col
            .i64()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x as f64))
            .collect()),
        DataType::Int32 => Ok(col
            .i32()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x as f64))
            .collect()),
        DataType::UInt64 => Ok(col
            .u64()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x as f64))
            .collect()),
        DataType::UInt32 => Ok(col
            .u32()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|x| x as f64))
            .collect()),
        _ => Err(ForecastError::DataError(format!(
            "Column '{}' cannot be converted to f64",
            column_name
        ))),
    }
}
