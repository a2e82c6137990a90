//! Derived-column transforms
//!
//! Each transform reads a table and returns a new one; the input is never
//! modified.

use crate::data::{ColumnRole, Table};
use crate::error::{NotebookError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A single derived-column step, as written in chapter configs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Transform {
    /// Rescale to `[0, 1]`; an empty list means every numeric column
    NormalizeMinMax {
        #[serde(default)]
        columns: Vec<String>,
    },
    /// Z-score with the sample standard deviation; empty means every numeric column
    Standardize {
        #[serde(default)]
        columns: Vec<String>,
    },
    /// Add `<column>2` holding the squared values
    Square { column: String },
    /// Add a 1/0 column: 1 where `column >= threshold`
    Indicator {
        column: String,
        threshold: f64,
        name: String,
    },
    /// Add a 1/0 column: 1 where the categorical `column` equals `level`
    LevelIndicator {
        column: String,
        level: String,
        name: String,
    },
    /// Add the product of two numeric columns
    Product {
        left: String,
        right: String,
        name: String,
    },
    /// Replace labels of a categorical column
    Recode {
        column: String,
        mapping: BTreeMap<String, String>,
    },
    /// Map counts to "Yes" (> 0) or "No"
    BinarizeCounts { columns: Vec<String> },
    /// Treat a column as categorical
    AsCategorical { column: String },
    /// Treat a column as a row identifier
    AsIdentifier { column: String },
    Drop { column: String },
    Rename { from: String, to: String },
}

impl Transform {
    pub fn apply(&self, table: &Table) -> Result<Table> {
        debug!(transform = ?self, "applying transform");
        match self {
            Transform::NormalizeMinMax { columns } => {
                let mut out = table.clone();
                for column in numeric_targets(table, columns) {
                    out = normalize_min_max(&out, &column)?;
                }
                Ok(out)
            }
            Transform::Standardize { columns } => {
                let mut out = table.clone();
                for column in numeric_targets(table, columns) {
                    out = standardize(&out, &column)?;
                }
                Ok(out)
            }
            Transform::Square { column } => square(table, column),
            Transform::Indicator { column, threshold, name } => {
                indicator(table, column, *threshold, name)
            }
            Transform::LevelIndicator { column, level, name } => {
                level_indicator(table, column, level, name)
            }
            Transform::Product { left, right, name } => product(table, left, right, name),
            Transform::Recode { column, mapping } => recode(table, column, mapping),
            Transform::BinarizeCounts { columns } => {
                let mut out = table.clone();
                for column in columns {
                    out = binarize_counts(&out, column)?;
                }
                Ok(out)
            }
            Transform::AsCategorical { column } => table.with_role(column, ColumnRole::Categorical),
            Transform::AsIdentifier { column } => table.with_role(column, ColumnRole::Identifier),
            Transform::Drop { column } => table.drop(column),
            Transform::Rename { from, to } => table.rename(from, to),
        }
    }
}

/// Apply transforms in order
pub fn apply_all(table: &Table, transforms: &[Transform]) -> Result<Table> {
    transforms.iter().try_fold(table.clone(), |acc, t| t.apply(&acc))
}

fn numeric_targets(table: &Table, columns: &[String]) -> Vec<String> {
    if columns.is_empty() {
        table.columns_with_role(ColumnRole::Numeric)
    } else {
        columns.to_vec()
    }
}

fn map_numeric<F>(table: &Table, column: &str, name: &str, f: F) -> Result<Table>
where
    F: Fn(f64) -> f64,
{
    let values = table
        .numeric_opt(column)?
        .into_iter()
        .map(|v| v.map(&f))
        .collect();
    table.with_numeric_column(name, values)
}

/// `(x - min) / (max - min)`; the minimum maps to exactly 0 and the maximum
/// to exactly 1. A constant column maps to 0.
pub fn normalize_min_max(table: &Table, column: &str) -> Result<Table> {
    let present: Vec<f64> = table.numeric_opt(column)?.into_iter().flatten().collect();
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    map_numeric(table, column, column, |v| {
        if range > 0.0 {
            (v - min) / range
        } else {
            0.0
        }
    })
}

/// `(x - mean) / sd` with the n - 1 denominator
pub fn standardize(table: &Table, column: &str) -> Result<Table> {
    let present: Vec<f64> = table.numeric_opt(column)?.into_iter().flatten().collect();
    if present.len() < 2 {
        return Err(NotebookError::DataFormat(format!(
            "cannot standardize '{}' with fewer than two values",
            column
        )));
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let sd = var.sqrt();
    map_numeric(table, column, column, |v| {
        if sd > 0.0 {
            (v - mean) / sd
        } else {
            0.0
        }
    })
}

pub fn square(table: &Table, column: &str) -> Result<Table> {
    map_numeric(table, column, &format!("{}2", column), |v| v * v)
}

pub fn indicator(table: &Table, column: &str, threshold: f64, name: &str) -> Result<Table> {
    map_numeric(table, column, name, |v| if v >= threshold { 1.0 } else { 0.0 })
}

pub fn level_indicator(table: &Table, column: &str, level: &str, name: &str) -> Result<Table> {
    let values = table
        .labels_opt(column)?
        .into_iter()
        .map(|v| v.map(|s| if s == level { 1.0 } else { 0.0 }))
        .collect();
    table.with_numeric_column(name, values)
}

pub fn product(table: &Table, left: &str, right: &str, name: &str) -> Result<Table> {
    let values = table
        .numeric_opt(left)?
        .into_iter()
        .zip(table.numeric_opt(right)?)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some(a * b),
            _ => None,
        })
        .collect();
    table.with_numeric_column(name, values)
}

/// Replace labels found in `mapping`; other labels pass through unchanged.
pub fn recode(table: &Table, column: &str, mapping: &BTreeMap<String, String>) -> Result<Table> {
    let values = table
        .labels_opt(column)?
        .into_iter()
        .map(|v| v.map(|s| mapping.get(&s).cloned().unwrap_or(s)))
        .collect();
    table.with_categorical_column(column, values)
}

pub fn binarize_counts(table: &Table, column: &str) -> Result<Table> {
    let values = table
        .numeric_opt(column)?
        .into_iter()
        .map(|v| v.map(|c| if c > 0.0 { "Yes".to_string() } else { "No".to_string() }))
        .collect();
    table.with_categorical_column(column, values)
}
