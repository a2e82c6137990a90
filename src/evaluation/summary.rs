//! Descriptive summaries of table columns

use crate::data::Table;
use crate::error::{NotebookError, Result};
use crate::evaluation::regression::pearson;
use ndarray::Array2;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Five-number summary plus mean and sample standard deviation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub mean: f64,
    pub q3: f64,
    pub max: f64,
    pub sd: f64,
}

impl fmt::Display for ColumnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "Min.", "1st Qu.", "Median", "Mean", "3rd Qu.", "Max.", "SD"
        )?;
        writeln!(
            f,
            "{:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            self.min, self.q1, self.median, self.mean, self.q3, self.max, self.sd
        )?;
        if self.missing > 0 {
            writeln!(f, "NA's: {}", self.missing)?;
        }
        Ok(())
    }
}

/// Quantile with linear interpolation between order statistics
/// (`h = (n - 1) p`). `sorted` must be ascending and non-empty.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

pub fn describe(table: &Table, column: &str) -> Result<ColumnSummary> {
    let raw = table.numeric_opt(column)?;
    let missing = raw.iter().filter(|v| v.is_none()).count();
    let mut values: Vec<f64> = raw.into_iter().flatten().collect();
    if values.is_empty() {
        return Err(NotebookError::DataFormat(format!(
            "column '{}' has no values to summarise",
            column
        )));
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sd = if values.len() > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    Ok(ColumnSummary {
        column: column.to_string(),
        count: values.len(),
        missing,
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        mean,
        q3: quantile(&values, 0.75),
        max: values[values.len() - 1],
        sd,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCount {
    pub level: String,
    pub count: usize,
    pub proportion: f64,
}

/// Level counts of any column (missing values as `NA`), in level order
pub fn frequency(table: &Table, column: &str) -> Result<Vec<LevelCount>> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let values = table.labels_opt(column)?;
    let n = values.len().max(1) as f64;
    for v in values {
        *counts.entry(v.unwrap_or_else(|| "NA".to_string())).or_insert(0) += 1;
    }
    Ok(counts
        .into_iter()
        .map(|(level, count)| LevelCount {
            level,
            count,
            proportion: count as f64 / n,
        })
        .collect())
}

/// Two-way count table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub row_name: String,
    pub col_name: String,
    pub row_levels: Vec<String>,
    pub col_levels: Vec<String>,
    /// `counts[row][col]`
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn count(&self, row: &str, col: &str) -> usize {
        let i = self.row_levels.iter().position(|l| l == row);
        let j = self.col_levels.iter().position(|l| l == col);
        match (i, j) {
            (Some(i), Some(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Each row divided by its total
    pub fn row_proportions(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let total = row.iter().sum::<usize>().max(1) as f64;
                row.iter().map(|c| *c as f64 / total).collect()
            })
            .collect()
    }
}

impl fmt::Display for CrossTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .row_levels
            .iter()
            .chain(&self.col_levels)
            .map(|l| l.len())
            .chain([self.row_name.len(), 6])
            .max()
            .unwrap_or(6)
            + 2;
        write!(f, "{:>w$} |", self.row_name, w = width)?;
        for level in &self.col_levels {
            write!(f, " {:>w$}", level, w = width)?;
        }
        writeln!(f)?;
        for (level, row) in self.row_levels.iter().zip(&self.counts) {
            write!(f, "{:>w$} |", level, w = width)?;
            for count in row {
                write!(f, " {:>w$}", count, w = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn crosstab(table: &Table, rows: &str, cols: &str) -> Result<CrossTab> {
    let a = table.labels_opt(rows)?;
    let b = table.labels_opt(cols)?;
    let row_levels = table.levels(rows)?;
    let col_levels = table.levels(cols)?;
    let mut counts = vec![vec![0; col_levels.len()]; row_levels.len()];
    for (x, y) in a.iter().zip(&b) {
        let (Some(x), Some(y)) = (x, y) else { continue };
        let i = row_levels.binary_search(x);
        let j = col_levels.binary_search(y);
        if let (Ok(i), Ok(j)) = (i, j) {
            counts[i][j] += 1;
        }
    }
    Ok(CrossTab {
        row_name: rows.to_string(),
        col_name: cols.to_string(),
        row_levels,
        col_levels,
        counts,
    })
}

/// Pairwise Pearson correlations over complete rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[[i, j]])
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.columns.iter().map(|c| c.len()).max().unwrap_or(0).max(8) + 1;
        write!(f, "{:>w$}", "", w = width)?;
        for c in &self.columns {
            write!(f, "{:>w$}", c, w = width)?;
        }
        writeln!(f)?;
        for (i, c) in self.columns.iter().enumerate() {
            write!(f, "{:>w$}", c, w = width)?;
            for j in 0..self.columns.len() {
                write!(f, "{:>w$.4}", self.values[[i, j]], w = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Correlations between numeric `columns`. Rows with a missing value in any
/// of them are skipped. Zero-variance pairs are `NaN`.
pub fn correlation_matrix(table: &Table, columns: &[&str]) -> Result<CorrelationMatrix> {
    let raw = columns
        .iter()
        .map(|c| table.numeric_opt(c))
        .collect::<Result<Vec<_>>>()?;
    let complete: Vec<usize> = (0..table.n_rows())
        .filter(|&i| raw.iter().all(|col| col[i].is_some()))
        .collect();
    let data: Vec<Vec<f64>> = raw
        .iter()
        .map(|col| complete.iter().filter_map(|&i| col[i]).collect())
        .collect();

    let k = columns.len();
    let mut values = Array2::from_elem((k, k), f64::NAN);
    for i in 0..k {
        for j in i..k {
            let r = if i == j && data[i].len() > 1 {
                Some(1.0)
            } else {
                pearson(&data[i], &data[j])
            };
            let r = r.unwrap_or(f64::NAN);
            values[[i, j]] = r;
            values[[j, i]] = r;
        }
    }
    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}
