//! In-memory table with semantic column roles

use crate::error::{NotebookError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Continuous or integer-valued measurement, stored as Float64
    Numeric,
    /// Label or factor, stored as String
    Categorical,
    /// Row identifier, never used as a feature
    Identifier,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Numeric => write!(f, "numeric"),
            ColumnRole::Categorical => write!(f, "categorical"),
            ColumnRole::Identifier => write!(f, "identifier"),
        }
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Label(String),
    Missing,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", format_level(*v)),
            Value::Label(s) => write!(f, "{}", s),
            Value::Missing => write!(f, "NA"),
        }
    }
}

/// One row of a table, in column order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Render a numeric level without a trailing `.0` for whole numbers.
pub fn format_level(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Ordered rows over a fixed column set.
///
/// Numeric columns are stored as `Float64`, categorical and identifier columns
/// keep whatever dtype they were loaded with (categoricals are always `String`).
/// Every operation that changes columns returns a new table.
#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
    roles: Vec<ColumnRole>,
}

impl Table {
    /// Wrap a data frame, coercing dtypes to roles.
    ///
    /// Integer and float columns become numeric, everything else becomes a
    /// categorical string column.
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(frame.width());
        let mut roles = Vec::with_capacity(frame.width());

        for column in frame.get_columns() {
            let series = column.as_materialized_series();
            let (coerced, role) = match series.dtype() {
                DataType::String => (series.clone(), ColumnRole::Categorical),
                DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
                DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
                DataType::Float32 | DataType::Float64 => {
                    (series.cast(&DataType::Float64)?, ColumnRole::Numeric)
                }
                _ => (series.cast(&DataType::String)?, ColumnRole::Categorical),
            };
            columns.push(coerced.into_column());
            roles.push(role);
        }

        Ok(Self {
            frame: DataFrame::new(columns)?,
            roles,
        })
    }

    /// Underlying data frame
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn n_cols(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn role(&self, name: &str) -> Option<ColumnRole> {
        self.position(name).map(|idx| self.roles[idx])
    }

    /// Columns and their roles, in table order
    pub fn schema(&self) -> Vec<(String, ColumnRole)> {
        self.column_names().into_iter().zip(self.roles.iter().copied()).collect()
    }

    /// Names of all columns with the given role
    pub fn columns_with_role(&self, role: ColumnRole) -> Vec<String> {
        self.schema()
            .into_iter()
            .filter(|(_, r)| *r == role)
            .map(|(name, _)| name)
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.frame
            .get_column_names()
            .iter()
            .position(|col| col.as_str() == name)
    }

    fn series(&self, name: &str) -> Result<&Series> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| NotebookError::column_not_found(name))?;
        Ok(column.as_materialized_series())
    }

    /// Numeric column values, `None` where missing
    pub fn numeric_opt(&self, name: &str) -> Result<Vec<Option<f64>>> {
        match self.role(name) {
            Some(ColumnRole::Numeric) => {}
            Some(role) => {
                return Err(NotebookError::DataFormat(format!(
                    "column '{}' is {}, not numeric",
                    name, role
                )))
            }
            None => return Err(NotebookError::column_not_found(name)),
        }
        let series = self.series(name)?;
        Ok(series.f64()?.into_iter().collect())
    }

    /// Numeric column values; fails if any value is missing
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>> {
        self.numeric_opt(name)?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| {
                    NotebookError::DataFormat(format!("missing value in '{}' at row {}", name, i))
                })
            })
            .collect()
    }

    /// Column values rendered as labels, `None` where missing.
    ///
    /// Works for every role; numeric values are formatted with [`format_level`].
    pub fn labels_opt(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self.series(name)?;
        match series.dtype() {
            DataType::String => Ok(series
                .str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()),
            DataType::Float64 => Ok(series
                .f64()?
                .into_iter()
                .map(|v| v.map(format_level))
                .collect()),
            _ => {
                let as_str = series.cast(&DataType::String)?;
                let values = as_str
                    .str()?
                    .into_iter()
                    .map(|v| v.map(|s| s.to_string()))
                    .collect();
                Ok(values)
            }
        }
    }

    /// Column values as labels; fails if any value is missing
    pub fn labels(&self, name: &str) -> Result<Vec<String>> {
        self.labels_opt(name)?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| {
                    NotebookError::DataFormat(format!("missing value in '{}' at row {}", name, i))
                })
            })
            .collect()
    }

    /// Distinct non-missing labels of a column, sorted
    pub fn levels(&self, name: &str) -> Result<Vec<String>> {
        let mut levels: Vec<String> = self.labels_opt(name)?.into_iter().flatten().collect();
        levels.sort();
        levels.dedup();
        Ok(levels)
    }

    /// A single cell
    pub fn value(&self, row: usize, name: &str) -> Result<Value> {
        if row >= self.n_rows() {
            return Err(NotebookError::IndexOutOfRange {
                start: row,
                end: row + 1,
                rows: self.n_rows(),
            });
        }
        let role = self.role(name).ok_or_else(|| NotebookError::column_not_found(name))?;
        let value = match role {
            ColumnRole::Numeric => match self.series(name)?.f64()?.get(row) {
                Some(v) => Value::Number(v),
                None => Value::Missing,
            },
            _ => match self.labels_opt(name)?.swap_remove(row) {
                Some(s) => Value::Label(s),
                None => Value::Missing,
            },
        };
        Ok(value)
    }

    /// A full row as a column → value mapping
    pub fn row(&self, idx: usize) -> Result<Row> {
        let cells = self
            .column_names()
            .into_iter()
            .map(|name| {
                let value = self.value(idx, &name)?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Row { cells })
    }

    /// Rows at the given positions, in the given order
    pub fn take(&self, indices: &[usize]) -> Result<Table> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows()) {
            return Err(NotebookError::IndexOutOfRange {
                start: bad,
                end: bad + 1,
                rows: self.n_rows(),
            });
        }
        let idx = IdxCa::from_vec(
            "idx".into(),
            indices.iter().map(|&i| i as IdxSize).collect(),
        );
        Ok(Table {
            frame: self.frame.take(&idx)?,
            roles: self.roles.clone(),
        })
    }

    /// Contiguous rows `[start, end)`
    pub fn slice(&self, start: usize, end: usize) -> Result<Table> {
        if start > end || end > self.n_rows() {
            return Err(NotebookError::IndexOutOfRange {
                start,
                end,
                rows: self.n_rows(),
            });
        }
        Ok(Table {
            frame: self.frame.slice(start as i64, end - start),
            roles: self.roles.clone(),
        })
    }

    /// Keep only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let roles = names
            .iter()
            .map(|name| self.role(name).ok_or_else(|| NotebookError::column_not_found(name)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            frame: self.frame.select(names.iter().copied())?,
            roles,
        })
    }

    /// Remove a column
    pub fn drop(&self, name: &str) -> Result<Table> {
        let idx = self.position(name).ok_or_else(|| NotebookError::column_not_found(name))?;
        let mut roles = self.roles.clone();
        roles.remove(idx);
        Ok(Table {
            frame: self.frame.drop(name)?,
            roles,
        })
    }

    /// Rename a column, keeping its role
    pub fn rename(&self, from: &str, to: &str) -> Result<Table> {
        if !self.has_column(from) {
            return Err(NotebookError::column_not_found(from));
        }
        if from != to && self.has_column(to) {
            return Err(NotebookError::DataFormat(format!("column '{}' already exists", to)));
        }
        let mut frame = self.frame.clone();
        frame.rename(from, to.into())?;
        Ok(Table {
            frame,
            roles: self.roles.clone(),
        })
    }

    /// Add or replace a numeric column
    pub fn with_numeric_column(&self, name: &str, values: Vec<Option<f64>>) -> Result<Table> {
        self.check_length(name, values.len())?;
        self.with_series(Series::new(name.into(), values), ColumnRole::Numeric)
    }

    /// Add or replace a categorical column
    pub fn with_categorical_column(&self, name: &str, values: Vec<Option<String>>) -> Result<Table> {
        self.check_length(name, values.len())?;
        self.with_series(Series::new(name.into(), values), ColumnRole::Categorical)
    }

    /// Change the declared role of a column, converting its storage.
    pub fn with_role(&self, name: &str, role: ColumnRole) -> Result<Table> {
        let current = self.role(name).ok_or_else(|| NotebookError::column_not_found(name))?;
        if current == role {
            return Ok(self.clone());
        }
        match role {
            ColumnRole::Categorical => {
                let labels = self.labels_opt(name)?;
                self.with_categorical_column(name, labels)
            }
            ColumnRole::Numeric => {
                let parsed = self
                    .labels_opt(name)?
                    .into_iter()
                    .map(|v| match v {
                        Some(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                            NotebookError::DataFormat(format!(
                                "value '{}' in '{}' is not numeric",
                                s, name
                            ))
                        }),
                        None => Ok(None),
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.with_numeric_column(name, parsed)
            }
            ColumnRole::Identifier => {
                let idx = self.position(name).ok_or_else(|| NotebookError::column_not_found(name))?;
                let mut table = self.clone();
                table.roles[idx] = ColumnRole::Identifier;
                Ok(table)
            }
        }
    }

    /// Stack another table with the same schema underneath this one
    pub fn vstack(&self, other: &Table) -> Result<Table> {
        if self.schema() != other.schema() {
            return Err(NotebookError::DataFormat(
                "cannot stack tables with different schemas".to_string(),
            ));
        }
        Ok(Table {
            frame: self.frame.vstack(&other.frame)?,
            roles: self.roles.clone(),
        })
    }

    fn check_length(&self, name: &str, len: usize) -> Result<()> {
        if self.n_cols() > 0 && len != self.n_rows() {
            return Err(NotebookError::DataFormat(format!(
                "column '{}' has {} values, table has {} rows",
                name,
                len,
                self.n_rows()
            )));
        }
        Ok(())
    }

    fn with_series(&self, series: Series, role: ColumnRole) -> Result<Table> {
        let name = series.name().to_string();
        let mut frame = self.frame.clone();
        let mut roles = self.roles.clone();
        frame.with_column(series)?;
        match self.position(&name) {
            Some(idx) => roles[idx] = role,
            None => roles.push(role),
        }
        Ok(Table { frame, roles })
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frame)
    }
}
