//! Table to design-matrix encoding
//!
//! Numeric columns pass through. Categorical columns are dummy coded against
//! their first (sorted) level, with the level set frozen at fit time.
//! Identifier columns and the target never become features.

use crate::data::{ColumnRole, Table};
use crate::error::{NotebookError, Result};
use ndarray::Array2;
use smartcore::linalg::basic::matrix::DenseMatrix;

#[derive(Debug, Clone, PartialEq)]
enum FeatureColumn {
    Numeric { name: String },
    Dummy { name: String, levels: Vec<String> },
}

impl FeatureColumn {
    fn name(&self) -> &str {
        match self {
            FeatureColumn::Numeric { name } | FeatureColumn::Dummy { name, .. } => name,
        }
    }

    fn width(&self) -> usize {
        match self {
            FeatureColumn::Numeric { .. } => 1,
            FeatureColumn::Dummy { levels, .. } => levels.len().saturating_sub(1),
        }
    }
}

/// Column layout learned from a training table
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    columns: Vec<FeatureColumn>,
}

impl FeatureEncoder {
    /// Learn the feature layout from every non-identifier column except `target`
    pub fn fit(table: &Table, target: &str) -> Result<Self> {
        let mut columns = Vec::new();
        for (name, role) in table.schema() {
            if name == target {
                continue;
            }
            match role {
                ColumnRole::Numeric => columns.push(FeatureColumn::Numeric { name }),
                ColumnRole::Categorical => {
                    let levels = table.levels(&name)?;
                    columns.push(FeatureColumn::Dummy { name, levels });
                }
                ColumnRole::Identifier => {}
            }
        }
        if columns.is_empty() {
            return Err(NotebookError::Fit(format!(
                "no feature columns besides target '{}'",
                target
            )));
        }
        Ok(Self { columns })
    }

    /// Source columns the encoder reads
    pub fn source_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Names of the encoded matrix columns (`<column><level>` for dummies)
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for column in &self.columns {
            match column {
                FeatureColumn::Numeric { name } => names.push(name.clone()),
                FeatureColumn::Dummy { name, levels } => {
                    names.extend(levels.iter().skip(1).map(|l| format!("{}{}", name, l)))
                }
            }
        }
        names
    }

    pub fn n_features(&self) -> usize {
        self.columns.iter().map(|c| c.width()).sum()
    }

    /// Encode a table into a row-major matrix.
    ///
    /// Fails on a missing source column, a missing value, a role mismatch or a
    /// categorical level not seen at fit time.
    pub fn encode(&self, table: &Table) -> Result<Array2<f64>> {
        let n_rows = table.n_rows();
        let mut matrix = Array2::zeros((n_rows, self.n_features()));
        let mut offset = 0;

        for column in &self.columns {
            let name = column.name();
            if !table.has_column(name) {
                return Err(NotebookError::Predict(format!(
                    "feature column '{}' is missing",
                    name
                )));
            }
            match column {
                FeatureColumn::Numeric { .. } => {
                    let values = table
                        .numeric_opt(name)
                        .map_err(|e| NotebookError::Predict(e.to_string()))?;
                    for (i, v) in values.into_iter().enumerate() {
                        matrix[[i, offset]] = v.ok_or_else(|| missing(name, i))?;
                    }
                }
                FeatureColumn::Dummy { levels, .. } => {
                    if table.role(name) != Some(ColumnRole::Categorical) {
                        return Err(NotebookError::Predict(format!(
                            "feature column '{}' must be categorical",
                            name
                        )));
                    }
                    for (i, v) in table.labels_opt(name)?.into_iter().enumerate() {
                        let label = v.ok_or_else(|| missing(name, i))?;
                        let pos = levels.iter().position(|l| *l == label).ok_or_else(|| {
                            NotebookError::Predict(format!(
                                "unseen level '{}' in column '{}'",
                                label, name
                            ))
                        })?;
                        if pos > 0 {
                            matrix[[i, offset + pos - 1]] = 1.0;
                        }
                    }
                }
            }
            offset += column.width();
        }
        Ok(matrix)
    }
}

/// Copy an encoded matrix into the layout the learner library expects
pub(crate) fn to_dense(x: &Array2<f64>) -> Result<DenseMatrix<f64>> {
    let rows: Vec<Vec<f64>> = x.rows().into_iter().map(|r| r.to_vec()).collect();
    DenseMatrix::from_2d_vec(&rows).map_err(|e| NotebookError::DataFormat(e.to_string()))
}

fn missing(column: &str, row: usize) -> NotebookError {
    NotebookError::Predict(format!("missing value in '{}' at row {}", column, row))
}

/// Class labels of a categorical target, as sorted levels plus integer codes
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit(labels: &[String]) -> Self {
        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, labels: &[String]) -> Result<Vec<i32>> {
        labels
            .iter()
            .map(|l| {
                self.classes
                    .iter()
                    .position(|c| c == l)
                    .map(|p| p as i32)
                    .ok_or_else(|| NotebookError::Fit(format!("unknown class '{}'", l)))
            })
            .collect()
    }

    pub fn decode(&self, code: i32) -> Result<String> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .cloned()
            .ok_or_else(|| NotebookError::Predict(format!("class code {} out of range", code)))
    }
}
