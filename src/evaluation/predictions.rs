//! Predicting on evaluation tables and scoring the result

use super::confusion::ConfusionMatrix;
use super::regression::RegressionMetrics;
use crate::data::Table;
use crate::error::{NotebookError, Result};
use crate::training::{FittedModel, Predictions, TaskType};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Predictions aligned with the rows of the evaluated table
#[derive(Debug, Clone)]
pub struct PredictionSet {
    target: String,
    rows: Table,
    predicted: Predictions,
    actual: Option<Predictions>,
}

impl PredictionSet {
    pub fn len(&self) -> usize {
        self.predicted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicted.is_empty()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn predicted(&self) -> &Predictions {
        &self.predicted
    }

    /// Ground truth, when the evaluated table carried the target column
    pub fn actual(&self) -> Option<&Predictions> {
        self.actual.as_ref()
    }

    pub fn predicted_labels(&self) -> Option<&[String]> {
        match &self.predicted {
            Predictions::Labels(v) => Some(v),
            Predictions::Values(_) => None,
        }
    }

    pub fn predicted_values(&self) -> Option<&[f64]> {
        match &self.predicted {
            Predictions::Values(v) => Some(v),
            Predictions::Labels(_) => None,
        }
    }

    /// The evaluated rows with a `predicted_<target>` column appended
    pub fn joined(&self) -> Result<Table> {
        let name = format!("predicted_{}", self.target);
        match &self.predicted {
            Predictions::Labels(v) => self
                .rows
                .with_categorical_column(&name, v.iter().cloned().map(Some).collect()),
            Predictions::Values(v) => self
                .rows
                .with_numeric_column(&name, v.iter().copied().map(Some).collect()),
        }
    }
}

/// Scores for one evaluation table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evaluation {
    Classification {
        confusion: ConfusionMatrix,
        accuracy: f64,
        error_rate: f64,
        kappa: f64,
    },
    Regression(RegressionMetrics),
}

impl Evaluation {
    pub fn confusion(&self) -> Option<&ConfusionMatrix> {
        match self {
            Evaluation::Classification { confusion, .. } => Some(confusion),
            Evaluation::Regression(_) => None,
        }
    }

    pub fn regression(&self) -> Option<&RegressionMetrics> {
        match self {
            Evaluation::Regression(m) => Some(m),
            Evaluation::Classification { .. } => None,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Classification {
                confusion,
                accuracy,
                error_rate,
                kappa,
            } => {
                write!(f, "{}", confusion)?;
                writeln!(f, "accuracy:   {:.4}", accuracy)?;
                writeln!(f, "error rate: {:.4}", error_rate)?;
                writeln!(f, "kappa:      {:.4}", kappa)
            }
            Evaluation::Regression(m) => {
                match m.correlation {
                    Some(r) => writeln!(f, "correlation:         {:.4}", r)?,
                    None => writeln!(f, "correlation:         NA")?,
                }
                writeln!(f, "mean absolute error: {:.4}", m.mean_absolute_error)?;
                write!(f, "{}", m.histogram)
            }
        }
    }
}

pub struct Evaluator;

impl Evaluator {
    /// Predict every row of `table`. Ground truth is attached when the
    /// target column is present.
    pub fn predict(model: &FittedModel, table: &Table) -> Result<PredictionSet> {
        let predicted = model.predict(table)?;
        if predicted.len() != table.n_rows() {
            return Err(NotebookError::Predict(format!(
                "{} predictions for {} rows",
                predicted.len(),
                table.n_rows()
            )));
        }

        let target = model.target();
        let actual = if table.has_column(target) {
            let truth = match model.task() {
                TaskType::Regression => Predictions::Values(
                    table
                        .numeric(target)
                        .map_err(|e| NotebookError::Predict(e.to_string()))?,
                ),
                _ => Predictions::Labels(
                    table
                        .labels(target)
                        .map_err(|e| NotebookError::Predict(e.to_string()))?,
                ),
            };
            Some(truth)
        } else {
            None
        };

        Ok(PredictionSet {
            target: target.to_string(),
            rows: table.clone(),
            predicted,
            actual,
        })
    }

    /// Compare predictions with the table's target column
    pub fn score(predictions: &PredictionSet) -> Result<Evaluation> {
        let actual = predictions.actual().ok_or_else(|| {
            NotebookError::Predict(format!(
                "target column '{}' is absent; nothing to compare against",
                predictions.target()
            ))
        })?;
        match (predictions.predicted(), actual) {
            (Predictions::Labels(p), Predictions::Labels(a)) => {
                let confusion = ConfusionMatrix::from_labels(p, a)?;
                Ok(Evaluation::Classification {
                    accuracy: confusion.accuracy(),
                    error_rate: confusion.error_rate(),
                    kappa: confusion.kappa(),
                    confusion,
                })
            }
            (Predictions::Values(p), Predictions::Values(a)) => {
                Ok(Evaluation::Regression(RegressionMetrics::compute(p, a)?))
            }
            _ => Err(NotebookError::Predict(
                "predicted and actual values have different kinds".to_string(),
            )),
        }
    }

    /// Predict and score in one step
    pub fn evaluate(model: &FittedModel, table: &Table) -> Result<Evaluation> {
        let predictions = Self::predict(model, table)?;
        let evaluation = Self::score(&predictions)?;
        match &evaluation {
            Evaluation::Classification { accuracy, kappa, .. } => {
                info!(rows = predictions.len(), accuracy, kappa, "evaluated classifier")
            }
            Evaluation::Regression(m) => {
                info!(rows = predictions.len(), mae = m.mean_absolute_error, "evaluated regressor")
            }
        }
        Ok(evaluation)
    }
}
