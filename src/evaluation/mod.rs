//! Prediction, scoring and descriptive summaries
//!
//! - [`Evaluator`] predicts on a table and compares against its target
//! - [`ConfusionMatrix`] for classifiers, [`RegressionMetrics`] for regressors
//! - [`Rule`] measures over a [`TransactionSet`](crate::data::TransactionSet)
//! - column summaries, frequency tables, cross tabulations and correlations

mod association;
mod confusion;
mod predictions;
mod regression;
pub mod summary;

pub use association::{ItemFrequency, Rule, RuleMeasures};
pub use confusion::ConfusionMatrix;
pub use predictions::{Evaluation, Evaluator, PredictionSet};
pub use regression::{mean_absolute_error, pearson, ErrorHistogram, RegressionMetrics};
pub use summary::{
    correlation_matrix, crosstab, describe, frequency, ColumnSummary, CorrelationMatrix, CrossTab,
    LevelCount,
};
