//! Notebook ML - classical machine learning chapters as pipelines
//!
//! Each chapter of the notebook is a run of the same four stages:
//! load a delimited file, split it into train and test rows, fit one
//! algorithm family, and evaluate predictions on the held-out rows.
//!
//! # Modules
//!
//! - [`data`] - Tables, CSV and basket loaders, train/test splitting
//! - [`preprocessing`] - Derived columns, scaling, term matrices
//! - [`training`] - Fit configurations and the learner families
//! - [`evaluation`] - Predictions, confusion matrices, regression and rule measures
//! - [`chapters`] - Chapter configurations, built-in presets and the runner
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Pipeline stages
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod evaluation;

// Orchestration
pub mod chapters;
pub mod cli;

pub use error::{NotebookError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{NotebookError, Result};

    // Data
    pub use crate::data::{ColumnRole, CsvFormat, DataLoader, Split, SplitStrategy, Splitter, Table, TransactionSet};

    // Preprocessing
    pub use crate::preprocessing::{apply_all, TermMatrixBuilder, Transform};

    // Training
    pub use crate::training::{Algorithm, CostMatrix, FitConfig, FittedModel, Fitter, Kernel, Predictions, TaskType, Weighting};

    // Evaluation
    pub use crate::evaluation::{ConfusionMatrix, Evaluation, Evaluator, PredictionSet, RegressionMetrics, Rule, RuleMeasures};

    // Chapters
    pub use crate::chapters::{preset, run_chapter, ChapterConfig, ChapterReport, ChapterTask};
}
