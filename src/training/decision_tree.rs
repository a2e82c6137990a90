//! Decision tree bindings
//!
//! Classification trees split on entropy; regression trees on variance.
//! Tree induction itself is delegated to smartcore.

use crate::error::{NotebookError, Result};
use crate::training::features::to_dense;
use ndarray::Array2;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters, SplitCriterion,
};
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

/// Classification tree over integer class codes
pub struct ClassificationTree {
    model: DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>,
}

impl ClassificationTree {
    pub fn fit(x: &Array2<f64>, y: &[i32], max_depth: Option<u16>) -> Result<Self> {
        let mut params = DecisionTreeClassifierParameters::default();
        params.criterion = SplitCriterion::Entropy;
        params.max_depth = max_depth;

        let model = DecisionTreeClassifier::fit(&to_dense(x)?, &y.to_vec(), params)
            .map_err(|e| NotebookError::Fit(format!("decision tree: {}", e)))?;
        Ok(Self { model })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<i32>> {
        self.model
            .predict(&to_dense(x)?)
            .map_err(|e| NotebookError::Predict(format!("decision tree: {}", e)))
    }
}

/// CART-style regression tree
pub struct RegressionTree {
    model: DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    max_depth: Option<u16>,
    min_split: usize,
}

impl RegressionTree {
    pub fn fit(
        x: &Array2<f64>,
        y: &[f64],
        max_depth: Option<u16>,
        min_split: Option<usize>,
    ) -> Result<Self> {
        let mut params = DecisionTreeRegressorParameters::default();
        params.max_depth = max_depth;
        // rpart's default minsplit
        let min_split = min_split.unwrap_or(20);
        params.min_samples_split = min_split;

        let model = DecisionTreeRegressor::fit(&to_dense(x)?, &y.to_vec(), params)
            .map_err(|e| NotebookError::Fit(format!("regression tree: {}", e)))?;
        Ok(Self {
            model,
            max_depth,
            min_split,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        self.model
            .predict(&to_dense(x)?)
            .map_err(|e| NotebookError::Predict(format!("regression tree: {}", e)))
    }

    pub fn summary(&self) -> String {
        let depth = self
            .max_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unbounded".to_string());
        format!("max depth: {}, min split: {}\n", depth, self.min_split)
    }
}
