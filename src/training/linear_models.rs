//! Ordinary least squares binding

use crate::error::{NotebookError, Result};
use crate::training::features::to_dense;
use ndarray::Array2;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};

pub struct LinearModel {
    model: LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn fit(x: &Array2<f64>, y: &[f64]) -> Result<Self> {
        if x.nrows() <= x.ncols() {
            return Err(NotebookError::Fit(format!(
                "linear regression needs more rows ({}) than features ({})",
                x.nrows(),
                x.ncols()
            )));
        }
        let model = LinearRegression::fit(&to_dense(x)?, &y.to_vec(), LinearRegressionParameters::default())
            .map_err(|e| NotebookError::Fit(format!("linear regression: {}", e)))?;

        // Read the fitted plane back by predicting at the origin and each unit vector
        let p = x.ncols();
        let mut basis = Array2::zeros((p + 1, p));
        for j in 0..p {
            basis[[j + 1, j]] = 1.0;
        }
        let at = model
            .predict(&to_dense(&basis)?)
            .map_err(|e| NotebookError::Fit(format!("linear regression: {}", e)))?;
        let intercept = at[0];
        let coefficients = at[1..].iter().map(|v| v - intercept).collect();

        Ok(Self {
            model,
            intercept,
            coefficients,
        })
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coefficients in feature order
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        self.model
            .predict(&to_dense(x)?)
            .map_err(|e| NotebookError::Predict(format!("linear regression: {}", e)))
    }

    pub fn summary(&self, feature_names: &[String]) -> String {
        let mut out = format!("{:<20} {:>14.4}\n", "(Intercept)", self.intercept);
        for (name, coef) in feature_names.iter().zip(&self.coefficients) {
            out.push_str(&format!("{:<20} {:>14.4}\n", name, coef));
        }
        out
    }
}
