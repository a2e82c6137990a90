//! k-nearest-neighbour classification binding

use crate::error::{NotebookError, Result};
use crate::training::config::Weighting;
use crate::training::features::to_dense;
use ndarray::Array2;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::neighbors::knn_classifier::{KNNClassifier, KNNClassifierParameters};
use smartcore::neighbors::KNNWeightFunction;

/// Euclidean kNN over the encoded feature matrix
pub struct KnnClassifier {
    model: KNNClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>, Euclidian<f64>>,
    k: usize,
    weighting: Weighting,
}

impl KnnClassifier {
    pub fn fit(x: &Array2<f64>, y: &[i32], k: usize, weighting: Weighting) -> Result<Self> {
        if k > x.nrows() {
            return Err(NotebookError::Fit(format!(
                "k = {} exceeds the {} training rows",
                k,
                x.nrows()
            )));
        }
        let weight = match weighting {
            Weighting::Uniform => KNNWeightFunction::Uniform,
            Weighting::Distance => KNNWeightFunction::Distance,
        };
        let params = KNNClassifierParameters::default().with_k(k).with_weight(weight);

        let model = KNNClassifier::fit(&to_dense(x)?, &y.to_vec(), params)
            .map_err(|e| NotebookError::Fit(format!("knn: {}", e)))?;
        Ok(Self {
            model,
            k,
            weighting,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<i32>> {
        self.model
            .predict(&to_dense(x)?)
            .map_err(|e| NotebookError::Predict(format!("knn: {}", e)))
    }

    pub fn summary(&self) -> String {
        format!("k = {}, weighting = {:?}\n", self.k, self.weighting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_knn_votes_with_neighbours() {
        let x = array![[0.0, 0.0], [0.1, 0.1], [0.2, 0.0], [1.0, 1.0], [0.9, 1.0], [1.0, 0.9]];
        let y = vec![0, 0, 0, 1, 1, 1];
        let model = KnnClassifier::fit(&x, &y, 3, Weighting::Uniform).unwrap();
        let predicted = model.predict(&array![[0.05, 0.05], [0.95, 0.95]]).unwrap();
        assert_eq!(predicted, vec![0, 1]);
    }

    #[test]
    fn test_k_larger_than_training_set() {
        let x = array![[0.0], [1.0]];
        assert!(KnnClassifier::fit(&x, &[0, 1], 5, Weighting::Uniform).is_err());
    }
}
