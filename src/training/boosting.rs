//! Boosted, cost-sensitive decision trees
//!
//! Each trial fits a tree on a weighted bootstrap of the training rows and
//! votes with weight `ln((1 - err) / err) + ln(K - 1)` (SAMME). Misclassified
//! rows gain weight for the next trial. Misclassification costs enter as
//! initial row weights: a row of actual class `c` starts with weight
//! proportional to the total cost of predicting anything else for `c`.

use crate::error::{NotebookError, Result};
use crate::training::decision_tree::ClassificationTree;
use ndarray::{Array2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Error floor so a perfect trial still gets a finite vote
const MIN_ERROR: f64 = 1e-10;

pub struct BoostedTrees {
    trees: Vec<ClassificationTree>,
    alphas: Vec<f64>,
    n_classes: usize,
}

impl BoostedTrees {
    /// Fit up to `trials` trees.
    ///
    /// `row_weights` are the starting weights (one per row). Uniform weights
    /// and `trials == 1` fit a single tree on the rows as given. Boosting
    /// stops early when a trial is perfect or no better than chance.
    pub fn fit(
        x: &Array2<f64>,
        y: &[i32],
        n_classes: usize,
        trials: usize,
        row_weights: &[f64],
        max_depth: Option<u16>,
        seed: u64,
    ) -> Result<Self> {
        let n = x.nrows();
        if n != y.len() || n != row_weights.len() {
            return Err(NotebookError::Fit(format!(
                "{} rows but {} labels and {} weights",
                n,
                y.len(),
                row_weights.len()
            )));
        }
        let total: f64 = row_weights.iter().sum();
        if !(total > 0.0) {
            return Err(NotebookError::Fit("row weights must sum to a positive value".to_string()));
        }
        let mut weights: Vec<f64> = row_weights.iter().map(|w| w / total).collect();
        let uniform = weights.iter().all(|w| (w - weights[0]).abs() < 1e-12);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(trials);
        let mut alphas = Vec::with_capacity(trials);
        let chance = 1.0 - 1.0 / n_classes.max(2) as f64;

        for trial in 0..trials {
            let tree = if trial == 0 && uniform {
                ClassificationTree::fit(x, y, max_depth)?
            } else {
                let sample = weighted_sample(&weights, n, &mut rng)?;
                let xs = x.select(Axis(0), &sample);
                let ys: Vec<i32> = sample.iter().map(|&i| y[i]).collect();
                ClassificationTree::fit(&xs, &ys, max_depth)?
            };

            if trials == 1 {
                trees.push(tree);
                alphas.push(1.0);
                break;
            }

            let predicted = tree.predict(x)?;
            let missed: Vec<bool> = predicted.iter().zip(y).map(|(p, a)| p != a).collect();
            let error: f64 = weights
                .iter()
                .zip(&missed)
                .filter(|(_, m)| **m)
                .map(|(w, _)| w)
                .sum();
            debug!(trial, error, "boosting trial");

            if error >= chance {
                if trees.is_empty() {
                    trees.push(tree);
                    alphas.push(1.0);
                }
                break;
            }

            let clamped = error.max(MIN_ERROR);
            let alpha = ((1.0 - clamped) / clamped).ln() + ((n_classes as f64) - 1.0).max(1.0).ln();
            trees.push(tree);
            alphas.push(alpha);

            if error == 0.0 {
                break;
            }
            for (w, m) in weights.iter_mut().zip(&missed) {
                if *m {
                    *w *= alpha.exp();
                }
            }
            let sum: f64 = weights.iter().sum();
            weights.iter_mut().for_each(|w| *w /= sum);
        }

        Ok(Self {
            trees,
            alphas,
            n_classes,
        })
    }

    /// Number of trees actually kept
    pub fn n_trials(&self) -> usize {
        self.trees.len()
    }

    /// Weighted vote; ties go to the lowest class code
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<i32>> {
        let mut votes = vec![vec![0.0; self.n_classes]; x.nrows()];
        for (tree, alpha) in self.trees.iter().zip(&self.alphas) {
            for (row, class) in tree.predict(x)?.into_iter().enumerate() {
                if let Ok(c) = usize::try_from(class) {
                    if let Some(v) = votes[row].get_mut(c) {
                        *v += alpha;
                    }
                }
            }
        }
        Ok(votes
            .iter()
            .map(|row| {
                let mut best = 0;
                for (c, v) in row.iter().enumerate() {
                    if *v > row[best] {
                        best = c;
                    }
                }
                best as i32
            })
            .collect())
    }
}

/// Draw `n` row indices with replacement, proportional to `weights`
pub(crate) fn weighted_sample(weights: &[f64], n: usize, rng: &mut ChaCha8Rng) -> Result<Vec<usize>> {
    let dist = WeightedIndex::new(weights)
        .map_err(|e| NotebookError::Fit(format!("invalid sampling weights: {}", e)))?;
    Ok((0..n).map(|_| dist.sample(rng)).collect())
}

/// Starting row weights from per-class misclassification weights.
///
/// Classes whose total cost is zero fall back to weight 1 when every class
/// is zero.
pub(crate) fn cost_weights(y: &[i32], class_weights: &[f64]) -> Vec<f64> {
    if class_weights.iter().all(|w| *w == 0.0) {
        return vec![1.0; y.len()];
    }
    y.iter()
        .map(|&c| usize::try_from(c).ok().and_then(|c| class_weights.get(c)).copied().unwrap_or(0.0))
        .collect()
}
