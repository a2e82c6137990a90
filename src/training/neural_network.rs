//! Multilayer perceptron regression binding
//!
//! One hidden layer feeding a single output unit, trained by the `runnt`
//! network in mini-batches over rows shuffled once per epoch. Inputs and the
//! target are expected on a comparable scale, which the chapters arrange with
//! min-max normalization before fitting.

use crate::error::{NotebookError, Result};
use ndarray::Array2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use runnt::nn::NN;
use std::cell::RefCell;
use tracing::debug;

pub const DEFAULT_HIDDEN: usize = 1;

/// Training schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MlpSchedule {
    pub learning_rate: f32,
    pub batch_size: usize,
    pub max_epochs: usize,
    /// Epochs without a training-error improvement of `tolerance` before stopping
    pub patience: usize,
    pub tolerance: f64,
}

impl Default for MlpSchedule {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            batch_size: 8,
            max_epochs: 2000,
            patience: 50,
            tolerance: 1e-7,
        }
    }
}

pub struct MlpRegressor {
    net: RefCell<NN>,
    n_inputs: usize,
    hidden: usize,
    epochs: usize,
    loss: f64,
}

fn rows_f32(x: &Array2<f64>) -> Vec<Vec<f32>> {
    x.rows()
        .into_iter()
        .map(|r| r.iter().map(|v| *v as f32).collect())
        .collect()
}

impl MlpRegressor {
    pub fn fit(x: &Array2<f64>, y: &[f64], hidden: usize, seed: u64) -> Result<Self> {
        Self::fit_with(x, y, hidden, seed, MlpSchedule::default())
    }

    pub fn fit_with(
        x: &Array2<f64>,
        y: &[f64],
        hidden: usize,
        seed: u64,
        schedule: MlpSchedule,
    ) -> Result<Self> {
        let (n_samples, n_inputs) = x.dim();
        if n_samples == 0 || n_samples != y.len() {
            return Err(NotebookError::Fit(format!(
                "neural network needs matching rows, got {} inputs and {} targets",
                n_samples,
                y.len()
            )));
        }
        if hidden == 0 {
            return Err(NotebookError::Fit("hidden layer needs at least one unit".to_string()));
        }

        // The network draws its initial weights from fastrand
        fastrand::seed(seed);
        let mut net = NN::new(&[n_inputs, hidden, 1]).with_learning_rate(schedule.learning_rate);

        let inputs = rows_f32(x);
        let targets: Vec<Vec<f32>> = y.iter().map(|v| vec![*v as f32]).collect();
        let all_inputs: Vec<&Vec<f32>> = inputs.iter().collect();
        let all_targets: Vec<&Vec<f32>> = targets.iter().collect();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..n_samples).collect();
        let batch_size = schedule.batch_size.max(1);
        let mut best = f64::INFINITY;
        let mut stale = 0;
        let mut epochs = 0;
        let mut loss = f64::INFINITY;

        for epoch in 0..schedule.max_epochs {
            order.shuffle(&mut rng);
            let ins: Vec<&Vec<f32>> = order.iter().map(|&i| &inputs[i]).collect();
            let tars: Vec<&Vec<f32>> = order.iter().map(|&i| &targets[i]).collect();
            net.fit(&ins, &tars, batch_size);

            loss = f64::from(net.forward_errors(&all_inputs, &all_targets));
            epochs = epoch + 1;
            if !loss.is_finite() {
                return Err(NotebookError::Fit(format!(
                    "neural network diverged after {} epochs",
                    epochs
                )));
            }
            if best - loss > schedule.tolerance {
                best = loss;
                stale = 0;
            } else {
                stale += 1;
                if stale >= schedule.patience {
                    break;
                }
            }
        }
        debug!(epochs, error = loss, "neural network trained");

        Ok(Self {
            net: RefCell::new(net),
            n_inputs,
            hidden,
            epochs,
            loss,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.n_inputs {
            return Err(NotebookError::Predict(format!(
                "neural network expects {} inputs, got {}",
                self.n_inputs,
                x.ncols()
            )));
        }
        let mut net = self.net.borrow_mut();
        rows_f32(x)
            .iter()
            .map(|row| {
                net.forward(row)
                    .first()
                    .map(|v| f64::from(*v))
                    .ok_or_else(|| NotebookError::Predict("neural network produced no output".to_string()))
            })
            .collect()
    }

    pub fn hidden_units(&self) -> usize {
        self.hidden
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Training error reported by the network after the last epoch
    pub fn loss(&self) -> f64 {
        self.loss
    }

    pub fn summary(&self) -> String {
        format!(
            "{} inputs -> {} hidden -> 1 output\n{} epochs, training error {:.6}\n",
            self.n_inputs, self.hidden, self.epochs, self.loss
        )
    }
}
