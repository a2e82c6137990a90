//! Regression error measures

use crate::error::{NotebookError, Result};
use serde::Serialize;
use smartcore::metrics;
use std::fmt;

pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Pearson correlation; `None` when either side has zero variance or fewer
/// than two values
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Mean absolute error over the common prefix; 0 for empty input
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    metrics::mean_absolute_error(&actual[..n].to_vec(), &predicted[..n].to_vec())
}

/// Equal-width histogram over `[0, max]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorHistogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl ErrorHistogram {
    pub fn new(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let max = values.iter().copied().fold(0.0, f64::max);
        let width = if max > 0.0 { max / bins as f64 } else { 1.0 };
        let edges = (0..=bins).map(|i| i as f64 * width).collect();
        let mut counts = vec![0; bins];
        for v in values {
            // the top edge belongs to the last bin
            let bin = ((v / width).floor() as usize).min(bins - 1);
            counts[bin] += 1;
        }
        Self { edges, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl fmt::Display for ErrorHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        for (i, count) in self.counts.iter().enumerate() {
            let bar = "#".repeat(count * 40 / peak);
            writeln!(
                f,
                "[{:>10.3}, {:>10.3}) {:>6} {}",
                self.edges[i],
                self.edges[i + 1],
                count,
                bar
            )?;
        }
        Ok(())
    }
}

/// Agreement between predicted and actual numeric values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub n: usize,
    pub correlation: Option<f64>,
    pub mean_absolute_error: f64,
    pub histogram: ErrorHistogram,
}

impl RegressionMetrics {
    pub fn compute(predicted: &[f64], actual: &[f64]) -> Result<Self> {
        Self::with_bins(predicted, actual, DEFAULT_HISTOGRAM_BINS)
    }

    pub fn with_bins(predicted: &[f64], actual: &[f64], bins: usize) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(NotebookError::Predict(format!(
                "{} predictions for {} actual values",
                predicted.len(),
                actual.len()
            )));
        }
        let errors: Vec<f64> = predicted.iter().zip(actual).map(|(p, a)| (p - a).abs()).collect();
        Ok(Self {
            n: predicted.len(),
            correlation: pearson(predicted, actual),
            mean_absolute_error: mean_absolute_error(predicted, actual),
            histogram: ErrorHistogram::new(&errors, bins),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        let c = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&a, &c).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&a, &[5.0; 4]), None);
    }

    #[test]
    fn test_mae() {
        assert!((mean_absolute_error(&[1.0, 2.0, 3.0], &[2.0, 2.0, 5.0]) - 1.0).abs() < 1e-12);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }

    #[test]
    fn test_histogram_places_max_in_last_bin() {
        let hist = ErrorHistogram::new(&[0.0, 0.5, 1.0, 2.0], 4);
        assert_eq!(hist.counts, vec![1, 1, 1, 1]);
        assert_eq!(hist.edges.len(), 5);
        assert_eq!(hist.total(), 4);
    }

    #[test]
    fn test_metrics_mismatch() {
        assert!(RegressionMetrics::compute(&[1.0], &[1.0, 2.0]).is_err());
    }
}
