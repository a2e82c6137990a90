//! Confusion tabulation for classifiers

use crate::error::{NotebookError, Result};
use serde::Serialize;
use std::fmt;

/// Counts indexed `[predicted][actual]` over the union of observed levels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    levels: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_labels(predicted: &[String], actual: &[String]) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(NotebookError::Predict(format!(
                "{} predictions for {} actual values",
                predicted.len(),
                actual.len()
            )));
        }
        let mut levels: Vec<String> = predicted.iter().chain(actual).cloned().collect();
        levels.sort();
        levels.dedup();

        let n = levels.len();
        let mut counts = vec![vec![0; n]; n];
        for (p, a) in predicted.iter().zip(actual) {
            // both labels were collected into `levels` above
            let (Ok(i), Ok(j)) = (levels.binary_search(p), levels.binary_search(a)) else {
                continue;
            };
            counts[i][j] += 1;
        }
        Ok(Self { levels, counts })
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn count(&self, predicted: &str, actual: &str) -> usize {
        match (self.index(predicted), self.index(actual)) {
            (Some(i), Some(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    fn index(&self, level: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == level)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    fn correct(&self) -> usize {
        (0..self.levels.len()).map(|i| self.counts[i][i]).sum()
    }

    fn row_total(&self, i: usize) -> usize {
        self.counts[i].iter().sum()
    }

    fn col_total(&self, j: usize) -> usize {
        self.counts.iter().map(|row| row[j]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.correct() as f64 / total as f64
    }

    pub fn error_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        1.0 - self.accuracy()
    }

    /// Cohen's kappa: agreement beyond what the marginals predict by chance
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let observed = self.accuracy();
        let expected: f64 = (0..self.levels.len())
            .map(|i| (self.row_total(i) as f64 / total) * (self.col_total(i) as f64 / total))
            .sum();
        if (1.0 - expected).abs() < f64::EPSILON {
            return if observed == 1.0 { 1.0 } else { 0.0 };
        }
        (observed - expected) / (1.0 - expected)
    }

    /// Share of predictions of `class` that were right; `None` if never predicted
    pub fn precision(&self, class: &str) -> Option<f64> {
        let i = self.index(class)?;
        let predicted = self.row_total(i);
        (predicted > 0).then(|| self.counts[i][i] as f64 / predicted as f64)
    }

    /// Share of actual `class` rows that were found; `None` if never observed
    pub fn recall(&self, class: &str) -> Option<f64> {
        let j = self.index(class)?;
        let actual = self.col_total(j);
        (actual > 0).then(|| self.counts[j][j] as f64 / actual as f64)
    }

    /// Cross tabulation with row/column totals and cell proportions of the
    /// table total
    pub fn render(&self) -> String {
        let total = self.total().max(1) as f64;
        let width = self
            .levels
            .iter()
            .map(|l| l.len())
            .max()
            .unwrap_or(0)
            .max("predicted".len())
            .max(8)
            + 2;

        let mut out = String::new();
        out.push_str(&format!("{:>w$} | actual\n", "", w = width));
        out.push_str(&format!("{:>w$} |", "predicted", w = width));
        for level in &self.levels {
            out.push_str(&format!(" {:>w$} |", level, w = width));
        }
        out.push_str(&format!(" {:>w$}\n", "Row Total", w = width));
        let rule = "-".repeat((width + 3) * (self.levels.len() + 2));
        out.push_str(&rule);
        out.push('\n');

        for (i, level) in self.levels.iter().enumerate() {
            out.push_str(&format!("{:>w$} |", level, w = width));
            for count in &self.counts[i] {
                out.push_str(&format!(" {:>w$} |", count, w = width));
            }
            out.push_str(&format!(" {:>w$}\n", self.row_total(i), w = width));
            out.push_str(&format!("{:>w$} |", "", w = width));
            for count in &self.counts[i] {
                out.push_str(&format!(" {:>w$.3} |", *count as f64 / total, w = width));
            }
            out.push_str(&format!(" {:>w$.3}\n", self.row_total(i) as f64 / total, w = width));
            out.push_str(&rule);
            out.push('\n');
        }

        out.push_str(&format!("{:>w$} |", "Col Total", w = width));
        for j in 0..self.levels.len() {
            out.push_str(&format!(" {:>w$} |", self.col_total(j), w = width));
        }
        out.push_str(&format!(" {:>w$}\n", self.total(), w = width));
        out
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counts_sum_to_rows() {
        let predicted = labels(&["no", "no", "yes", "yes", "no"]);
        let actual = labels(&["no", "yes", "yes", "no", "no"]);
        let cm = ConfusionMatrix::from_labels(&predicted, &actual).unwrap();
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.count("no", "yes"), 1);
        assert_eq!(cm.count("no", "no"), 2);
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
        assert!((cm.error_rate() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_levels_are_union() {
        let cm = ConfusionMatrix::from_labels(&labels(&["a", "a"]), &labels(&["a", "b"])).unwrap();
        assert_eq!(cm.levels(), &["a", "b"]);
        assert_eq!(cm.precision("b"), None);
        assert_eq!(cm.recall("b"), Some(0.0));
    }

    #[test]
    fn test_kappa() {
        // 20 agree-yes, 5 yes/no, 10 no/yes, 15 agree-no: po = 0.7, pe = 0.5
        let mut predicted = Vec::new();
        let mut actual = Vec::new();
        for (p, a, n) in [("yes", "yes", 20), ("yes", "no", 5), ("no", "yes", 10), ("no", "no", 15)] {
            for _ in 0..n {
                predicted.push(p.to_string());
                actual.push(a.to_string());
            }
        }
        let cm = ConfusionMatrix::from_labels(&predicted, &actual).unwrap();
        assert!((cm.kappa() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_single_level_kappa() {
        let cm = ConfusionMatrix::from_labels(&labels(&["a", "a"]), &labels(&["a", "a"])).unwrap();
        assert_eq!(cm.kappa(), 1.0);
    }

    #[test]
    fn test_length_mismatch() {
        let err = ConfusionMatrix::from_labels(&labels(&["a"]), &labels(&["a", "b"])).unwrap_err();
        assert!(matches!(err, NotebookError::Predict(_)));
    }

    #[test]
    fn test_render_has_totals() {
        let cm = ConfusionMatrix::from_labels(&labels(&["no", "yes"]), &labels(&["no", "no"])).unwrap();
        let text = cm.render();
        assert!(text.contains("Row Total"));
        assert!(text.contains("Col Total"));
    }
}
