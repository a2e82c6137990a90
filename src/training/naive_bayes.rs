//! Categorical naive Bayes
//!
//! Class priors and per-feature level frequencies, with additive (Laplace)
//! smoothing applied to every count.

use crate::data::{ColumnRole, Table};
use crate::error::{NotebookError, Result};
use std::collections::HashMap;

/// Scoring floor for a zero likelihood
const MIN_PROBABILITY: f64 = 0.001;

#[derive(Debug, Clone)]
struct FrequencyTable {
    column: String,
    levels: Vec<String>,
    /// `counts[class][level]`
    counts: Vec<Vec<usize>>,
}

/// Naive Bayes over categorical features
#[derive(Debug, Clone)]
pub struct NaiveBayes {
    classes: Vec<String>,
    class_counts: Vec<usize>,
    tables: Vec<FrequencyTable>,
    laplace: f64,
}

impl NaiveBayes {
    /// Count class and level frequencies.
    ///
    /// Every non-identifier column except `target` must be categorical.
    pub fn fit(table: &Table, target: &str, laplace: f64) -> Result<Self> {
        let y = table.labels(target)?;
        let mut classes = y.clone();
        classes.sort();
        classes.dedup();
        let class_index: HashMap<&str, usize> =
            classes.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();
        let codes: Vec<usize> = y.iter().map(|l| class_index[l.as_str()]).collect();

        let mut class_counts = vec![0; classes.len()];
        for &c in &codes {
            class_counts[c] += 1;
        }

        let mut tables = Vec::new();
        for (name, role) in table.schema() {
            if name == target || role == ColumnRole::Identifier {
                continue;
            }
            if role == ColumnRole::Numeric {
                return Err(NotebookError::Fit(format!(
                    "naive Bayes needs categorical features; '{}' is numeric",
                    name
                )));
            }
            let values = table.labels(&name)?;
            let levels = table.levels(&name)?;
            let mut counts = vec![vec![0; levels.len()]; classes.len()];
            for (value, &c) in values.iter().zip(&codes) {
                if let Some(l) = levels.iter().position(|lv| lv == value) {
                    counts[c][l] += 1;
                }
            }
            tables.push(FrequencyTable { column: name, levels, counts });
        }

        if tables.is_empty() {
            return Err(NotebookError::Fit("naive Bayes needs at least one feature".to_string()));
        }

        Ok(Self {
            classes,
            class_counts,
            tables,
            laplace,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn laplace(&self) -> f64 {
        self.laplace
    }

    pub fn features(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.column.as_str()).collect()
    }

    /// Class prior estimated from training frequencies
    pub fn prior(&self, class: &str) -> Option<f64> {
        let c = self.classes.iter().position(|x| x == class)?;
        let total: usize = self.class_counts.iter().sum();
        Some(self.class_counts[c] as f64 / total as f64)
    }

    /// `P(feature = level | class)`, smoothed:
    /// `(count + laplace) / (class_count + laplace * n_levels)`
    pub fn likelihood(&self, feature: &str, level: &str, class: &str) -> Option<f64> {
        let table = self.tables.iter().find(|t| t.column == feature)?;
        let c = self.classes.iter().position(|x| x == class)?;
        let l = table.levels.iter().position(|x| x == level)?;
        let numerator = table.counts[c][l] as f64 + self.laplace;
        let denominator = self.class_counts[c] as f64 + self.laplace * table.levels.len() as f64;
        if denominator == 0.0 {
            return Some(0.0);
        }
        Some(numerator / denominator)
    }

    /// Unnormalized log posterior per class for one row of labels
    fn log_scores(&self, row: &[&str]) -> Vec<f64> {
        self.classes
            .iter()
            .map(|class| {
                let prior = self.prior(class).unwrap_or(0.0).max(f64::MIN_POSITIVE);
                let evidence: f64 = self
                    .tables
                    .iter()
                    .zip(row)
                    .map(|(t, level)| {
                        self.likelihood(&t.column, level, class)
                            .unwrap_or(0.0)
                            .max(MIN_PROBABILITY)
                            .ln()
                    })
                    .sum();
                prior.ln() + evidence
            })
            .collect()
    }

    /// Posterior class probabilities for every row
    pub fn predict_proba(&self, table: &Table) -> Result<Vec<Vec<f64>>> {
        let columns = self.feature_labels(table)?;
        let mut out = Vec::with_capacity(table.n_rows());
        for i in 0..table.n_rows() {
            let row: Vec<&str> = columns.iter().map(|c| c[i].as_str()).collect();
            let scores = self.log_scores(&row);
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
            let sum: f64 = exp.iter().sum();
            out.push(exp.into_iter().map(|e| e / sum).collect());
        }
        Ok(out)
    }

    /// Most probable class per row; ties go to the first class in sorted order
    pub fn predict(&self, table: &Table) -> Result<Vec<String>> {
        let columns = self.feature_labels(table)?;
        let mut out = Vec::with_capacity(table.n_rows());
        for i in 0..table.n_rows() {
            let row: Vec<&str> = columns.iter().map(|c| c[i].as_str()).collect();
            let scores = self.log_scores(&row);
            let mut best = 0;
            for (c, s) in scores.iter().enumerate() {
                if *s > scores[best] {
                    best = c;
                }
            }
            out.push(self.classes[best].clone());
        }
        Ok(out)
    }

    fn feature_labels(&self, table: &Table) -> Result<Vec<Vec<String>>> {
        self.tables
            .iter()
            .map(|t| {
                if !table.has_column(&t.column) {
                    return Err(NotebookError::Predict(format!(
                        "feature column '{}' is missing",
                        t.column
                    )));
                }
                let values = table
                    .labels(&t.column)
                    .map_err(|e| NotebookError::Predict(e.to_string()))?;
                if let Some(unseen) = values.iter().find(|v| !t.levels.contains(v)) {
                    return Err(NotebookError::Predict(format!(
                        "unseen level '{}' in column '{}'",
                        unseen, t.column
                    )));
                }
                Ok(values)
            })
            .collect()
    }

    /// Conditional probability tables, one block per feature
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for t in &self.tables {
            out.push_str(&format!("{}\n", t.column));
            for class in &self.classes {
                let cells: Vec<String> = t
                    .levels
                    .iter()
                    .map(|l| {
                        let p = self.likelihood(&t.column, l, class).unwrap_or(0.0);
                        format!("{}={:.4}", l, p)
                    })
                    .collect();
                out.push_str(&format!("  {}: {}\n", class, cells.join(" ")));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn messages() -> Table {
        let df = df!(
            "type" => &["spam", "spam", "ham", "ham", "ham", "ham"],
            "free" => &["Yes", "Yes", "No", "No", "No", "Yes"],
            "call" => &["Yes", "No", "No", "No", "No", "No"],
        )
        .unwrap();
        Table::from_frame(df).unwrap()
    }

    #[test]
    fn test_likelihood_without_smoothing() {
        let model = NaiveBayes::fit(&messages(), "type", 0.0).unwrap();
        assert_eq!(model.likelihood("free", "Yes", "spam"), Some(1.0));
        assert_eq!(model.likelihood("free", "No", "spam"), Some(0.0));
        assert_eq!(model.likelihood("free", "Yes", "ham"), Some(0.25));
        assert_eq!(model.prior("ham"), Some(4.0 / 6.0));
    }

    #[test]
    fn test_laplace_lifts_zero_counts() {
        let plain = NaiveBayes::fit(&messages(), "type", 0.0).unwrap();
        let smooth = NaiveBayes::fit(&messages(), "type", 1.0).unwrap();
        assert_eq!(plain.likelihood("call", "Yes", "ham"), Some(0.0));
        // (0 + 1) / (4 + 2)
        let lifted = smooth.likelihood("call", "Yes", "ham").unwrap();
        assert!((lifted - 1.0 / 6.0).abs() < 1e-12);

        let a = smooth.likelihood("free", "No", "ham").unwrap();
        let b = smooth.likelihood("free", "Yes", "ham").unwrap();
        assert!(a > b);
    }

    #[test]
    fn test_predict() {
        let model = NaiveBayes::fit(&messages(), "type", 1.0).unwrap();
        let predictions = model.predict(&messages()).unwrap();
        assert_eq!(predictions[0], "spam");
        assert_eq!(predictions[2], "ham");

        let proba = model.predict_proba(&messages()).unwrap();
        assert!((proba[0].iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_feature_rejected() {
        let df = df!("type" => &["a", "b"], "x" => &[1.0, 2.0]).unwrap();
        let err = NaiveBayes::fit(&Table::from_frame(df).unwrap(), "type", 1.0).unwrap_err();
        assert!(matches!(err, NotebookError::Fit(_)));
    }

    #[test]
    fn test_unseen_level_rejected() {
        let model = NaiveBayes::fit(&messages(), "type", 1.0).unwrap();
        let df = df!("free" => &["Maybe"], "call" => &["No"]).unwrap();
        let err = model.predict(&Table::from_frame(df).unwrap()).unwrap_err();
        assert!(matches!(err, NotebookError::Predict(_)));
    }
}
