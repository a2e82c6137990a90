//! Majority-class and single-feature rule learners

use crate::data::{ColumnRole, Table};
use crate::error::{NotebookError, Result};
use std::collections::BTreeMap;
use tracing::debug;

fn majority(labels: &[String]) -> Option<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for l in labels {
        *counts.entry(l.as_str()).or_insert(0) += 1;
    }
    // BTreeMap iterates in sorted order, so ties resolve to the smallest label
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (label, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((label, n)),
        })
        .map(|(label, n)| (label.to_string(), n))
}

/// Always predicts the most frequent training class
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroRule {
    class: String,
}

impl ZeroRule {
    pub fn fit(table: &Table, target: &str) -> Result<Self> {
        let y = table.labels(target)?;
        let (class, _) = majority(&y)
            .ok_or_else(|| NotebookError::Fit("cannot fit on an empty table".to_string()))?;
        Ok(Self { class })
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn predict(&self, table: &Table) -> Vec<String> {
        vec![self.class.clone(); table.n_rows()]
    }
}

/// One rule per level of the single most accurate categorical feature
#[derive(Debug, Clone, PartialEq)]
pub struct OneRule {
    feature: String,
    rules: BTreeMap<String, String>,
    /// Prediction for levels the rule set has never seen
    default: String,
    training_errors: usize,
    n_train: usize,
}

impl OneRule {
    /// Pick the feature whose level → majority-class rules make the fewest
    /// training errors. Ties go to the earlier column.
    pub fn fit(table: &Table, target: &str) -> Result<Self> {
        let y = table.labels(target)?;
        let (default, _) = majority(&y)
            .ok_or_else(|| NotebookError::Fit("cannot fit on an empty table".to_string()))?;

        let mut best: Option<(String, BTreeMap<String, String>, usize)> = None;
        for (name, role) in table.schema() {
            if name == target || role != ColumnRole::Categorical {
                continue;
            }
            let values = table.labels(&name)?;
            let mut by_level: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (v, class) in values.into_iter().zip(&y) {
                by_level.entry(v).or_default().push(class.clone());
            }

            let mut rules = BTreeMap::new();
            let mut errors = 0;
            for (level, classes) in by_level {
                if let Some((class, hits)) = majority(&classes) {
                    errors += classes.len() - hits;
                    rules.insert(level, class);
                }
            }
            debug!(feature = %name, errors, "one rule candidate");

            if best.as_ref().map_or(true, |(_, _, e)| errors < *e) {
                best = Some((name, rules, errors));
            }
        }

        let (feature, rules, training_errors) = best.ok_or_else(|| {
            NotebookError::Fit("one rule needs at least one categorical feature".to_string())
        })?;

        Ok(Self {
            feature,
            rules,
            default,
            training_errors,
            n_train: y.len(),
        })
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn rules(&self) -> &BTreeMap<String, String> {
        &self.rules
    }

    /// Fraction of training rows the rules classify correctly
    pub fn training_accuracy(&self) -> f64 {
        if self.n_train == 0 {
            return 0.0;
        }
        1.0 - self.training_errors as f64 / self.n_train as f64
    }

    pub fn predict(&self, table: &Table) -> Result<Vec<String>> {
        if !table.has_column(&self.feature) {
            return Err(NotebookError::Predict(format!(
                "feature column '{}' is missing",
                self.feature
            )));
        }
        let values = table
            .labels(&self.feature)
            .map_err(|e| NotebookError::Predict(e.to_string()))?;
        Ok(values
            .iter()
            .map(|v| self.rules.get(v).unwrap_or(&self.default).clone())
            .collect())
    }

    pub fn summary(&self) -> String {
        let mut out = format!("{}:\n", self.feature);
        for (level, class) in &self.rules {
            out.push_str(&format!("  {}\t-> {}\n", level, class));
        }
        out.push_str(&format!(
            "({} of {} instances correct)\n",
            self.n_train - self.training_errors,
            self.n_train
        ));
        out
    }
}
