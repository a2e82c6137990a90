//! Built-in chapter configurations
//!
//! Each preset reproduces one notebook chapter: its column schema, derived
//! columns, split and learner settings. Only the data path varies.

use super::config::{ChapterConfig, ChapterTask, RuleSpec};
use crate::data::{CsvFormat, SplitStrategy};
use crate::error::{NotebookError, Result};
use crate::preprocessing::Transform;
use crate::training::{Algorithm, CostMatrix, FitConfig, Kernel, Weighting};
use std::collections::BTreeMap;
use std::path::Path;

/// Preset names with a one-line description
pub const PRESETS: &[(&str, &str)] = &[
    ("credit", "loan default risk with a boosted, cost-sensitive C5.0 tree"),
    ("mushrooms", "mushroom edibility with a OneR rule set"),
    ("mushrooms-ripper", "mushroom edibility with RIPPER rules"),
    ("sms", "SMS spam filtering with naive Bayes over term presence"),
    ("concrete", "concrete strength with a multilayer perceptron"),
    ("letters", "optical letter recognition with a linear SVM"),
    ("letters-rbf", "optical letter recognition with a Gaussian-kernel SVM"),
    ("groceries", "grocery basket association rules"),
    ("insurance", "medical expenses with linear regression"),
    ("wine", "wine quality with a regression tree"),
    ("wine-m5p", "wine quality with an M5 model tree"),
    ("wbcd", "breast cancer diagnosis with k-nearest neighbours"),
    ("usedcars", "used car listing summaries"),
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn supervised(split: Option<SplitStrategy>, fit: FitConfig) -> ChapterTask {
    ChapterTask::Supervised { split, fit }
}

/// Build the named preset reading from `data`
pub fn preset(name: &str, data: &Path) -> Result<ChapterConfig> {
    let description = PRESETS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, d)| *d)
        .ok_or_else(|| NotebookError::Config(format!("unknown chapter '{}'", name)))?;

    let config = match name {
        "credit" => ChapterConfig::new(
            name,
            data,
            supervised(
                Some(SplitStrategy::Sample {
                    train_size: 900,
                    test_size: None,
                    seed: 123,
                }),
                FitConfig::new(Algorithm::DecisionTree, "default")
                    .with_trials(10)
                    .with_seed(123)
                    // a missed default costs four times a wrongly refused loan
                    .with_costs(CostMatrix::new(
                        &["no", "yes"],
                        vec![vec![0.0, 4.0], vec![1.0, 0.0]],
                    )),
            ),
        )
        .with_format(CsvFormat::new().with_categorical("default")),

        "mushrooms" | "mushrooms-ripper" => {
            let algorithm = if name == "mushrooms" {
                Algorithm::OneRule
            } else {
                Algorithm::Ripper
            };
            ChapterConfig::new(name, data, supervised(None, FitConfig::new(algorithm, "type")))
                .with_format(CsvFormat::new().with_drop("veil_type"))
        }

        "sms" => ChapterConfig::new(
            name,
            data,
            supervised(
                Some(SplitStrategy::At { index: 4169 }),
                FitConfig::new(Algorithm::NaiveBayes, "type").with_laplace(1.0),
            ),
        )
        .with_text("text", 5),

        "concrete" => ChapterConfig::new(
            name,
            data,
            supervised(
                Some(SplitStrategy::At { index: 773 }),
                FitConfig::new(Algorithm::NeuralNetwork, "strength").with_hidden(5),
            ),
        )
        .with_transform(Transform::NormalizeMinMax { columns: Vec::new() }),

        "letters" | "letters-rbf" => {
            let kernel = if name == "letters" {
                Kernel::Linear
            } else {
                Kernel::Rbf { gamma: None }
            };
            ChapterConfig::new(
                name,
                data,
                supervised(
                    Some(SplitStrategy::At { index: 16000 }),
                    FitConfig::new(Algorithm::Svm, "letter").with_kernel(kernel),
                ),
            )
        }

        "groceries" => ChapterConfig::new(
            name,
            data,
            ChapterTask::Association {
                fit: FitConfig::new(Algorithm::Apriori, "")
                    .with_support(0.006)
                    .with_confidence(0.25)
                    .with_min_len(2),
                rules: vec![
                    RuleSpec { lhs: strings(&["herbs"]), rhs: strings(&["root vegetables"]) },
                    RuleSpec { lhs: strings(&["berries"]), rhs: strings(&["whipped/sour cream"]) },
                    RuleSpec {
                        lhs: strings(&["other vegetables", "tropical fruit", "whole milk"]),
                        rhs: strings(&["root vegetables"]),
                    },
                    RuleSpec { lhs: strings(&["yogurt"]), rhs: strings(&["whole milk"]) },
                ],
                top_items: 20,
            },
        ),

        "insurance" => ChapterConfig::new(
            name,
            data,
            supervised(None, FitConfig::new(Algorithm::LinearRegression, "expenses")),
        )
        .with_transform(Transform::Square { column: "age".to_string() })
        .with_transform(Transform::Indicator {
            column: "bmi".to_string(),
            threshold: 30.0,
            name: "bmi30".to_string(),
        })
        .with_transform(Transform::LevelIndicator {
            column: "smoker".to_string(),
            level: "yes".to_string(),
            name: "smoker_yes".to_string(),
        })
        .with_transform(Transform::Product {
            left: "bmi30".to_string(),
            right: "smoker_yes".to_string(),
            name: "bmi30_smoker".to_string(),
        })
        .with_transform(Transform::Drop { column: "smoker".to_string() }),

        "wine" | "wine-m5p" => {
            let algorithm = if name == "wine" {
                Algorithm::RegressionTree
            } else {
                Algorithm::ModelTree
            };
            ChapterConfig::new(
                name,
                data,
                supervised(Some(SplitStrategy::At { index: 3750 }), FitConfig::new(algorithm, "quality")),
            )
        }

        "wbcd" => {
            let mapping: BTreeMap<String, String> = [("B", "Benign"), ("M", "Malignant")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            ChapterConfig::new(
                name,
                data,
                supervised(
                    Some(SplitStrategy::At { index: 469 }),
                    FitConfig::new(Algorithm::Knn, "diagnosis")
                        .with_k(21)
                        .with_weighting(Weighting::Uniform),
                ),
            )
            .with_format(CsvFormat::new().with_identifier("id"))
            .with_transform(Transform::Recode {
                column: "diagnosis".to_string(),
                mapping,
            })
            .with_transform(Transform::NormalizeMinMax { columns: Vec::new() })
        }

        "usedcars" => ChapterConfig::new(
            name,
            data,
            ChapterTask::Summary {
                columns: strings(&["year", "price", "mileage", "model", "color", "transmission"]),
                crosstab: Some(("model".to_string(), "transmission".to_string())),
            },
        ),

        other => return Err(NotebookError::Config(format!("unknown chapter '{}'", other))),
    };

    Ok(config.with_description(description))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_builds_and_validates() {
        for (name, _) in PRESETS {
            let config = preset(name, Path::new("data.csv")).unwrap();
            assert_eq!(config.name, *name);
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_credit_preset() {
        let config = preset("credit", Path::new("credit.csv")).unwrap();
        match config.task {
            ChapterTask::Supervised { split, fit } => {
                assert_eq!(
                    split,
                    Some(SplitStrategy::Sample { train_size: 900, test_size: None, seed: 123 })
                );
                assert_eq!(fit.hyperparameters.trials, Some(10));
                fit.validate().unwrap();
            }
            other => panic!("unexpected task {:?}", other),
        }
    }

    #[test]
    fn test_unknown_preset() {
        assert!(preset("titanic", Path::new("x.csv")).is_err());
    }
}
