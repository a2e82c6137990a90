//! Run a chapter end to end

use super::config::{ChapterConfig, ChapterTask, RuleSpec};
use crate::data::{ColumnRole, DataLoader, Splitter, Table};
use crate::error::{NotebookError, Result};
use crate::evaluation::{
    crosstab, describe, frequency, ColumnSummary, CrossTab, Evaluation, Evaluator, ItemFrequency,
    LevelCount, Rule, RuleMeasures,
};
use crate::preprocessing::{apply_all, TermMatrixBuilder};
use crate::training::{FitConfig, Fitter};
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

/// A measured rule and whether it clears the configured thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredRule {
    pub rule: Rule,
    pub measures: RuleMeasures,
    pub meets_thresholds: bool,
}

#[derive(Debug, Clone)]
pub enum ChapterOutcome {
    Supervised {
        train_rows: usize,
        test_rows: usize,
        model_summary: String,
        evaluation: Evaluation,
    },
    Association {
        transactions: usize,
        top_items: Vec<ItemFrequency>,
        rules: Vec<MeasuredRule>,
    },
    Summary {
        summaries: Vec<ColumnSummary>,
        frequencies: Vec<(String, Vec<LevelCount>)>,
        crosstab: Option<CrossTab>,
    },
}

#[derive(Debug, Clone)]
pub struct ChapterReport {
    pub name: String,
    pub description: String,
    pub rows: usize,
    pub elapsed_secs: f64,
    pub outcome: ChapterOutcome,
}

/// Loader → transforms → splitter → fitter → evaluator.
///
/// The first error aborts the chapter.
pub fn run_chapter(config: &ChapterConfig) -> Result<ChapterReport> {
    config.validate()?;
    let start = Instant::now();
    info!(chapter = %config.name, path = %config.dataset.path.display(), "running chapter");

    let loader = DataLoader::new();
    let (rows, outcome) = match &config.task {
        ChapterTask::Association { fit, rules, top_items } => {
            let baskets = loader.load_transactions(&config.dataset.path, config.dataset.format.delimiter)?;
            let rows = baskets.len();
            (rows, run_association(&baskets, fit, rules, *top_items)?)
        }
        ChapterTask::Supervised { split, fit } => {
            let table = apply_all(&loader.load_csv(&config.dataset.path, &config.dataset.format)?, &config.transforms)?;
            let rows = table.n_rows();
            (rows, run_supervised(config, &table, split.as_ref(), fit)?)
        }
        ChapterTask::Summary { columns, crosstab } => {
            let table = apply_all(&loader.load_csv(&config.dataset.path, &config.dataset.format)?, &config.transforms)?;
            let rows = table.n_rows();
            (rows, run_summary(&table, columns, crosstab.as_ref())?)
        }
    };

    let elapsed_secs = start.elapsed().as_secs_f64();
    info!(chapter = %config.name, secs = elapsed_secs, "chapter finished");
    Ok(ChapterReport {
        name: config.name.clone(),
        description: config.description.clone(),
        rows,
        elapsed_secs,
        outcome,
    })
}

fn run_supervised(
    config: &ChapterConfig,
    table: &Table,
    split: Option<&crate::data::SplitStrategy>,
    fit: &FitConfig,
) -> Result<ChapterOutcome> {
    let (mut train, mut test) = match split {
        Some(strategy) => {
            let split = Splitter::split(table, strategy)?;
            (split.train, split.test)
        }
        None => {
            warn!(chapter = %config.name, "no split configured; evaluating on the training rows");
            (table.clone(), table.clone())
        }
    };

    if let Some(step) = &config.text {
        let mut builder = TermMatrixBuilder::new(&step.column).with_min_frequency(step.min_frequency);
        train = builder.fit_transform(&train)?;
        test = builder.transform(&test)?;
    }

    let model = Fitter::fit(&train, fit)?;
    let predictions = Evaluator::predict(&model, &test)?;
    let evaluation = Evaluator::score(&predictions)?;

    Ok(ChapterOutcome::Supervised {
        train_rows: train.n_rows(),
        test_rows: test.n_rows(),
        model_summary: model.summary(),
        evaluation,
    })
}

fn run_association(
    baskets: &crate::data::TransactionSet,
    fit: &FitConfig,
    specs: &[RuleSpec],
    top_items: usize,
) -> Result<ChapterOutcome> {
    fit.validate()?;
    let hp = &fit.hyperparameters;
    let min_support = hp.support.unwrap_or(0.1);
    let min_confidence = hp.confidence.unwrap_or(0.8);
    let min_len = hp.min_len.unwrap_or(1);

    let mut rules = Vec::with_capacity(specs.len());
    for spec in specs {
        let lhs: Vec<&str> = spec.lhs.iter().map(|s| s.as_str()).collect();
        let rhs: Vec<&str> = spec.rhs.iter().map(|s| s.as_str()).collect();
        let rule = Rule::new(&lhs, &rhs)?;
        let measures = baskets.measure(&rule);
        let meets_thresholds = measures.support >= min_support
            && measures.confidence >= min_confidence
            && rule.items().len() >= min_len;
        rules.push(MeasuredRule {
            rule,
            measures,
            meets_thresholds,
        });
    }

    let mut items = baskets.item_frequency();
    items.truncate(top_items);
    Ok(ChapterOutcome::Association {
        transactions: baskets.len(),
        top_items: items,
        rules,
    })
}

fn run_summary(
    table: &Table,
    columns: &[String],
    pair: Option<&(String, String)>,
) -> Result<ChapterOutcome> {
    let columns = if columns.is_empty() {
        table.column_names()
    } else {
        columns.to_vec()
    };

    let mut summaries = Vec::new();
    let mut frequencies = Vec::new();
    for column in &columns {
        match table.role(column) {
            Some(ColumnRole::Numeric) => summaries.push(describe(table, column)?),
            Some(_) => frequencies.push((column.clone(), frequency(table, column)?)),
            None => return Err(NotebookError::column_not_found(column)),
        }
    }
    let crosstab = pair.map(|(a, b)| crosstab(table, a, b)).transpose()?;

    Ok(ChapterOutcome::Summary {
        summaries,
        frequencies,
        crosstab,
    })
}

impl fmt::Display for ChapterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.name)?;
        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        match &self.outcome {
            ChapterOutcome::Supervised {
                train_rows,
                test_rows,
                model_summary,
                evaluation,
            } => {
                writeln!(f, "{} rows: {} train / {} test", self.rows, train_rows, test_rows)?;
                write!(f, "{}", model_summary)?;
                write!(f, "{}", evaluation)?;
            }
            ChapterOutcome::Association {
                transactions,
                top_items,
                rules,
            } => {
                writeln!(f, "{} transactions", transactions)?;
                for item in top_items {
                    writeln!(f, "  {:<30} {:>6} {:>8.4}", item.item, item.count, item.support)?;
                }
                for measured in rules {
                    let m = &measured.measures;
                    writeln!(
                        f,
                        "{} support={:.4} confidence={:.4} lift={:.4} count={}{}",
                        measured.rule,
                        m.support,
                        m.confidence,
                        m.lift,
                        m.count,
                        if measured.meets_thresholds { "" } else { " (below thresholds)" }
                    )?;
                }
            }
            ChapterOutcome::Summary {
                summaries,
                frequencies,
                crosstab,
            } => {
                for summary in summaries {
                    writeln!(f, "{}", summary.column)?;
                    write!(f, "{}", summary)?;
                }
                for (column, levels) in frequencies {
                    writeln!(f, "{}", column)?;
                    for level in levels {
                        writeln!(f, "  {:<20} {:>6} {:>8.3}", level.level, level.count, level.proportion)?;
                    }
                }
                if let Some(ct) = crosstab {
                    write!(f, "{}", ct)?;
                }
            }
        }
        writeln!(f, "({:.2}s)", self.elapsed_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::config::ChapterTask;
    use crate::data::SplitStrategy;
    use crate::training::Algorithm;
    use std::path::PathBuf;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("notebook_runner_{}_{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_supervised_chapter() {
        let mut csv = String::from("size,color,label\n");
        for i in 0..40 {
            let label = if i % 2 == 0 { "a" } else { "b" };
            csv.push_str(&format!("{},{},{}\n", i % 2, if i % 2 == 0 { "red" } else { "blue" }, label));
        }
        let path = write_temp("supervised.csv", &csv);
        let config = ChapterConfig::new(
            "toy",
            &path,
            ChapterTask::Supervised {
                split: Some(SplitStrategy::At { index: 30 }),
                fit: FitConfig::new(Algorithm::OneRule, "label"),
            },
        );
        let report = run_chapter(&config).unwrap();
        match report.outcome {
            ChapterOutcome::Supervised { train_rows, test_rows, evaluation, .. } => {
                assert_eq!(train_rows, 30);
                assert_eq!(test_rows, 10);
                assert_eq!(evaluation.confusion().unwrap().total(), 10);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_association_chapter() {
        let path = write_temp("baskets.csv", "milk,bread\nmilk,eggs\nbread\nmilk,bread,eggs\n");
        let config = ChapterConfig::new(
            "baskets",
            &path,
            ChapterTask::Association {
                fit: FitConfig::new(Algorithm::Apriori, "").with_support(0.25).with_confidence(0.5),
                rules: vec![RuleSpec { lhs: vec!["milk".to_string()], rhs: vec!["bread".to_string()] }],
                top_items: 2,
            },
        );
        let report = run_chapter(&config).unwrap();
        match report.outcome {
            ChapterOutcome::Association { transactions, top_items, rules } => {
                assert_eq!(transactions, 4);
                assert_eq!(top_items.len(), 2);
                assert_eq!(rules[0].measures.count, 2);
                assert!(rules[0].meets_thresholds);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_unbound_family_aborts_chapter() {
        let path = write_temp("unbound.csv", "x,y\n1,2\n2,4\n3,6\n4,8\n");
        let config = ChapterConfig::new(
            "unbound",
            &path,
            ChapterTask::Supervised {
                split: None,
                fit: FitConfig::new(Algorithm::ModelTree, "y").with_min_split(2),
            },
        );
        assert!(matches!(run_chapter(&config), Err(NotebookError::Fit(_))));
        std::fs::remove_file(path).ok();
    }
}
