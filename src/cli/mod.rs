//! Notebook CLI
//!
//! Run configured or built-in chapters and inspect datasets.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::chapters::{preset, run_chapter, ChapterConfig, ChapterOutcome, ChapterReport, PRESETS};
use crate::data::{ColumnRole, CsvFormat, DataLoader};
use crate::evaluation::{describe, frequency, Evaluation, Rule};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn indented(block: &str) {
    for line in block.lines() {
        println!("  {}", line);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "notebook")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Load, split, fit and evaluate notebook chapters")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a chapter described by a JSON config file
    Run {
        /// Chapter config file
        #[arg(short, long)]
        config: PathBuf,

        /// Override the dataset path in the config
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Run a built-in chapter against a data file
    Chapter {
        /// Chapter name (see `list`)
        name: String,

        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Print the chapter config as JSON instead of running it
        #[arg(long)]
        dump_config: bool,
    },

    /// List the built-in chapters
    List,

    /// Show data information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// Summarise columns of a data file
    Describe {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Columns to summarise; all when omitted
        #[arg(short, long)]
        column: Vec<String>,
    },

    /// Measure a single association rule over a basket file
    Rules {
        /// Basket file, one transaction per line
        #[arg(short, long)]
        baskets: PathBuf,

        /// Antecedent items
        #[arg(long, value_delimiter = ',')]
        lhs: Vec<String>,

        /// Consequent items
        #[arg(long, value_delimiter = ',', required = true)]
        rhs: Vec<String>,

        /// Item delimiter within a line
        #[arg(long, default_value = ",")]
        delimiter: char,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(config_path: &Path, data: Option<&Path>) -> anyhow::Result<()> {
    let mut config = ChapterConfig::from_file(config_path)?;
    if let Some(path) = data {
        config = config.with_data_path(path);
    }
    execute(&config)
}

pub fn cmd_chapter(name: &str, data: &Path, dump_config: bool) -> anyhow::Result<()> {
    let config = preset(name, data)?;
    if dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }
    execute(&config)
}

fn execute(config: &ChapterConfig) -> anyhow::Result<()> {
    section(&format!("Chapter {}", config.name));
    if !config.description.is_empty() {
        println!("  {}", muted(&config.description));
    }

    step_run(&format!("Running on {}", config.dataset.path.display()));
    let start = Instant::now();
    let report = run_chapter(config)?;
    step_done(&format!("{} rows in {:?}", report.rows, start.elapsed()));

    print_report(&report);
    Ok(())
}

fn print_report(report: &ChapterReport) {
    match &report.outcome {
        ChapterOutcome::Supervised {
            train_rows,
            test_rows,
            model_summary,
            evaluation,
        } => {
            println!("  {:<16} {}", muted("Train rows"), train_rows);
            println!("  {:<16} {}", muted("Test rows"), test_rows);

            section("Model");
            indented(model_summary);

            section("Evaluation");
            match evaluation {
                Evaluation::Classification {
                    confusion,
                    accuracy,
                    kappa,
                    ..
                } => {
                    indented(&confusion.render());
                    println!();
                    println!("  {:<16} {}", muted("Accuracy"), format!("{:.4}", accuracy).white().bold());
                    println!("  {:<16} {}", muted("Kappa"), format!("{:.4}", kappa).white());
                }
                Evaluation::Regression(metrics) => {
                    let r = metrics
                        .correlation
                        .map(|r| format!("{:.4}", r))
                        .unwrap_or_else(|| "NA".to_string());
                    println!("  {:<16} {}", muted("Correlation"), r.white().bold());
                    println!("  {:<16} {}", muted("MAE"), format!("{:.4}", metrics.mean_absolute_error).white());
                    println!();
                    indented(&metrics.histogram.to_string());
                }
            }
        }
        ChapterOutcome::Association {
            transactions,
            top_items,
            rules,
        } => {
            println!("  {:<16} {}", muted("Transactions"), transactions);

            section("Item frequency");
            for item in top_items {
                println!("  {:<32} {:>6} {:>8.4}", item.item, item.count, item.support);
            }

            section("Rules");
            println!(
                "  {:<48} {:>8} {:>10} {:>8} {:>6}",
                muted("Rule"),
                muted("Support"),
                muted("Confidence"),
                muted("Lift"),
                muted("Count")
            );
            for measured in rules {
                let m = &measured.measures;
                let line = format!(
                    "{:<48} {:>8.4} {:>10.4} {:>8.4} {:>6}",
                    measured.rule.to_string(),
                    m.support,
                    m.confidence,
                    m.lift,
                    m.count
                );
                if measured.meets_thresholds {
                    println!("  {}", line);
                } else {
                    println!("  {}", dim(&line));
                }
            }
        }
        ChapterOutcome::Summary {
            summaries,
            frequencies,
            crosstab,
        } => {
            for summary in summaries {
                section(&summary.column);
                indented(&summary.to_string());
            }
            for (column, levels) in frequencies {
                section(column);
                for level in levels {
                    println!("  {:<24} {:>6} {:>8.3}", level.level, level.count, level.proportion);
                }
            }
            if let Some(ct) = crosstab {
                section("Cross table");
                indented(&ct.to_string());
            }
        }
    }
    println!();
    println!("  {:<16} {:.3}s", muted("Time"), report.elapsed_secs);
    println!();
}

pub fn cmd_list() -> anyhow::Result<()> {
    section("Chapters");
    for (name, description) in PRESETS {
        println!("  {:<20} {}", name.white(), muted(description));
    }
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path, delimiter: char) -> anyhow::Result<()> {
    section("Data Info");

    let loader = DataLoader::new();
    let format = CsvFormat::new().with_delimiter(delimiter);
    let info = loader.file_info(data_path, &format)?;
    let table = loader.load_csv(data_path, &format)?;

    println!("  {:<12} {}", muted("File"), info.path);
    println!("  {:<12} {}", muted("Rows"), info.n_rows);
    println!("  {:<12} {}", muted("Columns"), info.n_cols);
    println!("  {:<12} {:.2} KB", muted("Size"), info.file_size as f64 / 1024.0);
    println!();

    println!("  {:<24} {:<12} {:>8}", muted("Column"), muted("Role"), muted("Levels"));
    println!("  {}", dim(&"─".repeat(46)));

    for (name, role) in table.schema() {
        let levels = match role {
            ColumnRole::Categorical => table.levels(&name).map(|l| l.len().to_string()).unwrap_or_default(),
            _ => String::new(),
        };
        println!(
            "  {:<24} {:<12} {:>8}",
            name,
            format!("{:?}", role).truecolor(140, 140, 140),
            levels
        );
    }

    println!();
    Ok(())
}

pub fn cmd_describe(data_path: &Path, columns: &[String]) -> anyhow::Result<()> {
    let table = DataLoader::new().load_csv(data_path, &CsvFormat::new())?;
    let columns = if columns.is_empty() {
        table.column_names()
    } else {
        columns.to_vec()
    };

    for column in &columns {
        section(column);
        match table.role(column) {
            Some(ColumnRole::Numeric) => indented(&describe(&table, column)?.to_string()),
            Some(_) => {
                for level in frequency(&table, column)? {
                    println!("  {:<24} {:>6} {:>8.3}", level.level, level.count, level.proportion);
                }
            }
            None => anyhow::bail!("column '{}' not found", column),
        }
    }
    println!();
    Ok(())
}

pub fn cmd_rules(baskets: &Path, lhs: &[String], rhs: &[String], delimiter: char) -> anyhow::Result<()> {
    section("Rule");

    step_run("Loading baskets");
    let transactions = DataLoader::new().load_transactions(baskets, delimiter)?;
    step_done(&format!("{} transactions", transactions.len()));

    let lhs: Vec<&str> = lhs.iter().map(|s| s.as_str()).collect();
    let rhs: Vec<&str> = rhs.iter().map(|s| s.as_str()).collect();
    let rule = Rule::new(&lhs, &rhs)?;
    let m = transactions.measure(&rule);

    println!();
    println!("  {}", rule.to_string().white().bold());
    println!("  {:<12} {:.4}", muted("Support"), m.support);
    println!("  {:<12} {:.4}", muted("Confidence"), m.confidence);
    println!("  {:<12} {:.4}", muted("Lift"), m.lift);
    println!("  {:<12} {}", muted("Count"), m.count);
    println!();
    Ok(())
}
