//! Chapter run configuration

use crate::data::{CsvFormat, SplitStrategy};
use crate::error::{NotebookError, Result};
use crate::preprocessing::Transform;
use crate::training::{Algorithm, FitConfig, TaskType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a chapter reads its data from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub path: PathBuf,
    #[serde(default)]
    pub format: CsvFormat,
}

/// Turn a free-text column into term presence columns after splitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStep {
    pub column: String,
    #[serde(default = "default_min_frequency")]
    pub min_frequency: usize,
}

fn default_min_frequency() -> usize {
    5
}

/// A rule to measure against basket data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub lhs: Vec<String>,
    pub rhs: Vec<String>,
}

/// What a chapter does once its data is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChapterTask {
    /// Split, fit and evaluate. Without a split the model is fitted and
    /// evaluated on the whole table.
    Supervised {
        #[serde(default)]
        split: Option<SplitStrategy>,
        fit: FitConfig,
    },
    /// Measure rules over basket data with the thresholds in `fit`
    Association {
        fit: FitConfig,
        #[serde(default)]
        rules: Vec<RuleSpec>,
        #[serde(default = "default_top_items")]
        top_items: usize,
    },
    /// Describe columns and optionally cross-tabulate two of them
    Summary {
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default)]
        crosstab: Option<(String, String)>,
    },
}

fn default_top_items() -> usize {
    10
}

/// One complete notebook chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub dataset: DatasetSource,
    #[serde(default)]
    pub transforms: Vec<Transform>,
    #[serde(default)]
    pub text: Option<TextStep>,
    pub task: ChapterTask,
}

impl ChapterConfig {
    pub fn new(name: &str, path: impl Into<PathBuf>, task: ChapterTask) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            dataset: DatasetSource {
                path: path.into(),
                format: CsvFormat::default(),
            },
            transforms: Vec::new(),
            text: None,
            task,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_format(mut self, format: CsvFormat) -> Self {
        self.dataset.format = format;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn with_text(mut self, column: &str, min_frequency: usize) -> Self {
        self.text = Some(TextStep {
            column: column.to_string(),
            min_frequency,
        });
        self
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset.path = path.into();
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Structural checks that do not need the data
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(NotebookError::Config("chapter name must not be empty".to_string()));
        }
        match &self.task {
            ChapterTask::Supervised { fit, .. } => {
                fit.validate()?;
                if fit.algorithm.task() == TaskType::Association {
                    return Err(NotebookError::Config(format!(
                        "{} cannot drive a supervised chapter",
                        fit.algorithm
                    )));
                }
            }
            ChapterTask::Association { fit, rules, .. } => {
                fit.validate()?;
                if fit.algorithm != Algorithm::Apriori {
                    return Err(NotebookError::Config(format!(
                        "association chapters need apriori, got {}",
                        fit.algorithm
                    )));
                }
                if !self.transforms.is_empty() || self.text.is_some() {
                    return Err(NotebookError::Config(
                        "transforms do not apply to basket data".to_string(),
                    ));
                }
                if rules.iter().any(|r| r.rhs.is_empty()) {
                    return Err(NotebookError::Config(
                        "every rule needs a consequent".to_string(),
                    ));
                }
            }
            ChapterTask::Summary { .. } => {}
        }
        Ok(())
    }
}
