//! Fit configuration: algorithm families and their hyperparameters

use crate::error::{NotebookError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What kind of target an algorithm family learns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Classification,
    Regression,
    Association,
}

/// The fixed set of supported algorithm families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// C5.0-style decision tree, optionally boosted and cost-sensitive
    DecisionTree,
    /// Majority-class baseline
    ZeroRule,
    /// Single-feature rule set
    OneRule,
    /// Incremental reduced-error pruning rule learner
    Ripper,
    /// Categorical naive Bayes with additive smoothing
    NaiveBayes,
    /// Multilayer perceptron regression
    NeuralNetwork,
    /// Support-vector classification
    Svm,
    /// Frequent itemset / association rule mining
    Apriori,
    /// CART regression tree
    RegressionTree,
    /// M5-style model tree
    ModelTree,
    /// k-nearest-neighbour classification
    Knn,
    /// Ordinary least squares
    LinearRegression,
}

/// Hyperparameter names, as recognised per family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hyperparameter {
    Trials,
    Costs,
    MaxDepth,
    Seed,
    Laplace,
    Hidden,
    Kernel,
    Penalty,
    Support,
    Confidence,
    MinLen,
    MinSplit,
    K,
    Weighting,
}

impl fmt::Display for Hyperparameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hyperparameter::Trials => "trials",
            Hyperparameter::Costs => "costs",
            Hyperparameter::MaxDepth => "max_depth",
            Hyperparameter::Seed => "seed",
            Hyperparameter::Laplace => "laplace",
            Hyperparameter::Hidden => "hidden",
            Hyperparameter::Kernel => "kernel",
            Hyperparameter::Penalty => "penalty",
            Hyperparameter::Support => "support",
            Hyperparameter::Confidence => "confidence",
            Hyperparameter::MinLen => "min_len",
            Hyperparameter::MinSplit => "min_split",
            Hyperparameter::K => "k",
            Hyperparameter::Weighting => "weighting",
        };
        write!(f, "{}", name)
    }
}

impl Algorithm {
    pub const ALL: [Algorithm; 12] = [
        Algorithm::DecisionTree,
        Algorithm::ZeroRule,
        Algorithm::OneRule,
        Algorithm::Ripper,
        Algorithm::NaiveBayes,
        Algorithm::NeuralNetwork,
        Algorithm::Svm,
        Algorithm::Apriori,
        Algorithm::RegressionTree,
        Algorithm::ModelTree,
        Algorithm::Knn,
        Algorithm::LinearRegression,
    ];

    pub fn task(&self) -> TaskType {
        match self {
            Algorithm::DecisionTree
            | Algorithm::ZeroRule
            | Algorithm::OneRule
            | Algorithm::Ripper
            | Algorithm::NaiveBayes
            | Algorithm::Svm
            | Algorithm::Knn => TaskType::Classification,
            Algorithm::NeuralNetwork
            | Algorithm::RegressionTree
            | Algorithm::ModelTree
            | Algorithm::LinearRegression => TaskType::Regression,
            Algorithm::Apriori => TaskType::Association,
        }
    }

    /// Hyperparameters this family accepts
    pub fn recognized(&self) -> &'static [Hyperparameter] {
        use Hyperparameter::*;
        match self {
            Algorithm::DecisionTree => &[Trials, Costs, MaxDepth, Seed],
            Algorithm::ZeroRule | Algorithm::OneRule | Algorithm::Ripper => &[],
            Algorithm::NaiveBayes => &[Laplace],
            Algorithm::NeuralNetwork => &[Hidden, Seed],
            Algorithm::Svm => &[Kernel, Penalty],
            Algorithm::Apriori => &[Support, Confidence, MinLen],
            Algorithm::RegressionTree | Algorithm::ModelTree => &[MaxDepth, MinSplit],
            Algorithm::Knn => &[K, Weighting],
            Algorithm::LinearRegression => &[],
        }
    }

    /// Whether a learner binding exists for this family
    pub fn is_bound(&self) -> bool {
        !matches!(
            self,
            Algorithm::Ripper | Algorithm::ModelTree | Algorithm::Apriori
        )
    }

    /// Conventional name of the procedure this family stands for
    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::DecisionTree => "C5.0 decision tree",
            Algorithm::ZeroRule => "ZeroR",
            Algorithm::OneRule => "OneR",
            Algorithm::Ripper => "RIPPER (JRip)",
            Algorithm::NaiveBayes => "naive Bayes",
            Algorithm::NeuralNetwork => "multilayer perceptron",
            Algorithm::Svm => "support vector machine",
            Algorithm::Apriori => "Apriori",
            Algorithm::RegressionTree => "regression tree (rpart)",
            Algorithm::ModelTree => "model tree (M5P)",
            Algorithm::Knn => "k-nearest neighbours",
            Algorithm::LinearRegression => "linear regression",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Algorithm {
    type Err = NotebookError;

    fn from_str(s: &str) -> Result<Self> {
        let algorithm = match s.to_lowercase().as_str() {
            "decision_tree" | "c5.0" | "c50" | "tree" => Algorithm::DecisionTree,
            "zero_rule" | "zeror" => Algorithm::ZeroRule,
            "one_rule" | "oner" => Algorithm::OneRule,
            "ripper" | "jrip" => Algorithm::Ripper,
            "naive_bayes" | "nb" => Algorithm::NaiveBayes,
            "neural_network" | "mlp" | "neuralnet" => Algorithm::NeuralNetwork,
            "svm" | "ksvm" => Algorithm::Svm,
            "apriori" => Algorithm::Apriori,
            "regression_tree" | "rpart" => Algorithm::RegressionTree,
            "model_tree" | "m5p" => Algorithm::ModelTree,
            "knn" | "kknn" => Algorithm::Knn,
            "linear_regression" | "lm" => Algorithm::LinearRegression,
            other => {
                return Err(NotebookError::Config(format!("unknown algorithm '{}'", other)))
            }
        };
        Ok(algorithm)
    }
}

/// SVM kernel family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Kernel {
    Linear,
    /// Gaussian kernel; `gamma` defaults to `1 / n_features`
    Rbf { gamma: Option<f64> },
    Polynomial { degree: f64, gamma: f64, coef0: f64 },
    Sigmoid { gamma: f64, coef0: f64 },
}

/// Neighbour vote weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    Uniform,
    /// Votes weighted by inverse distance
    Distance,
}

/// Misclassification costs, indexed `[predicted][actual]` over `levels`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMatrix {
    pub levels: Vec<String>,
    pub costs: Vec<Vec<f64>>,
}

impl CostMatrix {
    pub fn new(levels: &[&str], costs: Vec<Vec<f64>>) -> Self {
        Self {
            levels: levels.iter().map(|s| s.to_string()).collect(),
            costs,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.levels.len();
        if n < 2 {
            return Err(NotebookError::Fit("cost matrix needs at least two levels".to_string()));
        }
        if self.costs.len() != n || self.costs.iter().any(|row| row.len() != n) {
            return Err(NotebookError::Fit(format!(
                "cost matrix must be {}x{} to match its levels",
                n, n
            )));
        }
        if self.costs.iter().flatten().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(NotebookError::Fit("costs must be finite and non-negative".to_string()));
        }
        Ok(())
    }

    /// Cost of predicting `predicted` when the truth is `actual`
    pub fn cost(&self, predicted: &str, actual: &str) -> Option<f64> {
        let p = self.levels.iter().position(|l| l == predicted)?;
        let a = self.levels.iter().position(|l| l == actual)?;
        Some(self.costs[p][a])
    }

    /// Total cost of misclassifying each actual level
    pub fn misclassification_weight(&self, actual: &str) -> Option<f64> {
        let a = self.levels.iter().position(|l| l == actual)?;
        Some(
            (0..self.levels.len())
                .filter(|&p| p != a)
                .map(|p| self.costs[p][a])
                .sum(),
        )
    }
}

/// Named hyperparameters; only those a family recognises may be set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Boosting iterations
    pub trials: Option<usize>,
    pub costs: Option<CostMatrix>,
    pub max_depth: Option<u16>,
    pub seed: Option<u64>,
    /// Additive smoothing added to every frequency count
    pub laplace: Option<f64>,
    /// Hidden units
    pub hidden: Option<usize>,
    pub kernel: Option<Kernel>,
    /// SVM soft-margin penalty C
    pub penalty: Option<f64>,
    pub support: Option<f64>,
    pub confidence: Option<f64>,
    pub min_len: Option<usize>,
    pub min_split: Option<usize>,
    pub k: Option<usize>,
    pub weighting: Option<Weighting>,
    /// Keys that name no hyperparameter, kept so validation can reject them
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl Hyperparameters {
    /// Names of the hyperparameters that were set
    pub fn supplied(&self) -> Vec<Hyperparameter> {
        let mut names = Vec::new();
        let mut mark = |set: bool, name: Hyperparameter| {
            if set {
                names.push(name);
            }
        };
        mark(self.trials.is_some(), Hyperparameter::Trials);
        mark(self.costs.is_some(), Hyperparameter::Costs);
        mark(self.max_depth.is_some(), Hyperparameter::MaxDepth);
        mark(self.seed.is_some(), Hyperparameter::Seed);
        mark(self.laplace.is_some(), Hyperparameter::Laplace);
        mark(self.hidden.is_some(), Hyperparameter::Hidden);
        mark(self.kernel.is_some(), Hyperparameter::Kernel);
        mark(self.penalty.is_some(), Hyperparameter::Penalty);
        mark(self.support.is_some(), Hyperparameter::Support);
        mark(self.confidence.is_some(), Hyperparameter::Confidence);
        mark(self.min_len.is_some(), Hyperparameter::MinLen);
        mark(self.min_split.is_some(), Hyperparameter::MinSplit);
        mark(self.k.is_some(), Hyperparameter::K);
        mark(self.weighting.is_some(), Hyperparameter::Weighting);
        names
    }

    fn check_values(&self) -> Result<()> {
        let invalid = |name: &str, reason: &str| {
            Err(NotebookError::Fit(format!("invalid {}: {}", name, reason)))
        };
        if self.trials == Some(0) {
            return invalid("trials", "must be at least 1");
        }
        if let Some(costs) = &self.costs {
            costs.validate()?;
        }
        if self.max_depth == Some(0) {
            return invalid("max_depth", "must be at least 1");
        }
        if let Some(laplace) = self.laplace {
            if !laplace.is_finite() || laplace < 0.0 {
                return invalid("laplace", "must be a non-negative number");
            }
        }
        if self.hidden == Some(0) {
            return invalid("hidden", "must be at least 1");
        }
        if let Some(penalty) = self.penalty {
            if !(penalty > 0.0) {
                return invalid("penalty", "must be positive");
            }
        }
        if let Some(Kernel::Rbf { gamma: Some(gamma) }) = self.kernel {
            if !(gamma > 0.0) {
                return invalid("kernel", "rbf gamma must be positive");
            }
        }
        if let Some(support) = self.support {
            if !(support > 0.0 && support <= 1.0) {
                return invalid("support", "must be in (0, 1]");
            }
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return invalid("confidence", "must be in [0, 1]");
            }
        }
        if self.min_len == Some(0) {
            return invalid("min_len", "must be at least 1");
        }
        if let Some(min_split) = self.min_split {
            if min_split < 2 {
                return invalid("min_split", "must be at least 2");
            }
        }
        if self.k == Some(0) {
            return invalid("k", "must be at least 1");
        }
        Ok(())
    }
}

/// Everything the fitter needs besides the training table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    pub algorithm: Algorithm,
    pub target: String,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
}

impl FitConfig {
    pub fn new(algorithm: Algorithm, target: &str) -> Self {
        Self {
            algorithm,
            target: target.to_string(),
            hyperparameters: Hyperparameters::default(),
        }
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.hyperparameters.trials = Some(trials);
        self
    }

    pub fn with_costs(mut self, costs: CostMatrix) -> Self {
        self.hyperparameters.costs = Some(costs);
        self
    }

    pub fn with_max_depth(mut self, depth: u16) -> Self {
        self.hyperparameters.max_depth = Some(depth);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.hyperparameters.seed = Some(seed);
        self
    }

    pub fn with_laplace(mut self, laplace: f64) -> Self {
        self.hyperparameters.laplace = Some(laplace);
        self
    }

    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hyperparameters.hidden = Some(hidden);
        self
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.hyperparameters.kernel = Some(kernel);
        self
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.hyperparameters.penalty = Some(penalty);
        self
    }

    pub fn with_support(mut self, support: f64) -> Self {
        self.hyperparameters.support = Some(support);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.hyperparameters.confidence = Some(confidence);
        self
    }

    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.hyperparameters.min_len = Some(min_len);
        self
    }

    pub fn with_min_split(mut self, min_split: usize) -> Self {
        self.hyperparameters.min_split = Some(min_split);
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.hyperparameters.k = Some(k);
        self
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.hyperparameters.weighting = Some(weighting);
        self
    }

    /// Reject hyperparameters the family does not recognise and invalid values
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = self.hyperparameters.unknown.keys().next() {
            return Err(NotebookError::Fit(format!(
                "hyperparameter '{}' is not recognised by {}",
                name, self.algorithm
            )));
        }
        let recognized = self.algorithm.recognized();
        if let Some(extra) = self
            .hyperparameters
            .supplied()
            .into_iter()
            .find(|h| !recognized.contains(h))
        {
            return Err(NotebookError::Fit(format!(
                "hyperparameter '{}' is not recognised by {}",
                extra, self.algorithm
            )));
        }
        self.hyperparameters.check_values()
    }
}
