//! Fitting and predicting
//!
//! [`Fitter::fit`] checks a [`FitConfig`] against the training table,
//! dispatches to the learner for the requested family and returns a
//! [`FittedModel`] that remembers everything needed to predict on new rows.

use super::boosting::{cost_weights, BoostedTrees};
use super::config::{Algorithm, FitConfig, TaskType, Weighting};
use super::decision_tree::RegressionTree;
use super::features::{FeatureEncoder, LabelEncoder};
use super::knn::KnnClassifier;
use super::linear_models::LinearModel;
use super::naive_bayes::NaiveBayes;
use super::neural_network::{MlpRegressor, DEFAULT_HIDDEN};
use super::one_rule::{OneRule, ZeroRule};
use super::svm::SvmClassifier;
use crate::data::{ColumnRole, Table};
use crate::error::{NotebookError, Result};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

const DEFAULT_SEED: u64 = 42;
const DEFAULT_K: usize = 7;

/// Fitted state, one variant per bound family
pub enum TrainedModel {
    ZeroRule(ZeroRule),
    OneRule(OneRule),
    NaiveBayes(NaiveBayes),
    DecisionTree(BoostedTrees),
    Knn(KnnClassifier),
    Svm(SvmClassifier),
    RegressionTree(RegressionTree),
    LinearRegression(LinearModel),
    NeuralNetwork(MlpRegressor),
}

impl TrainedModel {
    fn name(&self) -> &'static str {
        match self {
            TrainedModel::ZeroRule(_) => "ZeroRule",
            TrainedModel::OneRule(_) => "OneRule",
            TrainedModel::NaiveBayes(_) => "NaiveBayes",
            TrainedModel::DecisionTree(_) => "DecisionTree",
            TrainedModel::Knn(_) => "Knn",
            TrainedModel::Svm(_) => "Svm",
            TrainedModel::RegressionTree(_) => "RegressionTree",
            TrainedModel::LinearRegression(_) => "LinearRegression",
            TrainedModel::NeuralNetwork(_) => "NeuralNetwork",
        }
    }
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrainedModel::{}", self.name())
    }
}

/// Raw model output, one entry per input row
#[derive(Debug, Clone, PartialEq)]
pub enum Predictions {
    Labels(Vec<String>),
    Values(Vec<f64>),
}

impl Predictions {
    pub fn len(&self) -> usize {
        match self {
            Predictions::Labels(v) => v.len(),
            Predictions::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A model fitted on one training table
#[derive(Debug)]
pub struct FittedModel {
    config: FitConfig,
    model: TrainedModel,
    encoder: Option<FeatureEncoder>,
    labels: Option<LabelEncoder>,
    n_train: usize,
    training_time_secs: f64,
}

/// Encoding problems while fitting are fit errors, not predict errors
fn at_fit(e: NotebookError) -> NotebookError {
    match e {
        NotebookError::Predict(msg) => NotebookError::Fit(msg),
        other => other,
    }
}

pub struct Fitter;

impl Fitter {
    /// Fit `config.algorithm` on `table`, predicting `config.target`.
    ///
    /// Fails with a fit error when a hyperparameter is not recognised, the
    /// family has no learner binding, the target is missing or has the wrong
    /// role, a feature or target value is missing, or the learner rejects the data.
    pub fn fit(table: &Table, config: &FitConfig) -> Result<FittedModel> {
        config.validate()?;
        let algorithm = config.algorithm;
        if !algorithm.is_bound() {
            return Err(NotebookError::Fit(format!(
                "no binding for {} in the linked learner library",
                algorithm
            )));
        }
        Self::check_table(table, config)?;

        info!(algorithm = %algorithm, rows = table.n_rows(), target = %config.target, "fitting model");
        let start = Instant::now();

        let (model, encoder, labels) = match algorithm.task() {
            TaskType::Classification => Self::fit_classifier(table, config)?,
            TaskType::Regression => Self::fit_regressor(table, config)?,
            TaskType::Association => {
                return Err(NotebookError::Fit(format!(
                    "{} does not fit a predictive model",
                    algorithm
                )))
            }
        };

        let training_time_secs = start.elapsed().as_secs_f64();
        info!(model = model.name(), secs = training_time_secs, "model fitted");

        Ok(FittedModel {
            config: config.clone(),
            model,
            encoder,
            labels,
            n_train: table.n_rows(),
            training_time_secs,
        })
    }

    fn check_table(table: &Table, config: &FitConfig) -> Result<()> {
        let target = config.target.as_str();
        let role = table.role(target).ok_or_else(|| {
            NotebookError::Fit(format!("target column '{}' not found", target))
        })?;
        let expected = match config.algorithm.task() {
            TaskType::Regression => ColumnRole::Numeric,
            _ => ColumnRole::Categorical,
        };
        if role != expected {
            return Err(NotebookError::Fit(format!(
                "{} needs a {} target; '{}' is {}",
                config.algorithm, expected, target, role
            )));
        }
        if table.n_rows() == 0 {
            return Err(NotebookError::Fit("cannot fit on an empty table".to_string()));
        }
        for (name, role) in table.schema() {
            if role == ColumnRole::Identifier {
                continue;
            }
            if table.labels_opt(&name)?.iter().any(|v| v.is_none()) {
                return Err(NotebookError::Fit(format!("missing value in column '{}'", name)));
            }
        }
        Ok(())
    }

    fn fit_classifier(
        table: &Table,
        config: &FitConfig,
    ) -> Result<(TrainedModel, Option<FeatureEncoder>, Option<LabelEncoder>)> {
        let hp = &config.hyperparameters;
        let y_labels = table.labels(&config.target)?;
        let labels = LabelEncoder::fit(&y_labels);
        let n_classes = labels.classes().len();
        if n_classes < 2 {
            return Err(NotebookError::Fit(format!(
                "target '{}' has a single class",
                config.target
            )));
        }
        debug!(classes = ?labels.classes(), "target levels");

        let model = match config.algorithm {
            Algorithm::ZeroRule => {
                return Ok((TrainedModel::ZeroRule(ZeroRule::fit(table, &config.target)?), None, Some(labels)))
            }
            Algorithm::OneRule => {
                return Ok((TrainedModel::OneRule(OneRule::fit(table, &config.target)?), None, Some(labels)))
            }
            Algorithm::NaiveBayes => {
                let model = NaiveBayes::fit(table, &config.target, hp.laplace.unwrap_or(0.0))?;
                return Ok((TrainedModel::NaiveBayes(model), None, Some(labels)));
            }
            other => other,
        };

        let encoder = FeatureEncoder::fit(table, &config.target)?;
        let x = encoder.encode(table).map_err(at_fit)?;
        let y = labels.encode(&y_labels)?;

        let trained = match model {
            Algorithm::DecisionTree => {
                let class_weights = match &hp.costs {
                    Some(costs) => {
                        if labels.classes().iter().any(|c| !costs.levels.contains(c)) {
                            return Err(NotebookError::Fit(format!(
                                "cost matrix levels {:?} do not cover target levels {:?}",
                                costs.levels,
                                labels.classes()
                            )));
                        }
                        labels
                            .classes()
                            .iter()
                            .map(|c| costs.misclassification_weight(c).unwrap_or(0.0))
                            .collect()
                    }
                    None => vec![1.0; n_classes],
                };
                let weights = cost_weights(&y, &class_weights);
                TrainedModel::DecisionTree(BoostedTrees::fit(
                    &x,
                    &y,
                    n_classes,
                    hp.trials.unwrap_or(1),
                    &weights,
                    hp.max_depth,
                    hp.seed.unwrap_or(DEFAULT_SEED),
                )?)
            }
            Algorithm::Knn => TrainedModel::Knn(KnnClassifier::fit(
                &x,
                &y,
                hp.k.unwrap_or(DEFAULT_K),
                hp.weighting.unwrap_or(Weighting::Uniform),
            )?),
            Algorithm::Svm => TrainedModel::Svm(SvmClassifier::fit(
                &x,
                &y,
                n_classes,
                hp.kernel,
                hp.penalty,
            )?),
            other => {
                return Err(NotebookError::Fit(format!(
                    "{} is not a classification family",
                    other
                )))
            }
        };
        Ok((trained, Some(encoder), Some(labels)))
    }

    fn fit_regressor(
        table: &Table,
        config: &FitConfig,
    ) -> Result<(TrainedModel, Option<FeatureEncoder>, Option<LabelEncoder>)> {
        let hp = &config.hyperparameters;
        let encoder = FeatureEncoder::fit(table, &config.target)?;
        let x = encoder.encode(table).map_err(at_fit)?;
        let y = table.numeric(&config.target)?;

        let trained = match config.algorithm {
            Algorithm::RegressionTree => {
                TrainedModel::RegressionTree(RegressionTree::fit(&x, &y, hp.max_depth, hp.min_split)?)
            }
            Algorithm::LinearRegression => TrainedModel::LinearRegression(LinearModel::fit(&x, &y)?),
            Algorithm::NeuralNetwork => TrainedModel::NeuralNetwork(MlpRegressor::fit(
                &x,
                &y,
                hp.hidden.unwrap_or(DEFAULT_HIDDEN),
                hp.seed.unwrap_or(DEFAULT_SEED),
            )?),
            other => {
                return Err(NotebookError::Fit(format!("{} is not a regression family", other)))
            }
        };
        Ok((trained, Some(encoder), None))
    }
}

impl FittedModel {
    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    pub fn target(&self) -> &str {
        &self.config.target
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn task(&self) -> TaskType {
        self.config.algorithm.task()
    }

    /// Target classes in code order; empty for regression
    pub fn classes(&self) -> &[String] {
        self.labels.as_ref().map(|l| l.classes()).unwrap_or(&[])
    }

    /// Inputs the model reads, after encoding where one applies
    pub fn feature_names(&self) -> Vec<String> {
        match (&self.model, &self.encoder) {
            (_, Some(encoder)) => encoder.feature_names(),
            (TrainedModel::NaiveBayes(nb), _) => nb.features().iter().map(|s| s.to_string()).collect(),
            (TrainedModel::OneRule(rule), _) => vec![rule.feature().to_string()],
            _ => Vec::new(),
        }
    }

    pub fn n_train(&self) -> usize {
        self.n_train
    }

    pub fn training_time_secs(&self) -> f64 {
        self.training_time_secs
    }

    /// Boosting trials actually kept, for decision trees
    pub fn trials_used(&self) -> Option<usize> {
        match &self.model {
            TrainedModel::DecisionTree(trees) => Some(trees.n_trials()),
            _ => None,
        }
    }

    pub fn trained(&self) -> &TrainedModel {
        &self.model
    }

    pub fn naive_bayes(&self) -> Option<&NaiveBayes> {
        match &self.model {
            TrainedModel::NaiveBayes(nb) => Some(nb),
            _ => None,
        }
    }

    pub fn one_rule(&self) -> Option<&OneRule> {
        match &self.model {
            TrainedModel::OneRule(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn neural_network(&self) -> Option<&MlpRegressor> {
        match &self.model {
            TrainedModel::NeuralNetwork(m) => Some(m),
            _ => None,
        }
    }

    pub fn linear(&self) -> Option<&LinearModel> {
        match &self.model {
            TrainedModel::LinearRegression(lm) => Some(lm),
            _ => None,
        }
    }

    fn decode(&self, codes: Vec<i32>) -> Result<Predictions> {
        let labels = self
            .labels
            .as_ref()
            .ok_or_else(|| NotebookError::Predict("model has no class labels".to_string()))?;
        let decoded = codes
            .into_iter()
            .map(|c| labels.decode(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Predictions::Labels(decoded))
    }

    fn encode(&self, table: &Table) -> Result<ndarray::Array2<f64>> {
        self.encoder
            .as_ref()
            .ok_or_else(|| NotebookError::Predict("model has no feature encoder".to_string()))?
            .encode(table)
    }

    /// Predict every row of `table`, in row order.
    ///
    /// The target column may be present or absent; it is never read.
    pub fn predict(&self, table: &Table) -> Result<Predictions> {
        if table.n_rows() == 0 {
            return Ok(match self.task() {
                TaskType::Regression => Predictions::Values(Vec::new()),
                _ => Predictions::Labels(Vec::new()),
            });
        }
        match &self.model {
            TrainedModel::ZeroRule(m) => Ok(Predictions::Labels(m.predict(table))),
            TrainedModel::OneRule(m) => Ok(Predictions::Labels(m.predict(table)?)),
            TrainedModel::NaiveBayes(m) => Ok(Predictions::Labels(m.predict(table)?)),
            TrainedModel::DecisionTree(m) => self.decode(m.predict(&self.encode(table)?)?),
            TrainedModel::Knn(m) => self.decode(m.predict(&self.encode(table)?)?),
            TrainedModel::Svm(m) => self.decode(m.predict(&self.encode(table)?)?),
            TrainedModel::RegressionTree(m) => Ok(Predictions::Values(m.predict(&self.encode(table)?)?)),
            TrainedModel::LinearRegression(m) => {
                Ok(Predictions::Values(m.predict(&self.encode(table)?)?))
            }
            TrainedModel::NeuralNetwork(m) => Ok(Predictions::Values(m.predict(&self.encode(table)?)?)),
        }
    }

    /// Human-readable description of the fitted model
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} on '{}' ({} training rows)\n",
            self.config.algorithm, self.config.target, self.n_train
        );
        let detail = match &self.model {
            TrainedModel::ZeroRule(m) => format!("always predicts '{}'\n", m.class()),
            TrainedModel::OneRule(m) => m.summary(),
            TrainedModel::NaiveBayes(m) => m.summary(),
            TrainedModel::DecisionTree(m) => format!("{} boosting trial(s)\n", m.n_trials()),
            TrainedModel::Knn(m) => m.summary(),
            TrainedModel::Svm(m) => m.summary(),
            TrainedModel::RegressionTree(m) => m.summary(),
            TrainedModel::LinearRegression(m) => m.summary(&self.feature_names()),
            TrainedModel::NeuralNetwork(m) => m.summary(),
        };
        out.push_str(&detail);
        out
    }
}
