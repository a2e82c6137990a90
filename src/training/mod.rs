//! Model fitting module
//!
//! Supported algorithm families:
//! - C5.0-style decision trees with boosting and misclassification costs
//! - ZeroR and OneR rule learners
//! - Categorical naive Bayes with Laplace smoothing
//! - k-nearest neighbours
//! - Support vector machines (one-vs-one)
//! - Regression trees
//! - Ordinary least squares
//! - Multilayer perceptron regression
//!
//! RIPPER, model trees and Apriori are recognised in
//! configurations but have no learner binding; fitting them is a fit error.

mod boosting;
mod config;
mod engine;
mod features;
pub mod decision_tree;
pub mod knn;
pub mod linear_models;
pub mod naive_bayes;
pub mod neural_network;
pub mod one_rule;
pub mod svm;

pub use boosting::BoostedTrees;
pub use config::{
    Algorithm, CostMatrix, FitConfig, Hyperparameter, Hyperparameters, Kernel, TaskType, Weighting,
};
pub use engine::{FittedModel, Fitter, Predictions, TrainedModel};
pub use features::{FeatureEncoder, LabelEncoder};
pub use linear_models::LinearModel;
pub use naive_bayes::NaiveBayes;
pub use neural_network::MlpRegressor;
pub use one_rule::{OneRule, ZeroRule};
