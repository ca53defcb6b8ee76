//! Text classifiers
//!
//! Every algorithm implements [`Classifier`]. Training code picks one by name
//! through [`AlgorithmConfig`] and keeps the result as a [`FittedModel`],
//! which is what gets serialized into model artifacts.

pub mod decision_tree;
pub mod knn;
pub mod metrics;
pub mod naive_automatic;
pub mod naive_bayes;
pub mod split;
pub mod tfidf;

pub use decision_tree::{DecisionTreeParams, TfidfDecisionTree};
pub use knn::{CustomKnn, KnnParams};
pub use metrics::{classification_metrics, ClassificationMetrics};
pub use naive_automatic::{KeywordCountModel, NaiveAutomaticParams};
pub use naive_bayes::{CustomNaiveBayes, FeatureRep, NaiveBayesParams, Ngram};
pub use split::{stratified_split, Split};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Invalid hyperparameters: {0}")]
    InvalidHyperparameters(String),

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Got {texts} texts but {labels} labels")]
    LengthMismatch { texts: usize, labels: usize },

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Need at least {needed} labeled rows, found {found}")]
    TooFewRows { needed: usize, found: usize },
}

pub(crate) fn check_training_input(texts: &[String], labels: &[i64]) -> Result<(), ModelError> {
    if texts.len() != labels.len() {
        return Err(ModelError::LengthMismatch {
            texts: texts.len(),
            labels: labels.len(),
        });
    }
    if texts.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    Ok(())
}

/// Supervised text classifier
pub trait Classifier {
    fn fit(&mut self, texts: &[String], labels: &[i64]) -> Result<(), ModelError>;

    fn predict_one(&self, text: &str) -> Result<i64, ModelError>;

    fn predict(&self, texts: &[String]) -> Result<Vec<i64>, ModelError> {
        texts.iter().map(|t| self.predict_one(t)).collect()
    }
}

/// Algorithm choice with its hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub enum AlgorithmConfig {
    Knn(KnnParams),
    NaiveBayes(NaiveBayesParams),
    NaiveAutomatic(NaiveAutomaticParams),
    DecisionTree(DecisionTreeParams),
}

fn params_from<T>(hyperparameters: Option<&Value>) -> Result<T, ModelError>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match hyperparameters {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ModelError::InvalidHyperparameters(e.to_string())),
    }
}

impl AlgorithmConfig {
    pub const NAMES: [&'static str; 4] = ["knn", "naive_bayes", "naive_automatic", "decision_tree"];

    /// Resolve an algorithm name and optional JSON hyperparameters
    ///
    /// Missing hyperparameters take the per-algorithm defaults.
    pub fn parse(name: &str, hyperparameters: Option<&Value>) -> Result<Self, ModelError> {
        let config = match name {
            "knn" => AlgorithmConfig::Knn(params_from(hyperparameters)?),
            "naive_bayes" => AlgorithmConfig::NaiveBayes(params_from(hyperparameters)?),
            "naive_automatic" => AlgorithmConfig::NaiveAutomatic(params_from(hyperparameters)?),
            "decision_tree" => AlgorithmConfig::DecisionTree(params_from(hyperparameters)?),
            other => return Err(ModelError::UnknownAlgorithm(other.to_string())),
        };
        // surface bad values before any job exists; keyword lists are
        // resolved from the keyword store later
        if !matches!(config, AlgorithmConfig::NaiveAutomatic(_)) {
            config.build()?;
        }
        Ok(config)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmConfig::Knn(_) => "knn",
            AlgorithmConfig::NaiveBayes(_) => "naive_bayes",
            AlgorithmConfig::NaiveAutomatic(_) => "naive_automatic",
            AlgorithmConfig::DecisionTree(_) => "decision_tree",
        }
    }

    pub fn hyperparameters(&self) -> Value {
        let value = match self {
            AlgorithmConfig::Knn(p) => serde_json::to_value(p),
            AlgorithmConfig::NaiveBayes(p) => serde_json::to_value(p),
            AlgorithmConfig::NaiveAutomatic(p) => serde_json::to_value(p),
            AlgorithmConfig::DecisionTree(p) => serde_json::to_value(p),
        };
        value.unwrap_or(Value::Null)
    }

    fn build(&self) -> Result<FittedModel, ModelError> {
        Ok(match self {
            AlgorithmConfig::Knn(p) => FittedModel::Knn(CustomKnn::new(*p)?),
            AlgorithmConfig::NaiveBayes(p) => FittedModel::NaiveBayes(CustomNaiveBayes::new(p.clone())),
            AlgorithmConfig::NaiveAutomatic(p) => FittedModel::NaiveAutomatic(KeywordCountModel::new(
                p.positives.clone().unwrap_or_default(),
                p.negatives.clone().unwrap_or_default(),
            )?),
            AlgorithmConfig::DecisionTree(p) => FittedModel::DecisionTree(TfidfDecisionTree::new(*p)?),
        })
    }

    /// Build and fit the configured model
    pub fn train(&self, texts: &[String], labels: &[i64]) -> Result<FittedModel, ModelError> {
        let mut model = self.build()?;
        model.fit(texts, labels)?;
        Ok(model)
    }
}

/// A trained model of any supported algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FittedModel {
    Knn(CustomKnn),
    NaiveBayes(CustomNaiveBayes),
    NaiveAutomatic(KeywordCountModel),
    DecisionTree(TfidfDecisionTree),
}

impl FittedModel {
    pub fn algorithm(&self) -> &'static str {
        match self {
            FittedModel::Knn(_) => "knn",
            FittedModel::NaiveBayes(_) => "naive_bayes",
            FittedModel::NaiveAutomatic(_) => "naive_automatic",
            FittedModel::DecisionTree(_) => "decision_tree",
        }
    }

    fn classifier(&self) -> &dyn Classifier {
        match self {
            FittedModel::Knn(m) => m,
            FittedModel::NaiveBayes(m) => m,
            FittedModel::NaiveAutomatic(m) => m,
            FittedModel::DecisionTree(m) => m,
        }
    }

    fn classifier_mut(&mut self) -> &mut dyn Classifier {
        match self {
            FittedModel::Knn(m) => m,
            FittedModel::NaiveBayes(m) => m,
            FittedModel::NaiveAutomatic(m) => m,
            FittedModel::DecisionTree(m) => m,
        }
    }
}

impl Classifier for FittedModel {
    fn fit(&mut self, texts: &[String], labels: &[i64]) -> Result<(), ModelError> {
        self.classifier_mut().fit(texts, labels)
    }

    fn predict_one(&self, text: &str) -> Result<i64, ModelError> {
        self.classifier().predict_one(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults_and_names() {
        for name in AlgorithmConfig::NAMES {
            let config = AlgorithmConfig::parse(name, None).unwrap();
            assert_eq!(config.name(), name);
        }
        assert_eq!(
            AlgorithmConfig::parse("knn", None).unwrap(),
            AlgorithmConfig::Knn(KnnParams { k: 5 })
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_bad_values() {
        assert!(matches!(
            AlgorithmConfig::parse("svm", None),
            Err(ModelError::UnknownAlgorithm(name)) if name == "svm"
        ));
        assert!(matches!(
            AlgorithmConfig::parse("knn", Some(&json!({"k": 0}))),
            Err(ModelError::InvalidHyperparameters(_))
        ));
        assert!(matches!(
            AlgorithmConfig::parse("naive_bayes", Some(&json!({"ngram": "fourgram"}))),
            Err(ModelError::InvalidHyperparameters(_))
        ));
    }

    #[test]
    fn test_parse_hyperparameters() {
        let config = AlgorithmConfig::parse(
            "naive_bayes",
            Some(&json!({"ngram": "bigram", "feature_rep": "binary"})),
        )
        .unwrap();
        assert_eq!(
            config.hyperparameters(),
            json!({"ngram": "bigram", "feature_rep": "binary", "vocabulary": null})
        );
    }

    #[test]
    fn test_naive_automatic_requires_keywords_to_train() {
        let config = AlgorithmConfig::parse("naive_automatic", None).unwrap();
        assert!(config.train(&strings(&["x"]), &[4]).is_err());

        let config = AlgorithmConfig::NaiveAutomatic(NaiveAutomaticParams {
            positives: Some(vec!["good".into()]),
            negatives: Some(vec!["bad".into()]),
        });
        let model = config.train(&strings(&["x"]), &[4]).unwrap();
        assert_eq!(model.predict_one("good stuff").unwrap(), 4);
    }

    #[test]
    fn test_fitted_model_survives_json() {
        let config = AlgorithmConfig::parse("knn", Some(&json!({"k": 1}))).unwrap();
        let model = config
            .train(&strings(&["happy happy day", "sad rainy day"]), &[4, 0])
            .unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: FittedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.algorithm(), "knn");
        assert_eq!(
            restored.predict(&strings(&["happy day", "rainy day"])).unwrap(),
            vec![4, 0]
        );
    }

    #[test]
    fn test_every_algorithm_trains() {
        let texts = strings(&[
            "great lovely happy",
            "lovely great",
            "awful terrible sad",
            "terrible awful",
        ]);
        let labels = [4, 4, 0, 0];
        let configs = [
            AlgorithmConfig::Knn(KnnParams { k: 1 }),
            AlgorithmConfig::NaiveBayes(NaiveBayesParams::default()),
            AlgorithmConfig::DecisionTree(DecisionTreeParams::default()),
            AlgorithmConfig::NaiveAutomatic(NaiveAutomaticParams {
                positives: Some(vec!["great".into()]),
                negatives: Some(vec!["awful".into()]),
            }),
        ];
        for config in configs {
            let model = config.train(&texts, &labels).unwrap();
            assert_eq!(model.algorithm(), config.name());
            assert_eq!(model.predict(&texts).unwrap()[0], 4, "{}", config.name());
            assert_eq!(model.predict(&texts).unwrap()[2], 0, "{}", config.name());
        }
    }
}
