//! Request bodies accepted by the job and model endpoints

use crate::classifiers::split::DEFAULT_TEST_SIZE;
use crate::classifiers::{AlgorithmConfig, ModelError};
use crate::labeling::{Annotation, ClusteringAlgorithm, ClusteringHyperparams, KeywordMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// How a labeling job assigns targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LabelRequest {
    Manual {
        annotations: Vec<Annotation>,
        #[serde(default)]
        stop_early: bool,
    },
    /// Keyword scoring; the stored default lists are used when `keywords` is absent
    Naive {
        #[serde(default)]
        keywords: Option<KeywordMap>,
    },
    Clustering {
        algorithm: ClusteringAlgorithm,
        #[serde(default)]
        hyperparameters: ClusteringHyperparams,
    },
}

impl LabelRequest {
    pub fn method(&self) -> &'static str {
        match self {
            LabelRequest::Manual { .. } => "manual",
            LabelRequest::Naive { .. } => "naive",
            LabelRequest::Clustering { .. } => "clustering",
        }
    }

    /// Hyperparameters recorded with the labeling
    pub fn hyperparameters(&self) -> Value {
        match self {
            LabelRequest::Manual { stop_early, annotations } => serde_json::json!({
                "stop_early": stop_early,
                "annotations": annotations.len(),
            }),
            LabelRequest::Naive { keywords } => serde_json::json!({
                "custom_keywords": keywords.is_some(),
            }),
            LabelRequest::Clustering {
                algorithm,
                hyperparameters,
            } => serde_json::json!({
                "algorithm": algorithm.as_str(),
                "hyperparameters": hyperparameters,
            }),
        }
    }
}

fn default_test_size() -> f64 {
    DEFAULT_TEST_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRequest {
    pub algorithm: String,
    #[serde(default)]
    pub hyperparameters: Option<Value>,
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl TrainRequest {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            hyperparameters: None,
            test_size: DEFAULT_TEST_SIZE,
            model_name: None,
        }
    }

    /// Resolve the algorithm and check the split size
    pub fn validate(&self) -> Result<AlgorithmConfig, ModelError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ModelError::InvalidHyperparameters(format!(
                "test_size must be between 0 and 1, got {}",
                self.test_size
            )));
        }
        AlgorithmConfig::parse(&self.algorithm, self.hyperparameters.as_ref())
    }

    pub fn model_name(&self) -> String {
        self.model_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("{}_model", self.algorithm))
    }
}

/// Exactly one of the three inputs must be given
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub texts: Option<Vec<String>>,
    #[serde(default)]
    pub dataset_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictInput {
    One(String),
    Many(Vec<String>),
    Dataset(Uuid),
}

impl PredictRequest {
    pub fn into_input(self) -> Option<PredictInput> {
        match (self.text, self.texts, self.dataset_id) {
            (Some(text), None, None) => Some(PredictInput::One(text)),
            (None, Some(texts), None) => Some(PredictInput::Many(texts)),
            (None, None, Some(id)) => Some(PredictInput::Dataset(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub dataset_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_request_methods() {
        let manual: LabelRequest = serde_json::from_value(json!({
            "method": "manual",
            "annotations": [{"row_index": 0, "label": 4}]
        }))
        .unwrap();
        assert_eq!(manual.method(), "manual");
        assert!(matches!(manual, LabelRequest::Manual { stop_early: false, .. }));

        let naive: LabelRequest = serde_json::from_value(json!({"method": "naive"})).unwrap();
        assert_eq!(naive, LabelRequest::Naive { keywords: None });

        let clustering: LabelRequest = serde_json::from_value(json!({
            "method": "clustering",
            "algorithm": "kmeans",
            "hyperparameters": {"n_clusters": 3}
        }))
        .unwrap();
        assert_eq!(clustering.hyperparameters()["algorithm"], "kmeans");

        assert!(serde_json::from_value::<LabelRequest>(json!({"method": "magic"})).is_err());
    }

    #[test]
    fn test_train_request_defaults() {
        let request: TrainRequest = serde_json::from_value(json!({"algorithm": "knn"})).unwrap();
        assert_eq!(request.test_size, 0.2);
        assert_eq!(request.model_name(), "knn_model");
        assert!(request.validate().is_ok());

        let mut bad = TrainRequest::new("knn");
        bad.test_size = 0.0;
        assert!(bad.validate().is_err());
        assert!(TrainRequest::new("forest").validate().is_err());
    }

    #[test]
    fn test_predict_input_requires_exactly_one() {
        let one = PredictRequest {
            text: Some("hi".into()),
            ..Default::default()
        };
        assert_eq!(one.into_input(), Some(PredictInput::One("hi".into())));
        let both = PredictRequest {
            text: Some("hi".into()),
            texts: Some(vec![]),
            dataset_id: None,
        };
        assert_eq!(both.into_input(), None);
        assert_eq!(PredictRequest::default().into_input(), None);
    }
}
