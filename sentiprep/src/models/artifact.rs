//! Trained model artifacts and their metadata records

use crate::classifiers::{ClassificationMetrics, FittedModel};
use crate::labeling::LabelingSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Object path of a model artifact
pub fn artifact_path(model_id: Uuid) -> String {
    format!("models/{}/model.json", model_id)
}

/// Self-contained model document written to the object store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub algorithm: String,
    pub hyperparameters: Value,
    pub model: FittedModel,
    pub train_size: usize,
    pub val_size: usize,
    pub metrics: ClassificationMetrics,
}

impl ModelArtifact {
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Row of the `trained_models` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub model_id: Uuid,
    pub model_name: String,
    pub session_id: Uuid,
    pub dataset_id: Uuid,
    pub algorithm: String,
    pub hyperparameters: Value,
    pub model_file: String,
    pub train_size: usize,
    pub val_size: usize,
    pub metrics: ClassificationMetrics,
    pub created_at: DateTime<Utc>,
}

/// Row of the `labelings` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labeling {
    pub labeling_id: Uuid,
    pub dataset_id: Uuid,
    pub session_id: Uuid,
    pub method: String,
    pub hyperparameters: Value,
    pub summary: LabelingSummary,
    pub labeled_file: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::{classification_metrics, AlgorithmConfig};

    #[test]
    fn test_artifact_bytes_round_trip_predictions() {
        let config = AlgorithmConfig::parse("naive_bayes", None).unwrap();
        let texts = vec!["good fun".to_string(), "bad pain".to_string()];
        let model = config.train(&texts, &[4, 0]).unwrap();
        let artifact = ModelArtifact {
            algorithm: config.name().to_string(),
            hyperparameters: config.hyperparameters(),
            model,
            train_size: 2,
            val_size: 1,
            metrics: classification_metrics(&[4], &[4]).unwrap(),
        };

        let restored = ModelArtifact::from_bytes(&artifact.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.algorithm, "naive_bayes");
        assert_eq!(restored.model.algorithm(), "naive_bayes");
        assert_eq!(restored.metrics, artifact.metrics);
    }

    #[test]
    fn test_artifact_path() {
        let id = Uuid::nil();
        assert_eq!(
            artifact_path(id),
            "models/00000000-0000-0000-0000-000000000000/model.json"
        );
    }
}
