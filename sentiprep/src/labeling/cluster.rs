//! Cluster-derived labels

use super::Polarity;
use crate::classifiers::tfidf::{SparseVector, TfidfVectorizer};
use crate::clustering::kmeans::{kmeans, KMeansConfig};
use crate::clustering::{
    agglomerative_vectors, aligned_accuracy, dbscan::dbscan, hierarchical_cluster,
    map_to_polarity, ClusteringError, Linkage,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusteringAlgorithm {
    Kmeans,
    Dbscan,
    Agglomerative,
    /// Jaccard-distance agglomerative clustering on raw texts
    Hierarchical,
}

impl ClusteringAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusteringAlgorithm::Kmeans => "kmeans",
            ClusteringAlgorithm::Dbscan => "dbscan",
            ClusteringAlgorithm::Agglomerative => "agglomerative",
            ClusteringAlgorithm::Hierarchical => "hierarchical",
        }
    }
}

/// Optional knobs; unset values take the per-algorithm defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringHyperparams {
    pub n_clusters: Option<usize>,
    pub eps: Option<f64>,
    pub min_samples: Option<usize>,
    pub linkage: Option<Linkage>,
    pub random_state: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub clusters: usize,
    /// Row count per cluster id, ascending by id
    pub rows_per_cluster: Vec<usize>,
    pub label_distribution: BTreeMap<String, usize>,
    /// Agreement with existing labels after optimal cluster alignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aligned_accuracy: Option<f64>,
}

/// Raw cluster ids for `texts`
pub fn cluster_texts<S: AsRef<str>>(
    texts: &[S],
    algorithm: ClusteringAlgorithm,
    params: &ClusteringHyperparams,
) -> Result<Vec<i64>, ClusteringError> {
    match algorithm {
        ClusteringAlgorithm::Hierarchical => hierarchical_cluster(
            texts,
            params.n_clusters.unwrap_or(3),
            params.linkage.unwrap_or(Linkage::Average),
        ),
        ClusteringAlgorithm::Kmeans => {
            let (points, dimension) = vectorize(texts);
            let config = KMeansConfig {
                k: params.n_clusters.unwrap_or(5),
                seed: params.random_state.unwrap_or(42),
                ..Default::default()
            };
            kmeans(&points, dimension, &config)
        }
        ClusteringAlgorithm::Dbscan => dbscan(
            &vectorize(texts).0,
            params.eps.unwrap_or(0.5),
            params.min_samples.unwrap_or(5),
        ),
        ClusteringAlgorithm::Agglomerative => agglomerative_vectors(
            &vectorize(texts).0,
            params.n_clusters.unwrap_or(5),
            params.linkage.unwrap_or(Linkage::Ward),
        ),
    }
}

fn vectorize<S: AsRef<str>>(texts: &[S]) -> (Vec<SparseVector>, usize) {
    let mut vectorizer = TfidfVectorizer::new();
    let points = vectorizer.fit_transform(texts);
    debug!(
        "Vectorized {} texts into {} features",
        points.len(),
        vectorizer.dimension()
    );
    (points, vectorizer.dimension())
}

/// Cluster, reduce to polarity and summarize
pub fn label_by_clusters<S: AsRef<str>>(
    texts: &[S],
    algorithm: ClusteringAlgorithm,
    params: &ClusteringHyperparams,
    truth: Option<&[Polarity]>,
) -> Result<(Vec<Polarity>, ClusterSummary), ClusteringError> {
    let ids = cluster_texts(texts, algorithm, params)?;
    let labels = map_to_polarity(&ids);

    let mut per_cluster: BTreeMap<i64, usize> = BTreeMap::new();
    for id in &ids {
        *per_cluster.entry(*id).or_insert(0) += 1;
    }

    let mut label_distribution: BTreeMap<String, usize> =
        Polarity::ALL.iter().map(|p| (p.to_string(), 0)).collect();
    for label in &labels {
        *label_distribution.entry(label.to_string()).or_insert(0) += 1;
    }

    let aligned_accuracy = match truth {
        Some(truth) => {
            let truth: Vec<i64> = truth.iter().map(|p| p.value()).collect();
            Some(aligned_accuracy(&truth, &ids)?)
        }
        None => None,
    };

    let summary = ClusterSummary {
        clusters: per_cluster.len(),
        rows_per_cluster: per_cluster.into_values().collect(),
        label_distribution,
        aligned_accuracy,
    };
    Ok((labels, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTS: [&str; 6] = [
        "love love this great phone",
        "great phone love it",
        "love this great great phone",
        "awful battery terrible screen",
        "terrible awful battery",
        "screen terrible awful",
    ];

    #[test]
    fn test_hierarchical_defaults_produce_polarity() {
        let (labels, summary) = label_by_clusters(
            &TEXTS,
            ClusteringAlgorithm::Hierarchical,
            &ClusteringHyperparams {
                n_clusters: Some(2),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(labels.len(), 6);
        assert_eq!(summary.clusters, 2);
        assert_eq!(summary.rows_per_cluster.iter().sum::<usize>(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[0], labels[3]);
        assert!(summary.aligned_accuracy.is_none());
    }

    #[test]
    fn test_kmeans_with_ground_truth() {
        let truth = [
            Polarity::Positive,
            Polarity::Positive,
            Polarity::Positive,
            Polarity::Negative,
            Polarity::Negative,
            Polarity::Negative,
        ];
        let (_, summary) = label_by_clusters(
            &TEXTS,
            ClusteringAlgorithm::Kmeans,
            &ClusteringHyperparams {
                n_clusters: Some(2),
                ..Default::default()
            },
            Some(&truth),
        )
        .unwrap();
        assert_eq!(summary.aligned_accuracy, Some(1.0));
    }

    #[test]
    fn test_dbscan_noise_maps_to_neutral() {
        let (labels, summary) = label_by_clusters(
            &TEXTS,
            ClusteringAlgorithm::Dbscan,
            &ClusteringHyperparams {
                eps: Some(0.01),
                min_samples: Some(2),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        assert!(labels.iter().all(|l| *l == Polarity::Neutral));
        assert_eq!(summary.label_distribution["2"], 6);
    }

    #[test]
    fn test_kmeans_needs_enough_rows() {
        let err = cluster_texts(&["a b"], ClusteringAlgorithm::Kmeans, &ClusteringHyperparams::default())
            .unwrap_err();
        assert!(matches!(err, ClusteringError::TooFewSamples { .. }));
    }

    #[test]
    fn test_algorithm_names() {
        let algorithm: ClusteringAlgorithm = serde_json::from_str("\"agglomerative\"").unwrap();
        assert_eq!(algorithm.as_str(), "agglomerative");
    }
}
