//! Clustering and cluster-to-label mapping
//!
//! Two families: agglomerative clustering over a Jaccard distance matrix of
//! raw texts, and vector-space algorithms (k-means, DBSCAN, Euclidean
//! agglomerative) over TF-IDF vectors. Either way the resulting cluster ids
//! are reduced to polarity labels by [`mapper::map_to_polarity`].

pub mod dbscan;
pub mod distance;
pub mod hierarchical;
pub mod hungarian;
pub mod kmeans;
pub mod mapper;

pub use distance::{distance_matrix, jaccard_distance, DistanceMatrix};
pub use hierarchical::{agglomerative, hierarchical_cluster, Linkage};
pub use mapper::{align_clusters_to_labels, aligned_accuracy, map_to_polarity};

use crate::classifiers::tfidf::SparseVector;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusteringError {
    #[error("Number of clusters must be at least 1, got {0}")]
    InvalidClusterCount(usize),

    #[error("{samples} samples cannot form {clusters} clusters")]
    TooFewSamples { samples: usize, clusters: usize },

    #[error("Label arrays differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid clustering parameter: {0}")]
    InvalidParameter(String),
}

/// Agglomerative clustering on Euclidean distances between vectors, ids `0..k`
pub fn agglomerative_vectors(
    points: &[SparseVector],
    k: usize,
    linkage: Linkage,
) -> Result<Vec<i64>, ClusteringError> {
    if points.len() < k {
        return Err(ClusteringError::TooFewSamples {
            samples: points.len(),
            clusters: k,
        });
    }
    let matrix = DistanceMatrix::from_fn(points.len(), |i, j| points[i].euclidean(&points[j]));
    Ok(agglomerative(matrix, k, linkage)?
        .into_iter()
        .map(|id| id - 1)
        .collect())
}
