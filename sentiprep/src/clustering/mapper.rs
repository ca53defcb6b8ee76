//! Mapping cluster ids onto sentiment labels

use super::hungarian::max_weight_assignment;
use super::ClusteringError;
use crate::labeling::Polarity;
use std::collections::{BTreeMap, BTreeSet};

/// Positional cluster-to-polarity mapping
///
/// Distinct non-negative ids are taken in ascending order; the first three map
/// to negative, neutral and positive. Later ids and noise (negative ids) map
/// to neutral. The mapping carries no semantic knowledge of the clusters.
pub fn map_to_polarity(cluster_ids: &[i64]) -> Vec<Polarity> {
    let mapping = polarity_mapping(cluster_ids);
    cluster_ids
        .iter()
        .map(|id| mapping.get(id).copied().unwrap_or(Polarity::Neutral))
        .collect()
}

/// The id-to-polarity table used by [`map_to_polarity`]
pub fn polarity_mapping(cluster_ids: &[i64]) -> BTreeMap<i64, Polarity> {
    let distinct: BTreeSet<i64> = cluster_ids.iter().copied().filter(|id| *id >= 0).collect();
    distinct
        .into_iter()
        .zip(Polarity::ALL)
        .collect()
}

/// Optimal one-to-one cluster-to-label mapping against ground truth
///
/// Maximizes the number of rows whose cluster maps to their true label.
/// Clusters left without a label map to the smallest true label.
pub fn align_clusters_to_labels(
    true_labels: &[i64],
    cluster_labels: &[i64],
) -> Result<BTreeMap<i64, i64>, ClusteringError> {
    if true_labels.len() != cluster_labels.len() {
        return Err(ClusteringError::LengthMismatch {
            left: true_labels.len(),
            right: cluster_labels.len(),
        });
    }

    let labels: Vec<i64> = true_labels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let clusters: Vec<i64> = cluster_labels
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let Some(&fallback) = labels.first() else {
        return Ok(BTreeMap::new());
    };

    let mut counts = vec![vec![0.0; clusters.len()]; labels.len()];
    for (label, cluster) in true_labels.iter().zip(cluster_labels) {
        if let (Ok(r), Ok(c)) = (labels.binary_search(label), clusters.binary_search(cluster)) {
            counts[r][c] += 1.0;
        }
    }

    let mut mapping: BTreeMap<i64, i64> = clusters.iter().map(|c| (*c, fallback)).collect();
    for (r, c) in max_weight_assignment(&counts) {
        mapping.insert(clusters[c], labels[r]);
    }
    Ok(mapping)
}

/// Share of rows whose aligned cluster label equals the true label
pub fn aligned_accuracy(true_labels: &[i64], cluster_labels: &[i64]) -> Result<f64, ClusteringError> {
    let mapping = align_clusters_to_labels(true_labels, cluster_labels)?;
    if true_labels.is_empty() {
        return Ok(0.0);
    }
    let correct = true_labels
        .iter()
        .zip(cluster_labels)
        .filter(|(label, cluster)| mapping.get(*cluster) == Some(*label))
        .count();
    Ok(correct as f64 / true_labels.len() as f64)
}
