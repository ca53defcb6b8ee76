//! Density-based clustering (DBSCAN) with Euclidean distance

use super::ClusteringError;
use crate::classifiers::tfidf::SparseVector;
use std::collections::VecDeque;

/// Label given to points that belong to no cluster
pub const NOISE: i64 = -1;

/// Cluster ids `0..` in discovery order; noise is [`NOISE`]
///
/// `min_samples` counts the point itself.
pub fn dbscan(points: &[SparseVector], eps: f64, min_samples: usize) -> Result<Vec<i64>, ClusteringError> {
    if eps.is_nan() || eps <= 0.0 {
        return Err(ClusteringError::InvalidParameter(format!("eps must be positive, got {}", eps)));
    }
    if min_samples == 0 {
        return Err(ClusteringError::InvalidParameter("min_samples must be at least 1".to_string()));
    }

    let neighbors: Vec<Vec<usize>> = (0..points.len())
        .map(|i| {
            (0..points.len())
                .filter(|&j| points[i].euclidean(&points[j]) <= eps)
                .collect()
        })
        .collect();

    let mut labels: Vec<Option<i64>> = vec![None; points.len()];
    let mut next_cluster = 0;

    for start in 0..points.len() {
        if labels[start].is_some() || neighbors[start].len() < min_samples {
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[start] = Some(cluster);
        let mut queue: VecDeque<usize> = neighbors[start].iter().copied().collect();

        while let Some(p) = queue.pop_front() {
            if labels[p].is_some() {
                continue;
            }
            labels[p] = Some(cluster);
            if neighbors[p].len() >= min_samples {
                queue.extend(neighbors[p].iter().copied().filter(|q| labels[*q].is_none()));
            }
        }
    }

    Ok(labels.into_iter().map(|l| l.unwrap_or(NOISE)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64) -> SparseVector {
        SparseVector::from_entries(vec![(0, x)])
    }

    #[test]
    fn test_two_clusters_and_noise() {
        let points: Vec<SparseVector> = [0.0, 0.1, 0.2, 5.0, 5.1, 5.2, 20.0].iter().map(|x| point(*x)).collect();
        let labels = dbscan(&points, 0.15, 2).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1, NOISE]);
    }

    #[test]
    fn test_all_noise_when_sparse() {
        let points: Vec<SparseVector> = [0.0, 1.0, 2.0].iter().map(|x| point(*x)).collect();
        assert_eq!(dbscan(&points, 0.5, 5).unwrap(), vec![NOISE; 3]);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(dbscan(&[], 0.0, 5).is_err());
        assert!(dbscan(&[], 0.5, 0).is_err());
    }
}
