//! Agglomerative clustering over a precomputed distance matrix
//!
//! Merges are found with the nearest-neighbour chain algorithm and
//! Lance-Williams distance updates. The dendrogram is then cut into exactly
//! `k` flat clusters by applying the `n - k` lowest merges.

use super::distance::{distance_matrix, DistanceMatrix};
use super::ClusteringError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rule for the distance between merged clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    Single,
    Complete,
    #[default]
    Average,
    Ward,
}

impl Linkage {
    /// Distance from the union of clusters i and j to cluster k
    fn update(self, d_ik: f64, d_jk: f64, d_ij: f64, n_i: f64, n_j: f64, n_k: f64) -> f64 {
        match self {
            Linkage::Single => d_ik.min(d_jk),
            Linkage::Complete => d_ik.max(d_jk),
            Linkage::Average => (n_i * d_ik + n_j * d_jk) / (n_i + n_j),
            Linkage::Ward => {
                let t = n_i + n_j + n_k;
                (((n_i + n_k) * d_ik * d_ik + (n_j + n_k) * d_jk * d_jk - n_k * d_ij * d_ij) / t)
                    .max(0.0)
                    .sqrt()
            }
        }
    }
}

/// One dendrogram merge: the clusters containing `a` and `b` joined at `height`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub a: usize,
    pub b: usize,
    pub height: f64,
}

/// Full merge sequence (`n - 1` merges) for a distance matrix
pub fn linkage_merges(matrix: DistanceMatrix, linkage: Linkage) -> Vec<Merge> {
    let n = matrix.len();
    let mut d = matrix.into_values();
    let mut size = vec![1.0_f64; n];
    let mut active = vec![true; n];
    let mut remaining = n;
    let mut chain: Vec<usize> = Vec::with_capacity(n);
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    while remaining > 1 {
        if chain.is_empty() {
            if let Some(first) = active.iter().position(|a| *a) {
                chain.push(first);
            }
        }

        let Some(&a) = chain.last() else { break };
        let previous = chain.len().checked_sub(2).map(|i| chain[i]);

        // Ties prefer the previous chain element so reciprocal pairs terminate
        let mut nearest = previous;
        let mut nearest_d = previous.map_or(f64::INFINITY, |p| d[a * n + p]);
        for b in 0..n {
            if b != a && active[b] && d[a * n + b] < nearest_d {
                nearest = Some(b);
                nearest_d = d[a * n + b];
            }
        }
        let Some(b) = nearest else { break };

        if Some(b) != previous {
            chain.push(b);
            continue;
        }

        chain.truncate(chain.len() - 2);
        // cluster `a` is absorbed into slot `b`
        for k in 0..n {
            if k == a || k == b || !active[k] {
                continue;
            }
            let updated = linkage.update(d[a * n + k], d[b * n + k], nearest_d, size[a], size[b], size[k]);
            d[b * n + k] = updated;
            d[k * n + b] = updated;
        }
        size[b] += size[a];
        active[a] = false;
        remaining -= 1;
        merges.push(Merge {
            a,
            b,
            height: nearest_d,
        });
    }

    merges.sort_by(|x, y| x.height.total_cmp(&y.height));
    merges
}

/// Cut a distance matrix into `k` flat clusters
///
/// Cluster ids are `1..=k`, numbered by first appearance in row order. With
/// fewer than `k` items every item is its own cluster.
pub fn agglomerative(
    matrix: DistanceMatrix,
    k: usize,
    linkage: Linkage,
) -> Result<Vec<i64>, ClusteringError> {
    if k == 0 {
        return Err(ClusteringError::InvalidClusterCount(k));
    }
    let n = matrix.len();
    let merges = linkage_merges(matrix, linkage);

    let mut parent: Vec<usize> = (0..n).collect();
    for merge in merges.iter().take(n.saturating_sub(k)) {
        let ra = find(&mut parent, merge.a);
        let rb = find(&mut parent, merge.b);
        parent[ra] = rb;
    }

    let mut ids: Vec<Option<i64>> = vec![None; n];
    let mut next_id = 1;
    let mut labels = Vec::with_capacity(n);
    for item in 0..n {
        let root = find(&mut parent, item);
        let id = *ids[root].get_or_insert_with(|| {
            let id = next_id;
            next_id += 1;
            id
        });
        labels.push(id);
    }

    debug!("Agglomerative clustering: {} items into {} clusters", n, next_id - 1);
    Ok(labels)
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

/// Cluster texts into `k` groups using Jaccard distance
pub fn hierarchical_cluster<S: AsRef<str>>(
    items: &[S],
    k: usize,
    linkage: Linkage,
) -> Result<Vec<i64>, ClusteringError> {
    agglomerative(distance_matrix(items), k, linkage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points_1d(xs: &[f64]) -> DistanceMatrix {
        DistanceMatrix::from_fn(xs.len(), |i, j| (xs[i] - xs[j]).abs())
    }

    #[test]
    fn test_two_obvious_groups_every_linkage() {
        let xs = [0.0, 0.1, 0.2, 10.0, 10.1, 10.3];
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average, Linkage::Ward] {
            let labels = agglomerative(points_1d(&xs), 2, linkage).unwrap();
            assert_eq!(labels, vec![1, 1, 1, 2, 2, 2], "{:?}", linkage);
        }
    }

    #[test]
    fn test_exactly_k_clusters() {
        let xs = [0.0, 1.0, 3.0, 7.0, 15.0, 31.0, 63.0];
        for k in 1..=7 {
            let labels = agglomerative(points_1d(&xs), k, Linkage::Average).unwrap();
            let max = *labels.iter().max().unwrap();
            assert_eq!(max as usize, k);
        }
    }

    #[test]
    fn test_fewer_items_than_clusters() {
        let labels = agglomerative(points_1d(&[1.0, 2.0]), 5, Linkage::Ward).unwrap();
        assert_eq!(labels, vec![1, 2]);
        assert!(agglomerative(points_1d(&[]), 3, Linkage::Ward).unwrap().is_empty());
    }

    #[test]
    fn test_zero_clusters_rejected() {
        let err = agglomerative(points_1d(&[1.0]), 0, Linkage::Average).unwrap_err();
        assert!(matches!(err, ClusteringError::InvalidClusterCount(0)));
    }

    #[test]
    fn test_merge_heights_are_sorted_and_complete() {
        let merges = linkage_merges(points_1d(&[0.0, 2.0, 3.0, 9.0]), Linkage::Single);
        assert_eq!(merges.len(), 3);
        let heights: Vec<f64> = merges.iter().map(|m| m.height).collect();
        assert_eq!(heights, vec![1.0, 2.0, 6.0]);
    }

    #[test]
    fn test_hierarchical_cluster_on_text() {
        let texts = [
            "i love this movie",
            "love this movie so much",
            "terrible awful service",
            "awful terrible food service",
        ];
        let labels = hierarchical_cluster(&texts, 2, Linkage::Average).unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }
}
