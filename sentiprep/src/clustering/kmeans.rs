//! K-means over sparse vectors
//!
//! k-means++ seeding from a fixed seed, Lloyd iterations, best of `n_init`
//! runs by inertia.

use super::ClusteringError;
use crate::classifiers::tfidf::SparseVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct KMeansConfig {
    pub k: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 5,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

struct Run {
    labels: Vec<i64>,
    inertia: f64,
}

/// Cluster `points` (of dimension `dim`) into `config.k` groups, ids `0..k`
pub fn kmeans(
    points: &[SparseVector],
    dim: usize,
    config: &KMeansConfig,
) -> Result<Vec<i64>, ClusteringError> {
    if config.k == 0 {
        return Err(ClusteringError::InvalidClusterCount(0));
    }
    if points.len() < config.k {
        return Err(ClusteringError::TooFewSamples {
            samples: points.len(),
            clusters: config.k,
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<Run> = None;
    for _ in 0..config.n_init.max(1) {
        let run = lloyd(points, dim, config, &mut rng);
        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }

    let best = best.ok_or(ClusteringError::InvalidClusterCount(config.k))?;
    debug!("K-means finished with inertia {:.4}", best.inertia);
    Ok(best.labels)
}

fn squared_distance(point: &SparseVector, centroid: &[f64], centroid_norm_sq: f64) -> f64 {
    (point.norm_sq() - 2.0 * point.dot_dense(centroid) + centroid_norm_sq).max(0.0)
}

fn dense(point: &SparseVector, dim: usize) -> Vec<f64> {
    let mut v = vec![0.0; dim];
    for &(i, value) in point.entries() {
        if i < dim {
            v[i] = value;
        }
    }
    v
}

fn norm_sq(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// k-means++ seeding
fn seed_centroids(points: &[SparseVector], dim: usize, k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(dense(&points[rng.gen_range(0..points.len())], dim));

    let mut closest: Vec<f64> = vec![f64::INFINITY; points.len()];
    while centroids.len() < k {
        let Some(last) = centroids.last() else { break };
        let last_norm = norm_sq(last);
        for (d, point) in closest.iter_mut().zip(points) {
            *d = d.min(squared_distance(point, last, last_norm));
        }

        let total: f64 = closest.iter().sum();
        let next = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            closest
                .iter()
                .position(|d| {
                    target -= d;
                    target <= 0.0
                })
                .unwrap_or(points.len() - 1)
        } else {
            rng.gen_range(0..points.len())
        };
        centroids.push(dense(&points[next], dim));
    }
    centroids
}

fn lloyd(points: &[SparseVector], dim: usize, config: &KMeansConfig, rng: &mut StdRng) -> Run {
    let mut centroids = seed_centroids(points, dim, config.k, rng);
    let mut labels = vec![0i64; points.len()];
    let mut inertia = 0.0;

    for _ in 0..config.max_iter {
        let norms: Vec<f64> = centroids.iter().map(|c| norm_sq(c)).collect();
        inertia = 0.0;
        for (label, point) in labels.iter_mut().zip(points) {
            let (best, d) = centroids
                .iter()
                .zip(&norms)
                .enumerate()
                .map(|(c, (centroid, n))| (c, squared_distance(point, centroid, *n)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((0, 0.0));
            *label = best as i64;
            inertia += d;
        }

        let mut sums = vec![vec![0.0; dim]; config.k];
        let mut counts = vec![0usize; config.k];
        for (label, point) in labels.iter().zip(points) {
            let c = *label as usize;
            counts[c] += 1;
            for &(i, value) in point.entries() {
                if i < dim {
                    sums[c][i] += value;
                }
            }
        }

        let mut shift = 0.0;
        for (c, sum) in sums.into_iter().enumerate() {
            // empty clusters keep their previous centroid
            if counts[c] == 0 {
                continue;
            }
            let updated: Vec<f64> = sum.into_iter().map(|s| s / counts[c] as f64).collect();
            shift += centroids[c]
                .iter()
                .zip(&updated)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>();
            centroids[c] = updated;
        }

        if shift <= config.tolerance {
            break;
        }
    }

    Run { labels, inertia }
}
