//! K-nearest-neighbours over raw text with Jaccard distance
//!
//! A lazy learner: `fit` stores the training set verbatim and every
//! prediction scans all of it.

use super::{check_training_input, Classifier, ModelError};
use crate::clustering::distance::{jaccard_distance_sets, tokens};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

pub const DEFAULT_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnParams {
    pub k: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self { k: DEFAULT_K }
    }
}

/// Candidate neighbour, ordered by distance then by position in the knowledge base
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    distance: f64,
    index: usize,
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomKnn {
    k: usize,
    texts: Vec<String>,
    labels: Vec<i64>,
}

impl CustomKnn {
    pub fn new(params: KnnParams) -> Result<Self, ModelError> {
        if params.k == 0 {
            return Err(ModelError::InvalidHyperparameters(
                "k must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            k: params.k,
            texts: Vec::new(),
            labels: Vec::new(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn knowledge_base_len(&self) -> usize {
        self.texts.len()
    }

    /// Indexes of the `k` nearest knowledge-base items, nearest first
    ///
    /// Among equally distant items the earliest one is preferred.
    fn nearest(&self, query: &str) -> Vec<usize> {
        let query_tokens = tokens(query);
        // max-heap: the current worst of the k best is on top
        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(self.k + 1);

        for (index, text) in self.texts.iter().enumerate() {
            let candidate = Neighbor {
                distance: jaccard_distance_sets(&query_tokens, &tokens(text)),
                index,
            };
            if heap.len() < self.k {
                heap.push(candidate);
            } else if heap.peek().map_or(false, |worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        heap.into_sorted_vec().into_iter().map(|n| n.index).collect()
    }
}

impl Classifier for CustomKnn {
    fn fit(&mut self, texts: &[String], labels: &[i64]) -> Result<(), ModelError> {
        check_training_input(texts, labels)?;
        self.texts = texts.to_vec();
        self.labels = labels.to_vec();
        Ok(())
    }

    /// Majority vote of the nearest neighbours; ties go to the smallest label
    fn predict_one(&self, text: &str) -> Result<i64, ModelError> {
        if self.texts.is_empty() {
            return Err(ModelError::NotFitted);
        }

        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
        for index in self.nearest(text) {
            *votes.entry(self.labels[index]).or_insert(0) += 1;
        }

        let mut best: Option<(i64, usize)> = None;
        for (label, count) in votes {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((label, count));
            }
        }
        best.map(|(label, _)| label).ok_or(ModelError::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn fitted(k: usize, texts: &[&str], labels: &[i64]) -> CustomKnn {
        let mut knn = CustomKnn::new(KnnParams { k }).unwrap();
        knn.fit(&strings(texts), labels).unwrap();
        knn
    }

    #[test]
    fn test_k1_exact_duplicate_wins() {
        let knn = fitted(
            1,
            &["the food was awful", "I love this place", "meh it was fine"],
            &[0, 4, 2],
        );
        assert_eq!(knn.predict_one("I love this place").unwrap(), 4);
        assert_eq!(knn.predict_one("the food was awful").unwrap(), 0);
    }

    #[test]
    fn test_majority_vote() {
        let knn = fitted(
            3,
            &["great great movie", "great movie", "great film", "bad movie"],
            &[4, 4, 0, 0],
        );
        // nearest three: two positives and one negative
        assert_eq!(knn.predict_one("great movie").unwrap(), 4);
    }

    #[test]
    fn test_vote_tie_goes_to_smallest_label() {
        let knn = fitted(2, &["alpha beta", "alpha gamma"], &[4, 0]);
        assert_eq!(knn.predict_one("alpha").unwrap(), 0);

        let knn = fitted(2, &["alpha beta", "alpha gamma"], &[2, 4]);
        assert_eq!(knn.predict_one("alpha").unwrap(), 2);
    }

    #[test]
    fn test_equal_distances_keep_earliest_neighbours() {
        // every item is at distance 1 from the query; the first two are kept
        let knn = fitted(2, &["a", "b", "c", "d"], &[4, 4, 0, 0]);
        assert_eq!(knn.nearest("zzz"), vec![0, 1]);
        assert_eq!(knn.predict_one("zzz").unwrap(), 4);
    }

    #[test]
    fn test_k_larger_than_knowledge_base() {
        let knn = fitted(10, &["x y", "y z"], &[0, 0]);
        assert_eq!(knn.predict_one("x").unwrap(), 0);
    }

    #[test]
    fn test_invalid_k_and_unfitted() {
        assert!(CustomKnn::new(KnnParams { k: 0 }).is_err());
        let knn = CustomKnn::new(KnnParams::default()).unwrap();
        assert!(matches!(knn.predict_one("x"), Err(ModelError::NotFitted)));
    }
}
