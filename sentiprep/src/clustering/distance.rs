//! Jaccard distance over token sets

use std::collections::BTreeSet;

/// Lowercased whitespace tokens
pub fn tokens(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// `1 - |A ∩ B| / |A ∪ B|`; two empty sets are at distance 0
pub fn jaccard_distance_sets(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    1.0 - intersection as f64 / union as f64
}

pub fn jaccard_distance(a: &str, b: &str) -> f64 {
    jaccard_distance_sets(&tokens(a), &tokens(b))
}

/// Symmetric square matrix of pairwise distances, zero diagonal
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Fill the upper triangle with `distance(i, j)` and mirror it
    pub fn from_fn(size: usize, mut distance: impl FnMut(usize, usize) -> f64) -> Self {
        let mut values = vec![0.0; size * size];
        for i in 0..size {
            for j in (i + 1)..size {
                let d = distance(i, j);
                values[i * size + j] = d;
                values[j * size + i] = d;
            }
        }
        Self { size, values }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub(crate) fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Pairwise Jaccard distances; quadratic in the number of items
pub fn distance_matrix<S: AsRef<str>>(items: &[S]) -> DistanceMatrix {
    let token_sets: Vec<BTreeSet<String>> = items.iter().map(|s| tokens(s.as_ref())).collect();
    DistanceMatrix::from_fn(token_sets.len(), |i, j| {
        jaccard_distance_sets(&token_sets[i], &token_sets[j])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jaccard_basics() {
        assert_eq!(jaccard_distance("", ""), 0.0);
        assert_eq!(jaccard_distance("I love this", "i LOVE this"), 0.0);
        assert_eq!(jaccard_distance("a b", "c d"), 1.0);
        assert!((jaccard_distance("a b c", "a b d") - 0.5).abs() < 1e-12);
        assert_eq!(jaccard_distance("", "word"), 1.0);
    }

    #[test]
    fn test_jaccard_is_symmetric() {
        let texts = ["the cat sat", "a cat ran", "", "the the dog", "Sat cat THE"];
        for a in texts {
            assert_eq!(jaccard_distance(a, a), 0.0);
            for b in texts {
                assert_eq!(jaccard_distance(a, b), jaccard_distance(b, a));
            }
        }
    }

    #[test]
    fn test_distance_matrix_shape() {
        let matrix = distance_matrix(&["a b", "a c", "d"]);
        assert_eq!(matrix.len(), 3);
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert!((matrix.get(0, 1) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(matrix.get(0, 2), 1.0);
    }
}
