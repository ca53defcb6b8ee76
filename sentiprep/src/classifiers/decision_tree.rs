//! CART decision tree on TF-IDF features
//!
//! Binary splits of the form `x[feature] <= threshold`, chosen to minimize
//! the weighted Gini impurity of the children.

use super::tfidf::{SparseVector, TfidfVectorizer};
use super::{check_training_input, Classifier, ModelError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const MIN_IMPURITY_DECREASE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTreeParams {
    /// Unlimited when absent
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        label: i64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn decide(&self, x: &SparseVector) -> i64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { label, .. } => return *label,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x.get(*feature) <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &BTreeMap<i64, usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .values()
        .map(|c| {
            let p = *c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn class_counts(labels: &[i64], samples: &[usize]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for i in samples {
        *counts.entry(labels[*i]).or_insert(0) += 1;
    }
    counts
}

/// Most frequent label; ties go to the smallest
fn majority(counts: &BTreeMap<i64, usize>) -> i64 {
    let mut best: Option<(i64, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, c)| *count > c) {
            best = Some((*label, *count));
        }
    }
    best.map(|(label, _)| label).unwrap_or_default()
}

struct TreeBuilder<'a> {
    points: &'a [SparseVector],
    labels: &'a [i64],
    params: DecisionTreeParams,
}

impl TreeBuilder<'_> {
    fn build(&self, samples: Vec<usize>, depth: usize) -> TreeNode {
        let counts = class_counts(self.labels, &samples);
        let leaf = TreeNode::Leaf {
            label: majority(&counts),
            samples: samples.len(),
        };

        if counts.len() <= 1
            || samples.len() < self.params.min_samples_split.max(2)
            || self.params.max_depth.map_or(false, |max| depth >= max)
        {
            return leaf;
        }

        let parent = gini(&counts, samples.len());
        let Some(best) = self.best_split(&samples) else {
            return leaf;
        };
        if parent - best.impurity <= MIN_IMPURITY_DECREASE {
            return leaf;
        }

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|i| self.points[*i].get(best.feature) <= best.threshold);

        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    /// Lowest weighted child impurity over all features present in `samples`
    fn best_split(&self, samples: &[usize]) -> Option<Candidate> {
        let features: BTreeSet<usize> = samples
            .iter()
            .flat_map(|i| self.points[*i].entries().iter().map(|(f, _)| *f))
            .collect();
        let total = samples.len();
        let all_counts = class_counts(self.labels, samples);
        let mut best: Option<Candidate> = None;

        for feature in features {
            let mut values: Vec<(f64, i64)> = samples
                .iter()
                .map(|i| (self.points[*i].get(feature), self.labels[*i]))
                .collect();
            values.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left: BTreeMap<i64, usize> = BTreeMap::new();
            let mut right = all_counts.clone();
            for pos in 0..total - 1 {
                let (value, label) = values[pos];
                *left.entry(label).or_insert(0) += 1;
                if let Some(c) = right.get_mut(&label) {
                    *c -= 1;
                }
                let next = values[pos + 1].0;
                if next <= value {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = total - n_left;
                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / total as f64;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(Candidate {
                        feature,
                        threshold: (value + next) / 2.0,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfDecisionTree {
    params: DecisionTreeParams,
    vectorizer: TfidfVectorizer,
    root: Option<TreeNode>,
}

impl TfidfDecisionTree {
    pub fn new(params: DecisionTreeParams) -> Result<Self, ModelError> {
        if params.max_depth == Some(0) {
            return Err(ModelError::InvalidHyperparameters(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if params.min_samples_split < 2 {
            return Err(ModelError::InvalidHyperparameters(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        Ok(Self {
            params,
            vectorizer: TfidfVectorizer::new(),
            root: None,
        })
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }
}

impl Classifier for TfidfDecisionTree {
    fn fit(&mut self, texts: &[String], labels: &[i64]) -> Result<(), ModelError> {
        check_training_input(texts, labels)?;
        let mut vectorizer = TfidfVectorizer::new();
        let points = vectorizer.fit_transform(texts);
        let builder = TreeBuilder {
            points: &points,
            labels,
            params: self.params,
        };
        self.root = Some(builder.build((0..texts.len()).collect(), 0));
        self.vectorizer = vectorizer;
        Ok(())
    }

    fn predict_one(&self, text: &str) -> Result<i64, ModelError> {
        let root = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        Ok(root.decide(&self.vectorizer.transform(text)))
    }
}
