//! Multinomial naive Bayes over word n-grams
//!
//! Tokens are lowercase whitespace-separated words plus the configured
//! higher-order n-grams. Likelihoods use Laplace smoothing over the learned
//! vocabulary; at prediction time tokens outside that vocabulary are ignored.

use super::{check_training_input, Classifier, ModelError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ngram {
    #[default]
    Unigram,
    Bigram,
    Trigram,
}

impl Ngram {
    /// Largest n-gram order produced
    pub fn order(&self) -> usize {
        match self {
            Ngram::Unigram => 1,
            Ngram::Bigram => 2,
            Ngram::Trigram => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureRep {
    /// Every occurrence counts
    #[default]
    Frequency,
    /// A token counts at most once per document
    Binary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NaiveBayesParams {
    pub ngram: Ngram,
    pub feature_rep: FeatureRep,
    /// Restricts the features to these tokens when set
    pub vocabulary: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ClassModel {
    log_prior: f64,
    log_likelihood: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomNaiveBayes {
    ngram: Ngram,
    feature_rep: FeatureRep,
    fixed_vocabulary: Option<BTreeSet<String>>,
    vocabulary: BTreeSet<String>,
    classes: BTreeMap<i64, ClassModel>,
}

/// Unigrams followed by bigrams and trigrams up to `ngram`
pub fn ngram_tokens(text: &str, ngram: Ngram) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    for n in 2..=ngram.order() {
        out.extend(words.windows(n).map(|w| w.join(" ")));
    }
    out
}

impl CustomNaiveBayes {
    pub fn new(params: NaiveBayesParams) -> Self {
        let fixed_vocabulary = params
            .vocabulary
            .map(|words| words.into_iter().map(|w| w.to_lowercase()).collect());
        Self {
            ngram: params.ngram,
            feature_rep: params.feature_rep,
            fixed_vocabulary,
            vocabulary: BTreeSet::new(),
            classes: BTreeMap::new(),
        }
    }

    pub fn vocabulary(&self) -> &BTreeSet<String> {
        &self.vocabulary
    }

    pub fn classes(&self) -> Vec<i64> {
        self.classes.keys().copied().collect()
    }

    fn features(&self, text: &str) -> Vec<String> {
        let mut tokens = ngram_tokens(text, self.ngram);
        if let Some(fixed) = &self.fixed_vocabulary {
            tokens.retain(|t| fixed.contains(t));
        }
        if self.feature_rep == FeatureRep::Binary {
            let mut seen = BTreeSet::new();
            tokens.retain(|t| seen.insert(t.clone()));
        }
        tokens
    }

    /// Unnormalized log posterior per class
    pub fn scores(&self, text: &str) -> Result<BTreeMap<i64, f64>, ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let features = self.features(text);
        Ok(self
            .classes
            .iter()
            .map(|(label, model)| {
                let score = features
                    .iter()
                    .filter_map(|t| model.log_likelihood.get(t))
                    .sum::<f64>()
                    + model.log_prior;
                (*label, score)
            })
            .collect())
    }
}

impl Classifier for CustomNaiveBayes {
    fn fit(&mut self, texts: &[String], labels: &[i64]) -> Result<(), ModelError> {
        check_training_input(texts, labels)?;

        let mut doc_counts: BTreeMap<i64, usize> = BTreeMap::new();
        let mut word_counts: BTreeMap<i64, BTreeMap<String, u64>> = BTreeMap::new();
        let mut vocabulary = BTreeSet::new();

        for (text, label) in texts.iter().zip(labels) {
            *doc_counts.entry(*label).or_insert(0) += 1;
            let counts = word_counts.entry(*label).or_default();
            for token in self.features(text) {
                vocabulary.insert(token.clone());
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let total_docs = texts.len() as f64;
        let vocabulary_size = vocabulary.len() as f64;
        let mut classes = BTreeMap::new();
        for (label, docs) in doc_counts {
            let counts = word_counts.remove(&label).unwrap_or_default();
            let total_words = counts.values().sum::<u64>() as f64;
            let denominator = total_words + vocabulary_size;
            let log_likelihood = vocabulary
                .iter()
                .map(|word| {
                    let count = counts.get(word).copied().unwrap_or(0) as f64;
                    (word.clone(), ((count + 1.0) / denominator).ln())
                })
                .collect();
            classes.insert(
                label,
                ClassModel {
                    log_prior: (docs as f64 / total_docs).ln(),
                    log_likelihood,
                },
            );
        }

        self.vocabulary = vocabulary;
        self.classes = classes;
        Ok(())
    }

    /// Highest posterior wins; exact ties go to the smallest label
    fn predict_one(&self, text: &str) -> Result<i64, ModelError> {
        let mut best: Option<(i64, f64)> = None;
        for (label, score) in self.scores(text)? {
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((label, score));
            }
        }
        best.map(|(label, _)| label).ok_or(ModelError::NotFitted)
    }
}
