//! Keyword-count model
//!
//! No learning: a text is positive when it contains more positive words than
//! negative ones, negative in the opposite case, neutral otherwise.

use super::{check_training_input, Classifier, ModelError};
use crate::labeling::Polarity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NaiveAutomaticParams {
    /// Positive words; the configured default list is used when absent
    pub positives: Option<Vec<String>>,
    /// Negative words; the configured default list is used when absent
    pub negatives: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCountModel {
    positives: BTreeSet<String>,
    negatives: BTreeSet<String>,
}

impl KeywordCountModel {
    pub fn new<P, N>(positives: P, negatives: N) -> Result<Self, ModelError>
    where
        P: IntoIterator<Item = String>,
        N: IntoIterator<Item = String>,
    {
        let normalize = |words: Vec<String>| -> BTreeSet<String> {
            words
                .into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };
        let positives = normalize(positives.into_iter().collect());
        let negatives = normalize(negatives.into_iter().collect());
        if positives.is_empty() && negatives.is_empty() {
            return Err(ModelError::InvalidHyperparameters(
                "naive_automatic needs at least one positive or negative word".to_string(),
            ));
        }
        Ok(Self {
            positives,
            negatives,
        })
    }

    /// (positive hits, negative hits) over whitespace tokens
    pub fn counts(&self, text: &str) -> (usize, usize) {
        let lowered = text.to_lowercase();
        lowered.split_whitespace().fold((0, 0), |(pos, neg), token| {
            (
                pos + usize::from(self.positives.contains(token)),
                neg + usize::from(self.negatives.contains(token)),
            )
        })
    }
}

impl Classifier for KeywordCountModel {
    /// Validates the input only; the word lists are the whole model
    fn fit(&mut self, texts: &[String], labels: &[i64]) -> Result<(), ModelError> {
        check_training_input(texts, labels)
    }

    fn predict_one(&self, text: &str) -> Result<i64, ModelError> {
        let (pos, neg) = self.counts(text);
        let polarity = match pos.cmp(&neg) {
            std::cmp::Ordering::Greater => Polarity::Positive,
            std::cmp::Ordering::Less => Polarity::Negative,
            std::cmp::Ordering::Equal => Polarity::Neutral,
        };
        Ok(polarity.value())
    }
}
