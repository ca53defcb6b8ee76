//! TF-IDF vectorization
//!
//! Tokens are lowercase runs of two or more word characters, English stop
//! words removed. The vocabulary keeps the `max_features` most frequent terms
//! and is indexed alphabetically. IDF is smoothed, `ln((1 + n) / (1 + df)) + 1`,
//! and every vector is L2-normalized.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const DEFAULT_MAX_FEATURES: usize = 5000;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
    "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
    "anyone", "anything", "are", "around", "as", "at", "be", "became", "because", "become",
    "been", "before", "being", "below", "between", "both", "but", "by", "can", "cannot",
    "could", "did", "do", "does", "doing", "done", "down", "during", "each", "either",
    "else", "enough", "etc", "even", "ever", "every", "few", "for", "from", "further",
    "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "however", "i", "ie", "if", "in", "into", "is",
    "it", "its", "itself", "just", "last", "least", "less", "made", "many", "may",
    "me", "meanwhile", "might", "mine", "more", "moreover", "most", "mostly", "much", "must",
    "my", "myself", "neither", "never", "nevertheless", "next", "no", "nobody", "none", "nor",
    "not", "nothing", "now", "of", "off", "often", "on", "once", "one", "only",
    "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over",
    "own", "per", "perhaps", "please", "rather", "re", "same", "see", "seem", "seemed",
    "seems", "several", "she", "should", "since", "so", "some", "somehow", "someone", "something",
    "sometimes", "still", "such", "than", "that", "the", "their", "them", "themselves", "then",
    "there", "therefore", "these", "they", "this", "those", "though", "through", "thus", "to",
    "together", "too", "toward", "towards", "under", "until", "up", "upon", "us", "very",
    "via", "was", "we", "well", "were", "what", "whatever", "when", "whence", "whenever",
    "where", "whereas", "whether", "which", "while", "who", "whoever", "whole", "whom", "whose",
    "why", "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Sparse vector with entries sorted by index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from unsorted entries; zero values are dropped
    pub fn from_entries(mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|(_, v)| *v != 0.0);
        entries.sort_by_key(|(i, _)| *i);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at `index`, zero when absent
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn norm_sq(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut a, mut b) = (self.entries.iter().peekable(), other.entries.iter().peekable());
        let mut sum = 0.0;
        while let (Some(&&(ia, va)), Some(&&(ib, vb))) = (a.peek(), b.peek()) {
            match ia.cmp(&ib) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => {
                    sum += va * vb;
                    a.next();
                    b.next();
                }
            }
        }
        sum
    }

    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|(i, v)| v * dense.get(*i).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn euclidean(&self, other: &SparseVector) -> f64 {
        (self.norm_sq() + other.norm_sq() - 2.0 * self.dot(other))
            .max(0.0)
            .sqrt()
    }

    fn normalize(&mut self) {
        let norm = self.norm_sq().sqrt();
        if norm > 0.0 {
            for (_, v) in self.entries.iter_mut() {
                *v /= norm;
            }
        }
    }
}

/// Fitted TF-IDF model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    max_features: usize,
    stop_words: bool,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            stop_words: true,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_stop_words(mut self, stop_words: bool) -> Self {
        self.stop_words = stop_words;
        self
    }

    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Tokenize one document
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        TOKEN_RE
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words || !STOP_WORDS.contains(t))
            .map(str::to_string)
            .collect()
    }

    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S]) {
        let documents: Vec<Vec<String>> = texts.iter().map(|t| self.analyze(t.as_ref())).collect();

        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &documents {
            let mut seen = HashSet::new();
            for term in doc {
                *term_freq.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        // Most frequent terms first, alphabetical among equals
        let mut ranked: Vec<(&str, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut kept: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
        kept.sort_unstable();

        let n = documents.len() as f64;
        self.idf = kept
            .iter()
            .map(|t| {
                let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        let mut vector = SparseVector::from_entries(
            counts
                .into_iter()
                .map(|(i, tf)| (i, tf * self.idf[i]))
                .collect(),
        );
        vector.normalize();
        vector
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, texts: &[S]) -> Vec<SparseVector> {
        self.fit(texts);
        texts.iter().map(|t| self.transform(t.as_ref())).collect()
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_drops_stop_words_and_short_tokens() {
        let v = TfidfVectorizer::new();
        assert_eq!(v.analyze("I LOVE this movie, a 10/10!"), vec!["love", "movie", "10", "10"]);
        let keep = TfidfVectorizer::new().with_stop_words(false);
        assert_eq!(keep.analyze("I love this"), vec!["love", "this"]);
    }

    #[test]
    fn test_vectors_are_unit_length() {
        let mut v = TfidfVectorizer::new();
        let vectors = v.fit_transform(&["great movie", "terrible movie", "great great acting"]);
        for vector in &vectors {
            assert!((vector.norm_sq() - 1.0).abs() < 1e-9);
        }
        assert_eq!(v.dimension(), 4);
        // rarer terms weigh more than the shared one
        let movie = v.vocabulary()["movie"];
        let great = v.vocabulary()["great"];
        let terrible = v.vocabulary()["terrible"];
        assert!(vectors[1].get(terrible) > vectors[1].get(movie));
        assert!(vectors[0].get(great) > 0.0);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut v = TfidfVectorizer::new().with_max_features(1);
        v.fit(&["apple apple banana", "apple cherry"]);
        assert_eq!(v.vocabulary().keys().collect::<Vec<_>>(), vec!["apple"]);
    }

    #[test]
    fn test_unknown_text_is_zero_vector() {
        let mut v = TfidfVectorizer::new();
        v.fit(&["alpha beta"]);
        assert!(v.transform("gamma delta").is_empty());
    }

    #[test]
    fn test_sparse_arithmetic() {
        let a = SparseVector::from_entries(vec![(2, 1.0), (0, 3.0)]);
        let b = SparseVector::from_entries(vec![(0, 1.0), (1, 4.0)]);
        assert_eq!(a.dot(&b), 3.0);
        assert_eq!(a.dot_dense(&[1.0, 1.0, 2.0]), 5.0);
        assert!((a.euclidean(&a)).abs() < 1e-12);
        assert_eq!(a.get(1), 0.0);
    }
}
