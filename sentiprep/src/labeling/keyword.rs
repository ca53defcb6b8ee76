//! Keyword-count labeling

use super::Polarity;
use std::collections::BTreeMap;

/// Class name to keyword list
pub type KeywordMap = BTreeMap<String, Vec<String>>;

/// Polarity implied by a class name
///
/// Names containing "pos" (which covers "positive") or "4" are positive;
/// otherwise names containing "neg" or "0" are negative; anything else is
/// neutral.
pub fn class_polarity(name: &str) -> Polarity {
    let name = name.to_lowercase();
    if name.contains("pos") || name.contains('4') {
        Polarity::Positive
    } else if name.contains("neg") || name.contains('0') {
        Polarity::Negative
    } else {
        Polarity::Neutral
    }
}

/// Parse a comma-separated keyword resource: trimmed, lowercased, blanks dropped
pub fn parse_keyword_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
struct KeywordClass {
    polarity: Polarity,
    keywords: Vec<String>,
}

/// Scores texts against named keyword lists
#[derive(Debug, Clone, Default)]
pub struct KeywordLabeler {
    classes: Vec<KeywordClass>,
}

impl KeywordLabeler {
    pub fn new(map: &KeywordMap) -> Self {
        let classes = map
            .iter()
            .map(|(name, words)| KeywordClass {
                polarity: class_polarity(name),
                keywords: words
                    .iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect(),
            })
            .collect();
        Self { classes }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.iter().all(|c| c.keywords.is_empty())
    }

    /// Label one text
    ///
    /// Score per class is the number of its keywords found as substrings of
    /// the lowercased text. No match, or a tie between the best classes, is
    /// neutral.
    pub fn label_text(&self, text: &str) -> Polarity {
        let lowered = text.to_lowercase();
        let scores: Vec<(usize, Polarity)> = self
            .classes
            .iter()
            .map(|class| {
                let score = class
                    .keywords
                    .iter()
                    .filter(|k| lowered.contains(k.as_str()))
                    .count();
                (score, class.polarity)
            })
            .collect();

        let best = scores.iter().map(|(s, _)| *s).max().unwrap_or(0);
        if best == 0 {
            return Polarity::Neutral;
        }

        let mut winners = scores.iter().filter(|(s, _)| *s == best);
        match (winners.next(), winners.next()) {
            (Some((_, polarity)), None) => *polarity,
            _ => Polarity::Neutral,
        }
    }

    pub fn label_texts<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Polarity> {
        texts.iter().map(|t| self.label_text(t.as_ref())).collect()
    }
}
