//! Single-string text normalization
//!
//! `clean` runs a fixed sequence of steps, each gated by one flag of
//! [`TextCleaningRule`]. An empty return value means the text must be dropped;
//! the reason is recorded in the run's [`CleaningMetrics`].
//!
//! Step order:
//! 1. absent or blank text
//! 2. retweet marker (short-circuits)
//! 3. `#` characters
//! 4. e-mail addresses and `@handles`
//! 5. HTML tags
//! 6. URLs
//! 7. contradictory emoji/emoticons
//! 8. punctuation and digits
//! 9. language filter
//! 10. whitespace collapse
//! 11. empty result
//!
//! URL removal follows the tag step, so an anchor's `href` leaves with its tag.
//! It precedes the emoticon check (`://` contains the `:/` marker) and the
//! punctuation pass (a URL is matched whole). Whitespace is collapsed last so
//! removals never leave doubled spaces.

use super::language::{Language, LanguageDetector};
use super::metrics::{self, CleaningMetrics};
use super::options::TextCleaningRule;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").expect("valid URL regex"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").expect("valid e-mail regex"));

static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("valid mention regex"));

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid HTML regex"));

static NON_WORD_OR_DIGIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]|\d").expect("valid punctuation regex"));

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const RETWEET_MARKERS: [&str; 2] = ["RT ", "RT@"];

const POSITIVE_MARKERS: &[&str] = &[
    "😀", "😃", "😄", "😁", "😆", "😊", "🙂", "😍", "🥰", "😘", "😂", "🤣", "👍", "❤", "💕",
    ":)", ":-)", ":D", ":-D", ";)", ";-)", "<3",
];

const NEGATIVE_MARKERS: &[&str] = &[
    "😞", "😔", "😟", "🙁", "☹", "😢", "😭", "😠", "😡", "🤬", "😩", "😫", "👎", "💔",
    ":(", ":-(", ":'(", ":/", ":-/",
];

/// Normalizes text cells according to one [`TextCleaningRule`]
#[derive(Debug, Clone, Copy)]
pub struct TextNormalizer<'a> {
    rule: &'a TextCleaningRule,
    detector: Option<&'a dyn LanguageDetector>,
}

impl<'a> TextNormalizer<'a> {
    /// `detector` is `None` when language detection is unavailable; the
    /// language filter is then skipped.
    pub fn new(rule: &'a TextCleaningRule, detector: Option<&'a dyn LanguageDetector>) -> Self {
        Self { rule, detector }
    }

    /// Clean one cell; returns `""` when the text must be dropped
    pub fn clean(&self, text: Option<&str>, metrics: &mut CleaningMetrics) -> String {
        let rule = self.rule;

        let Some(raw) = text.filter(|t| !t.trim().is_empty()) else {
            metrics.incr(metrics::ABSENT_TEXT);
            return String::new();
        };

        if rule.remove_retweets && is_retweet(raw) {
            metrics.incr(metrics::RETWEET);
            return String::new();
        }

        let mut text = raw.to_string();

        if rule.remove_hashtags {
            text = text.replace('#', "");
        }

        if rule.remove_mentions {
            text = EMAIL_RE.replace_all(&text, "").into_owned();
            text = MENTION_RE.replace_all(&text, "").into_owned();
        }

        if rule.remove_html_tags {
            text = HTML_TAG_RE.replace_all(&text, "").into_owned();
        }

        if rule.remove_urls {
            text = URL_RE.replace_all(&text, "").into_owned();
        }

        if rule.remove_contradictory_emojis && has_contradictory_markers(&text) {
            metrics.incr(metrics::POSITIVE_AND_NEGATIVE);
            return String::new();
        }

        if rule.remove_numbers {
            text = NON_WORD_OR_DIGIT_RE.replace_all(&text, "").into_owned();
        }

        if rule.filters_language() {
            if let Some(detector) = self.detector {
                if !self.language_allowed(detector.detect(&text)) {
                    metrics.incr(metrics::LANGUAGE_MISMATCH);
                    return String::new();
                }
            }
        }

        if rule.remove_extra_spaces {
            text = WHITESPACE_RE.replace_all(&text, " ").trim().to_string();
        }

        if text.trim().is_empty() {
            metrics.incr(metrics::EMPTY_AFTER_CLEANING);
            return String::new();
        }

        text
    }

    /// Allowed languages are the union of the enabled flags; undetermined and
    /// any other language are always rejected.
    fn language_allowed(&self, detected: Option<Language>) -> bool {
        match detected {
            Some(Language::French) => self.rule.remove_not_french,
            Some(Language::English) => self.rule.remove_not_english,
            Some(Language::Other) | None => false,
        }
    }
}

fn is_retweet(text: &str) -> bool {
    let trimmed = text.trim_start();
    RETWEET_MARKERS.iter().any(|m| trimmed.starts_with(m))
}

fn has_contradictory_markers(text: &str) -> bool {
    let positive = POSITIVE_MARKERS.iter().any(|m| text.contains(m));
    positive && NEGATIVE_MARKERS.iter().any(|m| text.contains(m))
}
