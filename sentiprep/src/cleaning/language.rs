//! Language detection capability
//!
//! Detection is optional. The service resolves a detector once at startup and
//! the normalizer skips the language filter when none is available.

use std::fmt::Debug;

/// Languages the filter distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    French,
    English,
    Other,
}

/// Detects the language of a short text
pub trait LanguageDetector: Send + Sync + Debug {
    /// `None` when the language could not be determined
    fn detect(&self, text: &str) -> Option<Language>;
}

/// Trigram-based detector backed by `whatlang`
#[cfg(feature = "language-detection")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

#[cfg(feature = "language-detection")]
impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<Language> {
        let info = whatlang::detect(text)?;
        Some(match info.lang() {
            whatlang::Lang::Fra => Language::French,
            whatlang::Lang::Eng => Language::English,
            _ => Language::Other,
        })
    }
}

/// Fixed-answer detector for tests
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct FixedDetector(pub Option<Language>);

#[cfg(test)]
impl LanguageDetector for FixedDetector {
    fn detect(&self, _text: &str) -> Option<Language> {
        self.0
    }
}
