//! Cleaning configuration
//!
//! Deserialized straight from the clean-job request body. Immutable for the
//! duration of one pipeline run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full configuration of one cleaning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningOptions {
    /// Columns to keep, by index, with their output names. Applied last.
    #[serde(default)]
    pub keep_columns: Option<BTreeMap<usize, String>>,

    /// Remove rows that are exact duplicates of an earlier row
    #[serde(default = "default_true")]
    pub remove_duplicates: bool,

    /// Missing-value rules, applied in list order
    #[serde(default)]
    pub missing_values: Vec<MissingValueRule>,

    /// Text normalization settings
    #[serde(default)]
    pub text_cleaning: Option<TextCleaningRule>,

    /// Per-column validation rules, combined by AND
    #[serde(default)]
    pub validations: Vec<ColumnValidationRule>,
}

fn default_true() -> bool {
    true
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            keep_columns: None,
            remove_duplicates: true,
            missing_values: Vec::new(),
            text_cleaning: None,
            validations: Vec::new(),
        }
    }
}

/// How missing cells are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    DropRows,
    FillConstant,
    FillMean,
    FillMedian,
    FillMode,
}

/// One missing-value rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingValueRule {
    pub strategy: MissingStrategy,
    /// Target columns; every column when absent
    #[serde(default)]
    pub columns: Option<Vec<usize>>,
    /// Fill value for `fill_constant` (empty string when absent)
    #[serde(default)]
    pub constant_value: Option<String>,
}

impl MissingValueRule {
    pub fn new(strategy: MissingStrategy) -> Self {
        Self {
            strategy,
            columns: None,
            constant_value: None,
        }
    }

    pub fn on_columns(mut self, columns: Vec<usize>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_constant(mut self, value: impl Into<String>) -> Self {
        self.constant_value = Some(value.into());
        self
    }
}

/// Text normalization flags; each one enables a single normalization step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextCleaningRule {
    /// Text columns to normalize; the detected text column when empty
    pub columns: Vec<usize>,
    pub remove_retweets: bool,
    pub remove_urls: bool,
    pub remove_hashtags: bool,
    pub remove_mentions: bool,
    pub remove_html_tags: bool,
    pub remove_contradictory_emojis: bool,
    pub remove_numbers: bool,
    pub remove_not_french: bool,
    pub remove_not_english: bool,
    pub remove_extra_spaces: bool,
}

impl TextCleaningRule {
    /// Every step enabled except the language filters
    pub fn all_steps() -> Self {
        Self {
            columns: Vec::new(),
            remove_retweets: true,
            remove_urls: true,
            remove_hashtags: true,
            remove_mentions: true,
            remove_html_tags: true,
            remove_contradictory_emojis: true,
            remove_numbers: true,
            remove_not_french: false,
            remove_not_english: false,
            remove_extra_spaces: true,
        }
    }

    pub fn filters_language(&self) -> bool {
        self.remove_not_french || self.remove_not_english
    }
}

/// A validation check bound to one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnValidationRule {
    pub column: usize,
    #[serde(flatten)]
    pub check: ValidationCheck,
}

impl ColumnValidationRule {
    pub fn new(column: usize, check: ValidationCheck) -> Self {
        Self { column, check }
    }
}

/// Validation predicate and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "validation_type", rename_all = "snake_case")]
pub enum ValidationCheck {
    Polarity {
        #[serde(default = "default_polarity_values")]
        allowed: Vec<i64>,
    },
    UniqueId,
    Date,
    NotEmpty,
    MaxLength {
        max_length: usize,
    },
}

fn default_polarity_values() -> Vec<i64> {
    vec![0, 2, 4]
}

impl ValidationCheck {
    /// Name used in counter keys (`invalid_{name}_{column}`)
    pub fn name(&self) -> &'static str {
        match self {
            ValidationCheck::Polarity { .. } => "polarity",
            ValidationCheck::UniqueId => "unique_id",
            ValidationCheck::Date => "date",
            ValidationCheck::NotEmpty => "not_empty",
            ValidationCheck::MaxLength { .. } => "max_length",
        }
    }

    pub fn polarity() -> Self {
        ValidationCheck::Polarity {
            allowed: default_polarity_values(),
        }
    }
}
