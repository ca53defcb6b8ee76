//! Per-run cleaning counters
//!
//! A fresh value is created for every pipeline run and threaded through each
//! stage, so concurrent cleaning jobs never share counters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const INITIAL_ROWS: &str = "initial_rows";
pub const FINAL_ROWS: &str = "final_rows";
pub const ROWS_REMOVED: &str = "rows_removed";
pub const DUPLICATE_ROWS: &str = "duplicate_rows";
pub const ABSENT_TEXT: &str = "absent_text";
pub const RETWEET: &str = "retweet";
pub const POSITIVE_AND_NEGATIVE: &str = "positive_and_negative";
pub const LANGUAGE_MISMATCH: &str = "language_mismatch";
pub const EMPTY_AFTER_CLEANING: &str = "empty_after_cleaning";
pub const EMPTY_TEXT_ROWS: &str = "empty_text_rows";
pub const VALIDATION_ROWS_REMOVED: &str = "validation_rows_removed";
pub const MISSING_ROWS_DROPPED: &str = "missing_rows_dropped";
pub const MISSING_VALUES_FILLED: &str = "missing_values_filled";

/// Named counters accumulated during one cleaning run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CleaningMetrics {
    counters: BTreeMap<String, u64>,
}

impl CleaningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&mut self, name: &str, amount: u64) {
        *self.counters.entry(name.to_string()).or_insert(0) += amount;
    }

    pub fn set(&mut self, name: &str, value: u64) {
        self.counters.insert(name.to_string(), value);
    }

    /// Counter value; zero when never touched
    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let mut metrics = CleaningMetrics::new();
        metrics.incr(RETWEET);
        metrics.add(RETWEET, 2);
        metrics.set(INITIAL_ROWS, 10);
        assert_eq!(metrics.get(RETWEET), 3);
        assert_eq!(metrics.get(INITIAL_ROWS), 10);
        assert_eq!(metrics.get(ABSENT_TEXT), 0);
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let mut metrics = CleaningMetrics::new();
        metrics.incr(DUPLICATE_ROWS);
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json, serde_json::json!({"duplicate_rows": 1}));
    }
}
