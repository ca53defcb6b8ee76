//! Cleaning pipeline
//!
//! Stage order is fixed: validation, duplicate removal, text normalization,
//! missing values, projection. Absent configuration skips a stage. Any stage
//! error aborts the run and no output is produced.

use super::language::LanguageDetector;
use super::metrics::{self, CleaningMetrics};
use super::missing::handle_missing;
use super::normalizer::TextNormalizer;
use super::options::{CleaningOptions, TextCleaningRule};
use super::validator::RowValidator;
use super::CleaningError;
use crate::table::{detect_text_column, Table};
use sentiprep_common::config::MissingColumnPolicy;
use std::collections::HashSet;
use tracing::debug;

/// Output of a successful run
#[derive(Debug, Clone)]
pub struct CleaningReport {
    pub table: Table,
    pub metrics: CleaningMetrics,
}

/// Runs [`CleaningOptions`] against a table
#[derive(Debug, Clone, Copy)]
pub struct CleaningPipeline<'a> {
    options: &'a CleaningOptions,
    detector: Option<&'a dyn LanguageDetector>,
    missing_columns: MissingColumnPolicy,
}

impl<'a> CleaningPipeline<'a> {
    pub fn new(options: &'a CleaningOptions) -> Self {
        Self {
            options,
            detector: None,
            missing_columns: MissingColumnPolicy::default(),
        }
    }

    pub fn with_language_detector(mut self, detector: Option<&'a dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_missing_column_policy(mut self, policy: MissingColumnPolicy) -> Self {
        self.missing_columns = policy;
        self
    }

    pub fn run(&self, table: Table) -> Result<CleaningReport, CleaningError> {
        let mut metrics = CleaningMetrics::new();
        let initial_rows = table.len() as u64;
        metrics.set(metrics::INITIAL_ROWS, initial_rows);

        let mut table = if self.options.validations.is_empty() {
            table
        } else {
            RowValidator::new(self.missing_columns).validate(
                table,
                &self.options.validations,
                &mut metrics,
            )?
        };

        if self.options.remove_duplicates {
            remove_duplicates(&mut table, &mut metrics);
        }

        if let Some(rule) = &self.options.text_cleaning {
            self.normalize_text(&mut table, rule, &mut metrics)?;
        }

        if !self.options.missing_values.is_empty() {
            handle_missing(&mut table, &self.options.missing_values, &mut metrics)?;
        }

        if let Some(keep) = self.options.keep_columns.as_ref().filter(|k| !k.is_empty()) {
            let selection: Vec<(usize, String)> = keep
                .iter()
                .filter(|(index, _)| table.has_column(**index))
                .map(|(index, name)| (*index, name.clone()))
                .collect();
            table.project(&selection)?;
        }

        let final_rows = table.len() as u64;
        metrics.set(metrics::FINAL_ROWS, final_rows);
        metrics.set(metrics::ROWS_REMOVED, initial_rows - final_rows);
        debug!(
            "Cleaning finished: {} -> {} rows",
            initial_rows, final_rows
        );

        Ok(CleaningReport { table, metrics })
    }

    fn normalize_text(
        &self,
        table: &mut Table,
        rule: &TextCleaningRule,
        metrics: &mut CleaningMetrics,
    ) -> Result<(), CleaningError> {
        let columns = if rule.columns.is_empty() {
            match detect_text_column(table, &[]) {
                Some(column) => vec![column],
                None => return Ok(()),
            }
        } else {
            if let Some(&bad) = rule.columns.iter().find(|c| !table.has_column(**c)) {
                return Err(CleaningError::MissingColumn(bad));
            }
            rule.columns.clone()
        };

        let normalizer = TextNormalizer::new(rule, self.detector);
        let mut keep = Vec::with_capacity(table.len());

        for row in table.rows_mut() {
            let mut any_text = false;
            for &column in &columns {
                let cleaned = normalizer.clean(row[column].as_deref(), metrics);
                any_text |= !cleaned.is_empty();
                row[column] = (!cleaned.is_empty()).then_some(cleaned);
            }
            keep.push(any_text);
        }

        let removed = table.retain_mask(&keep);
        metrics.add(metrics::EMPTY_TEXT_ROWS, removed as u64);
        debug!("Text normalization removed {} rows", removed);
        Ok(())
    }
}

/// Keep the first of each group of identical rows
fn remove_duplicates(table: &mut Table, metrics: &mut CleaningMetrics) {
    let mask: Vec<bool> = {
        let mut seen = HashSet::new();
        table.rows().iter().map(|row| seen.insert(row)).collect()
    };
    let removed = table.retain_mask(&mask);
    metrics.add(metrics::DUPLICATE_ROWS, removed as u64);
    debug!("Removed {} duplicate rows", removed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::options::{
        ColumnValidationRule, MissingStrategy, MissingValueRule, ValidationCheck,
    };
    use crate::table::write_csv;
    use std::collections::BTreeMap;

    #[test]
    fn test_duplicate_rows_counted() {
        let table = Table::from_strs(&[&["4", "same"], &["4", "same"], &["0", "other"]]).unwrap();
        let options = CleaningOptions::default();
        let report = CleaningPipeline::new(&options).run(table).unwrap();
        assert_eq!(report.table.len(), 2);
        assert_eq!(report.metrics.get(metrics::DUPLICATE_ROWS), 1);
        assert_eq!(report.metrics.get(metrics::ROWS_REMOVED), 1);
    }

    #[test]
    fn test_all_rows_removed_still_serializes() {
        let table = Table::from_strs(&[&["RT @a hi"], &["RT @b yo"]]).unwrap();
        let options = CleaningOptions {
            text_cleaning: Some(TextCleaningRule::all_steps()),
            ..Default::default()
        };
        let report = CleaningPipeline::new(&options).run(table).unwrap();
        assert_eq!(report.metrics.get(metrics::FINAL_ROWS), 0);
        assert_eq!(report.metrics.get(metrics::RETWEET), 2);
        assert!(write_csv(&report.table).unwrap().is_empty());
    }

    #[test]
    fn test_row_kept_when_one_text_column_survives() {
        let table = Table::from_strs(&[&["RT @x hi", "real text"], &["RT @y", "RT @z"]]).unwrap();
        let options = CleaningOptions {
            text_cleaning: Some(TextCleaningRule {
                columns: vec![0, 1],
                remove_retweets: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = CleaningPipeline::new(&options).run(table).unwrap();
        assert_eq!(report.table.len(), 1);
        assert_eq!(report.table.rows()[0], vec![None, Some("real text".to_string())]);
        assert_eq!(report.metrics.get(metrics::EMPTY_TEXT_ROWS), 1);
    }

    #[test]
    fn test_projection_runs_last() {
        let table = Table::from_strs(&[
            &["4", "id1", "Great day!!"],
            &["7", "id2", "Bad day"],
        ])
        .unwrap();
        let mut keep = BTreeMap::new();
        keep.insert(0, "target".to_string());
        keep.insert(2, "text".to_string());
        keep.insert(9, "ignored".to_string());
        let options = CleaningOptions {
            keep_columns: Some(keep),
            validations: vec![ColumnValidationRule::new(0, ValidationCheck::polarity())],
            missing_values: vec![MissingValueRule::new(MissingStrategy::DropRows)],
            text_cleaning: Some(TextCleaningRule {
                columns: vec![2],
                remove_numbers: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = CleaningPipeline::new(&options).run(table).unwrap();
        assert_eq!(report.table.columns(), &["target".to_string(), "text".to_string()]);
        assert_eq!(
            report.table.rows(),
            &[vec![Some("4".to_string()), Some("Great day".to_string())]]
        );
        assert_eq!(report.metrics.get("invalid_polarity_0"), 1);
    }

    #[test]
    fn test_final_rows_never_exceed_initial() {
        let table = Table::from_strs(&[&["a"], &["a"], &["b"], &["c"]]).unwrap();
        let report = CleaningPipeline::new(&CleaningOptions::default()).run(table).unwrap();
        assert!(report.metrics.get(metrics::FINAL_ROWS) <= report.metrics.get(metrics::INITIAL_ROWS));
        assert_eq!(report.metrics.get(metrics::INITIAL_ROWS), 4);
    }
}
