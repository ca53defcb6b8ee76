//! Column validation
//!
//! Every rule produces a row mask. Masks are ANDed into one combined mask that
//! is applied once at the end, so each rule's rejection counter reflects every
//! row it rejects, including rows another rule also rejects.

use super::metrics::{self, CleaningMetrics};
use super::options::{ColumnValidationRule, ValidationCheck};
use super::CleaningError;
use crate::table::{Cell, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sentiprep_common::config::MissingColumnPolicy;
use std::collections::HashSet;
use tracing::debug;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%a %b %d %H:%M:%S %Y",
];

/// Log-style timestamp with a numeric zone, e.g. `Mon Apr 06 22:19:45 +0000 2009`
const ZONED_LOG_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Same layout with the zone token removed
const UNZONED_LOG_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Applies [`ColumnValidationRule`]s to a table
#[derive(Debug, Clone, Copy, Default)]
pub struct RowValidator {
    missing_columns: MissingColumnPolicy,
}

impl RowValidator {
    pub fn new(missing_columns: MissingColumnPolicy) -> Self {
        Self { missing_columns }
    }

    /// Filter `table` down to rows that pass every rule
    pub fn validate(
        &self,
        mut table: Table,
        rules: &[ColumnValidationRule],
        metrics: &mut CleaningMetrics,
    ) -> Result<Table, CleaningError> {
        let mut combined = vec![true; table.len()];

        for rule in rules {
            if !table.has_column(rule.column) {
                match self.missing_columns {
                    MissingColumnPolicy::Skip => {
                        debug!(
                            "Skipping {} rule on missing column {}",
                            rule.check.name(),
                            rule.column
                        );
                        continue;
                    }
                    MissingColumnPolicy::Fail => {
                        return Err(CleaningError::MissingColumn(rule.column));
                    }
                }
            }

            let cells: Vec<&Cell> = table.column(rule.column)?.collect();
            let mask = rule_mask(&rule.check, &cells);
            let rejected = mask.iter().filter(|ok| !**ok).count() as u64;
            if rejected > 0 {
                metrics.add(
                    &format!("invalid_{}_{}", rule.check.name(), rule.column),
                    rejected,
                );
            }

            for (keep, ok) in combined.iter_mut().zip(mask) {
                *keep &= ok;
            }
        }

        let removed = table.retain_mask(&combined);
        metrics.add(metrics::VALIDATION_ROWS_REMOVED, removed as u64);
        debug!("Validation removed {} rows, {} remain", removed, table.len());
        Ok(table)
    }
}

fn rule_mask(check: &ValidationCheck, cells: &[&Cell]) -> Vec<bool> {
    match check {
        ValidationCheck::Polarity { allowed } => polarity_mask(cells, allowed),
        ValidationCheck::UniqueId => {
            let mut seen = HashSet::new();
            cells
                .iter()
                .map(|cell| match non_blank(cell) {
                    Some(value) => seen.insert(value.trim()),
                    None => false,
                })
                .collect()
        }
        ValidationCheck::Date => cells
            .iter()
            .map(|cell| non_blank(cell).map_or(false, is_parseable_date))
            .collect(),
        ValidationCheck::NotEmpty => cells.iter().map(|cell| non_blank(cell).is_some()).collect(),
        ValidationCheck::MaxLength { max_length } => cells
            .iter()
            .map(|cell| {
                cell.as_deref()
                    .map_or(true, |value| value.chars().count() <= *max_length)
            })
            .collect(),
    }
}

fn non_blank<'c>(cell: &'c Cell) -> Option<&'c str> {
    cell.as_deref().filter(|v| !v.trim().is_empty())
}

/// A column containing any unparseable value fails as a whole
fn polarity_mask(cells: &[&Cell], allowed: &[i64]) -> Vec<bool> {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell.as_deref() {
            None => Some(None),
            Some(value) => value.trim().parse::<f64>().ok().map(Some),
        })
        .collect();

    match parsed {
        None => vec![false; cells.len()],
        Some(values) => values
            .into_iter()
            .map(|value| {
                value.map_or(false, |v| v.fract() == 0.0 && allowed.contains(&(v as i64)))
            })
            .collect(),
    }
}

/// Try each known layout in order; log timestamps fall back to dropping the zone token
pub fn is_parseable_date(value: &str) -> bool {
    let value = value.trim();

    if DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_str(value, ZONED_LOG_FORMAT).is_ok()
    {
        return true;
    }

    if DATE_FORMATS
        .iter()
        .any(|f| NaiveDate::parse_from_str(value, f).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(value, f).is_ok())
    {
        return true;
    }

    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() == 6 {
        let without_zone = [&tokens[..4], &tokens[5..]].concat().join(" ");
        return NaiveDateTime::parse_from_str(&without_zone, UNZONED_LOG_FORMAT).is_ok();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|r| {
                    r.iter()
                        .map(|c| (!c.is_empty()).then(|| c.to_string()))
                        .collect()
                })
                .collect(),
        )
        .unwrap()
    }

    fn run(t: Table, rules: &[ColumnValidationRule]) -> (Table, CleaningMetrics) {
        let mut metrics = CleaningMetrics::new();
        let out = RowValidator::default().validate(t, rules, &mut metrics).unwrap();
        (out, metrics)
    }

    #[test]
    fn test_polarity_rule() {
        let t = table(&[&["4", "a"], &["1", "b"], &["0.0", "c"], &["", "d"]]);
        let (out, metrics) = run(t, &[ColumnValidationRule::new(0, ValidationCheck::polarity())]);
        assert_eq!(out.len(), 2);
        assert_eq!(metrics.get("invalid_polarity_0"), 2);
    }

    #[test]
    fn test_polarity_unparseable_fails_whole_column() {
        let t = table(&[&["4", "a"], &["positive", "b"], &["0", "c"]]);
        let (out, metrics) = run(t, &[ColumnValidationRule::new(0, ValidationCheck::polarity())]);
        assert!(out.is_empty());
        assert_eq!(metrics.get("invalid_polarity_0"), 3);
    }

    #[test]
    fn test_unique_id_keeps_first_occurrence() {
        let t = table(&[&["1", "a"], &["2", "b"], &["1", "c"], &["", "d"]]);
        let (out, metrics) = run(t, &[ColumnValidationRule::new(0, ValidationCheck::UniqueId)]);
        assert_eq!(out.column_text(1).unwrap(), vec!["a", "b"]);
        assert_eq!(metrics.get("invalid_unique_id_0"), 2);
    }

    #[test]
    fn test_date_formats() {
        assert!(is_parseable_date("2009-04-06"));
        assert!(is_parseable_date("2009-04-06 22:19:45"));
        assert!(is_parseable_date("2009-04-06T22:19:45Z"));
        assert!(is_parseable_date("Mon Apr 06 22:19:45 +0000 2009"));
        assert!(is_parseable_date("Mon Apr 06 22:19:45 PDT 2009"));
        assert!(is_parseable_date("06/04/2009"));
        assert!(!is_parseable_date("yesterday"));
        assert!(!is_parseable_date("2009-13-45"));
    }

    #[test]
    fn test_not_empty_and_max_length() {
        let t = table(&[&["short", "x"], &["this is long", "y"], &["", "z"], &["  ", "w"]]);
        let (out, metrics) = run(
            t.clone(),
            &[ColumnValidationRule::new(0, ValidationCheck::MaxLength { max_length: 5 })],
        );
        // null passes max_length; whitespace-only is length 2
        assert_eq!(out.len(), 3);
        assert_eq!(metrics.get("invalid_max_length_0"), 1);

        let (out, _) = run(t, &[ColumnValidationRule::new(0, ValidationCheck::NotEmpty)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_rules_combine_and_count_independently() {
        let t = table(&[&["9", ""], &["4", "ok"], &["0", ""]]);
        let rules = [
            ColumnValidationRule::new(0, ValidationCheck::polarity()),
            ColumnValidationRule::new(1, ValidationCheck::NotEmpty),
        ];
        let (out, metrics) = run(t, &rules);
        assert_eq!(out.len(), 1);
        assert_eq!(metrics.get("invalid_polarity_0"), 1);
        // row 0 fails both rules and is counted by both
        assert_eq!(metrics.get("invalid_not_empty_1"), 2);
        assert_eq!(metrics.get(metrics::VALIDATION_ROWS_REMOVED), 2);
    }

    #[test]
    fn test_output_never_grows_and_retained_rows_pass() {
        let t = table(&[&["1", "a"], &["1", "b"], &["2", ""], &["4", "d"]]);
        let rules = [
            ColumnValidationRule::new(0, ValidationCheck::UniqueId),
            ColumnValidationRule::new(1, ValidationCheck::NotEmpty),
        ];
        let (out, _) = run(t.clone(), &rules);
        assert!(out.len() <= t.len());
        for row in out.rows() {
            assert!(row[1].as_deref().map_or(false, |v| !v.trim().is_empty()));
        }
        // re-validating the output removes nothing
        let (again, _) = run(out.clone(), &rules);
        assert_eq!(again, out);
    }

    #[test]
    fn test_missing_column_policy() {
        let t = table(&[&["a"]]);
        let rule = [ColumnValidationRule::new(3, ValidationCheck::NotEmpty)];

        let (out, _) = run(t.clone(), &rule);
        assert_eq!(out.len(), 1);

        let mut metrics = CleaningMetrics::new();
        let err = RowValidator::new(MissingColumnPolicy::Fail)
            .validate(t, &rule, &mut metrics)
            .unwrap_err();
        assert!(matches!(err, CleaningError::MissingColumn(3)));
    }
}
