//! Missing-value handling

use super::metrics::{self, CleaningMetrics};
use super::options::{MissingStrategy, MissingValueRule};
use super::CleaningError;
use crate::table::Table;
use std::collections::BTreeMap;
use tracing::debug;

/// Apply each rule in order
pub fn handle_missing(
    table: &mut Table,
    rules: &[MissingValueRule],
    metrics: &mut CleaningMetrics,
) -> Result<(), CleaningError> {
    for rule in rules {
        let columns = match &rule.columns {
            Some(columns) => {
                if let Some(&bad) = columns.iter().find(|c| !table.has_column(**c)) {
                    return Err(CleaningError::MissingColumn(bad));
                }
                columns.clone()
            }
            None => (0..table.width()).collect(),
        };

        match rule.strategy {
            MissingStrategy::DropRows => {
                let mask: Vec<bool> = table
                    .rows()
                    .iter()
                    .map(|row| columns.iter().all(|&c| row[c].is_some()))
                    .collect();
                let removed = table.retain_mask(&mask);
                metrics.add(metrics::MISSING_ROWS_DROPPED, removed as u64);
            }
            MissingStrategy::FillConstant => {
                let value = rule.constant_value.clone().unwrap_or_default();
                for &column in &columns {
                    fill_column(table, column, &value, metrics);
                }
            }
            MissingStrategy::FillMean | MissingStrategy::FillMedian => {
                for &column in &columns {
                    let Some(mut values) = numeric_values(table, column) else {
                        debug!("Column {} is not numeric, skipping {:?}", column, rule.strategy);
                        continue;
                    };
                    let fill = if rule.strategy == MissingStrategy::FillMean {
                        values.iter().sum::<f64>() / values.len() as f64
                    } else {
                        median(&mut values)
                    };
                    fill_column(table, column, &format_number(fill), metrics);
                }
            }
            MissingStrategy::FillMode => {
                for &column in &columns {
                    let value = mode(table, column).unwrap_or_default();
                    fill_column(table, column, &value, metrics);
                }
            }
        }
    }
    Ok(())
}

fn fill_column(table: &mut Table, column: usize, value: &str, metrics: &mut CleaningMetrics) {
    let mut filled = 0;
    for row in table.rows_mut() {
        if row[column].is_none() {
            row[column] = Some(value.to_string());
            filled += 1;
        }
    }
    metrics.add(metrics::MISSING_VALUES_FILLED, filled);
}

/// Present values of a column, if every one of them is numeric and at least one exists
fn numeric_values(table: &Table, column: usize) -> Option<Vec<f64>> {
    let values: Option<Vec<f64>> = table
        .rows()
        .iter()
        .filter_map(|row| row[column].as_deref())
        .map(|v| v.trim().parse::<f64>().ok())
        .collect();
    values.filter(|v| !v.is_empty())
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Most frequent present value; the smallest one among ties
fn mode(table: &Table, column: usize) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in table.rows().iter().filter_map(|row| row[column].as_deref()) {
        *counts.entry(value).or_insert(0) += 1;
    }
    let best = counts.values().copied().max()?;
    counts
        .into_iter()
        .find(|(_, count)| *count == best)
        .map(|(value, _)| value.to_string())
}

fn format_number(value: f64) -> String {
    format!("{}", value)
}
