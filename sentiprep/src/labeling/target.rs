//! Target column placement
//!
//! Labeled tables carry the target at column 0. An existing label column at
//! index 0 is overwritten; otherwise a new column is inserted in front.

use super::polarity::{parse_integer_cell, UNLABELED};
use super::{LabelingError, Polarity};
use crate::table::{detect_text_column, Table};

pub const TARGET_COLUMN: usize = 0;
pub const TARGET_COLUMN_NAME: &str = "target";

const TARGET_VALUES: [i64; 4] = [UNLABELED, 0, 2, 4];

/// Whether column 0 already holds labels (-1, 0, 2 or 4 in every present cell)
pub fn has_target_column(table: &Table, text_column: usize) -> bool {
    if text_column == TARGET_COLUMN || !table.has_column(TARGET_COLUMN) {
        return false;
    }
    table.rows().iter().all(|row| match row[TARGET_COLUMN].as_deref() {
        None => true,
        Some(cell) => parse_integer_cell(cell).map_or(false, |v| TARGET_VALUES.contains(&v)),
    })
}

/// Polarity ground truth in column 0, if every row has one
pub fn ground_truth(table: &Table, text_column: usize) -> Option<Vec<Polarity>> {
    if !has_target_column(table, text_column) || table.is_empty() {
        return None;
    }
    table
        .rows()
        .iter()
        .map(|row| row[TARGET_COLUMN].as_deref().and_then(Polarity::parse_cell))
        .collect()
}

/// Write target values into column 0
///
/// Returns the index of the text column after the write.
pub fn write_target(table: &mut Table, text_column: usize, values: &[i64]) -> Result<usize, LabelingError> {
    if values.len() != table.len() {
        return Err(LabelingError::LengthMismatch {
            rows: table.len(),
            labels: values.len(),
        });
    }
    let cells = values.iter().map(|v| Some(v.to_string())).collect();
    if has_target_column(table, text_column) {
        table.set_column(TARGET_COLUMN, cells)?;
        Ok(text_column)
    } else {
        table.insert_column(TARGET_COLUMN, TARGET_COLUMN_NAME, cells)?;
        Ok(text_column + 1)
    }
}

/// Current target values; `None` for rows without an integer label
pub fn read_target(table: &Table) -> Vec<Option<i64>> {
    table
        .rows()
        .iter()
        .map(|row| row.first().and_then(|c| c.as_deref()).and_then(parse_integer_cell))
        .collect()
}

/// Texts paired with polarity targets, ready for training or scoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledExamples {
    pub texts: Vec<String>,
    pub labels: Vec<i64>,
    /// Rows left out because their target is not a polarity value
    pub skipped: usize,
}

/// Extract (text, polarity) pairs with the target in column 0
///
/// The text column is detected among the remaining columns. Rows whose
/// target is missing, unlabeled (-1) or not a polarity value are skipped.
pub fn labeled_examples(table: &Table) -> Result<LabeledExamples, LabelingError> {
    let text_column = detect_text_column(table, &[TARGET_COLUMN]).ok_or(LabelingError::NoTextColumn)?;
    let mut examples = LabeledExamples::default();
    for row in table.rows() {
        let polarity = row[TARGET_COLUMN].as_deref().and_then(Polarity::parse_cell);
        match polarity {
            Some(p) => {
                examples.texts.push(row[text_column].clone().unwrap_or_default());
                examples.labels.push(p.value());
            }
            None => examples.skipped += 1,
        }
    }
    Ok(examples)
}
