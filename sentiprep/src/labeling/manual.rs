//! Manual annotation

use super::polarity::UNLABELED;
use super::target::{has_target_column, read_target, write_target};
use super::{LabelingError, Polarity};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One user-supplied label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub row_index: usize,
    pub label: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSummary {
    pub total_rows: usize,
    pub labeled_rows: usize,
    pub unlabeled_rows: usize,
}

/// Apply annotations to the target column
///
/// Labels outside {0, 2, 4} are rejected before anything changes. Row indexes
/// past the end of the table are ignored. With `stop_early` only annotated
/// rows are kept.
pub fn apply_annotations(
    table: &mut Table,
    text_column: usize,
    annotations: &[Annotation],
    stop_early: bool,
) -> Result<ManualSummary, LabelingError> {
    if let Some(bad) = annotations.iter().find(|a| Polarity::from_value(a.label).is_none()) {
        return Err(LabelingError::InvalidAnnotation {
            row_index: bad.row_index,
            label: bad.label,
        });
    }

    // later annotations for the same row win
    let by_row: BTreeMap<usize, i64> = annotations
        .iter()
        .filter(|a| a.row_index < table.len())
        .map(|a| (a.row_index, a.label))
        .collect();
    debug!(
        "Applying {} annotations ({} ignored)",
        by_row.len(),
        annotations.len() - annotations.iter().filter(|a| a.row_index < table.len()).count()
    );

    let existing: Vec<i64> = if has_target_column(table, text_column) {
        read_target(table)
            .into_iter()
            .map(|v| v.unwrap_or(UNLABELED))
            .collect()
    } else {
        vec![UNLABELED; table.len()]
    };

    let values: Vec<i64> = existing
        .into_iter()
        .enumerate()
        .map(|(row, current)| by_row.get(&row).copied().unwrap_or(current))
        .collect();
    write_target(table, text_column, &values)?;

    if stop_early {
        let keep: BTreeSet<usize> = by_row.keys().copied().collect();
        table.retain_indexes(&keep);
    }

    let labeled_rows = read_target(table)
        .into_iter()
        .filter(|v| v.map_or(false, |v| v != UNLABELED))
        .count();
    Ok(ManualSummary {
        total_rows: table.len(),
        labeled_rows,
        unlabeled_rows: table.len() - labeled_rows,
    })
}
