//! Label assignment
//!
//! Three ways to fill the target column of a table with polarity labels:
//! manual annotations, keyword scoring, and clustering followed by the
//! positional cluster-to-polarity mapping. Results always land in column 0.

pub mod cluster;
pub mod keyword;
pub mod manual;
pub mod polarity;
pub mod target;

pub use cluster::{ClusterSummary, ClusteringAlgorithm, ClusteringHyperparams};
pub use keyword::{KeywordLabeler, KeywordMap};
pub use manual::{Annotation, ManualSummary};
pub use polarity::Polarity;

use crate::clustering::ClusteringError;
use crate::table::{detect_text_column, Table, TableError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelingError {
    #[error("Annotation for row {row_index} has label {label}; expected 0, 2 or 4")]
    InvalidAnnotation { row_index: usize, label: i64 },

    #[error("Got {labels} labels for {rows} rows")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("No keywords provided for naive labeling")]
    NoKeywords,

    #[error("Dataset has no text column")]
    NoTextColumn,

    #[error(transparent)]
    Clustering(#[from] ClusteringError),

    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSummary {
    pub total: usize,
    /// Rows given a non-neutral label
    pub labeled: usize,
    pub neutral: usize,
}

/// Summary stored with each labeling record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelingSummary {
    Manual(ManualSummary),
    Keyword(KeywordSummary),
    Clusters(ClusterSummary),
}

fn text_column(table: &Table) -> Result<usize, LabelingError> {
    detect_text_column(table, &[]).ok_or(LabelingError::NoTextColumn)
}

fn write_polarities(table: &mut Table, text_column: usize, labels: &[Polarity]) -> Result<(), LabelingError> {
    let values: Vec<i64> = labels.iter().map(|p| p.value()).collect();
    target::write_target(table, text_column, &values)?;
    Ok(())
}

/// Label every row by keyword scores
pub fn label_table_by_keywords(
    table: &mut Table,
    labeler: &KeywordLabeler,
) -> Result<KeywordSummary, LabelingError> {
    let column = text_column(table)?;
    let labels = labeler.label_texts(&table.column_text(column)?);
    write_polarities(table, column, &labels)?;

    let neutral = labels.iter().filter(|l| **l == Polarity::Neutral).count();
    Ok(KeywordSummary {
        total: labels.len(),
        labeled: labels.len() - neutral,
        neutral,
    })
}

/// Label every row by clustering its text
///
/// Existing polarity labels in column 0 are used to report aligned accuracy
/// before they are overwritten.
pub fn label_table_by_clusters(
    table: &mut Table,
    algorithm: ClusteringAlgorithm,
    params: &ClusteringHyperparams,
) -> Result<ClusterSummary, LabelingError> {
    let column = text_column(table)?;
    let texts = table.column_text(column)?;
    let truth = target::ground_truth(table, column);
    let (labels, summary) = cluster::label_by_clusters(&texts, algorithm, params, truth.as_deref())?;
    write_polarities(table, column, &labels)?;
    Ok(summary)
}

/// Apply user annotations
pub fn label_table_manually(
    table: &mut Table,
    annotations: &[Annotation],
    stop_early: bool,
) -> Result<ManualSummary, LabelingError> {
    let column = text_column(table)?;
    manual::apply_annotations(table, column, annotations, stop_early)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_csv;

    #[test]
    fn test_keyword_labeling_end_to_end() {
        let mut table = read_csv(b"text\nI love this\nI hate this\n", true, None).unwrap();
        let mut map = KeywordMap::new();
        map.insert("pos".into(), vec!["love".into()]);
        map.insert("neg".into(), vec!["hate".into()]);

        let summary = label_table_by_keywords(&mut table, &KeywordLabeler::new(&map)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(target::read_target(&table), vec![Some(4), Some(0)]);
        assert_eq!(
            summary,
            KeywordSummary {
                total: 2,
                labeled: 2,
                neutral: 0
            }
        );
    }

    #[test]
    fn test_cluster_labeling_reports_alignment_against_existing_labels() {
        let mut table = Table::from_strs(&[
            &["4", "love love this great phone"],
            &["4", "great phone love it"],
            &["0", "awful battery terrible screen"],
            &["0", "terrible awful battery"],
        ])
        .unwrap();
        let summary = label_table_by_clusters(
            &mut table,
            ClusteringAlgorithm::Hierarchical,
            &ClusteringHyperparams {
                n_clusters: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(summary.aligned_accuracy, Some(1.0));
        // overwritten in place, not inserted
        assert_eq!(table.width(), 2);
        for value in target::read_target(&table) {
            assert!(matches!(value, Some(0) | Some(2) | Some(4)));
        }
    }

    #[test]
    fn test_summary_serializes_flat() {
        let summary = LabelingSummary::Keyword(KeywordSummary {
            total: 3,
            labeled: 1,
            neutral: 2,
        });
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({"total": 3, "labeled": 1, "neutral": 2})
        );
    }
}
