//! Classification metrics

use super::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    /// Support-weighted averages; a label never predicted has precision 0
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub error_rate: f64,
    /// Sorted union of true and predicted labels
    pub labels: Vec<i64>,
    /// Rows are true labels, columns predicted, both in `labels` order
    pub confusion_matrix: Vec<Vec<u64>>,
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn classification_metrics(
    y_true: &[i64],
    y_pred: &[i64],
) -> Result<ClassificationMetrics, ModelError> {
    if y_true.len() != y_pred.len() {
        return Err(ModelError::LengthMismatch {
            texts: y_pred.len(),
            labels: y_true.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }

    let labels: Vec<i64> = y_true
        .iter()
        .chain(y_pred)
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let position = |label: i64| labels.binary_search(&label).unwrap_or_default();

    let mut matrix = vec![vec![0u64; labels.len()]; labels.len()];
    for (t, p) in y_true.iter().zip(y_pred) {
        matrix[position(*t)][position(*p)] += 1;
    }

    let total = y_true.len() as u64;
    let correct: u64 = (0..labels.len()).map(|i| matrix[i][i]).sum();
    let accuracy = ratio(correct, total);

    let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
    for i in 0..labels.len() {
        let support: u64 = matrix[i].iter().sum();
        if support == 0 {
            continue;
        }
        let predicted: u64 = matrix.iter().map(|row| row[i]).sum();
        let tp = matrix[i][i];
        let p = ratio(tp, predicted);
        let r = ratio(tp, support);
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        let weight = support as f64 / total as f64;
        precision += p * weight;
        recall += r * weight;
        f1 += f * weight;
    }

    Ok(ClassificationMetrics {
        accuracy,
        precision,
        recall,
        f1_score: f1,
        error_rate: 1.0 - accuracy,
        labels,
        confusion_matrix: matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_predictions() {
        let m = classification_metrics(&[0, 4, 4], &[0, 4, 4]).unwrap();
        assert!(close(m.accuracy, 1.0));
        assert!(close(m.error_rate, 0.0));
        assert!(close(m.f1_score, 1.0));
        assert_eq!(m.confusion_matrix, vec![vec![1, 0], vec![0, 2]]);
    }

    #[test]
    fn test_weighted_scores() {
        // label 0: tp 1, support 2, predicted 1 -> p 1.0, r 0.5
        // label 4: tp 2, support 2, predicted 3 -> p 2/3, r 1.0
        let m = classification_metrics(&[0, 0, 4, 4], &[0, 4, 4, 4]).unwrap();
        assert!(close(m.accuracy, 0.75));
        assert!(close(m.error_rate, 0.25));
        assert!(close(m.precision, 0.5 * 1.0 + 0.5 * (2.0 / 3.0)));
        assert!(close(m.recall, 0.75));
        let f0 = 2.0 * 1.0 * 0.5 / 1.5;
        let f4 = 2.0 * (2.0 / 3.0) / (5.0 / 3.0);
        assert!(close(m.f1_score, 0.5 * f0 + 0.5 * f4));
    }

    #[test]
    fn test_predicted_only_label_in_matrix() {
        let m = classification_metrics(&[0, 0], &[2, 0]).unwrap();
        assert_eq!(m.labels, vec![0, 2]);
        assert_eq!(m.confusion_matrix, vec![vec![1, 1], vec![0, 0]]);
        assert!(close(m.precision, 1.0));
    }

    #[test]
    fn test_invalid_input() {
        assert!(classification_metrics(&[0], &[]).is_err());
        assert!(classification_metrics(&[], &[]).is_err());
    }
}
