//! Stratified train/validation split

use super::ModelError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Row indexes of each side, ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Split row indexes so each label keeps roughly its share on both sides
///
/// The validation side gets `ceil(test_size * n)` rows, at least one, and the
/// training side keeps at least one. Per-label quotas are the floor of the
/// proportional share, with the remaining slots going to the labels with the
/// largest fractional remainders.
pub fn stratified_split(labels: &[i64], test_size: f64, seed: u64) -> Result<Split, ModelError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ModelError::InvalidHyperparameters(format!(
            "test_size must be between 0 and 1, got {}",
            test_size
        )));
    }
    let n = labels.len();
    if n < 2 {
        return Err(ModelError::TooFewRows { needed: 2, found: n });
    }

    let n_validation = ((test_size * n as f64).ceil() as usize).clamp(1, n - 1);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        groups.entry(*label).or_default().push(i);
    }
    for members in groups.values_mut() {
        members.shuffle(&mut rng);
    }

    // (label, quota, fractional remainder)
    let mut quotas: Vec<(i64, usize, f64)> = groups
        .iter()
        .map(|(label, members)| {
            let exact = members.len() as f64 * n_validation as f64 / n as f64;
            (*label, exact.floor() as usize, exact - exact.floor())
        })
        .collect();

    let mut assigned: usize = quotas.iter().map(|q| q.1).sum();
    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|a, b| quotas[*b].2.total_cmp(&quotas[*a].2).then(a.cmp(b)));
    while assigned < n_validation {
        let before = assigned;
        for &i in &order {
            if assigned == n_validation {
                break;
            }
            let capacity = groups[&quotas[i].0].len();
            if quotas[i].1 < capacity {
                quotas[i].1 += 1;
                assigned += 1;
            }
        }
        if assigned == before {
            break;
        }
    }

    let mut train = Vec::with_capacity(n - n_validation);
    let mut validation = Vec::with_capacity(n_validation);
    for (label, quota, _) in quotas {
        let members = &groups[&label];
        validation.extend_from_slice(&members[..quota]);
        train.extend_from_slice(&members[quota..]);
    }
    train.sort_unstable();
    validation.sort_unstable();
    Ok(Split { train, validation })
}
