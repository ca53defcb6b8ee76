//! Rectangular assignment problem (Hungarian method with potentials)

/// Pair rows with distinct columns maximizing the total weight
///
/// Returns `min(rows, cols)` `(row, col)` pairs sorted by row. Rows must all
/// have the same length.
pub fn max_weight_assignment(weights: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let rows = weights.len();
    let cols = weights.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    let mut pairs = if rows <= cols {
        let cost: Vec<Vec<f64>> = weights
            .iter()
            .map(|row| row.iter().map(|w| -w).collect())
            .collect();
        min_cost_assignment(&cost)
            .into_iter()
            .enumerate()
            .collect::<Vec<_>>()
    } else {
        let cost: Vec<Vec<f64>> = (0..cols)
            .map(|c| (0..rows).map(|r| -weights[r][c]).collect())
            .collect();
        min_cost_assignment(&cost)
            .into_iter()
            .enumerate()
            .map(|(c, r)| (r, c))
            .collect()
    };
    pairs.sort_unstable();
    pairs
}

/// Column assigned to each row; requires `rows <= cols`
fn min_cost_assignment(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    let m = cost[0].len();
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    // p[j]: row (1-based) matched to column j; way[j]: previous column on the path
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0; n];
    for j in 1..=m {
        if p[j] != 0 {
            assignment[p[j] - 1] = j - 1;
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(weights: &[Vec<f64>], pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|&(r, c)| weights[r][c]).sum()
    }

    #[test]
    fn test_square_assignment() {
        let weights = vec![
            vec![1.0, 9.0, 0.0],
            vec![8.0, 2.0, 0.0],
            vec![0.0, 0.0, 7.0],
        ];
        let pairs = max_weight_assignment(&weights);
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
        assert_eq!(total(&weights, &pairs), 24.0);
    }

    #[test]
    fn test_more_columns_than_rows() {
        let weights = vec![vec![1.0, 5.0, 3.0], vec![4.0, 6.0, 0.0]];
        let pairs = max_weight_assignment(&weights);
        assert_eq!(pairs.len(), 2);
        assert_eq!(total(&weights, &pairs), 9.0);
    }

    #[test]
    fn test_more_rows_than_columns() {
        let weights = vec![vec![1.0], vec![7.0], vec![3.0]];
        assert_eq!(max_weight_assignment(&weights), vec![(1, 0)]);
    }

    #[test]
    fn test_empty() {
        assert!(max_weight_assignment(&[]).is_empty());
    }
}
