//! Grid shapes, reshaping, and log-space renormalization.
//!
//! A candidate grid is laid out row-major over `[example, context, vocab]`
//! with the vocabulary index varying fastest:
//!
//! ```text
//! flat = example * context * vocab + context_slot * vocab + vocab_item
//! ```
//!
//! Grids without a vocabulary axis (the direct protocol) use `vocab = 1`,
//! which drops the last term. Grids without context use `context = 1`.

use ndarray::{Array, Array3, ArrayView1, Axis, Dimension};

use crate::error::EvalError;

/// Logical shape of a candidate grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub batch: usize,
    pub context: usize,
    pub vocab: usize,
}

impl GridShape {
    /// Shape for exhaustive enumeration. `context = None` means the
    /// vocabulary is the only (implicit) context.
    pub fn exhaustive(batch: usize, context: Option<usize>, vocab: usize) -> Self {
        Self {
            batch,
            context: context.unwrap_or(1),
            vocab,
        }
    }

    /// Shape for direct context scoring (no vocabulary axis).
    pub fn direct(batch: usize, context: usize) -> Self {
        Self {
            batch,
            context,
            vocab: 1,
        }
    }

    /// Total number of grid entries.
    pub fn len(&self) -> usize {
        self.batch * self.context * self.vocab
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of `(example, context_slot, vocab_item)` in the flat grid.
    #[inline]
    pub fn flat_index(&self, example: usize, context_slot: usize, vocab_item: usize) -> usize {
        debug_assert!(example < self.batch);
        debug_assert!(context_slot < self.context);
        debug_assert!(vocab_item < self.vocab);
        (example * self.context + context_slot) * self.vocab + vocab_item
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.batch, self.context, self.vocab)
    }
}

/// Reshape flat per-candidate scores into a `[batch, context, vocab]` tensor.
///
/// # Errors
///
/// [`EvalError::ScoreCountMismatch`] if the base model returned the wrong
/// number of scores.
pub fn reshape_scores(scores: Vec<f64>, shape: GridShape) -> Result<Array3<f64>, EvalError> {
    if scores.len() != shape.len() {
        return Err(EvalError::ScoreCountMismatch {
            expected: shape.len(),
            actual: scores.len(),
        });
    }
    // Standard (C) layout matches the flat index identity above.
    Array3::from_shape_vec(shape.dims(), scores).map_err(|_| EvalError::GridSizeMismatch {
        expected: shape.len(),
        actual: shape.len(),
    })
}

/// Numerically stable `log(Σ exp(x))`.
///
/// Returns `-inf` for an empty input or when every entry is `-inf`, and
/// `+inf` when any entry is `+inf`.
pub fn log_sum_exp(values: ArrayView1<'_, f64>) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY || max == f64::INFINITY {
        return max;
    }
    let sum: f64 = values.iter().map(|&x| (x - max).exp()).sum();
    max + sum.ln()
}

/// Subtract the log-sum-exp of every lane along `axis`, in place.
///
/// Lanes with no mass (all `-inf`) are left unchanged instead of turning
/// into NaN. In a lane holding `+inf` entries those entries split the mass
/// evenly and every other entry becomes `-inf`, the limit of the finite case.
pub fn log_normalize_axis<D: Dimension>(values: &mut Array<f64, D>, axis: Axis) {
    for mut lane in values.lanes_mut(axis) {
        let lse = log_sum_exp(lane.view());
        if lse.is_finite() {
            lane.mapv_inplace(|x| x - lse);
        } else if lse == f64::INFINITY {
            let n_inf = lane.iter().filter(|&&x| x == f64::INFINITY).count();
            let share = -(n_inf as f64).ln();
            lane.mapv_inplace(|x| if x == f64::INFINITY { share } else { f64::NEG_INFINITY });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};
    use rstest::rstest;

    #[test]
    fn flat_index_matches_ndarray_layout() {
        let shape = GridShape::exhaustive(3, Some(4), 5);
        let flat: Vec<f64> = (0..shape.len()).map(|i| i as f64).collect();
        let tensor = reshape_scores(flat.clone(), shape).unwrap();
        for b in 0..3 {
            for c in 0..4 {
                for v in 0..5 {
                    assert_eq!(tensor[[b, c, v]], flat[shape.flat_index(b, c, v)]);
                }
            }
        }
    }

    #[test]
    fn vocab_free_shape_drops_last_term() {
        let shape = GridShape::direct(2, 3);
        assert_eq!(shape.len(), 6);
        assert_eq!(shape.flat_index(1, 2, 0), 5);
        assert_eq!(GridShape::exhaustive(2, None, 3).flat_index(1, 0, 2), 5);
    }

    #[test]
    fn wrong_score_count_is_rejected() {
        let err = reshape_scores(vec![0.0; 5], GridShape::direct(2, 3)).unwrap_err();
        assert!(matches!(
            err,
            EvalError::ScoreCountMismatch {
                expected: 6,
                actual: 5
            }
        ));
    }

    #[test]
    fn log_sum_exp_is_stable() {
        let big = array![1000.0, 1000.0];
        assert_abs_diff_eq!(log_sum_exp(big.view()), 1000.0 + 2f64.ln(), epsilon = 1e-12);

        let small = array![-1000.0, f64::NEG_INFINITY];
        assert_abs_diff_eq!(log_sum_exp(small.view()), -1000.0, epsilon = 1e-12);

        let empty = ndarray::Array1::<f64>::zeros(0);
        assert_eq!(log_sum_exp(empty.view()), f64::NEG_INFINITY);
    }

    #[test]
    fn normalized_rows_sum_to_one() {
        let mut m: Array2<f64> = array![[0.1, 2.0, -3.0], [5.0, 5.0, f64::NEG_INFINITY]];
        log_normalize_axis(&mut m, Axis(1));
        for row in m.rows() {
            let total: f64 = row.iter().map(|x| x.exp()).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        }
        assert_eq!(m[[1, 2]], f64::NEG_INFINITY);
    }

    #[test]
    fn empty_mass_lane_stays_neg_infinity() {
        let mut m = array![[f64::NEG_INFINITY, f64::NEG_INFINITY]];
        log_normalize_axis(&mut m, Axis(1));
        assert!(m.iter().all(|&x| x == f64::NEG_INFINITY));
    }

    #[rstest]
    #[case::single(array![[1.0, f64::INFINITY, -2.0]], 1.0)]
    #[case::tied(array![[f64::INFINITY, 0.0, f64::INFINITY]], 0.5)]
    fn infinite_entries_take_all_the_mass(#[case] m: Array2<f64>, #[case] share: f64) {
        let mut m = m;
        log_normalize_axis(&mut m, Axis(1));
        for &x in m.iter() {
            assert!(x == f64::NEG_INFINITY || (x - share.ln()).abs() < 1e-12);
        }
        let total: f64 = m.iter().map(|x| x.exp()).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn normalizes_middle_axis_of_tensor() {
        let shape = GridShape::exhaustive(1, Some(2), 2);
        let mut t = reshape_scores(vec![0.0, 1.0, 0.0, 3.0], shape).unwrap();
        log_normalize_axis(&mut t, Axis(1));
        for v in 0..2 {
            let total = t[[0, 0, v]].exp() + t[[0, 1, v]].exp();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        }
        // Column 0 had equal scores in both context slots
        assert_abs_diff_eq!(t[[0, 0, 0]], 0.5f64.ln(), epsilon = 1e-12);
    }
}
