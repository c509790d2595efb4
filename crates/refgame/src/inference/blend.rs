//! Context renormalization and prior blending for the exhaustive protocols.

use ndarray::{Array2, Array3, ArrayView1, Axis, s};

use super::shape::log_normalize_axis;

/// Per-example score matrices over the vocabulary, shape `[batch, vocab]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrices {
    /// Base-model scores at the true context slot, unnormalized.
    pub raw: Array2<f64>,
    /// Scores renormalized over the context alternatives, at the true slot.
    pub normalized: Array2<f64>,
}

/// Collapse a `[batch, context, vocab]` tensor to `[batch, vocab]`.
///
/// With context, `normalized` is the tensor log-normalized along the
/// context axis (per example and utterance) and read at each example's true
/// slot; `raw` is read at the same slot without normalization. Without
/// context (`true_context = None`, context axis of length 1), both are the
/// tensor itself.
pub fn context_normalize(mut tensor: Array3<f64>, true_context: Option<&[usize]>) -> ScoreMatrices {
    let Some(true_context) = true_context else {
        let raw = tensor.index_axis_move(Axis(1), 0);
        return ScoreMatrices {
            normalized: raw.clone(),
            raw,
        };
    };
    debug_assert_eq!(true_context.len(), tensor.len_of(Axis(0)));

    let (batch, _, vocab) = tensor.dim();
    let mut raw = Array2::<f64>::zeros((batch, vocab));
    for (i, &slot) in true_context.iter().enumerate() {
        raw.row_mut(i).assign(&tensor.slice(s![i, slot, ..]));
    }

    log_normalize_axis(&mut tensor, Axis(1));
    let mut normalized = Array2::<f64>::zeros((batch, vocab));
    for (i, &slot) in true_context.iter().enumerate() {
        normalized.row_mut(i).assign(&tensor.slice(s![i, slot, ..]));
    }

    ScoreMatrices { raw, normalized }
}

/// Fold in the prior and the base-model weight, then renormalize.
///
/// Order matters:
/// 1. `normalized += 0.5 * prior` (broadcast over the batch)
/// 2. `normalized = w * raw + (1 - w) * normalized` when `w > 0`
/// 3. log-normalize each row over the vocabulary
///
/// A prior entry of `-inf` (zero count) zeroes that utterance. At `w == 1`
/// the result is exactly `raw`.
pub fn blend(
    matrices: ScoreMatrices,
    prior: Option<ArrayView1<'_, f64>>,
    base_weight: f64,
) -> Array2<f64> {
    let ScoreMatrices {
        raw,
        mut normalized,
    } = matrices;

    if let Some(prior) = prior {
        normalized += &(&prior * 0.5);
    }

    if base_weight >= 1.0 {
        normalized = raw;
    } else if base_weight > 0.0 {
        normalized.zip_mut_with(&raw, |n, &r| {
            *n = base_weight * r + (1.0 - base_weight) * *n;
        });
    }

    log_normalize_axis(&mut normalized, Axis(1));
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::shape::{GridShape, reshape_scores};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn row_mass(m: &Array2<f64>, i: usize) -> f64 {
        m.row(i).iter().map(|x| x.exp()).sum()
    }

    #[test]
    fn no_context_passes_tensor_through() {
        let shape = GridShape::exhaustive(2, None, 2);
        let tensor = reshape_scores(vec![1.0, 2.0, 3.0, 4.0], shape).unwrap();
        let m = context_normalize(tensor, None);
        assert_eq!(m.raw, array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(m.raw, m.normalized);
    }

    #[test]
    fn context_normalizes_then_selects_true_slot() {
        // One example, two meanings, two utterances
        let shape = GridShape::exhaustive(1, Some(2), 2);
        let scores = vec![0.9f64.ln(), 0.1f64.ln(), 0.3f64.ln(), 0.7f64.ln()];
        let tensor = reshape_scores(scores, shape).unwrap();
        let m = context_normalize(tensor, Some([1usize].as_slice()));

        assert_abs_diff_eq!(m.raw[[0, 0]], 0.3f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.raw[[0, 1]], 0.7f64.ln(), epsilon = 1e-12);
        // Utterance 0: 0.3 / (0.9 + 0.3); utterance 1: 0.7 / (0.1 + 0.7)
        assert_abs_diff_eq!(m.normalized[[0, 0]], (0.3f64 / 1.2).ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.normalized[[0, 1]], (0.7f64 / 0.8).ln(), epsilon = 1e-12);
    }

    #[test]
    fn blend_without_prior_or_weight_only_renormalizes() {
        let raw = array![[0.0, 0.0]];
        let normalized = array![[1.0, 3.0]];
        let out = blend(ScoreMatrices { raw, normalized }, None, 0.0);
        let lse = (1f64.exp() + 3f64.exp()).ln();
        assert_abs_diff_eq!(out[[0, 0]], 1.0 - lse, epsilon = 1e-12);
        assert_abs_diff_eq!(row_mass(&out, 0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn prior_is_added_at_half_weight_before_renormalizing() {
        let normalized = array![[0.5f64.ln(), 0.5f64.ln()]];
        let prior = array![0.9f64.ln(), 0.1f64.ln()];
        let out = blend(
            ScoreMatrices {
                raw: normalized.clone(),
                normalized,
            },
            Some(prior.view()),
            0.0,
        );
        // p ∝ 0.5 * sqrt(prior)
        let (a, b) = (0.9f64.sqrt(), 0.1f64.sqrt());
        assert_abs_diff_eq!(out[[0, 0]], (a / (a + b)).ln(), epsilon = 1e-9);
        assert_abs_diff_eq!(out[[0, 1]], (b / (a + b)).ln(), epsilon = 1e-9);
    }

    #[test]
    fn full_base_weight_ignores_prior_and_context() {
        let raw = array![[0.2f64.ln(), 0.8f64.ln()]];
        let normalized = array![[5.0, -5.0]];
        let prior = array![0.0, f64::NEG_INFINITY];
        let out = blend(
            ScoreMatrices {
                raw: raw.clone(),
                normalized,
            },
            Some(prior.view()),
            1.0,
        );
        for (o, r) in out.iter().zip(raw.iter()) {
            assert_abs_diff_eq!(*o, *r, epsilon = 1e-12);
        }
    }

    #[test]
    fn prior_is_applied_before_weighting() {
        let raw = array![[0.0, 0.0]];
        let normalized = array![[0.0, 0.0]];
        let prior = array![2.0, 0.0];
        let w = 0.5;
        let out = blend(ScoreMatrices { raw, normalized }, Some(prior.view()), w);
        // Weighted after the prior: 0.5 * (0.5 * 2.0) = 0.5 for item 0
        let expected0 = 0.5 - (0.5f64.exp() + 1.0).ln();
        assert_abs_diff_eq!(out[[0, 0]], expected0, epsilon = 1e-12);
    }

    #[test]
    fn zero_count_prior_zeroes_item_without_error() {
        let normalized = array![[0.0, 0.0, 0.0]];
        let prior = array![0.5f64.ln(), 0.5f64.ln(), f64::NEG_INFINITY];
        let out = blend(
            ScoreMatrices {
                raw: normalized.clone(),
                normalized,
            },
            Some(prior.view()),
            0.3,
        );
        assert_eq!(out[[0, 2]], f64::NEG_INFINITY);
        assert_abs_diff_eq!(row_mass(&out, 0), 1.0, epsilon = 1e-12);
    }
}
