//! Decision rules: arg-max or categorical sampling per example.

use ndarray::{ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::EvalError;

/// Row-wise categorical sampling.
///
/// Takes a `[rows, candidates]` matrix whose rows are probability
/// distributions and returns one sampled column index per row.
pub trait Sampler {
    fn sample_rows(&mut self, probs: ArrayView2<'_, f64>) -> Result<Vec<usize>, EvalError>;
}

/// [`Sampler`] backed by `rand`'s weighted index distribution.
#[derive(Debug, Clone)]
pub struct CategoricalSampler<R = StdRng> {
    rng: R,
}

impl CategoricalSampler<StdRng> {
    /// Deterministic sampler for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> CategoricalSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Sampler for CategoricalSampler<R> {
    fn sample_rows(&mut self, probs: ArrayView2<'_, f64>) -> Result<Vec<usize>, EvalError> {
        probs
            .axis_iter(Axis(0))
            .map(|row| {
                let dist = WeightedIndex::<f64>::new(row.iter())
                    .map_err(|e| EvalError::Sampling(e.to_string()))?;
                Ok(dist.sample(&mut self.rng))
            })
            .collect()
    }
}

/// Index of the largest entry in each row. Ties resolve to the first index.
pub fn argmax_rows(values: ArrayView2<'_, f64>) -> Vec<usize> {
    values
        .axis_iter(Axis(0))
        .map(|row| {
            let mut best = 0;
            let mut best_value = f64::NEG_INFINITY;
            for (i, &v) in row.iter().enumerate() {
                if v > best_value {
                    best = i;
                    best_value = v;
                }
            }
            best
        })
        .collect()
}

/// Pick one candidate per row of a log-probability matrix.
///
/// Samples from `exp(log_probs)` when a sampler is given, otherwise takes
/// the arg-max.
pub fn decide(
    log_probs: ArrayView2<'_, f64>,
    sampler: Option<&mut (dyn Sampler + '_)>,
) -> Result<Vec<usize>, EvalError> {
    match sampler {
        Some(sampler) => {
            let probs = log_probs.mapv(f64::exp);
            sampler.sample_rows(probs.view())
        }
        None => Ok(argmax_rows(log_probs)),
    }
}

/// Log-probability of each row's gold candidate.
pub fn gold_scores(log_probs: ArrayView2<'_, f64>, gold: &[usize]) -> Vec<f64> {
    debug_assert_eq!(gold.len(), log_probs.nrows());
    gold.iter()
        .enumerate()
        .map(|(i, &g)| log_probs[[i, g]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn argmax_prefers_first_of_ties() {
        let m = array![[0.0, 1.0, 1.0], [-1.0, -2.0, -3.0]];
        assert_eq!(argmax_rows(m.view()), vec![1, 0]);
    }

    #[test]
    fn argmax_of_all_neg_infinity_is_zero() {
        let m = array![[f64::NEG_INFINITY, f64::NEG_INFINITY]];
        assert_eq!(argmax_rows(m.view()), vec![0]);
    }

    #[test]
    fn gold_scores_read_gold_not_prediction() {
        let m = array![[0.9f64.ln(), 0.1f64.ln()]];
        assert_eq!(gold_scores(m.view(), &[1]), vec![0.1f64.ln()]);
    }

    #[test]
    fn sampling_concentrates_on_near_certain_candidate() {
        let log_probs = array![[(1e-6f64).ln(), (1.0f64 - 2e-6).ln(), (1e-6f64).ln()]];
        let mut sampler = CategoricalSampler::seeded(42);
        let hits = (0..1000)
            .filter(|_| decide(log_probs.view(), Some(&mut sampler)).unwrap() == vec![1])
            .count();
        assert!(hits >= 990, "only {hits} of 1000 samples hit the mode");
    }

    #[test]
    fn sampling_is_reproducible_with_a_seed() {
        let probs = array![[0.25, 0.25, 0.5], [0.5, 0.5, 0.0]];
        let a = CategoricalSampler::seeded(7).sample_rows(probs.view()).unwrap();
        let b = CategoricalSampler::seeded(7).sample_rows(probs.view()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a[1], 2);
    }

    #[test]
    fn sampling_a_massless_row_fails() {
        let probs = array![[0.0, 0.0]];
        let err = CategoricalSampler::seeded(0)
            .sample_rows(probs.view())
            .unwrap_err();
        assert!(matches!(err, EvalError::Sampling(_)));
    }

    #[test]
    fn decide_without_sampler_is_argmax() {
        let m = array![[0.3f64.ln(), 0.7f64.ln()]];
        assert_eq!(decide(m.view(), None).unwrap(), vec![1]);
    }
}
