//! Utterance priors for the pragmatic speaker.

use std::collections::BTreeMap;

use ndarray::Array1;

use crate::data::{Example, Vocabulary};
use crate::error::EvalError;

/// Source of a log-prior over the vocabulary.
///
/// The exhaustive speaker asks for the prior once per evaluation run; a
/// `None` prior skips the prior step entirely.
pub trait PriorSource {
    fn log_prior(&self, vocab: &Vocabulary) -> Option<Array1<f64>>;
}

/// No prior: the speaker relies on the base model alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPrior;

impl PriorSource for NoPrior {
    fn log_prior(&self, _vocab: &Vocabulary) -> Option<Array1<f64>> {
        None
    }
}

/// Observed utterance frequencies.
///
/// Immutable once built. An utterance never observed has count 0 and log
/// probability `-inf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorCounter {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl PriorCounter {
    /// Build from explicit counts.
    ///
    /// # Errors
    ///
    /// [`EvalError::EmptyPrior`] if the counts sum to zero.
    pub fn from_counts<I, S>(counts: I) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut merged = BTreeMap::<String, u64>::new();
        for (utterance, count) in counts {
            *merged.entry(utterance.into()).or_insert(0) += count;
        }
        let total: u64 = merged.values().sum();
        if total == 0 {
            return Err(EvalError::EmptyPrior);
        }
        Ok(Self {
            counts: merged,
            total,
        })
    }

    /// Count the gold output utterances of (speaker) training examples.
    ///
    /// Examples whose output is not an utterance are skipped.
    pub fn from_examples(examples: &[Example]) -> Result<Self, EvalError> {
        Self::from_counts(
            examples
                .iter()
                .filter_map(|ex| ex.output.as_utterance())
                .map(|u| (u, 1)),
        )
    }

    pub fn count(&self, utterance: &str) -> u64 {
        self.counts.get(utterance).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// `log(count) - log(total)` for one utterance.
    pub fn log_prob(&self, utterance: &str) -> f64 {
        (self.count(utterance) as f64).ln() - (self.total as f64).ln()
    }
}

impl PriorSource for PriorCounter {
    fn log_prior(&self, vocab: &Vocabulary) -> Option<Array1<f64>> {
        Some(vocab.tokens().iter().map(|u| self.log_prob(u)).collect())
    }
}
