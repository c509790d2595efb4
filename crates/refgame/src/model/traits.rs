//! Model capability traits.
//!
//! - [`Learner`]: what every model can do (train, persist, report size)
//! - [`ScoringModel`]: a base model that scores candidate grids
//! - [`Evaluate`]: a model that predicts and scores evaluation examples
//!
//! Wrapper learners own a boxed [`ScoringModel`] and implement [`Wrapper`];
//! the blanket [`Learner`] impl forwards everything to the base model.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::data::{Example, Value};
use crate::error::EvalError;
use crate::inference::Sampler;

/// Which way a model maps between utterances and objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Utterance → object.
    Listener,
    /// Object → utterance.
    Speaker,
}

/// Training, persistence, and size introspection.
pub trait Learner {
    fn train(
        &mut self,
        training: &[Example],
        validation: Option<&[Example]>,
    ) -> Result<(), EvalError>;

    fn dump(&self, sink: &mut dyn Write) -> Result<(), EvalError>;

    fn load(&mut self, source: &mut dyn Read) -> Result<(), EvalError>;

    /// Number of trainable parameters.
    fn num_params(&self) -> usize;
}

/// A base model that assigns log-likelihoods to (input, output) pairs.
///
/// `score` must be order-preserving (one score per request, aligned by
/// position) and must not mutate the model.
pub trait ScoringModel: Learner {
    fn direction(&self) -> Direction;

    /// Every utterance the model knows, in a stable order.
    fn tokens(&self) -> Vec<String>;

    /// Log-likelihood of each request's output given its input.
    fn score(&self, requests: &[Example]) -> Result<Vec<f64>, EvalError>;
}

/// Predictions and gold scores, aligned with the evaluation examples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalOutput {
    /// Predicted utterances (exhaustive speakers) or context indices
    /// (direct listener).
    pub predictions: Vec<Value>,
    /// Log-probability each example's gold item received.
    pub scores: Vec<f64>,
}

impl EvalOutput {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            predictions: Vec::with_capacity(n),
            scores: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Geometric-mean perplexity of the gold items, `exp(-mean(score))`.
    ///
    /// Returns NaN for an empty output.
    pub fn perplexity(&self) -> f64 {
        if self.scores.is_empty() {
            return f64::NAN;
        }
        let mean = self.scores.iter().sum::<f64>() / self.scores.len() as f64;
        (-mean).exp()
    }
}

/// Predict-and-score over evaluation examples.
pub trait Evaluate: Learner {
    /// Predict one item per example and report each gold item's
    /// log-probability.
    ///
    /// With a sampler, predictions are drawn from the final distribution
    /// where the protocol supports it; otherwise the arg-max is taken.
    fn predict_and_score(
        &self,
        eval: &[Example],
        sampler: Option<&mut dyn Sampler>,
    ) -> Result<EvalOutput, EvalError>;
}

/// A learner that owns a base model and delegates everything but
/// evaluation to it.
pub trait Wrapper {
    fn base(&self) -> &dyn ScoringModel;
    fn base_mut(&mut self) -> &mut dyn ScoringModel;
}

impl<W: Wrapper> Learner for W {
    fn train(
        &mut self,
        training: &[Example],
        validation: Option<&[Example]>,
    ) -> Result<(), EvalError> {
        self.base_mut().train(training, validation)
    }

    fn dump(&self, sink: &mut dyn Write) -> Result<(), EvalError> {
        self.base().dump(sink)
    }

    fn load(&mut self, source: &mut dyn Read) -> Result<(), EvalError> {
        self.base_mut().load(source)
    }

    fn num_params(&self) -> usize {
        self.base().num_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn direction_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Direction::Listener).unwrap(),
            "\"listener\""
        );
        let d: Direction = serde_json::from_str("\"speaker\"").unwrap();
        assert_eq!(d, Direction::Speaker);
    }

    #[test]
    fn perplexity_of_gold_scores() {
        let out = EvalOutput {
            predictions: vec![Value::from("red"), Value::from("red")],
            scores: vec![0.5f64.ln(), 0.125f64.ln()],
        };
        // exp(-(ln 0.5 + ln 0.125) / 2) = 1 / sqrt(0.0625) = 4
        assert_abs_diff_eq!(out.perplexity(), 4.0, epsilon = 1e-12);
        assert!(EvalOutput::default().perplexity().is_nan());
    }
}
