//! Test helpers shared by unit tests, integration tests, and benches.
//!
//! [`ScriptedModel`] is a base model whose scores come from a closure, so a
//! test can pin down exact log-likelihoods without training anything.

use std::cell::RefCell;
use std::fmt;
use std::io::{Read, Write};
use std::rc::Rc;

use ndarray::{ArrayView2, Axis};

use crate::data::Example;
use crate::error::EvalError;
use crate::model::{Direction, Learner, ScoringModel};

/// Default tolerance for f64 comparisons.
pub const DEFAULT_TOLERANCE_F64: f64 = 1e-9;

/// Probability mass of each row of a log-probability matrix.
pub fn row_masses(log_probs: ArrayView2<'_, f64>) -> Vec<f64> {
    log_probs
        .axis_iter(Axis(0))
        .map(|row| row.iter().map(|x| x.exp()).sum())
        .collect()
}

// =============================================================================
// ScriptedModel
// =============================================================================

/// Base model with closure-defined scores.
///
/// Clones share the call log, so a test can hand a clone to a wrapper and
/// inspect the calls afterwards.
#[derive(Clone)]
pub struct ScriptedModel {
    direction: Direction,
    tokens: Vec<String>,
    scorer: Rc<dyn Fn(&Example) -> f64>,
    num_params: usize,
    calls: Rc<RefCell<Calls>>,
}

#[derive(Debug, Default)]
struct Calls {
    /// Request count of each `score` call.
    score: Vec<usize>,
    /// Training-set size of each `train` call.
    train: Vec<usize>,
}

impl ScriptedModel {
    pub fn new<I, S, F>(direction: Direction, tokens: I, scorer: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Example) -> f64 + 'static,
    {
        Self {
            direction,
            tokens: tokens.into_iter().map(Into::into).collect(),
            scorer: Rc::new(scorer),
            num_params: 0,
            calls: Rc::default(),
        }
    }

    /// Utterance → object model.
    pub fn listener<I, S, F>(tokens: I, scorer: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Example) -> f64 + 'static,
    {
        Self::new(Direction::Listener, tokens, scorer)
    }

    /// Object → utterance model.
    pub fn speaker<I, S, F>(tokens: I, scorer: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Example) -> f64 + 'static,
    {
        Self::new(Direction::Speaker, tokens, scorer)
    }

    /// Set the reported parameter count.
    pub fn with_num_params(mut self, n: usize) -> Self {
        self.num_params = n;
        self
    }

    /// Request count of every `score` call so far, in order.
    pub fn score_calls(&self) -> Vec<usize> {
        self.calls.borrow().score.clone()
    }

    /// Training-set size of every `train` call so far, in order.
    pub fn train_calls(&self) -> Vec<usize> {
        self.calls.borrow().train.clone()
    }
}

impl Learner for ScriptedModel {
    fn train(
        &mut self,
        training: &[Example],
        _validation: Option<&[Example]>,
    ) -> Result<(), EvalError> {
        self.calls.borrow_mut().train.push(training.len());
        Ok(())
    }

    /// Writes the token list; scores are not serializable.
    fn dump(&self, sink: &mut dyn Write) -> Result<(), EvalError> {
        serde_json::to_writer(sink, &self.tokens)?;
        Ok(())
    }

    fn load(&mut self, source: &mut dyn Read) -> Result<(), EvalError> {
        self.tokens = serde_json::from_reader(source)?;
        Ok(())
    }

    fn num_params(&self) -> usize {
        self.num_params
    }
}

impl ScoringModel for ScriptedModel {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn tokens(&self) -> Vec<String> {
        self.tokens.clone()
    }

    fn score(&self, requests: &[Example]) -> Result<Vec<f64>, EvalError> {
        self.calls.borrow_mut().score.push(requests.len());
        Ok(requests.iter().map(|ex| (self.scorer)(ex)).collect())
    }
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel")
            .field("direction", &self.direction)
            .field("tokens", &self.tokens)
            .field("num_params", &self.num_params)
            .finish_non_exhaustive()
    }
}
