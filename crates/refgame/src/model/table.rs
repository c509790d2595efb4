//! Count-table base model.
//!
//! [`TableModel`] scores `log P(output | input)` from smoothed co-occurrence
//! counts. It is a small but complete [`ScoringModel`]: trainable,
//! serializable, and usable as the level-0 agent for every wrapper.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::data::{Example, Value, Vocabulary};
use crate::error::EvalError;

use super::traits::{Direction, Learner, ScoringModel};

/// Additive smoothing applied to unseen pairs by default.
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Add-alpha smoothed conditional count table.
///
/// Values are keyed by [`Value::key`]. `BTreeMap` keeps dumps deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableModel {
    direction: Direction,
    alpha: f64,
    /// input key → output key → count
    counts: BTreeMap<String, BTreeMap<String, u64>>,
    input_totals: BTreeMap<String, u64>,
    /// Distinct outputs seen in training.
    n_outputs: usize,
    /// Utterances seen in training, first-seen order.
    tokens: Vec<String>,
}

impl TableModel {
    /// An untrained table. Scores are uniform until trained.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            alpha: DEFAULT_ALPHA,
            counts: BTreeMap::new(),
            input_totals: BTreeMap::new(),
            n_outputs: 0,
            tokens: Vec::new(),
        }
    }

    pub fn listener() -> Self {
        Self::new(Direction::Listener)
    }

    pub fn speaker() -> Self {
        Self::new(Direction::Speaker)
    }

    /// Set the smoothing constant. Must be positive.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        debug_assert!(alpha > 0.0);
        self.alpha = alpha;
        self
    }

    /// Smoothed `log P(output | input)`.
    pub fn log_likelihood(&self, input: &Value, output: &Value) -> f64 {
        let input_key = input.key();
        let pair = self
            .counts
            .get(&input_key)
            .and_then(|row| row.get(&output.key()))
            .copied()
            .unwrap_or(0);
        let total = self.input_totals.get(&input_key).copied().unwrap_or(0);
        let k = self.n_outputs.max(1) as f64;
        ((pair as f64 + self.alpha) / (total as f64 + self.alpha * k)).ln()
    }

    /// The utterance side of an example for this model's direction.
    fn utterance_of<'a>(&self, example: &'a Example) -> Option<&'a str> {
        match self.direction {
            Direction::Listener => example.input.as_utterance(),
            Direction::Speaker => example.output.as_utterance(),
        }
    }
}

impl Learner for TableModel {
    fn train(
        &mut self,
        training: &[Example],
        validation: Option<&[Example]>,
    ) -> Result<(), EvalError> {
        let mut counts: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        let mut input_totals: BTreeMap<String, u64> = BTreeMap::new();
        let mut outputs = std::collections::BTreeSet::new();
        let mut vocab = Vocabulary::default();

        for example in training {
            let input_key = example.input.key();
            let output_key = example.output.key();
            *counts
                .entry(input_key.clone())
                .or_default()
                .entry(output_key.clone())
                .or_insert(0) += 1;
            *input_totals.entry(input_key).or_insert(0) += 1;
            outputs.insert(output_key);
            if let Some(utterance) = self.utterance_of(example) {
                vocab.add(utterance.to_string());
            }
        }

        self.counts = counts;
        self.input_totals = input_totals;
        self.n_outputs = outputs.len();
        self.tokens = vocab.tokens().to_vec();
        tracing::debug!(
            examples = training.len(),
            cells = self.num_params(),
            tokens = self.tokens.len(),
            "trained count table"
        );

        if let Some(validation) = validation.filter(|v| !v.is_empty()) {
            let mean = validation
                .iter()
                .map(|ex| self.log_likelihood(&ex.input, &ex.output))
                .sum::<f64>()
                / validation.len() as f64;
            tracing::debug!(
                examples = validation.len(),
                mean_log_likelihood = mean,
                "validation"
            );
        }
        Ok(())
    }

    fn dump(&self, sink: &mut dyn Write) -> Result<(), EvalError> {
        serde_json::to_writer(sink, self)?;
        Ok(())
    }

    fn load(&mut self, source: &mut dyn Read) -> Result<(), EvalError> {
        *self = serde_json::from_reader(source)?;
        Ok(())
    }

    fn num_params(&self) -> usize {
        self.counts.values().map(BTreeMap::len).sum()
    }
}

impl ScoringModel for TableModel {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn tokens(&self) -> Vec<String> {
        self.tokens.clone()
    }

    fn score(&self, requests: &[Example]) -> Result<Vec<f64>, EvalError> {
        Ok(requests
            .iter()
            .map(|ex| self.log_likelihood(&ex.input, &ex.output))
            .collect())
    }
}
