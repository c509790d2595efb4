//! Direct context-limited listener.
//!
//! Scores each utterance against its own object alternatives only and picks
//! the most likely alternative. There is no vocabulary enumeration and no
//! prior.

use std::fmt;

use ndarray::Axis;

use crate::config::RefGameConfig;
use crate::data::{Example, Value, effective_batch_size, iter_batches, num_batches};
use crate::error::EvalError;
use crate::inference::{Sampler, argmax_rows, build_direct, gold_scores, log_normalize_axis, reshape_scores};
use crate::logger::EvalLogger;

use super::registry::ModelRegistry;
use super::traits::{EvalOutput, Evaluate, ScoringModel, Wrapper};

/// Listener restricted to each example's `alt_outputs`.
pub struct DirectListener {
    base: Box<dyn ScoringModel>,
    config: RefGameConfig,
}

impl DirectListener {
    pub fn new(base: Box<dyn ScoringModel>, config: RefGameConfig) -> Self {
        Self { base, config }
    }

    /// Resolve `direct_base_learner` through `registry`.
    pub fn from_config(config: &RefGameConfig, registry: &ModelRegistry) -> Result<Self, EvalError> {
        config.validate()?;
        let base = registry.create(&config.direct_base_learner, config)?;
        Ok(Self::new(base, config.clone()))
    }

    pub fn config(&self) -> &RefGameConfig {
        &self.config
    }
}

impl Wrapper for DirectListener {
    fn base(&self) -> &dyn ScoringModel {
        self.base.as_ref()
    }

    fn base_mut(&mut self) -> &mut dyn ScoringModel {
        self.base.as_mut()
    }
}

impl Evaluate for DirectListener {
    /// Predict the index of the referred object among `alt_outputs`.
    ///
    /// Always arg-max: a sampler, if given, is ignored. Predictions are
    /// [`Value::Index`]es; scores are the log-probability of each example's
    /// gold index (its `output`).
    fn predict_and_score(
        &self,
        eval: &[Example],
        sampler: Option<&mut dyn Sampler>,
    ) -> Result<EvalOutput, EvalError> {
        if !self.config.listener {
            return Err(EvalError::ListenerDataRequired);
        }

        let batch_size =
            effective_batch_size(self.config.listener_eval_batch_size, self.config.num_distractors)?;
        let direction = self.base.direction();

        let mut logger = EvalLogger::new(self.config.verbosity_level());
        if sampler.is_some() {
            logger.debug("direct listener takes the arg-max; ignoring sampler");
        }
        logger.info("Testing");
        logger.start_task("Eval batch", num_batches(eval.len(), batch_size));

        let mut output = EvalOutput::with_capacity(eval.len());
        for (batch_num, batch) in iter_batches(eval, batch_size).enumerate() {
            logger.progress(batch_num);

            let grid = build_direct(batch, batch_num * batch_size, direction)?;
            let scores = self.base.score(&grid.requests)?;
            // [batch, context, 1] -> [batch, context]
            let mut log_probs = reshape_scores(scores, grid.shape)?.index_axis_move(Axis(2), 0);
            log_normalize_axis(&mut log_probs, Axis(1));

            let picks = argmax_rows(log_probs.view());
            output.predictions.extend(picks.into_iter().map(Value::Index));
            output
                .scores
                .extend(gold_scores(log_probs.view(), &grid.gold));
        }

        logger.end_task();
        Ok(output)
    }
}

impl fmt::Debug for DirectListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectListener")
            .field("direction", &self.base.direction())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
