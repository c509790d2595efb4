//! Exhaustive pragmatic speakers.
//!
//! [`ExhaustiveSpeaker`] turns a base model into a speaker by scoring every
//! utterance against every meaning alternative, renormalizing over the
//! alternatives, and picking an utterance per example. The prior slot is a
//! type parameter: [`NoPrior`] for the plain speaker, [`PriorCounter`] for
//! [`ExhaustivePriorSpeaker`].

use std::fmt;

use crate::config::RefGameConfig;
use crate::data::{Example, Value, Vocabulary, effective_batch_size, iter_batches, num_batches};
use crate::error::EvalError;
use crate::inference::{
    Sampler, blend, build_exhaustive, context_normalize, decide, gold_scores, reshape_scores,
};
use crate::logger::EvalLogger;

use super::prior::{NoPrior, PriorCounter, PriorSource};
use super::registry::ModelRegistry;
use super::traits::{EvalOutput, Evaluate, ScoringModel, Wrapper};

/// Speaker that exhaustively enumerates the vocabulary through a base model.
pub struct ExhaustiveSpeaker<P = NoPrior> {
    base: Box<dyn ScoringModel>,
    config: RefGameConfig,
    prior: P,
}

/// Exhaustive speaker that also weighs utterances by observed frequency.
pub type ExhaustivePriorSpeaker = ExhaustiveSpeaker<PriorCounter>;

impl ExhaustiveSpeaker<NoPrior> {
    pub fn new(base: Box<dyn ScoringModel>, config: RefGameConfig) -> Self {
        Self {
            base,
            config,
            prior: NoPrior,
        }
    }

    /// Resolve `exhaustive_base_learner` through `registry`.
    pub fn from_config(config: &RefGameConfig, registry: &ModelRegistry) -> Result<Self, EvalError> {
        config.validate()?;
        let base = registry.create(&config.exhaustive_base_learner, config)?;
        Ok(Self::new(base, config.clone()))
    }
}

impl ExhaustiveSpeaker<PriorCounter> {
    /// Resolve `exhaustive_base_learner` through `registry` and attach `prior`.
    pub fn from_config_with_prior(
        config: &RefGameConfig,
        registry: &ModelRegistry,
        prior: PriorCounter,
    ) -> Result<Self, EvalError> {
        Ok(ExhaustiveSpeaker::<NoPrior>::from_config(config, registry)?.with_prior(prior))
    }
}

impl<P: PriorSource> ExhaustiveSpeaker<P> {
    /// Replace the prior, keeping the base model and config.
    pub fn with_prior<Q: PriorSource>(self, prior: Q) -> ExhaustiveSpeaker<Q> {
        ExhaustiveSpeaker {
            base: self.base,
            config: self.config,
            prior,
        }
    }

    pub fn config(&self) -> &RefGameConfig {
        &self.config
    }

    pub fn prior(&self) -> &P {
        &self.prior
    }
}

impl<P> Wrapper for ExhaustiveSpeaker<P> {
    fn base(&self) -> &dyn ScoringModel {
        self.base.as_ref()
    }

    fn base_mut(&mut self) -> &mut dyn ScoringModel {
        self.base.as_mut()
    }
}

impl<P: PriorSource> Evaluate for ExhaustiveSpeaker<P> {
    /// Predict an utterance for each example.
    ///
    /// Predictions are [`Value::Utterance`]s. Scores are the final
    /// log-probability of each example's gold output utterance.
    fn predict_and_score(
        &self,
        eval: &[Example],
        mut sampler: Option<&mut dyn Sampler>,
    ) -> Result<EvalOutput, EvalError> {
        let vocab = Vocabulary::from_tokens(self.base.tokens());
        let prior = self.prior.log_prior(&vocab);
        let direction = self.base.direction();

        // Sized by the vocabulary alone. With meaning alternatives a grid
        // holds `context` times that many requests.
        let batch_size = effective_batch_size(self.config.listener_eval_batch_size, vocab.len())?;

        let mut logger = EvalLogger::new(self.config.verbosity_level());
        logger.info("Testing");
        logger.start_task("Eval batch", num_batches(eval.len(), batch_size));

        let mut output = EvalOutput::with_capacity(eval.len());
        for (batch_num, batch) in iter_batches(eval, batch_size).enumerate() {
            logger.progress(batch_num);

            let grid = build_exhaustive(batch, batch_num * batch_size, &vocab, direction)?;
            let scores = self.base.score(&grid.requests)?;
            let tensor = reshape_scores(scores, grid.shape)?;
            let matrices = context_normalize(tensor, grid.true_context.as_deref());
            let log_probs = blend(
                matrices,
                prior.as_ref().map(|p| p.view()),
                self.config.exhaustive_base_weight,
            );

            let picks = decide(log_probs.view(), sampler.as_deref_mut())?;
            output.predictions.extend(
                vocab
                    .unvectorize_all(&picks)
                    .into_iter()
                    .map(Value::Utterance),
            );
            output
                .scores
                .extend(gold_scores(log_probs.view(), &grid.gold));
        }

        logger.end_task();
        Ok(output)
    }
}

impl<P: fmt::Debug> fmt::Debug for ExhaustiveSpeaker<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExhaustiveSpeaker")
            .field("direction", &self.base.direction())
            .field("config", &self.config)
            .field("prior", &self.prior)
            .finish_non_exhaustive()
    }
}
