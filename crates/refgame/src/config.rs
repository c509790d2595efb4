//! Evaluation configuration with builder pattern.
//!
//! [`RefGameConfig`] carries the options the wrapper learners read at
//! evaluation time. Field names match the option names used by existing
//! experiment configs, so a JSON config file deserializes directly.
//!
//! # Example
//!
//! ```
//! use refgame::RefGameConfig;
//!
//! // All defaults
//! let config = RefGameConfig::builder().build().unwrap();
//! assert_eq!(config.exhaustive_base_weight, 0.0);
//!
//! // Trust the base listener a little more than the pragmatic speaker
//! let config = RefGameConfig::builder()
//!     .exhaustive_base_learner("TableListener")
//!     .exhaustive_base_weight(0.25)
//!     .listener_eval_batch_size(2048)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.listener_eval_batch_size, 2048);
//! ```

use std::io::Read;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::logger::Verbosity;

/// Model identifier used when no base learner is configured.
pub const DEFAULT_BASE_LEARNER: &str = "TableListener";
/// Default grid capacity for one evaluation batch.
pub const DEFAULT_EVAL_BATCH_SIZE: usize = 4096;
/// Default number of distractors per reference game.
pub const DEFAULT_NUM_DISTRACTORS: usize = 4;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Mixing weight outside `[0, 1]`.
    #[error("exhaustive_base_weight must be in [0, 1], got {0}")]
    InvalidBaseWeight(f64),
    /// Grid capacity must be at least 1.
    #[error("listener_eval_batch_size must be at least 1")]
    ZeroBatchCapacity,
    /// Direct batches are sized by the distractor count.
    #[error("num_distractors must be at least 1")]
    ZeroDistractors,
    /// Model identifier left empty.
    #[error("{field} must name a model")]
    EmptyModelName { field: &'static str },
}

// =============================================================================
// RefGameConfig
// =============================================================================

/// Configuration for reference-game evaluation.
///
/// The builder (via `bon`) validates at build time. Deserialized configs are
/// validated by [`from_json_str`](Self::from_json_str) and
/// [`from_reader`](Self::from_reader); keys missing from the JSON take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default)]
pub struct RefGameConfig {
    /// Base model (level-0 listener or speaker) for the exhaustive speakers.
    #[builder(into, default = DEFAULT_BASE_LEARNER.to_string())]
    pub exhaustive_base_learner: String,

    /// Weight given to the base model's raw scores. The pragmatic
    /// distribution gets `1 - exhaustive_base_weight`. Default: 0.0.
    #[builder(default)]
    pub exhaustive_base_weight: f64,

    /// Base model for the direct context-limited listener.
    #[builder(into, default = DEFAULT_BASE_LEARNER.to_string())]
    pub direct_base_learner: String,

    /// Maximum number of candidates scored in one base-model call.
    #[builder(default = DEFAULT_EVAL_BATCH_SIZE)]
    pub listener_eval_batch_size: usize,

    /// Number of distractors; sizes direct-protocol batches.
    #[builder(default = DEFAULT_NUM_DISTRACTORS)]
    pub num_distractors: usize,

    /// Whether the eval data is listener data.
    #[builder(default = true)]
    pub listener: bool,

    /// Integer verbosity (0 = silent).
    #[builder(default)]
    pub verbosity: i32,
}

impl Default for RefGameConfig {
    fn default() -> Self {
        Self {
            exhaustive_base_learner: DEFAULT_BASE_LEARNER.to_string(),
            exhaustive_base_weight: 0.0,
            direct_base_learner: DEFAULT_BASE_LEARNER.to_string(),
            listener_eval_batch_size: DEFAULT_EVAL_BATCH_SIZE,
            num_distractors: DEFAULT_NUM_DISTRACTORS,
            listener: true,
            verbosity: 0,
        }
    }
}

/// Custom finishing function that validates the config.
impl<S: ref_game_config_builder::IsComplete> RefGameConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any option is invalid:
    /// - `exhaustive_base_weight` outside `[0, 1]`
    /// - `listener_eval_batch_size == 0`
    /// - `num_distractors == 0`
    /// - an empty model identifier
    pub fn build(self) -> Result<RefGameConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl RefGameConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, crate::EvalError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config.
    pub fn from_reader(reader: impl Read) -> Result<Self, crate::EvalError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // NaN fails the range check too
        if !(0.0..=1.0).contains(&self.exhaustive_base_weight) {
            return Err(ConfigError::InvalidBaseWeight(self.exhaustive_base_weight));
        }
        if self.listener_eval_batch_size == 0 {
            return Err(ConfigError::ZeroBatchCapacity);
        }
        if self.num_distractors == 0 {
            return Err(ConfigError::ZeroDistractors);
        }
        if self.exhaustive_base_learner.is_empty() {
            return Err(ConfigError::EmptyModelName {
                field: "exhaustive_base_learner",
            });
        }
        if self.direct_base_learner.is_empty() {
            return Err(ConfigError::EmptyModelName {
                field: "direct_base_learner",
            });
        }
        Ok(())
    }

    /// Verbosity level derived from the integer option.
    pub fn verbosity_level(&self) -> Verbosity {
        Verbosity::from_level(self.verbosity)
    }
}
