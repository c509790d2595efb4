//! Error types for reference-game evaluation.
//!
//! Every failure in the scoring pipeline is fatal for the run: errors
//! propagate to the caller and no partial predictions are returned.

use crate::config::ConfigError;

/// Errors raised while building candidate grids, scoring, or delegating to
/// the base model.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A protocol that needs explicit context alternatives got an example
    /// without them.
    #[error("example {index} has no context alternatives")]
    MissingContext { index: usize },

    /// The direct protocol was run against non-listener data.
    #[error("eval data must be listener data for the direct protocol")]
    ListenerDataRequired,

    /// Examples in one batch carry different numbers of alternatives.
    #[error("context size mismatch at example {index}: expected {expected}, got {actual}")]
    NonUniformContext {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// The candidate grid does not match `batch × context × vocabulary`.
    #[error("candidate grid has {actual} entries, expected {expected}")]
    GridSizeMismatch { expected: usize, actual: usize },

    /// The base model returned a different number of scores than requested.
    #[error("base model returned {actual} scores for a grid of {expected}")]
    ScoreCountMismatch { expected: usize, actual: usize },

    /// The configured grid capacity cannot hold a single example.
    #[error("batch capacity {capacity} is smaller than the grid width {width}")]
    ZeroBatchSize { capacity: usize, width: usize },

    /// A gold or true-context index points outside the context.
    #[error("index {index} is out of range for a context of size {context}")]
    InvalidGoldIndex { index: usize, context: usize },

    /// An utterance that is not part of the vocabulary.
    #[error("utterance {0:?} is not in the vocabulary")]
    UnknownUtterance(String),

    /// An example field holds the wrong kind of value.
    #[error("field `{field}` must hold {expected}")]
    UnexpectedValue {
        field: &'static str,
        expected: &'static str,
    },

    /// Categorical sampling failed (e.g. a row with no positive mass).
    #[error("sampling failed: {0}")]
    Sampling(String),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A model identifier that the registry does not know.
    #[error("unknown model {0:?}")]
    UnknownModel(String),

    /// A prior counter with zero total mass.
    #[error("prior counter has no observations")]
    EmptyPrior,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
