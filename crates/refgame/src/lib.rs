//! refgame: exhaustive-enumeration scoring for reference-game models.
//!
//! Evaluates pragmatic speakers and listeners built on top of a base model
//! that scores (input, output) pairs. Three protocols share one batched
//! pipeline of grid building, reshaping, and log-space renormalization.
//!
//! # Key Types
//!
//! - [`ExhaustiveSpeaker`] / [`ExhaustivePriorSpeaker`] - speakers that
//!   enumerate the whole vocabulary through a base listener or speaker
//! - [`DirectListener`] - listener restricted to each example's alternatives
//! - [`RefGameConfig`] - configuration builder
//! - [`ModelRegistry`] - resolves configured model identifiers
//! - [`Example`] / [`Value`] - evaluation records
//!
//! # Pipeline
//!
//! See the [`inference`] module for the grid layout and the order of the
//! renormalization and blending steps.

// Re-export approx traits for users who want to compare scores
pub use approx;

pub mod config;
pub mod data;
pub mod error;
pub mod inference;
pub mod logger;
pub mod model;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Configuration and errors
pub use config::{ConfigError, RefGameConfig};
pub use error::EvalError;

// Data types
pub use data::{Example, Value, Vocabulary};

// Models and wrappers
pub use model::{
    Direction, DirectListener, EvalOutput, Evaluate, ExhaustivePriorSpeaker, ExhaustiveSpeaker,
    Learner, ModelRegistry, PriorCounter, ScoringModel, TableModel,
};

// Decision rule
pub use inference::{CategoricalSampler, Sampler};

// Logging
pub use logger::{EvalLogger, Verbosity};
