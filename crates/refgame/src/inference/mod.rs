//! The exhaustive-enumeration scoring pipeline.
//!
//! Evaluation examples flow through these stages, one batch at a time:
//!
//! 1. [`grid`]: build one scoring request per candidate
//! 2. [`shape`]: reshape the base model's flat scores and log-normalize
//! 3. [`blend`]: fold in a prior and the base-model weight
//! 4. [`decision`]: arg-max or sample, and read off gold scores

pub mod blend;
pub mod decision;
pub mod grid;
pub mod shape;

pub use blend::{ScoreMatrices, blend, context_normalize};
pub use decision::{CategoricalSampler, Sampler, argmax_rows, decide, gold_scores};
pub use grid::{DirectGrid, ExhaustiveGrid, build_direct, build_exhaustive};
pub use shape::{GridShape, log_normalize_axis, log_sum_exp, reshape_scores};
