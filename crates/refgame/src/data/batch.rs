//! Batch splitting for evaluation.
//!
//! The exhaustive protocols score `width` candidates per example, so the
//! number of examples per batch is the grid capacity divided by that width.

use crate::data::Example;
use crate::error::EvalError;

/// Number of examples per batch for a grid capacity and per-example width.
///
/// # Errors
///
/// [`EvalError::ZeroBatchSize`] if a single example's grid would not fit,
/// reported before any scoring begins.
pub fn effective_batch_size(capacity: usize, width: usize) -> Result<usize, EvalError> {
    let width = width.max(1);
    let size = capacity / width;
    if size == 0 {
        return Err(EvalError::ZeroBatchSize { capacity, width });
    }
    Ok(size)
}

/// Split examples into consecutive batches of `size` in original order.
///
/// The final batch may be shorter. Restart by calling again.
pub fn iter_batches(examples: &[Example], size: usize) -> std::slice::Chunks<'_, Example> {
    debug_assert!(size > 0);
    examples.chunks(size)
}

/// Number of batches [`iter_batches`] yields.
pub fn num_batches(n_examples: usize, size: usize) -> usize {
    n_examples.div_ceil(size)
}
