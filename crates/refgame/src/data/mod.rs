//! Evaluation data: examples, the utterance vocabulary, and batching.

mod batch;
mod example;
mod vocab;

pub use batch::{effective_batch_size, iter_batches, num_batches};
pub use example::{Example, Value};
pub use vocab::Vocabulary;
