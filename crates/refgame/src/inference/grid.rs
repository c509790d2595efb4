//! Candidate-grid construction.
//!
//! Both builders emit one synthetic [`Example`] per grid cell in the order
//! fixed by [`GridShape::flat_index`]: outer loop over batch examples, then
//! context slots, then vocabulary items. The reshaper relies on this order.

use crate::data::{Example, Value, Vocabulary};
use crate::error::EvalError;
use crate::model::Direction;

use super::shape::GridShape;

/// Grid for the exhaustive speaker protocols.
#[derive(Debug, Clone)]
pub struct ExhaustiveGrid {
    /// Scoring requests, aligned with `shape`.
    pub requests: Vec<Example>,
    pub shape: GridShape,
    /// Index of each example's true meaning among its alternatives, when
    /// the batch carries context.
    pub true_context: Option<Vec<usize>>,
    /// Vocabulary index of each example's gold utterance.
    pub gold: Vec<usize>,
}

/// Grid for the direct listener protocol.
#[derive(Debug, Clone)]
pub struct DirectGrid {
    pub requests: Vec<Example>,
    pub shape: GridShape,
    /// Index of each example's true object among its alternatives.
    pub gold: Vec<usize>,
}

/// Orient an (utterance, object) pair to match the base model's direction.
#[inline]
fn oriented(direction: Direction, utterance: &Value, object: &Value) -> Example {
    match direction {
        Direction::Listener => Example::new(utterance.clone(), object.clone()),
        Direction::Speaker => Example::new(object.clone(), utterance.clone()),
    }
}

/// Number of meaning alternatives an example carries; empty counts as none.
fn alt_input_len(example: &Example) -> Option<usize> {
    example
        .alt_inputs
        .as_ref()
        .map(Vec::len)
        .filter(|&n| n > 0)
}

/// Build the exhaustive grid for one batch.
///
/// Each example is paired with every vocabulary item, once per meaning
/// alternative when `alt_inputs` is present, otherwise once with its own
/// `input` as the only meaning. `offset` is the position of the batch in the
/// full eval set, used in error reports.
///
/// # Errors
///
/// - [`EvalError::NonUniformContext`] if examples disagree on context size
/// - [`EvalError::InvalidGoldIndex`] if a true-context index is out of range
/// - [`EvalError::UnknownUtterance`] if a gold utterance is not in `vocab`
pub fn build_exhaustive(
    batch: &[Example],
    offset: usize,
    vocab: &Vocabulary,
    direction: Direction,
) -> Result<ExhaustiveGrid, EvalError> {
    let context = batch.first().and_then(alt_input_len);
    for (i, example) in batch.iter().enumerate() {
        let actual = alt_input_len(example);
        if actual != context {
            return Err(EvalError::NonUniformContext {
                index: offset + i,
                expected: context.unwrap_or(0),
                actual: actual.unwrap_or(0),
            });
        }
    }

    let shape = GridShape::exhaustive(batch.len(), context, vocab.len());
    let utterances: Vec<Value> = vocab
        .tokens()
        .iter()
        .map(|t| Value::Utterance(t.clone()))
        .collect();

    let mut requests = Vec::with_capacity(shape.len());
    for example in batch {
        let meanings = match &example.alt_inputs {
            Some(alts) if context.is_some() => alts.as_slice(),
            _ => std::slice::from_ref(&example.input),
        };
        for meaning in meanings {
            for utterance in &utterances {
                requests.push(oriented(direction, utterance, meaning));
            }
        }
    }
    if requests.len() != shape.len() {
        return Err(EvalError::GridSizeMismatch {
            expected: shape.len(),
            actual: requests.len(),
        });
    }

    let true_context = match context {
        Some(n) => Some(
            batch
                .iter()
                .map(|ex| {
                    let index = ex.input_index()?;
                    if index >= n {
                        return Err(EvalError::InvalidGoldIndex { index, context: n });
                    }
                    Ok(index)
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        None => None,
    };

    let gold = batch
        .iter()
        .map(|ex| {
            let utterance = ex.output_utterance()?;
            vocab
                .index_of(utterance)
                .ok_or_else(|| EvalError::UnknownUtterance(utterance.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExhaustiveGrid {
        requests,
        shape,
        true_context,
        gold,
    })
}

/// Build the direct grid for one batch: one request per object alternative.
///
/// # Errors
///
/// - [`EvalError::MissingContext`] if an example has no `alt_outputs`
/// - [`EvalError::NonUniformContext`] if examples disagree on context size
/// - [`EvalError::InvalidGoldIndex`] if a gold index is out of range
pub fn build_direct(
    batch: &[Example],
    offset: usize,
    direction: Direction,
) -> Result<DirectGrid, EvalError> {
    let mut context = None;
    let mut requests = Vec::new();
    let mut gold = Vec::with_capacity(batch.len());

    for (i, example) in batch.iter().enumerate() {
        let index = offset + i;
        let alts = match &example.alt_outputs {
            Some(alts) if !alts.is_empty() => alts,
            _ => return Err(EvalError::MissingContext { index }),
        };
        let expected = *context.get_or_insert(alts.len());
        if alts.len() != expected {
            return Err(EvalError::NonUniformContext {
                index,
                expected,
                actual: alts.len(),
            });
        }
        if requests.is_empty() {
            requests.reserve(batch.len() * expected);
        }
        for object in alts {
            requests.push(oriented(direction, &example.input, object));
        }

        let target = example.output_index()?;
        if target >= expected {
            return Err(EvalError::InvalidGoldIndex {
                index: target,
                context: expected,
            });
        }
        gold.push(target);
    }

    let shape = GridShape::direct(batch.len(), context.unwrap_or(0));
    if requests.len() != shape.len() {
        return Err(EvalError::GridSizeMismatch {
            expected: shape.len(),
            actual: requests.len(),
        });
    }

    Ok(DirectGrid {
        requests,
        shape,
        gold,
    })
}
