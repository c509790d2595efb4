//! Evaluation records.

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// A single field value of an [`Example`].
///
/// Depending on the model direction and protocol, an input or output is an
/// utterance, an object (e.g. a color as a coordinate vector), or an index
/// into the example's context alternatives.
///
/// Serialized untagged: a JSON integer is an index, a string an utterance,
/// and an array of numbers an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Index into a list of context alternatives.
    Index(usize),
    /// An utterance token.
    Utterance(String),
    /// An object or meaning in feature space.
    Object(Vec<f64>),
}

impl Value {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_utterance(&self) -> Option<&str> {
        match self {
            Self::Utterance(s) => Some(s),
            _ => None,
        }
    }

    /// Stable textual key, used for hashing values in count tables.
    pub fn key(&self) -> String {
        match self {
            Self::Index(i) => format!("i:{i}"),
            Self::Utterance(s) => format!("u:{s}"),
            Self::Object(v) => format!("o:{v:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Utterance(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Utterance(s)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Self::Object(v)
    }
}

/// An evaluation (or training) record.
///
/// `alt_inputs` holds candidate meanings for exhaustive speaker scoring,
/// `alt_outputs` candidate objects for direct listener scoring. A protocol
/// reads at most one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: Value,
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_inputs: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_outputs: Option<Vec<Value>>,
}

impl Example {
    /// Create an example without context alternatives.
    pub fn new(input: impl Into<Value>, output: impl Into<Value>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            alt_inputs: None,
            alt_outputs: None,
        }
    }

    pub fn with_alt_inputs(mut self, alts: Vec<Value>) -> Self {
        self.alt_inputs = Some(alts);
        self
    }

    pub fn with_alt_outputs(mut self, alts: Vec<Value>) -> Self {
        self.alt_outputs = Some(alts);
        self
    }

    /// The input as a context index.
    pub fn input_index(&self) -> Result<usize, EvalError> {
        self.input.as_index().ok_or(EvalError::UnexpectedValue {
            field: "input",
            expected: "a context index",
        })
    }

    /// The output as a context index.
    pub fn output_index(&self) -> Result<usize, EvalError> {
        self.output.as_index().ok_or(EvalError::UnexpectedValue {
            field: "output",
            expected: "a context index",
        })
    }

    /// The output as an utterance.
    pub fn output_utterance(&self) -> Result<&str, EvalError> {
        self.output.as_utterance().ok_or(EvalError::UnexpectedValue {
            field: "output",
            expected: "an utterance",
        })
    }
}
