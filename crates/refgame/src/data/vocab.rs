//! Utterance vocabulary.

use std::collections::HashMap;

use crate::error::EvalError;

/// Ordered, deduplicated set of utterances with index↔token lookup.
///
/// Built once per evaluation run from the base model's token set. Order is
/// first occurrence, and it fixes the vocabulary axis of every score tensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from a token sequence, dropping repeats.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self::default();
        for token in tokens {
            vocab.add(token.into());
        }
        vocab
    }

    /// Add a token if unseen; returns its index either way.
    pub fn add(&mut self, token: String) -> usize {
        if let Some(&i) = self.index.get(&token) {
            return i;
        }
        let i = self.tokens.len();
        self.index.insert(token.clone(), i);
        self.tokens.push(token);
        i
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Map tokens to indices, failing on the first unknown token.
    pub fn vectorize_all<'a>(
        &self,
        tokens: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<usize>, EvalError> {
        tokens
            .into_iter()
            .map(|t| {
                self.index_of(t)
                    .ok_or_else(|| EvalError::UnknownUtterance(t.to_string()))
            })
            .collect()
    }

    /// Map indices back to tokens.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range. Indices come from argmax or
    /// sampling over a vocabulary-sized axis, so this is an internal bug.
    pub fn unvectorize_all(&self, indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| self.tokens[i].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_in_first_seen_order() {
        let vocab = Vocabulary::from_tokens(["red", "orange", "red", "blue", "orange"]);
        assert_eq!(vocab.tokens(), &["red", "orange", "blue"]);
        assert_eq!(vocab.index_of("blue"), Some(2));
        assert_eq!(vocab.token(1), Some("orange"));
        assert_eq!(vocab.token(3), None);
    }

    #[test]
    fn vectorize_round_trip() {
        let vocab = Vocabulary::from_tokens(["red", "orange"]);
        let ids = vocab.vectorize_all(["orange", "red"]).unwrap();
        assert_eq!(ids, vec![1, 0]);
        assert_eq!(vocab.unvectorize_all(&ids), vec!["orange", "red"]);
    }

    #[test]
    fn unknown_token_is_an_error() {
        let vocab = Vocabulary::from_tokens(["red"]);
        let err = vocab.vectorize_all(["teal"]).unwrap_err();
        assert!(matches!(err, EvalError::UnknownUtterance(t) if t == "teal"));
    }
}
