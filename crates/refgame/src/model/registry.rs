//! Name-keyed model construction.
//!
//! A [`ModelRegistry`] is built once at startup and passed by reference to
//! whatever needs to resolve a configured model identifier.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::RefGameConfig;
use crate::error::EvalError;

use super::table::TableModel;
use super::traits::ScoringModel;

/// Constructor for a base model.
pub type ModelFactory =
    Box<dyn Fn(&RefGameConfig) -> Result<Box<dyn ScoringModel>, EvalError> + Send + Sync>;

/// Maps model identifiers to constructors.
#[derive(Default)]
pub struct ModelRegistry {
    factories: BTreeMap<String, ModelFactory>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `TableListener` and `TableSpeaker`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("TableListener", |_| Ok(Box::new(TableModel::listener())));
        registry.register("TableSpeaker", |_| Ok(Box::new(TableModel::speaker())));
        registry
    }

    /// Register a constructor, replacing any previous one under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&RefGameConfig) -> Result<Box<dyn ScoringModel>, EvalError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered identifiers in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Construct the model registered under `name`.
    ///
    /// # Errors
    ///
    /// [`EvalError::UnknownModel`] if nothing is registered under `name`,
    /// or whatever the constructor returns.
    pub fn create(
        &self,
        name: &str,
        config: &RefGameConfig,
    ) -> Result<Box<dyn ScoringModel>, EvalError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| EvalError::UnknownModel(name.to_string()))?;
        factory(config)
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
