//! Models: the base-model capability, the built-in count table, and the
//! three wrapper learners.
//!
//! # Wrappers
//!
//! - [`ExhaustiveSpeaker`]: speaker via exhaustive enumeration of a base model
//! - [`ExhaustivePriorSpeaker`]: the same, weighted by utterance frequency
//! - [`DirectListener`]: arg-max over each example's own object alternatives
//!
//! Each wrapper owns a boxed [`ScoringModel`], forwards training,
//! persistence, and parameter count to it through [`Wrapper`], and
//! implements only [`Evaluate`] itself.
//!
//! # Example
//!
//! ```
//! use refgame::{Example, ExhaustiveSpeaker, ModelRegistry, RefGameConfig};
//! use refgame::model::{Evaluate, Learner};
//!
//! let config = RefGameConfig::default();
//! let mut speaker = ExhaustiveSpeaker::from_config(&config, &ModelRegistry::with_defaults())?;
//! speaker.train(&[Example::new("red", vec![0.0]), Example::new("blue", vec![240.0])], None)?;
//!
//! let out = speaker.predict_and_score(&[Example::new(vec![0.0], "red")], None)?;
//! assert_eq!(out.predictions[0].as_utterance(), Some("red"));
//! # Ok::<(), refgame::EvalError>(())
//! ```

mod direct;
mod exhaustive;
mod prior;
mod registry;
mod table;
mod traits;

pub use direct::DirectListener;
pub use exhaustive::{ExhaustivePriorSpeaker, ExhaustiveSpeaker};
pub use prior::{NoPrior, PriorCounter, PriorSource};
pub use registry::{ModelFactory, ModelRegistry};
pub use table::{DEFAULT_ALPHA, TableModel};
pub use traits::{Direction, EvalOutput, Evaluate, Learner, ScoringModel, Wrapper};
