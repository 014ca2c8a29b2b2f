//! `texspeak-speech`: spoken descriptions of MathML.
//!
//! Rule resources are loaded once per process through
//! [`SpeechEngineState::ensure_ready`]; the resulting [`SpeechEngine`] turns a
//! serialized structure into a [`texspeak_core::Description`].

mod describe;
pub mod engine;
pub mod loader;
pub mod rules;
pub mod state;

pub use engine::SpeechEngine;
pub use loader::{FsRuleLoader, RuleLoader};
pub use rules::{DomainRules, RuleSet, Templates};
pub use state::{SpeechEngineState, DEFAULT_LOAD_TIMEOUT};
