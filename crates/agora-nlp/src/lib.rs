//! Rule-based natural-language understanding for the marketplace assistant.
//!
//! Classifies free-text utterances into intents with a confidence score and
//! extracts typed entities (prices, categories, conditions, ...). Pure:
//! classification is a function of the input and static rule tables, with no
//! hidden state and no failure mode other than the `unknown` intent.

pub mod engine;
pub mod entities;
pub mod text;

pub use engine::NlpEngine;
pub use entities::extract_entities;
pub use text::{fuzzy_contains, levenshtein, normalize, tokenize};
