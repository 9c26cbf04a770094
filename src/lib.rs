//! Sentence Engine: template-driven generation of grammatically agreeing text.
//!
//! Sentences are drawn from a weighted corpus of templates whose placeholders
//! are filled with words from a tagged dictionary and inflected by suffix
//! rules, so nouns, adjectives and verbs agree in case, number, gender and
//! person. Sentences chain into verses around a shared subject.

pub mod core;
pub mod schema;

pub use crate::core::config::{ConfigError, GeneratorConfig};
pub use crate::core::diagnostics::{Diagnostic, Diagnostics, Level};
pub use crate::core::pipeline::{GeneratorError, SentenceGenerator, SentenceGeneratorBuilder};
pub use crate::core::rules::Language;
pub use crate::core::template::{Template, TemplateError};
pub use crate::core::verse::{compose_poem, split_lines};
