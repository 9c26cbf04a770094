pub mod config;
pub mod context;
pub mod diagnostics;
pub mod lexicon;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod rules;
pub mod sampling;
pub mod semantic;
pub mod template;
pub mod verse;
