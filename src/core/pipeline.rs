/// The sentence generator: corpus loading and sentence drawing.
///
/// Owns the dictionary, rule table, template corpus, configuration, the
/// seeded random source and the draw history, and threads the previous
/// sentence's subject into the next one.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::config::{ConfigError, GeneratorConfig};
use crate::core::diagnostics::Diagnostics;
use crate::core::lexicon::Lexicon;
use crate::core::registry::TemplateRegistry;
use crate::core::rules::RuleTable;
use crate::core::sampling::DrawHistory;
use crate::core::template::{
    Sentence, Sources, SubjectSeed, Template, TemplateError, MAX_DRAW_ATTEMPTS,
};
use crate::schema::word::Word;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("the template corpus is empty")]
    EmptyCorpus,
}

/// The top-level generator. Built via `SentenceGenerator::builder()`.
pub struct SentenceGenerator {
    lexicon: Lexicon,
    rules: RuleTable,
    registry: TemplateRegistry,
    config: GeneratorConfig,
    history: DrawHistory,
    rng: StdRng,
    seed: u64,
    last_subject: Option<Word>,
    load_diagnostics: Diagnostics,
}

/// Builder for constructing a `SentenceGenerator`.
pub struct SentenceGeneratorBuilder {
    seed: u64,
    config: Option<GeneratorConfig>,
    config_path: Option<PathBuf>,
    dictionary_path: Option<PathBuf>,
    rules_path: Option<PathBuf>,
    corpus_path: Option<PathBuf>,
    /// Directly provided sources (for testing without files).
    dictionary: Option<String>,
    rules: Option<String>,
    corpus: Option<String>,
}

impl SentenceGenerator {
    pub fn builder() -> SentenceGeneratorBuilder {
        SentenceGeneratorBuilder {
            seed: 0,
            config: None,
            config_path: None,
            dictionary_path: None,
            rules_path: None,
            corpus_path: None,
            dictionary: None,
            rules: None,
            corpus: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Swap the configuration. Language and history size take effect
    /// immediately.
    pub fn set_config(&mut self, config: GeneratorConfig) {
        self.rules.set_language(config.language());
        if config.history_len() != self.history.capacity() {
            self.history = DrawHistory::new(config.history_len());
        }
        self.config = config;
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Diagnostics gathered while the builder loaded its sources.
    pub fn load_diagnostics(&self) -> &Diagnostics {
        &self.load_diagnostics
    }

    pub fn read_corpus(&mut self, source: &str) -> Diagnostics {
        self.registry.load(source)
    }

    /// Replace the dictionary and check it against the current rules.
    pub fn read_dictionary(&mut self, source: &str) -> Diagnostics {
        let mut diagnostics = self.lexicon.load(source);
        diagnostics.append(self.lexicon.validate(&self.rules));
        self.last_subject = None;
        diagnostics
    }

    pub fn read_rules(&mut self, source: &str) -> Diagnostics {
        let diagnostics = self.rules.load(source);
        self.rules.set_language(self.config.language());
        diagnostics
    }

    /// Text of the most recent sentence subject.
    pub fn subject(&self) -> Option<&str> {
        self.last_subject.as_ref().map(|w| w.text.as_str())
    }

    /// Forget the current subject so the next sentence draws a fresh one.
    pub fn clear_subject(&mut self) {
        self.last_subject = None;
    }

    /// Draw a template and write it. A subject carried over from the
    /// previous sentence is reused, unspoken with the configured chance.
    /// Templates failing at write time are retried with another draw.
    pub fn draw_sentence(&mut self) -> Result<String, GeneratorError> {
        if self.registry.is_empty() {
            return Err(GeneratorError::EmptyCorpus);
        }
        let mut last_error = None;
        for attempt in 0..MAX_DRAW_ATTEMPTS {
            let Some(template) = self.registry.draw(&mut self.rng) else {
                return Err(GeneratorError::EmptyCorpus);
            };
            let seed = match &self.last_subject {
                Some(word) if self.rng.gen_bool(self.config.implicit_subject_chance()) => {
                    SubjectSeed::Implicit(word)
                }
                Some(word) => SubjectSeed::Explicit(word),
                None => SubjectSeed::Fresh,
            };
            let sources = Sources {
                lexicon: &self.lexicon,
                rules: &self.rules,
                config: &self.config,
            };
            match template.write(sources, &mut self.rng, &mut self.history, seed) {
                Ok(sentence) => return Ok(self.finish(sentence)),
                Err(e) => {
                    tracing::debug!(attempt, template = %template, error = %e, "sentence failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.map_or(GeneratorError::EmptyCorpus, GeneratorError::Template))
    }

    /// Parse and write one template with a fresh subject.
    pub fn write(&mut self, template: &str) -> Result<String, GeneratorError> {
        let template = Template::parse(template)?;
        let sources = Sources {
            lexicon: &self.lexicon,
            rules: &self.rules,
            config: &self.config,
        };
        let sentence = template.write(
            sources,
            &mut self.rng,
            &mut self.history,
            SubjectSeed::Fresh,
        )?;
        Ok(self.finish(sentence))
    }

    fn finish(&mut self, sentence: Sentence) -> String {
        if let Some(subject) = sentence.subject {
            self.last_subject = Some(subject);
        }
        sentence.text
    }
}

impl SentenceGeneratorBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn dictionary_path(mut self, path: impl AsRef<Path>) -> Self {
        self.dictionary_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn rules_path(mut self, path: impl AsRef<Path>) -> Self {
        self.rules_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn corpus_path(mut self, path: impl AsRef<Path>) -> Self {
        self.corpus_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide the dictionary text directly (for testing without files).
    pub fn with_dictionary(mut self, source: &str) -> Self {
        self.dictionary = Some(source.to_string());
        self
    }

    /// Provide the rule text directly (for testing without files).
    pub fn with_rules(mut self, source: &str) -> Self {
        self.rules = Some(source.to_string());
        self
    }

    /// Provide the template corpus directly (for testing without files).
    pub fn with_corpus(mut self, source: &str) -> Self {
        self.corpus = Some(source.to_string());
        self
    }

    pub fn build(self) -> Result<SentenceGenerator, GeneratorError> {
        let config = match (self.config, &self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                config
            }
            (None, Some(path)) => GeneratorConfig::load_from_ron(path)?,
            (None, None) => GeneratorConfig::default(),
        };

        let rules_text = read_source(self.rules, self.rules_path.as_deref())?;
        let dictionary_text = read_source(self.dictionary, self.dictionary_path.as_deref())?;
        let corpus_text = read_source(self.corpus, self.corpus_path.as_deref())?;

        let mut generator = SentenceGenerator {
            lexicon: Lexicon::new(),
            rules: RuleTable::new(config.language()),
            registry: TemplateRegistry::new(),
            history: DrawHistory::new(config.history_len()),
            config,
            rng: StdRng::seed_from_u64(self.seed),
            seed: self.seed,
            last_subject: None,
            load_diagnostics: Diagnostics::new(),
        };

        // Rules first so the dictionary is validated against them.
        let mut diagnostics = Diagnostics::new();
        if let Some(text) = rules_text {
            diagnostics.append(generator.read_rules(&text));
        }
        if let Some(text) = dictionary_text {
            diagnostics.append(generator.read_dictionary(&text));
        }
        if let Some(text) = corpus_text {
            diagnostics.append(generator.read_corpus(&text));
        }
        generator.load_diagnostics = diagnostics;
        Ok(generator)
    }
}

/// Inline text wins over a path.
fn read_source(inline: Option<String>, path: Option<&Path>) -> Result<Option<String>, GeneratorError> {
    match (inline, path) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(path)) => Ok(Some(std::fs::read_to_string(path)?)),
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DICTIONARY: &str = "\
N 10 kot/m ANIMATE
N 10 lipa/f FEMININE
N 10 dąb/m
V 10 rosnąć/r
V 10 spać/s
D 5 cicho
";
    const RULES: &str = "\
V r 3 snąć śnie snąć
V r 13 nąć ną nąć
V s 3 spać śpi spać
V s 13 spać śpią spać
";
    const CORPUS: &str = "\
10 ${SUBJ} ${VERB} ${ADV}.
";

    fn build_test_generator(seed: u64) -> SentenceGenerator {
        SentenceGenerator::builder()
            .seed(seed)
            .with_dictionary(DICTIONARY)
            .with_rules(RULES)
            .with_corpus(CORPUS)
            .build()
            .unwrap()
    }

    #[test]
    fn draw_sentence_produces_output() {
        let mut generator = build_test_generator(42);
        let text = generator.draw_sentence().unwrap();
        assert!(text.ends_with('.'), "got {}", text);
        assert!(generator.subject().is_some());
    }

    #[test]
    fn deterministic_with_same_seed() {
        let mut a = build_test_generator(7);
        let mut b = build_test_generator(7);
        for _ in 0..5 {
            assert_eq!(a.draw_sentence().unwrap(), b.draw_sentence().unwrap());
        }
    }

    #[test]
    fn different_seeds_eventually_differ() {
        let first = build_test_generator(1).draw_sentence().unwrap();
        let found = (2..50).any(|seed| build_test_generator(seed).draw_sentence().unwrap() != first);
        assert!(found, "expected different output with different seeds");
    }

    #[test]
    fn subject_carries_over_until_cleared() {
        let mut generator = build_test_generator(3);
        generator.draw_sentence().unwrap();
        let subject = generator.subject().map(str::to_string);
        for _ in 0..10 {
            generator.draw_sentence().unwrap();
            assert_eq!(generator.subject().map(str::to_string), subject);
        }
        generator.clear_subject();
        assert!(generator.subject().is_none());
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let mut generator = SentenceGenerator::builder().build().unwrap();
        assert!(matches!(generator.draw_sentence(), Err(GeneratorError::EmptyCorpus)));
    }

    #[test]
    fn write_parses_and_resolves() {
        let mut generator = build_test_generator(5);
        let text = generator.write("${NOUN(SINGLE)} ${VERB}").unwrap();
        assert!(
            ["kot śpi", "kot rośnie", "lipa śpi", "lipa rośnie", "dąb śpi", "dąb rośnie"]
                .contains(&text.as_str()),
            "got {}",
            text
        );
        assert!(matches!(
            generator.write("${ADJ} ${NOUN}"),
            Err(GeneratorError::Template(TemplateError::UnresolvedSlot { .. }))
        ));
    }

    #[test]
    fn build_reports_load_diagnostics() {
        let generator = SentenceGenerator::builder()
            .with_dictionary("N 10 kot/q\nQ 1 zły\n")
            .with_corpus("1 ${ADJ}\n")
            .build()
            .unwrap();
        // Unknown tag, bad dictionary line, rejected template.
        assert!(generator.load_diagnostics().has_errors());
        assert!(generator.registry().is_empty());
        assert_eq!(generator.lexicon().len(), 1);
    }

    #[test]
    fn builder_with_seed() {
        let generator = SentenceGenerator::builder().seed(12345).build().unwrap();
        assert_eq!(generator.seed(), 12345);
    }

    #[test]
    fn set_config_resizes_history() {
        let mut generator = build_test_generator(1);
        let mut config = GeneratorConfig::default();
        config.set_history_len(2);
        generator.set_config(config);
        assert_eq!(generator.history.capacity(), 2);
    }
}
