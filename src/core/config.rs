/// Generator configuration: probability knobs, verse layout, language.
///
/// Loaded from RON; every knob is range checked on load and on set.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::rules::Language;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{knob} out of range: {value}")]
    OutOfRange { knob: &'static str, value: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    language: Language,
    /// Chance that a continued subject is left unspoken.
    implicit_subject_chance: f64,
    double_noun_chance: f64,
    double_adjective_chance: f64,
    /// Chance of an agreeing adjective in front of a verb's noun object.
    object_adjective_chance: f64,
    filler_chance: f64,
    verses: usize,
    lines_per_verse: usize,
    max_line_length: usize,
    /// Recent draws remembered per part of speech; 0 disables.
    history_len: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            language: Language::Polish,
            implicit_subject_chance: 0.3,
            double_noun_chance: 0.1,
            double_adjective_chance: 0.1,
            object_adjective_chance: 0.3,
            filler_chance: 0.5,
            verses: 3,
            lines_per_verse: 4,
            max_line_length: 40,
            history_len: 0,
        }
    }
}

fn check_chance(knob: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            knob,
            value: value.to_string(),
        })
    }
}

fn check_positive(knob: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            knob,
            value: value.to_string(),
        })
    }
}

macro_rules! chance_knob {
    ($get:ident, $set:ident) => {
        pub fn $get(&self) -> f64 {
            self.$get
        }

        pub fn $set(&mut self, value: f64) -> Result<(), ConfigError> {
            self.$get = check_chance(stringify!($get), value)?;
            Ok(())
        }
    };
}

macro_rules! count_knob {
    ($get:ident, $set:ident) => {
        pub fn $get(&self) -> usize {
            self.$get
        }

        pub fn $set(&mut self, value: usize) -> Result<(), ConfigError> {
            self.$get = check_positive(stringify!($get), value)?;
            Ok(())
        }
    };
}

impl GeneratorConfig {
    /// Load a configuration from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<GeneratorConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a configuration from a RON string. Missing fields take their
    /// defaults.
    pub fn parse_ron(input: &str) -> Result<GeneratorConfig, ConfigError> {
        let config: GeneratorConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_chance("implicit_subject_chance", self.implicit_subject_chance)?;
        check_chance("double_noun_chance", self.double_noun_chance)?;
        check_chance("double_adjective_chance", self.double_adjective_chance)?;
        check_chance("object_adjective_chance", self.object_adjective_chance)?;
        check_chance("filler_chance", self.filler_chance)?;
        check_positive("verses", self.verses)?;
        check_positive("lines_per_verse", self.lines_per_verse)?;
        check_positive("max_line_length", self.max_line_length)?;
        Ok(())
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    chance_knob!(implicit_subject_chance, set_implicit_subject_chance);
    chance_knob!(double_noun_chance, set_double_noun_chance);
    chance_knob!(double_adjective_chance, set_double_adjective_chance);
    chance_knob!(object_adjective_chance, set_object_adjective_chance);
    chance_knob!(filler_chance, set_filler_chance);
    count_knob!(verses, set_verses);
    count_knob!(lines_per_verse, set_lines_per_verse);
    count_knob!(max_line_length, set_max_line_length);

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn set_history_len(&mut self, value: usize) {
        self.history_len = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = GeneratorConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.language(), Language::Polish);
        assert_eq!(c.history_len(), 0);
    }

    #[test]
    fn parse_partial_ron() {
        let c = GeneratorConfig::parse_ron("(filler_chance: 1.0, verses: 2, language: Plain)").unwrap();
        assert_eq!(c.filler_chance(), 1.0);
        assert_eq!(c.verses(), 2);
        assert_eq!(c.language(), Language::Plain);
        assert_eq!(c.double_noun_chance(), 0.1);
    }

    #[test]
    fn parse_rejects_out_of_range() {
        let err = GeneratorConfig::parse_ron("(double_noun_chance: 1.5)").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { knob: "double_noun_chance", .. }));
        assert!(matches!(
            GeneratorConfig::parse_ron("(lines_per_verse: 0)"),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            GeneratorConfig::parse_ron("(verses: \"many\")"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn failed_set_keeps_previous_value() {
        let mut c = GeneratorConfig::default();
        c.set_object_adjective_chance(0.8).unwrap();
        assert!(c.set_object_adjective_chance(-0.1).is_err());
        assert!(c.set_object_adjective_chance(f64::NAN).is_err());
        assert_eq!(c.object_adjective_chance(), 0.8);
        assert!(c.set_max_line_length(0).is_err());
        assert_eq!(c.max_line_length(), 40);
    }

    #[test]
    fn ron_round_trip() {
        let mut c = GeneratorConfig::default();
        c.set_history_len(4);
        let text = ron::to_string(&c).unwrap();
        assert_eq!(GeneratorConfig::parse_ron(&text).unwrap(), c);
    }
}
