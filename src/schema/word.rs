use serde::{Deserialize, Serialize};
use std::fmt;

use super::form::{Case, FormId, Gender, GrammarError, GrammarForm, Number, Person};
use crate::core::rules::RuleTable;

/// Newtype wrapper for lexeme IDs, assigned in dictionary order on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LexemeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Filler,
}

impl PartOfSpeech {
    pub const COUNT: usize = 5;
    pub const ALL: [PartOfSpeech; Self::COUNT] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
        PartOfSpeech::Filler,
    ];

    /// Single-letter code used by dictionary and rule files.
    pub fn from_code(code: &str) -> Option<PartOfSpeech> {
        match code {
            "N" => Some(PartOfSpeech::Noun),
            "V" => Some(PartOfSpeech::Verb),
            "A" => Some(PartOfSpeech::Adjective),
            "D" => Some(PartOfSpeech::Adverb),
            "O" => Some(PartOfSpeech::Filler),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            PartOfSpeech::Noun => 'N',
            PartOfSpeech::Verb => 'V',
            PartOfSpeech::Adjective => 'A',
            PartOfSpeech::Adverb => 'D',
            PartOfSpeech::Filler => 'O',
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the rule table can inflect this part of speech.
    pub fn is_inflected(self) -> bool {
        matches!(
            self,
            PartOfSpeech::Noun | PartOfSpeech::Verb | PartOfSpeech::Adjective
        )
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Filler => "filler",
        };
        f.write_str(name)
    }
}

/// Something a word governs: a noun in some case, an agreeing adjective, or
/// an infinitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectSpec {
    Noun {
        case: Case,
        preposition: Option<String>,
    },
    Adjective,
    Infinitive {
        preposition: Option<String>,
    },
}

/// Selection properties shared by every kind of word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    pub semantic: Vec<String>,
    pub only_with: Vec<String>,
    pub not_with: Vec<String>,
    pub only_with_word: Vec<String>,
    pub not_with_word: Vec<String>,
    pub takes_only: Vec<String>,
    pub takes_no: Vec<String>,
    pub takes_only_word: Vec<String>,
    pub takes_no_word: Vec<String>,
    pub only_subject: bool,
    pub only_object: bool,
    pub no_adjective: bool,
    /// Never coordinated with or attached to another noun.
    pub no_noun_noun: bool,
    /// Frequency used instead of `frequency` when drawn as an object.
    pub object_frequency: Option<u32>,
    pub suffix: Option<String>,
}

impl Properties {
    pub fn has_semantic(&self, tag: &str) -> bool {
        self.semantic.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NounInfo {
    pub gender: Gender,
    pub number: Number,
    pub person: Person,
    pub animate: bool,
    /// A noun attached after this one, e.g. a genitive complement.
    pub attribute: Option<ObjectSpec>,
}

impl Default for NounInfo {
    fn default() -> Self {
        Self {
            gender: Gender::Masculine,
            number: Number::Singular,
            person: Person::Third,
            animate: false,
            attribute: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbInfo {
    pub reflexive: bool,
    pub objects: Vec<ObjectSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjectiveInfo {
    /// Possessive adjectives are never the second of a doubled pair.
    pub possessive: bool,
    pub only_singular: bool,
    pub only_plural: bool,
    pub object: Option<ObjectSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordKind {
    Noun(NounInfo),
    Verb(VerbInfo),
    Adjective(AdjectiveInfo),
    Adverb,
    Filler,
}

/// A dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: LexemeId,
    pub text: String,
    pub frequency: u32,
    /// Single-character markers selecting the inflection rules that apply.
    pub tags: Vec<char>,
    pub properties: Properties,
    pub kind: WordKind,
}

impl Word {
    pub fn pos(&self) -> PartOfSpeech {
        match self.kind {
            WordKind::Noun(_) => PartOfSpeech::Noun,
            WordKind::Verb(_) => PartOfSpeech::Verb,
            WordKind::Adjective(_) => PartOfSpeech::Adjective,
            WordKind::Adverb => PartOfSpeech::Adverb,
            WordKind::Filler => PartOfSpeech::Filler,
        }
    }

    pub fn as_noun(&self) -> Option<&NounInfo> {
        match &self.kind {
            WordKind::Noun(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_verb(&self) -> Option<&VerbInfo> {
        match &self.kind {
            WordKind::Verb(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_adjective(&self) -> Option<&AdjectiveInfo> {
        match &self.kind {
            WordKind::Adjective(info) => Some(info),
            _ => None,
        }
    }

    /// Inflect this word into `form`, then append its declared suffix.
    pub fn inflect(&self, rules: &RuleTable, form: &GrammarForm) -> Result<String, GrammarError> {
        let inflected = match &self.kind {
            WordKind::Noun(_) => rules.inflect_noun(&self.text, &self.tags, form)?,
            WordKind::Adjective(_) => rules.inflect_adjective(&self.text, &self.tags, form)?,
            WordKind::Verb(info) => {
                rules.inflect_verb(&self.text, &self.tags, form, info.reflexive)?
            }
            WordKind::Adverb | WordKind::Filler => self.text.clone(),
        };
        Ok(match &self.properties.suffix {
            Some(suffix) if !suffix.is_empty() => format!("{} {}", inflected, suffix),
            _ => inflected,
        })
    }

    /// Every form the rule table can produce for this word, keyed by form-id.
    pub fn all_forms(&self, rules: &RuleTable) -> Vec<(FormId, String)> {
        let numbers = [Number::Singular, Number::Plural];
        let persons = [Person::First, Person::Second, Person::Third];
        let mut forms: Vec<GrammarForm> = Vec::new();
        match &self.kind {
            WordKind::Noun(_) => {
                for case in Case::ALL {
                    for number in numbers {
                        forms.push(GrammarForm::new().case(case).number(number));
                    }
                }
            }
            WordKind::Adjective(_) => {
                for gender in [Gender::Masculine, Gender::Feminine, Gender::Neuter] {
                    for case in Case::ALL {
                        for number in numbers {
                            forms.push(
                                GrammarForm::new().case(case).number(number).gender(gender),
                            );
                        }
                    }
                }
            }
            WordKind::Verb(_) => {
                for person in persons {
                    for number in numbers {
                        forms.push(GrammarForm::new().person(person).number(number));
                        forms.push(GrammarForm::imperative(person, number));
                    }
                }
                forms.push(GrammarForm::infinitive());
            }
            WordKind::Adverb | WordKind::Filler => return Vec::new(),
        }

        let mut out: Vec<(FormId, String)> = forms
            .iter()
            .filter_map(|form| {
                let id = match self.kind {
                    WordKind::Noun(_) => form.noun_form_id(),
                    WordKind::Adjective(_) => form.adjective_form_id(),
                    _ => form.verb_form_id(),
                }
                .ok()?;
                let text = self.inflect(rules, form).ok()?;
                Some((id, text))
            })
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }
}
