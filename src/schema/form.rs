/// Grammatical categories and their numeric form-id encoding.
///
/// Form-ids index the inflection rule table, so the encodings here are part
/// of the rule file format:
///
/// - noun: `case + 10 * (number == plural)`
/// - adjective: `case + 10 * (number - 1) + 100 * gender`
/// - verb, indicative: `person + 10 * (number - 1)`
/// - verb, imperative: `20 + person + 10 * (number - 1)`
/// - verb, infinitive: `50`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("case is required for this form")]
    MissingCase,
    #[error("gender is required for adjective forms")]
    MissingGender,
    #[error("person is required for finite verb forms")]
    MissingPerson,
    #[error("an infinitive cannot carry a person")]
    InfinitiveWithPerson,
    #[error("invalid case: {0}")]
    InvalidCase(u16),
    #[error("invalid grammatical number: {0}")]
    InvalidNumber(u16),
    #[error("invalid gender: {0}")]
    InvalidGender(u16),
    #[error("invalid person: {0}")]
    InvalidPerson(u16),
    #[error("invalid verb form-id: {0}")]
    InvalidVerbForm(u16),
}

/// Grammatical case, numbered as in the rule files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Case {
    Nominative = 1,
    Genitive = 2,
    Dative = 3,
    Accusative = 4,
    Instrumental = 5,
    Locative = 6,
    Vocative = 7,
}

impl Case {
    pub const ALL: [Case; 7] = [
        Case::Nominative,
        Case::Genitive,
        Case::Dative,
        Case::Accusative,
        Case::Instrumental,
        Case::Locative,
        Case::Vocative,
    ];

    pub fn from_number(n: u16) -> Result<Case, GrammarError> {
        Case::ALL
            .get((n as usize).wrapping_sub(1))
            .copied()
            .ok_or(GrammarError::InvalidCase(n))
    }

    pub fn number(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Number {
    #[default]
    Singular = 1,
    Plural = 2,
}

impl Number {
    pub fn from_number(n: u16) -> Result<Number, GrammarError> {
        match n {
            1 => Ok(Number::Singular),
            2 => Ok(Number::Plural),
            other => Err(GrammarError::InvalidNumber(other)),
        }
    }

    pub fn number(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Masculine = 1,
    Feminine = 2,
    Neuter = 3,
}

impl Gender {
    pub fn from_number(n: u16) -> Result<Gender, GrammarError> {
        match n {
            1 => Ok(Gender::Masculine),
            2 => Ok(Gender::Feminine),
            3 => Ok(Gender::Neuter),
            other => Err(GrammarError::InvalidGender(other)),
        }
    }

    pub fn number(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Person {
    First = 1,
    Second = 2,
    #[default]
    Third = 3,
}

impl Person {
    pub fn from_number(n: u16) -> Result<Person, GrammarError> {
        match n {
            1 => Ok(Person::First),
            2 => Ok(Person::Second),
            3 => Ok(Person::Third),
            other => Err(GrammarError::InvalidPerson(other)),
        }
    }

    pub fn number(self) -> u16 {
        self as u16
    }
}

/// Index into the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormId(pub u16);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const INFINITIVE_FORM: FormId = FormId(50);
const IMPERATIVE_OFFSET: u16 = 20;

/// A requested grammatical form. Unset categories fall back to the
/// defaults of the form being computed, or fail when they are mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GrammarForm {
    pub case: Option<Case>,
    pub number: Option<Number>,
    pub gender: Option<Gender>,
    pub person: Option<Person>,
    pub infinitive: bool,
    pub imperative: bool,
    pub animate: Option<bool>,
}

impl GrammarForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case(mut self, case: Case) -> Self {
        self.case = Some(case);
        self
    }

    pub fn number(mut self, number: Number) -> Self {
        self.number = Some(number);
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn person(mut self, person: Person) -> Self {
        self.person = Some(person);
        self
    }

    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = Some(animate);
        self
    }

    pub fn infinitive() -> Self {
        Self {
            infinitive: true,
            ..Self::default()
        }
    }

    pub fn imperative(person: Person, number: Number) -> Self {
        Self {
            person: Some(person),
            number: Some(number),
            imperative: true,
            ..Self::default()
        }
    }

    fn number_or_default(&self) -> Number {
        self.number.unwrap_or_default()
    }

    pub fn noun_form_id(&self) -> Result<FormId, GrammarError> {
        let case = self.case.ok_or(GrammarError::MissingCase)?;
        let plural = u16::from(self.number_or_default() == Number::Plural);
        Ok(FormId(case.number() + 10 * plural))
    }

    pub fn adjective_form_id(&self) -> Result<FormId, GrammarError> {
        let case = self.case.ok_or(GrammarError::MissingCase)?;
        let gender = self.gender.ok_or(GrammarError::MissingGender)?;
        Ok(FormId(
            case.number() + 10 * (self.number_or_default().number() - 1) + 100 * gender.number(),
        ))
    }

    pub fn verb_form_id(&self) -> Result<FormId, GrammarError> {
        if self.infinitive {
            if self.person.is_some() {
                return Err(GrammarError::InfinitiveWithPerson);
            }
            return Ok(INFINITIVE_FORM);
        }
        let person = self.person.ok_or(GrammarError::MissingPerson)?;
        let id = person.number() + 10 * (self.number_or_default().number() - 1);
        if self.imperative {
            Ok(FormId(IMPERATIVE_OFFSET + id))
        } else {
            Ok(FormId(id))
        }
    }

    /// Decode an explicit indicative verb form-id such as `3` or `13`.
    pub fn from_verb_form_id(id: u16) -> Result<GrammarForm, GrammarError> {
        if id == INFINITIVE_FORM.0 {
            return Ok(GrammarForm::infinitive());
        }
        let (imperative, rest) = if id > IMPERATIVE_OFFSET {
            (true, id - IMPERATIVE_OFFSET)
        } else {
            (false, id)
        };
        let person = Person::from_number(rest % 10).map_err(|_| GrammarError::InvalidVerbForm(id))?;
        let number =
            Number::from_number(rest / 10 + 1).map_err(|_| GrammarError::InvalidVerbForm(id))?;
        Ok(GrammarForm {
            person: Some(person),
            number: Some(number),
            imperative,
            ..GrammarForm::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noun_ids() {
        let f = GrammarForm::new().case(Case::Locative);
        assert_eq!(f.noun_form_id().unwrap(), FormId(6));
        let f = f.number(Number::Plural);
        assert_eq!(f.noun_form_id().unwrap(), FormId(16));
        assert_eq!(
            GrammarForm::new().noun_form_id(),
            Err(GrammarError::MissingCase)
        );
    }

    #[test]
    fn adjective_ids() {
        let f = GrammarForm::new()
            .case(Case::Genitive)
            .gender(Gender::Feminine)
            .number(Number::Plural);
        assert_eq!(f.adjective_form_id().unwrap(), FormId(212));
        assert_eq!(
            GrammarForm::new().case(Case::Genitive).adjective_form_id(),
            Err(GrammarError::MissingGender)
        );
    }

    #[test]
    fn verb_buckets_are_disjoint() {
        let mut seen = std::collections::HashSet::new();
        for person in [Person::First, Person::Second, Person::Third] {
            for number in [Number::Singular, Number::Plural] {
                let ind = GrammarForm::new().person(person).number(number);
                assert!(seen.insert(ind.verb_form_id().unwrap()));
                let imp = GrammarForm::imperative(person, number);
                assert!(seen.insert(imp.verb_form_id().unwrap()));
            }
        }
        assert!(seen.insert(GrammarForm::infinitive().verb_form_id().unwrap()));
    }

    #[test]
    fn verb_errors() {
        assert_eq!(
            GrammarForm::new().verb_form_id(),
            Err(GrammarError::MissingPerson)
        );
        let mut inf = GrammarForm::infinitive();
        inf.person = Some(Person::First);
        assert_eq!(inf.verb_form_id(), Err(GrammarError::InfinitiveWithPerson));
    }

    #[test]
    fn explicit_verb_form_decodes() {
        let f = GrammarForm::from_verb_form_id(13).unwrap();
        assert_eq!(f.person, Some(Person::Third));
        assert_eq!(f.number, Some(Number::Plural));
        assert_eq!(f.verb_form_id().unwrap(), FormId(13));

        let imp = GrammarForm::from_verb_form_id(22).unwrap();
        assert!(imp.imperative);
        assert_eq!(imp.verb_form_id().unwrap(), FormId(22));

        assert!(GrammarForm::from_verb_form_id(50).unwrap().infinitive);
        assert_eq!(
            GrammarForm::from_verb_form_id(7),
            Err(GrammarError::InvalidVerbForm(7))
        );
    }

    #[test]
    fn numeric_decoding_rejects_out_of_range() {
        assert_eq!(Case::from_number(0), Err(GrammarError::InvalidCase(0)));
        assert_eq!(Case::from_number(8), Err(GrammarError::InvalidCase(8)));
        assert_eq!(Case::from_number(4), Ok(Case::Accusative));
        assert!(Gender::from_number(4).is_err());
        assert!(Number::from_number(3).is_err());
        assert!(Person::from_number(0).is_err());
    }
}
