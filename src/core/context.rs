/// Resolution context: per-sentence slot bindings and verb memo.
use rustc_hash::FxHashMap;
use std::fmt;

use crate::schema::form::{Case, Gender, Number, Person};
use crate::schema::word::{LexemeId, Word};

/// Slot coordinates of a placeholder: `${VERB2.3}` is index 2, occurrence 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotRef {
    pub index: usize,
    pub occurrence: usize,
}

impl SlotRef {
    pub fn new(index: usize, occurrence: usize) -> Self {
        Self { index, occurrence }
    }
}

impl Default for SlotRef {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.index, self.occurrence)
    }
}

/// One noun of a bound phrase and the text of its attached attribute.
#[derive(Debug, Clone)]
pub struct NounMember<'a> {
    pub word: &'a Word,
    pub attribute: Option<String>,
}

/// A noun phrase bound to a slot, with the agreement features later
/// placeholders inflect against.
#[derive(Debug, Clone)]
pub struct BoundNoun<'a> {
    pub members: Vec<NounMember<'a>>,
    pub case: Case,
    pub gender: Gender,
    pub number: Number,
    pub person: Person,
    pub animate: bool,
}

impl<'a> BoundNoun<'a> {
    pub fn single(word: &'a Word, attribute: Option<String>, case: Case) -> Self {
        let info = word.as_noun().cloned().unwrap_or_default();
        Self {
            members: vec![NounMember { word, attribute }],
            case,
            gender: info.gender,
            number: info.number,
            person: info.person,
            animate: info.animate,
        }
    }

    /// Coordinate `other` onto this phrase. The result is plural; it is
    /// masculine animate if any member is, otherwise it keeps the first
    /// noun's gender and becomes inanimate.
    pub fn coordinate(&mut self, other: NounMember<'a>) {
        let info = other.word.as_noun().cloned().unwrap_or_default();
        let masculine_animate = |g: Gender, a: bool| g == Gender::Masculine && a;
        if masculine_animate(self.gender, self.animate) || masculine_animate(info.gender, info.animate)
        {
            self.gender = Gender::Masculine;
            self.animate = true;
        } else {
            self.animate = false;
        }
        self.number = Number::Plural;
        if info.person.number() < self.person.number() {
            self.person = info.person;
        }
        self.members.push(other);
    }

    pub fn head(&self) -> &'a Word {
        self.members[0].word
    }
}

/// A drawn verb and its rendered text.
#[derive(Debug, Clone)]
pub struct ResolvedVerb<'a> {
    pub word: &'a Word,
    pub text: String,
}

/// Transient state of one `write` call. Never shared between calls.
#[derive(Debug, Default)]
pub struct ResolutionContext<'a> {
    /// `None` marks a slot whose noun draw came back empty.
    slots: FxHashMap<usize, Option<BoundNoun<'a>>>,
    subject: Option<&'a Word>,
    verbs: FxHashMap<SlotRef, Option<ResolvedVerb<'a>>>,
    /// Person and number fixed by an explicit verb form, per slot.
    forced: FxHashMap<usize, (Person, Number)>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, index: usize) -> Option<&Option<BoundNoun<'a>>> {
        self.slots.get(&index)
    }

    /// Bind a slot. The first noun bound to slot 1 becomes the subject.
    pub fn bind(&mut self, index: usize, noun: Option<BoundNoun<'a>>) {
        if index == 1 && self.subject.is_none() {
            self.subject = noun.as_ref().map(BoundNoun::head);
        }
        self.slots.insert(index, noun);
    }

    pub fn subject(&self) -> Option<&'a Word> {
        self.subject
    }

    /// Lexemes bound to slot 1.
    pub fn subject_lexemes(&self) -> Vec<LexemeId> {
        match self.slots.get(&1) {
            Some(Some(noun)) => noun.members.iter().map(|m| m.word.id).collect(),
            _ => Vec::new(),
        }
    }

    pub fn verb(&self, slot: SlotRef) -> Option<&Option<ResolvedVerb<'a>>> {
        self.verbs.get(&slot)
    }

    pub fn remember_verb(&mut self, slot: SlotRef, verb: Option<ResolvedVerb<'a>>) {
        self.verbs.insert(slot, verb);
    }

    pub fn force(&mut self, index: usize, person: Person, number: Number) {
        self.forced.insert(index, (person, number));
    }

    pub fn forced(&self, index: usize) -> Option<(Person, Number)> {
        self.forced.get(&index).copied()
    }

    pub fn forced_number(&self, index: usize) -> Option<Number> {
        self.forced(index).map(|(_, number)| number)
    }
}
