/// Sentence templates: placeholder parsing, slot checks, and resolution.
///
/// A template is literal text with placeholders of the form
/// `${ROLE[index[.occurrence]][(options)]}`. Placeholders sharing an index
/// agree with each other: `${ADJ2}` inflects like the noun in `${NOUN2}`,
/// `${VERB2}` takes that noun's person and number, `${OBJ2}` expands the
/// objects governed by `${VERB2}`.
use rand::Rng;
use rustc_hash::FxHashSet;
use std::fmt;
use thiserror::Error;

use crate::core::config::GeneratorConfig;
use crate::core::context::{BoundNoun, NounMember, ResolutionContext, ResolvedVerb, SlotRef};
use crate::core::lexicon::{FrequencyOverride, Lexicon};
use crate::core::options::{self, Delimiter, OptionError, ParsedOption};
use crate::core::rules::RuleTable;
use crate::core::sampling::DrawHistory;
use crate::core::semantic::{compatible, semantic_filter};
use crate::schema::form::{Case, Gender, GrammarError, GrammarForm, Number, Person};
use crate::schema::word::{ObjectSpec, PartOfSpeech, Word, WordKind};

/// Attempts before giving up: templates per sentence, and redraws of a
/// coordination partner, a verb object or an infinitive per placeholder.
pub const MAX_DRAW_ATTEMPTS: usize = 5;
/// How many bound objects may hang off one another.
const MAX_BOUND_DEPTH: usize = 2;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template syntax error: {0}")]
    Syntax(String),
    #[error("invalid placeholder options: {0}")]
    Options(#[from] OptionError),
    #[error("placeholder {placeholder} refers to a slot that is not resolved")]
    UnresolvedSlot { placeholder: String },
    #[error("inflection failed: {0}")]
    Grammar(#[from] GrammarError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Subject,
    Noun,
    Adjective,
    Verb,
    Object,
    Adverb,
    Filler,
}

impl Role {
    /// Roles are resolved in this order regardless of their position in the
    /// text, so agreement sources are bound before their dependants.
    pub const RESOLUTION_ORDER: [Role; 7] = [
        Role::Filler,
        Role::Subject,
        Role::Noun,
        Role::Adjective,
        Role::Verb,
        Role::Object,
        Role::Adverb,
    ];

    pub fn from_name(name: &str) -> Option<Role> {
        match name {
            "SUBJ" => Some(Role::Subject),
            "NOUN" => Some(Role::Noun),
            "ADJ" => Some(Role::Adjective),
            "VERB" => Some(Role::Verb),
            "OBJ" => Some(Role::Object),
            "ADV" => Some(Role::Adverb),
            "OTHER" => Some(Role::Filler),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Subject => "SUBJ",
            Role::Noun => "NOUN",
            Role::Adjective => "ADJ",
            Role::Verb => "VERB",
            Role::Object => "OBJ",
            Role::Adverb => "ADV",
            Role::Filler => "OTHER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interpreted placeholder options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderOptions {
    pub case: Option<Case>,
    /// `Some(true)` for `EMPTY`, `Some(false)` for `NOT_EMPTY`.
    pub empty: Option<bool>,
    pub semantic: Vec<String>,
    pub not_semantic: Vec<String>,
    pub single: bool,
    /// Explicit verb form overriding agreement.
    pub verb_form: Option<GrammarForm>,
}

impl PlaceholderOptions {
    fn from_parsed(role: Role, parsed: &[ParsedOption]) -> Result<Self, String> {
        let mut out = Self::default();
        for opt in parsed {
            let upper = opt.name.to_ascii_uppercase();
            let is_list = matches!(upper.as_str(), "SEMANTIC" | "NOT_SEMANTIC");
            match (&opt.params, is_list) {
                (Some(params), true) if !params.is_empty() => {}
                (_, true) => return Err(format!("{} needs at least one tag", opt.name)),
                (Some(_), false) => return Err(format!("{} takes no parameters", opt.name)),
                (None, false) => {}
            }
            let numeric = upper.parse::<u16>().ok();
            let is_noun = matches!(role, Role::Subject | Role::Noun);
            match (role, upper.as_str(), numeric) {
                (_, _, Some(n)) if is_noun => {
                    out.case = Some(Case::from_number(n).map_err(|e| e.to_string())?)
                }
                (Role::Verb, _, Some(n)) => {
                    out.verb_form =
                        Some(GrammarForm::from_verb_form_id(n).map_err(|e| e.to_string())?)
                }
                (Role::Verb, "INF", _) => out.verb_form = Some(GrammarForm::infinitive()),
                (Role::Verb, "IMP", _) => {
                    out.verb_form = Some(GrammarForm::imperative(Person::Second, Number::Singular))
                }
                (_, "EMPTY", _) if is_noun => out.empty = Some(true),
                (_, "NOT_EMPTY", _) if is_noun => out.empty = Some(false),
                (_, "SEMANTIC", _) if is_noun => out.semantic = owned_params(opt),
                (_, "NOT_SEMANTIC", _) if is_noun => out.not_semantic = owned_params(opt),
                (Role::Subject | Role::Noun | Role::Adjective, "SINGLE", _) => out.single = true,
                _ => return Err(format!("option '{}' is not valid on {}", opt.name, role)),
            }
        }
        Ok(out)
    }

    /// Whether a noun satisfies the emptiness and semantic options.
    pub fn accepts(&self, word: &Word) -> bool {
        match self.empty {
            Some(true) if !word.text.is_empty() => return false,
            Some(false) if word.text.is_empty() => return false,
            _ => {}
        }
        let props = &word.properties;
        if !self.semantic.is_empty() && !self.semantic.iter().any(|t| props.has_semantic(t)) {
            return false;
        }
        !self.not_semantic.iter().any(|t| props.has_semantic(t))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub role: Role,
    pub slot: SlotRef,
    pub raw_options: String,
    pub parsed_options: Vec<ParsedOption>,
    pub options: PlaceholderOptions,
    source: String,
}

impl Placeholder {
    /// Parse the text between `${` and `}`.
    fn parse(body: &str) -> Result<Placeholder, TemplateError> {
        let source = format!("${{{}}}", body);
        let (head, raw_options) = match body.find('(') {
            Some(open) => {
                let inner = body[open + 1..].strip_suffix(')').ok_or_else(|| {
                    TemplateError::Syntax(format!("{}: options must close the placeholder", source))
                })?;
                (&body[..open], inner)
            }
            None => (body, ""),
        };

        let role_end = head
            .find(|c: char| !c.is_ascii_uppercase())
            .unwrap_or(head.len());
        let (role_name, slot_text) = head.split_at(role_end);
        let role = Role::from_name(role_name).ok_or_else(|| {
            TemplateError::Syntax(format!("unknown role '{}' in {}", role_name, source))
        })?;
        let slot = parse_slot(slot_text).ok_or_else(|| {
            TemplateError::Syntax(format!("bad slot '{}' in {}", slot_text, source))
        })?;

        let parsed_options = options::parse(raw_options, Delimiter::Comma)?;
        let options = PlaceholderOptions::from_parsed(role, &parsed_options)
            .map_err(|msg| TemplateError::Syntax(format!("{}: {}", source, msg)))?;

        Ok(Placeholder {
            role,
            slot,
            raw_options: raw_options.to_string(),
            parsed_options,
            options,
            source,
        })
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn owned_params(opt: &ParsedOption) -> Vec<String> {
    opt.param_names().into_iter().map(str::to_string).collect()
}

fn parse_slot(text: &str) -> Option<SlotRef> {
    if text.is_empty() {
        return Some(SlotRef::default());
    }
    let number = |s: &str| -> Option<usize> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok().filter(|n| *n > 0)
    };
    match text.split_once('.') {
        Some((index, occurrence)) => Some(SlotRef::new(number(index)?, number(occurrence)?)),
        None => Some(SlotRef::new(number(text)?, 1)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    Literal(String),
    Placeholder(Placeholder),
}

/// What a previous sentence hands to the next one's `${SUBJ}`.
#[derive(Debug, Clone, Copy, Default)]
pub enum SubjectSeed<'a> {
    #[default]
    Fresh,
    /// Reuse the noun and print it.
    Explicit(&'a Word),
    /// Reuse the noun for agreement but print nothing.
    Implicit(&'a Word),
}

/// Loaded data a template resolves against.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub lexicon: &'a Lexicon,
    pub rules: &'a RuleTable,
    pub config: &'a GeneratorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub subject: Option<Word>,
}

/// A parsed and checked template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    segments: Vec<TemplateSegment>,
    /// Noun slots some `${ADJ}` describes.
    adjective_slots: FxHashSet<usize>,
}

impl Template {
    /// Parse a template and check that every placeholder refers to a slot
    /// declared before it.
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = input;

        while let Some(start) = rest.find("${") {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                TemplateError::Syntax(format!("unterminated placeholder in '{}'", input))
            })?;
            if !literal.is_empty() {
                segments.push(TemplateSegment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(TemplateSegment::Placeholder(Placeholder::parse(&after[..end])?));
            rest = &after[end + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(TemplateSegment::Literal(literal));
        }

        let mut template = Template {
            source: input.to_string(),
            segments,
            adjective_slots: FxHashSet::default(),
        };
        template.check_references()?;
        template.adjective_slots = template
            .placeholders()
            .filter(|p| p.role == Role::Adjective)
            .map(|p| p.slot.index)
            .collect();
        Ok(template)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Placeholder(p) => Some(p),
            TemplateSegment::Literal(_) => None,
        })
    }

    /// Left-to-right declaration check. Nouns and explicit-form verbs
    /// declare their slot; adjectives and agreeing verbs need it declared;
    /// objects need their exact verb declared.
    fn check_references(&self) -> Result<(), TemplateError> {
        let mut nouns = FxHashSet::default();
        let mut verbs = FxHashSet::default();
        for ph in self.placeholders() {
            let index = ph.slot.index;
            let declared = match ph.role {
                Role::Subject | Role::Noun => {
                    nouns.insert(index);
                    true
                }
                Role::Adjective => nouns.contains(&index),
                Role::Verb => {
                    let ok = ph.options.verb_form.is_some() || nouns.contains(&index);
                    nouns.insert(index);
                    verbs.insert(ph.slot);
                    ok
                }
                Role::Object => verbs.contains(&ph.slot),
                Role::Adverb | Role::Filler => true,
            };
            if !declared {
                return Err(TemplateError::UnresolvedSlot {
                    placeholder: ph.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Resolve every placeholder and assemble the sentence.
    pub fn write<R: Rng + ?Sized>(
        &self,
        sources: Sources<'_>,
        rng: &mut R,
        history: &mut DrawHistory,
        seed: SubjectSeed<'_>,
    ) -> Result<Sentence, TemplateError> {
        let mut writer = Writer {
            lexicon: sources.lexicon,
            rules: sources.rules,
            config: sources.config,
            adjective_slots: &self.adjective_slots,
            seed,
            rng,
            history,
            ctx: ResolutionContext::new(),
        };

        // Explicit verb forms fix their slot's agreement before any role
        // resolves. A form without person (INF) defaults to 3rd singular.
        for ph in self.placeholders() {
            if let Some(form) = ph.options.verb_form {
                let index = ph.slot.index;
                match (form.person, form.number) {
                    (Some(person), Some(number)) => writer.ctx.force(index, person, number),
                    _ if writer.ctx.forced(index).is_none() => {
                        writer.ctx.force(index, Person::Third, Number::Singular)
                    }
                    _ => {}
                }
            }
        }

        let mut outputs: Vec<Option<String>> = vec![None; self.segments.len()];
        for role in Role::RESOLUTION_ORDER {
            for (i, segment) in self.segments.iter().enumerate() {
                if let TemplateSegment::Placeholder(ph) = segment {
                    if ph.role == role {
                        outputs[i] = Some(writer.resolve(ph)?);
                    }
                }
            }
        }

        let mut text = String::new();
        for (segment, output) in self.segments.iter().zip(&outputs) {
            match segment {
                TemplateSegment::Literal(s) => text.push_str(s),
                TemplateSegment::Placeholder(_) => text.push_str(output.as_deref().unwrap_or("")),
            }
        }

        Ok(Sentence {
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
            subject: writer.ctx.subject().cloned(),
        })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, Copy)]
enum Draw {
    Subject,
    Object,
    Any(PartOfSpeech),
}

fn pick<'a, R: Rng + ?Sized>(
    lexicon: &'a Lexicon,
    kind: Draw,
    filter: FrequencyOverride<'_>,
    rng: &mut R,
) -> Option<&'a Word> {
    match kind {
        Draw::Subject => lexicon.draw_subject(Some(filter), rng),
        Draw::Object => lexicon.draw_object(Some(filter), rng),
        Draw::Any(pos) => lexicon.draw(pos, Some(filter), rng),
    }
}

fn noun_number(word: &Word) -> Number {
    word.as_noun().map(|n| n.number).unwrap_or_default()
}

/// Adjectives that may describe `noun` at `number`.
fn agreement_filter<'n>(noun: Option<&'n Word>, number: Number) -> impl Fn(u32, &Word) -> u32 + 'n {
    move |frequency, adjective| {
        let fits_number = match adjective.as_adjective() {
            Some(info) => match number {
                Number::Singular => !info.only_plural,
                Number::Plural => !info.only_singular,
            },
            None => true,
        };
        let fits_noun = noun.map_or(true, |noun| compatible(noun, adjective));
        if fits_number && fits_noun {
            frequency
        } else {
            0
        }
    }
}

struct Writer<'a, 'r, R: ?Sized> {
    lexicon: &'a Lexicon,
    rules: &'a RuleTable,
    config: &'a GeneratorConfig,
    adjective_slots: &'a FxHashSet<usize>,
    seed: SubjectSeed<'a>,
    rng: &'r mut R,
    history: &'r mut DrawHistory,
    ctx: ResolutionContext<'a>,
}

impl<'a, 'r, R: Rng + ?Sized> Writer<'a, 'r, R> {
    fn resolve(&mut self, ph: &Placeholder) -> Result<String, TemplateError> {
        match ph.role {
            Role::Filler => self.filler(),
            Role::Subject | Role::Noun => self.noun(ph),
            Role::Adjective => self.adjective(ph),
            Role::Verb => self.verb(ph),
            Role::Object => self.objects(ph),
            Role::Adverb => self.plain(PartOfSpeech::Adverb),
        }
    }

    fn chance(&mut self, p: f64) -> bool {
        p > 0.0 && self.rng.gen_bool(p)
    }

    /// History-aware draw. Recently drawn words are skipped unless nothing
    /// else qualifies.
    fn draw(&mut self, kind: Draw, filter: FrequencyOverride<'_>) -> Option<&'a Word> {
        let lexicon = self.lexicon;
        let mut word = {
            let history = &*self.history;
            let fresh = |f: u32, w: &Word| history.filter(w.pos(), filter(f, w), w.id);
            pick(lexicon, kind, &fresh, &mut *self.rng)
        };
        if word.is_none() && self.history.capacity() > 0 {
            word = pick(lexicon, kind, filter, &mut *self.rng);
        }
        let word = word?;
        self.history.record(word.pos(), word.id);
        Some(word)
    }

    /// Redraw until `accept` takes the word, at most `MAX_DRAW_ATTEMPTS` times.
    fn draw_accepted(
        &mut self,
        kind: Draw,
        filter: FrequencyOverride<'_>,
        accept: impl Fn(&Word) -> bool,
    ) -> Option<&'a Word> {
        for _ in 0..MAX_DRAW_ATTEMPTS {
            let word = self.draw(kind, filter)?;
            if accept(word) {
                return Some(word);
            }
        }
        None
    }

    fn unresolved(ph: &Placeholder) -> TemplateError {
        TemplateError::UnresolvedSlot {
            placeholder: ph.to_string(),
        }
    }

    fn noun(&mut self, ph: &Placeholder) -> Result<String, TemplateError> {
        let index = ph.slot.index;
        let case = match ph.role {
            Role::Subject => Case::Nominative,
            _ => ph.options.case.unwrap_or(Case::Nominative),
        };

        if let Some(bound) = self.ctx.slot(index) {
            return match bound.clone() {
                Some(noun) => self.render(&noun, case),
                None => Ok(String::new()),
            };
        }

        if ph.role == Role::Subject && index == 1 {
            match self.seed {
                SubjectSeed::Explicit(word) => {
                    let noun = BoundNoun::single(word, None, case);
                    let text = self.render(&noun, case)?;
                    self.ctx.bind(index, Some(noun));
                    return Ok(text);
                }
                SubjectSeed::Implicit(word) => {
                    self.ctx.bind(index, Some(BoundNoun::single(word, None, case)));
                    return Ok(String::new());
                }
                SubjectSeed::Fresh => {}
            }
        }

        let kind = if case == Case::Nominative {
            Draw::Subject
        } else {
            Draw::Object
        };
        let options = &ph.options;
        let described = self.adjective_slots.contains(&index);
        let filter = |f: u32, w: &Word| {
            if options.accepts(w) && !(described && w.properties.no_adjective) {
                f
            } else {
                0
            }
        };

        let Some(head) = self.draw(kind, &filter) else {
            self.ctx.bind(index, None);
            return Ok(String::new());
        };
        let attribute = self.bound_object(head, 1)?;
        let mut noun = BoundNoun::single(head, attribute, case);

        let p = self.config.double_noun_chance();
        if !options.single && !head.properties.no_noun_noun && !head.text.is_empty() && self.chance(p)
        {
            let partner = |f: u32, w: &Word| {
                if w.properties.no_noun_noun || w.text.is_empty() {
                    0
                } else {
                    filter(f, w)
                }
            };
            if let Some(second) = self.draw_accepted(kind, &partner, |w| w.id != head.id) {
                let attribute = self.bound_object(second, 1)?;
                noun.coordinate(NounMember {
                    word: second,
                    attribute,
                });
            }
        }

        let text = self.render(&noun, case)?;
        self.ctx.bind(index, Some(noun));
        Ok(text)
    }

    fn render(&self, noun: &BoundNoun<'a>, case: Case) -> Result<String, TemplateError> {
        let mut parts = Vec::with_capacity(noun.members.len());
        for member in &noun.members {
            let form = GrammarForm::new().case(case).number(noun_number(member.word));
            let mut text = member.word.inflect(self.rules, &form)?;
            if let Some(attribute) = &member.attribute {
                text.push(' ');
                text.push_str(attribute);
            }
            parts.push(text);
        }
        let conjunction = format!(" {} ", self.rules.language().conjunction());
        Ok(parts.join(&conjunction))
    }

    /// Text of the noun object bound to a noun or adjective, if it declares one.
    fn bound_object(&mut self, owner: &'a Word, depth: usize) -> Result<Option<String>, TemplateError> {
        if depth > MAX_BOUND_DEPTH {
            return Ok(None);
        }
        let spec = match &owner.kind {
            WordKind::Noun(info) => info.attribute.as_ref(),
            WordKind::Adjective(info) => info.object.as_ref(),
            _ => None,
        };
        let Some(ObjectSpec::Noun { case, preposition }) = spec else {
            return Ok(None);
        };

        let noun_owner = owner.pos() == PartOfSpeech::Noun;
        let semantic = semantic_filter(owner);
        let filter = |f: u32, w: &Word| {
            if w.id == owner.id || (noun_owner && w.properties.no_noun_noun) {
                0
            } else {
                semantic(f, w)
            }
        };
        let Some(object) = self.draw(Draw::Object, &filter) else {
            return Ok(None);
        };

        let form = GrammarForm::new().case(*case).number(noun_number(object));
        let mut text = object.inflect(self.rules, &form)?;
        if let Some(nested) = self.bound_object(object, depth + 1)? {
            text.push(' ');
            text.push_str(&nested);
        }
        let preposition = preposition.as_deref().unwrap_or("");
        Ok(Some(self.rules.join_preposition_object(preposition, &text)))
    }

    fn adjective(&mut self, ph: &Placeholder) -> Result<String, TemplateError> {
        let index = ph.slot.index;
        let noun = match self.ctx.slot(index) {
            None if self.ctx.forced(index).is_some() => return self.adjective_object(index),
            None => return Err(Self::unresolved(ph)),
            Some(None) => return Ok(String::new()),
            Some(Some(noun)) => noun.clone(),
        };
        let form = GrammarForm::new()
            .case(noun.case)
            .number(noun.number)
            .gender(noun.gender)
            .animate(noun.animate);
        let filter = agreement_filter(Some(noun.head()), noun.number);

        let Some(first) = self.draw(Draw::Any(PartOfSpeech::Adjective), &filter) else {
            return Ok(String::new());
        };
        let mut text = first.inflect(self.rules, &form)?;
        if let Some(object) = self.bound_object(first, 1)? {
            text.push(' ');
            text.push_str(&object);
        }

        let p = self.config.double_adjective_chance();
        if !ph.options.single && self.chance(p) {
            let partner = |f: u32, w: &Word| {
                if w.id == first.id || w.as_adjective().is_some_and(|a| a.possessive) {
                    0
                } else {
                    filter(f, w)
                }
            };
            if let Some(second) = self.draw(Draw::Any(PartOfSpeech::Adjective), &partner) {
                text = format!("{} {}", second.inflect(self.rules, &form)?, text);
            }
        }
        Ok(text)
    }

    /// Draw or reuse the verb of `ph.slot` and inflect it for this
    /// placeholder. Repeated references keep the verb but take their own form.
    fn verb(&mut self, ph: &Placeholder) -> Result<String, TemplateError> {
        let index = ph.slot.index;
        let subject = match self.ctx.slot(index) {
            Some(Some(noun)) => Some(noun.head()),
            _ => None,
        };
        let form = match ph.options.verb_form {
            Some(form) => form,
            None => {
                let (person, number) = match (self.ctx.slot(index), self.ctx.forced(index)) {
                    (Some(Some(noun)), _) => (noun.person, noun.number),
                    (_, Some(forced)) => forced,
                    (Some(None), None) => (Person::Third, Number::Singular),
                    (None, None) => return Err(Self::unresolved(ph)),
                };
                GrammarForm::new().person(person).number(number)
            }
        };

        if let Some(cached) = self.ctx.verb(ph.slot).map(|r| r.as_ref().map(|v| v.word)) {
            return match cached {
                Some(word) => Ok(word.inflect(self.rules, &form)?),
                None => Ok(String::new()),
            };
        }

        let filter = |f: u32, w: &Word| match subject {
            Some(noun) if !compatible(noun, w) => 0,
            _ => f,
        };
        let resolved = match self.draw(Draw::Any(PartOfSpeech::Verb), &filter) {
            Some(word) => Some(ResolvedVerb {
                word,
                text: word.inflect(self.rules, &form)?,
            }),
            None => None,
        };
        let text = resolved.as_ref().map(|v| v.text.clone()).unwrap_or_default();
        self.ctx.remember_verb(ph.slot, resolved);
        Ok(text)
    }

    fn objects(&mut self, ph: &Placeholder) -> Result<String, TemplateError> {
        let verb = match self.ctx.verb(ph.slot) {
            None => return Err(Self::unresolved(ph)),
            Some(None) => return Ok(String::new()),
            Some(Some(resolved)) => resolved.word,
        };
        let Some(info) = verb.as_verb() else {
            return Ok(String::new());
        };

        let mut parts = Vec::new();
        for spec in &info.objects {
            let text = match spec {
                ObjectSpec::Noun { case, preposition } => {
                    self.noun_object(verb, *case, preposition.as_deref())?
                }
                ObjectSpec::Infinitive { preposition } => {
                    self.infinitive_object(verb, preposition.as_deref())?
                }
                ObjectSpec::Adjective => self.adjective_object(ph.slot.index)?,
            };
            if !text.is_empty() {
                parts.push(text);
            }
        }
        Ok(parts.join(" "))
    }

    fn noun_object(
        &mut self,
        verb: &'a Word,
        case: Case,
        preposition: Option<&str>,
    ) -> Result<String, TemplateError> {
        let subject = self.ctx.subject_lexemes();
        let semantic = semantic_filter(verb);
        let Some(object) = self.draw_accepted(Draw::Object, &semantic, |w| !subject.contains(&w.id))
        else {
            return Ok(String::new());
        };

        let info = object.as_noun().cloned().unwrap_or_default();
        let mut text = object.inflect(self.rules, &GrammarForm::new().case(case).number(info.number))?;
        if let Some(attribute) = self.bound_object(object, 1)? {
            text.push(' ');
            text.push_str(&attribute);
        }

        let p = self.config.object_adjective_chance();
        if !object.properties.no_adjective && self.chance(p) {
            let filter = agreement_filter(Some(object), info.number);
            if let Some(adjective) = self.draw(Draw::Any(PartOfSpeech::Adjective), &filter) {
                let form = GrammarForm::new()
                    .case(case)
                    .number(info.number)
                    .gender(info.gender)
                    .animate(info.animate);
                text = format!("{} {}", adjective.inflect(self.rules, &form)?, text);
            }
        }
        Ok(self
            .rules
            .join_preposition_object(preposition.unwrap_or(""), &text))
    }

    fn infinitive_object(
        &mut self,
        verb: &'a Word,
        preposition: Option<&str>,
    ) -> Result<String, TemplateError> {
        let semantic = semantic_filter(verb);
        let distinct = |w: &Word| w.text != verb.text;
        let Some(infinitive) = self.draw_accepted(Draw::Any(PartOfSpeech::Verb), &semantic, distinct)
        else {
            return Ok(String::new());
        };
        let text = infinitive.inflect(self.rules, &GrammarForm::infinitive())?;
        Ok(self
            .rules
            .join_preposition_object(preposition.unwrap_or(""), &text))
    }

    /// Predicative adjective agreeing with the slot's noun, or with the
    /// number an explicit verb form fixed when the slot has none.
    fn adjective_object(&mut self, index: usize) -> Result<String, TemplateError> {
        let (form, noun) = match self.ctx.slot(index) {
            Some(Some(noun)) => (
                GrammarForm::new()
                    .case(Case::Nominative)
                    .number(noun.number)
                    .gender(noun.gender)
                    .animate(noun.animate),
                Some(noun.head()),
            ),
            _ => (
                GrammarForm::new()
                    .case(Case::Nominative)
                    .number(self.ctx.forced_number(index).unwrap_or_default())
                    .gender(Gender::Masculine),
                None,
            ),
        };
        let filter = agreement_filter(noun, form.number.unwrap_or_default());
        match self.draw(Draw::Any(PartOfSpeech::Adjective), &filter) {
            Some(adjective) => Ok(adjective.inflect(self.rules, &form)?),
            None => Ok(String::new()),
        }
    }

    fn filler(&mut self) -> Result<String, TemplateError> {
        let p = self.config.filler_chance();
        if !self.chance(p) {
            return Ok(String::new());
        }
        self.plain(PartOfSpeech::Filler)
    }

    fn plain(&mut self, pos: PartOfSpeech) -> Result<String, TemplateError> {
        let any = |f: u32, _: &Word| f;
        match self.draw(Draw::Any(pos), &any) {
            Some(word) => Ok(word.inflect(self.rules, &GrammarForm::new())?),
            None => Ok(String::new()),
        }
    }
}
