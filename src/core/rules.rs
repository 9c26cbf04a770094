/// Suffix-substitution inflection.
///
/// A rule line reads
/// `<POS> <tag> <form-id|a-b|a,b,c> <remove|0> <add|0> <pattern>[/<extra-tags>]`.
/// A rule applies to a word when the word carries every required tag, its
/// text matches the suffix pattern and ends with the removed suffix. Rules
/// for one form are tried in file order and the first applicable one wins;
/// with no applicable rule the text is returned unchanged.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use crate::schema::form::GrammarError;

use crate::core::diagnostics::Diagnostics;
use crate::schema::form::{Case, FormId, Gender, GrammarForm, Number};
use crate::schema::word::PartOfSpeech;

/// Language-specific spelling and agreement adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Polish,
    /// No overrides, no reflexive particle.
    Plain,
}

/// First letters after which Polish "z" becomes "ze" (when a consonant follows).
const Z_CLUSTER_INITIALS: &[char] = &['s', 'z', 'ś', 'ź', 'ż'];
/// First letters after which Polish "w" becomes "we" (when a consonant follows).
const W_CLUSTER_INITIALS: &[char] = &['w', 'f'];
const POLISH_VOWELS: &[char] = &['a', 'ą', 'e', 'ę', 'i', 'o', 'ó', 'u', 'y'];

impl Language {
    pub fn reflexive_particle(self) -> Option<&'static str> {
        match self {
            Language::Polish => Some("się"),
            Language::Plain => None,
        }
    }

    /// Word joining two coordinated nouns or adjectives.
    pub fn conjunction(self) -> &'static str {
        match self {
            Language::Polish => "i",
            Language::Plain => "and",
        }
    }

    /// Inanimate masculine adjectives borrow the neuter plural and, in the
    /// singular, the nominative for the accusative.
    pub fn adjust_adjective_form(self, form: &GrammarForm) -> GrammarForm {
        let mut adjusted = *form;
        if self == Language::Polish
            && form.gender == Some(Gender::Masculine)
            && form.animate == Some(false)
        {
            if form.number == Some(Number::Plural) {
                adjusted.gender = Some(Gender::Neuter);
            } else if form.case == Some(Case::Accusative) {
                adjusted.case = Some(Case::Nominative);
            }
        }
        adjusted
    }

    pub fn join_preposition(self, preposition: &str, object: &str) -> String {
        if preposition.is_empty() {
            return object.to_string();
        }
        if object.is_empty() {
            return String::new();
        }
        if self == Language::Polish && needs_euphonic_vowel(preposition, object) {
            return format!("{}e {}", preposition, object);
        }
        format!("{} {}", preposition, object)
    }
}

fn needs_euphonic_vowel(preposition: &str, object: &str) -> bool {
    let initials = match preposition.to_lowercase().as_str() {
        "z" => Z_CLUSTER_INITIALS,
        "w" => W_CLUSTER_INITIALS,
        _ => return false,
    };
    let lower = object.to_lowercase();
    if lower.starts_with("mn") {
        return true;
    }
    let mut chars = lower.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) => {
            initials.contains(&first) && !POLISH_VOWELS.contains(&second)
        }
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    Literal(char),
    Any,
    Class { chars: Vec<char>, negated: bool },
}

impl Atom {
    fn matches(&self, c: char) -> bool {
        match self {
            Atom::Literal(l) => *l == c,
            Atom::Any => true,
            Atom::Class { chars, negated } => chars.contains(&c) != *negated,
        }
    }
}

/// Word-ending pattern: literals, `.` for any character, `[..]` and `[^..]`
/// classes. `0` is the empty pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixPattern {
    source: String,
    atoms: Vec<Atom>,
}

impl SuffixPattern {
    pub fn parse(source: &str) -> Result<SuffixPattern, String> {
        let mut atoms = Vec::new();
        if source != "0" {
            let mut chars = source.chars();
            while let Some(c) = chars.next() {
                match c {
                    '.' => atoms.push(Atom::Any),
                    '[' => {
                        let mut class = Vec::new();
                        let mut negated = false;
                        let mut closed = false;
                        for (i, c) in chars.by_ref().enumerate() {
                            match c {
                                '^' if i == 0 => negated = true,
                                ']' => {
                                    closed = true;
                                    break;
                                }
                                other => class.push(other),
                            }
                        }
                        if !closed {
                            return Err(format!("unterminated character class in '{}'", source));
                        }
                        if class.is_empty() {
                            return Err(format!("empty character class in '{}'", source));
                        }
                        atoms.push(Atom::Class {
                            chars: class,
                            negated,
                        });
                    }
                    ']' => return Err(format!("unmatched ']' in '{}'", source)),
                    other => atoms.push(Atom::Literal(other)),
                }
            }
        }
        Ok(SuffixPattern {
            source: source.to_string(),
            atoms,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, text: &str) -> bool {
        let mut chars = text.chars().rev();
        self.atoms
            .iter()
            .rev()
            .all(|atom| chars.next().is_some_and(|c| atom.matches(c)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub remove: String,
    pub add: String,
    pub pattern: SuffixPattern,
    pub required_tags: Vec<char>,
}

impl Rule {
    pub fn applies(&self, text: &str, tags: &[char]) -> bool {
        self.required_tags.iter().all(|t| tags.contains(t))
            && text.ends_with(&self.remove)
            && self.pattern.matches(text)
    }

    pub fn apply(&self, text: &str) -> String {
        let stem = &text[..text.len() - self.remove.len()];
        format!("{}{}", stem, self.add)
    }
}

/// Inflection rules indexed by part of speech and form-id.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: FxHashMap<(PartOfSpeech, FormId), Vec<Rule>>,
    language: Language,
    count: usize,
}

impl RuleTable {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Replace the whole table with the rules in `source`.
    pub fn load(&mut self, source: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        self.rules.clear();
        self.count = 0;

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw);
            if line.is_empty() {
                continue;
            }
            match parse_rule_line(line) {
                Ok((pos, forms, rule)) => {
                    for form in forms {
                        let entry = self.rules.entry((pos, form)).or_default();
                        if entry.iter().any(|r| same_rule(r, &rule)) {
                            diagnostics.warn(
                                Some(line_no),
                                format!("duplicate {} rule for form {}", pos, form),
                            );
                            continue;
                        }
                        entry.push(rule.clone());
                        self.count += 1;
                    }
                }
                Err(msg) => diagnostics.warn(Some(line_no), msg),
            }
        }

        diagnostics.debug(None, format!("loaded {} inflection rules", self.count));
        diagnostics
    }

    pub fn load_from_path(&mut self, path: &Path) -> Result<Diagnostics, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(self.load(&contents))
    }

    /// Whether any rule for `pos` requires `tag`.
    pub fn has_tag(&self, pos: PartOfSpeech, tag: char) -> bool {
        self.rules
            .iter()
            .filter(|((p, _), _)| *p == pos)
            .flat_map(|(_, rules)| rules)
            .any(|r| r.required_tags.contains(&tag))
    }

    /// Apply the first matching rule for `(pos, form)`, or return `text`.
    pub fn inflect(&self, pos: PartOfSpeech, form: FormId, text: &str, tags: &[char]) -> String {
        self.rules
            .get(&(pos, form))
            .and_then(|rules| rules.iter().find(|r| r.applies(text, tags)))
            .map_or_else(|| text.to_string(), |r| r.apply(text))
    }

    pub fn inflect_noun(
        &self,
        text: &str,
        tags: &[char],
        form: &GrammarForm,
    ) -> Result<String, GrammarError> {
        let id = form.noun_form_id()?;
        Ok(self.inflect(PartOfSpeech::Noun, id, text, tags))
    }

    pub fn inflect_adjective(
        &self,
        text: &str,
        tags: &[char],
        form: &GrammarForm,
    ) -> Result<String, GrammarError> {
        let id = self.language.adjust_adjective_form(form).adjective_form_id()?;
        Ok(self.inflect(PartOfSpeech::Adjective, id, text, tags))
    }

    pub fn inflect_verb(
        &self,
        text: &str,
        tags: &[char],
        form: &GrammarForm,
        reflexive: bool,
    ) -> Result<String, GrammarError> {
        let id = form.verb_form_id()?;
        let inflected = self.inflect(PartOfSpeech::Verb, id, text, tags);
        Ok(match self.language.reflexive_particle() {
            Some(particle) if reflexive => {
                if form.infinitive {
                    format!("{} {}", particle, inflected)
                } else {
                    format!("{} {}", inflected, particle)
                }
            }
            _ => inflected,
        })
    }

    pub fn join_preposition_object(&self, preposition: &str, object: &str) -> String {
        self.language.join_preposition(preposition, object)
    }
}

fn same_rule(a: &Rule, b: &Rule) -> bool {
    let mut ta = a.required_tags.clone();
    let mut tb = b.required_tags.clone();
    ta.sort_unstable();
    tb.sort_unstable();
    ta == tb && a.remove == b.remove && a.pattern.as_str() == b.pattern.as_str()
}

/// Cut a trailing `#` comment. A `#` between double quotes is text.
pub(crate) fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (pos, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' if !quoted => return line[..pos].trim(),
            _ => {}
        }
    }
    line.trim()
}

fn empty_marker(field: &str) -> String {
    if field == "0" {
        String::new()
    } else {
        field.to_string()
    }
}

fn parse_form_ids(field: &str) -> Result<Vec<FormId>, String> {
    let number = |s: &str| {
        s.trim()
            .parse::<u16>()
            .map_err(|_| format!("invalid form-id '{}'", s))
    };
    if let Some((a, b)) = field.split_once('-') {
        let (a, b) = (number(a)?, number(b)?);
        if a > b {
            return Err(format!("empty form-id range '{}'", field));
        }
        return Ok((a..=b).map(FormId).collect());
    }
    field.split(',').map(|s| number(s).map(FormId)).collect()
}

fn parse_rule_line(line: &str) -> Result<(PartOfSpeech, Vec<FormId>, Rule), String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [pos, tag, forms, remove, add, pattern] = fields.as_slice() else {
        return Err(format!(
            "expected 6 fields in rule line, found {}",
            fields.len()
        ));
    };

    let pos = PartOfSpeech::from_code(pos)
        .filter(|p| p.is_inflected())
        .ok_or_else(|| format!("unknown part of speech '{}' in rule", pos))?;

    let mut tag_chars = tag.chars();
    let tag = match (tag_chars.next(), tag_chars.next()) {
        (Some(c), None) => c,
        _ => return Err(format!("rule tag must be a single character, got '{}'", tag)),
    };

    let forms = parse_form_ids(forms)?;
    let (pattern, extra) = pattern.split_once('/').unwrap_or((*pattern, ""));
    let pattern = SuffixPattern::parse(pattern)?;

    let mut required_tags = vec![tag];
    required_tags.extend(extra.chars().filter(|c| *c != tag));

    Ok((
        pos,
        forms,
        Rule {
            remove: empty_marker(remove),
            add: empty_marker(add),
            pattern,
            required_tags,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::form::Person;

    fn table(source: &str) -> RuleTable {
        let mut t = RuleTable::default();
        t.load(source);
        t
    }

    #[test]
    fn locative_rule_applies() {
        let t = table("N a 6 a ze ra");
        let form = GrammarForm::new().case(Case::Locative);
        assert_eq!(t.inflect_noun("pora", &['a'], &form).unwrap(), "porze");
        // Missing tag or non-matching ending leaves the text alone.
        assert_eq!(t.inflect_noun("pora", &['b'], &form).unwrap(), "pora");
        assert_eq!(t.inflect_noun("mama", &['a'], &form).unwrap(), "mama");
    }

    #[test]
    fn ranges_lists_and_empty_markers() {
        let t = table("N a 1-3 0 0 0\nN b 4,14 a ę a\n");
        assert_eq!(t.len(), 5);
        let acc = GrammarForm::new().case(Case::Accusative);
        assert_eq!(t.inflect_noun("lipa", &['b'], &acc).unwrap(), "lipę");
        let acc_pl = acc.number(Number::Plural);
        assert_eq!(t.inflect_noun("lipa", &['b'], &acc_pl).unwrap(), "lipę");
    }

    #[test]
    fn extra_tags_are_required() {
        let t = table("N a 2 a y a/x");
        let gen = GrammarForm::new().case(Case::Genitive);
        assert_eq!(t.inflect_noun("lipa", &['a'], &gen).unwrap(), "lipa");
        assert_eq!(t.inflect_noun("lipa", &['a', 'x'], &gen).unwrap(), "lipy");
    }

    #[test]
    fn first_applicable_rule_wins() {
        let t = table("N a 2 ka ki ka\nN a 2 a y a\n");
        let gen = GrammarForm::new().case(Case::Genitive);
        assert_eq!(t.inflect_noun("rzeka", &['a'], &gen).unwrap(), "rzeki");
        assert_eq!(t.inflect_noun("lipa", &['a'], &gen).unwrap(), "lipy");
    }

    #[test]
    fn patterns_with_classes() {
        let p = SuffixPattern::parse("[^k]a").unwrap();
        assert!(p.matches("lipa"));
        assert!(!p.matches("rzeka"));
        assert!(!p.matches("a"));
        assert!(SuffixPattern::parse(".a").unwrap().matches("ba"));
        assert!(SuffixPattern::parse("0").unwrap().matches(""));
        assert!(SuffixPattern::parse("[ab").is_err());
        assert!(SuffixPattern::parse("[]").is_err());
    }

    #[test]
    fn malformed_and_duplicate_lines_are_diagnosed() {
        let mut t = RuleTable::default();
        let d = t.load("N a 6 a ze ra\nN a 6 a ze ra\nX a 1 0 0 0\nN ab 1 0 0 0\nN a 9-2 0 0 0\nN a 1\n");
        assert_eq!(t.len(), 1);
        assert_eq!(d.count_at_least(crate::core::diagnostics::Level::Warn), 5);
    }

    #[test]
    fn load_replaces_table() {
        let mut t = table("N a 6 a ze ra");
        t.load("N a 2 a y a");
        let loc = GrammarForm::new().case(Case::Locative);
        assert_eq!(t.inflect_noun("pora", &['a'], &loc).unwrap(), "pora");
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn polish_inanimate_accusative_uses_nominative() {
        // Only the nominative has a rule.
        let t = table("A a 101 0 y n");
        let acc = GrammarForm::new()
            .gender(Gender::Masculine)
            .number(Number::Singular)
            .case(Case::Accusative)
            .animate(false);
        let nom = GrammarForm::new()
            .gender(Gender::Masculine)
            .number(Number::Singular)
            .case(Case::Nominative);
        assert_eq!(t.inflect_adjective("zielon", &['a'], &nom).unwrap(), "zielony");
        assert_eq!(
            t.inflect_adjective("zielon", &['a'], &acc).unwrap(),
            t.inflect_adjective("zielon", &['a'], &nom).unwrap()
        );

        // Animate nouns keep their own accusative bucket.
        let t = table("A a 101 0 y n\nA a 104 0 ego n");
        assert_eq!(
            t.inflect_adjective("zielon", &['a'], &acc.animate(true)).unwrap(),
            "zielonego"
        );
        assert_eq!(t.inflect_adjective("zielon", &['a'], &acc).unwrap(), "zielony");
    }

    #[test]
    fn polish_inanimate_plural_uses_neuter_bucket() {
        let t = table("A a 311 y e y\nA a 111 y i y");
        let pl = GrammarForm::new()
            .gender(Gender::Masculine)
            .number(Number::Plural)
            .case(Case::Nominative);
        assert_eq!(t.inflect_adjective("zielony", &['a'], &pl.animate(false)).unwrap(), "zielone");
        assert_eq!(t.inflect_adjective("zielony", &['a'], &pl.animate(true)).unwrap(), "zieloni");
    }

    #[test]
    fn plain_language_has_no_remap() {
        let mut t = table("A a 101 y y y\nA a 104 y ego y");
        t.set_language(Language::Plain);
        let acc = GrammarForm::new()
            .gender(Gender::Masculine)
            .case(Case::Accusative)
            .animate(false);
        assert_eq!(t.inflect_adjective("zielony", &['a'], &acc).unwrap(), "zielonego");
    }

    #[test]
    fn reflexive_particle_placement() {
        let t = table("V a 13 nąć ną ąć\nV a 50 0 0 0");
        let pl3 = GrammarForm::new().person(Person::Third).number(Number::Plural);
        assert_eq!(t.inflect_verb("rosnąć", &['a'], &pl3, true).unwrap(), "rosną się");
        assert_eq!(
            t.inflect_verb("rosnąć", &['a'], &GrammarForm::infinitive(), true).unwrap(),
            "się rosnąć"
        );
        assert_eq!(t.inflect_verb("rosnąć", &['a'], &pl3, false).unwrap(), "rosną");
    }

    #[test]
    fn verb_form_errors_propagate() {
        let t = RuleTable::default();
        assert_eq!(
            t.inflect_verb("iść", &[], &GrammarForm::new(), false),
            Err(GrammarError::MissingPerson)
        );
        assert_eq!(
            t.inflect_noun("dom", &[], &GrammarForm::new()),
            Err(GrammarError::MissingCase)
        );
        assert_eq!(
            t.inflect_adjective("duży", &[], &GrammarForm::new().case(Case::Dative)),
            Err(GrammarError::MissingGender)
        );
    }

    #[test]
    fn inflection_is_deterministic() {
        let t = table("N a 2 a y a\nN a 2 a i a");
        let gen = GrammarForm::new().case(Case::Genitive);
        let first = t.inflect_noun("lipa", &['a'], &gen).unwrap();
        for _ in 0..50 {
            assert_eq!(t.inflect_noun("lipa", &['a'], &gen).unwrap(), first);
        }
    }

    #[test]
    fn euphonic_prepositions() {
        let pl = Language::Polish;
        assert_eq!(pl.join_preposition("z", "szkła"), "ze szkła");
        assert_eq!(pl.join_preposition("z", "zdjęcia"), "ze zdjęcia");
        assert_eq!(pl.join_preposition("z", "sadu"), "z sadu");
        assert_eq!(pl.join_preposition("w", "wtorek"), "we wtorek");
        assert_eq!(pl.join_preposition("w", "wodzie"), "w wodzie");
        assert_eq!(pl.join_preposition("w", "mnie"), "we mnie");
        assert_eq!(pl.join_preposition("na", "szkle"), "na szkle");
        assert_eq!(pl.join_preposition("", "lesie"), "lesie");
        assert_eq!(Language::Plain.join_preposition("w", "wtorek"), "w wtorek");
    }

    #[test]
    fn comments_skip_quoted_text() {
        assert_eq!(strip_comment("N a 6 a ie a # locative"), "N a 6 a ie a");
        assert_eq!(strip_comment("N 1 \"nr #1\" # note"), "N 1 \"nr #1\"");
        assert_eq!(strip_comment("# only a comment"), "");
    }

    #[test]
    fn has_tag_scans_part_of_speech() {
        let t = table("N a 6 a ze ra/x");
        assert!(t.has_tag(PartOfSpeech::Noun, 'a'));
        assert!(t.has_tag(PartOfSpeech::Noun, 'x'));
        assert!(!t.has_tag(PartOfSpeech::Verb, 'a'));
    }
}
