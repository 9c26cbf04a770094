/// Dictionary loading and weighted word selection.
///
/// Line format: `<POS> <frequency> <text|"quoted text">[/<tags>] [<options>]`
/// with POS one of `N V A D O` and space-delimited options, e.g.
///
/// ```text
/// N 40 lipa/a FEMININE SEMANTIC(tree,plant)
/// V 20 rosnąć/c REFLEXIVE OBJECT(6,w)
/// A 10 "stary jak świat"/d ONLY_SINGULAR
/// ```

use rand::Rng;
use std::path::Path;
use std::str::FromStr;

use crate::core::diagnostics::{Diagnostic, Diagnostics, Level};
use crate::core::options::{self, Delimiter, ParsedOption};
use crate::core::rules::{strip_comment, RuleTable};
use crate::core::sampling::weighted_pick;
use crate::schema::form::{Case, Gender, Number, Person};
use crate::schema::word::{
    AdjectiveInfo, LexemeId, NounInfo, ObjectSpec, PartOfSpeech, Properties, VerbInfo, Word,
    WordKind,
};

/// Caller-supplied remapping of a candidate's frequency.
pub type FrequencyOverride<'a> = &'a dyn Fn(u32, &Word) -> u32;

/// Words grouped by part of speech, in dictionary order.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    words: [Vec<Word>; PartOfSpeech::COUNT],
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the dictionary with the entries in `source`. Bad lines are
    /// reported and skipped.
    pub fn load(&mut self, source: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let mut words: [Vec<Word>; PartOfSpeech::COUNT] = Default::default();
        let mut next_id = 0u32;

        for (idx, raw) in source.lines().enumerate() {
            let line = strip_comment(raw);
            if line.is_empty() {
                continue;
            }
            match parse_word_line(line, LexemeId(next_id)) {
                Ok(word) => {
                    next_id += 1;
                    words[word.pos().index()].push(word);
                }
                Err(msg) => diagnostics.warn(Some(idx + 1), msg),
            }
        }

        self.words = words;
        diagnostics.debug(None, format!("loaded {} dictionary entries", self.len()));
        diagnostics
    }

    pub fn load_from_path(&mut self, path: &Path) -> Result<Diagnostics, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(self.load(&contents))
    }

    pub fn words(&self, pos: PartOfSpeech) -> &[Word] {
        &self.words[pos.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.words.iter().flatten()
    }

    pub fn get(&self, id: LexemeId) -> Option<&Word> {
        self.iter().find(|w| w.id == id)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Weighted draw of one `pos` word. `filter` remaps each candidate's
    /// frequency; a result of zero excludes it.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        pos: PartOfSpeech,
        filter: Option<FrequencyOverride<'_>>,
        rng: &mut R,
    ) -> Option<&Word> {
        let words = self.words(pos);
        let idx = weighted_pick(
            words,
            |w| match filter {
                Some(f) => f(w.frequency, w),
                None => w.frequency,
            },
            rng,
        )?;
        Some(&words[idx])
    }

    /// Noun draw for the subject position: object-only nouns are excluded.
    pub fn draw_subject<R: Rng + ?Sized>(
        &self,
        filter: Option<FrequencyOverride<'_>>,
        rng: &mut R,
    ) -> Option<&Word> {
        let subject_filter = |frequency: u32, word: &Word| {
            if word.properties.only_object {
                return 0;
            }
            match filter {
                Some(f) => f(frequency, word),
                None => frequency,
            }
        };
        self.draw(PartOfSpeech::Noun, Some(&subject_filter), rng)
    }

    /// Noun draw for an object position: subject-only nouns are excluded and
    /// a declared object frequency replaces the base frequency.
    pub fn draw_object<R: Rng + ?Sized>(
        &self,
        filter: Option<FrequencyOverride<'_>>,
        rng: &mut R,
    ) -> Option<&Word> {
        let object_filter = |frequency: u32, word: &Word| {
            if word.properties.only_subject {
                return 0;
            }
            let base = word.properties.object_frequency.unwrap_or(frequency);
            match filter {
                Some(f) => f(base, word),
                None => base,
            }
        };
        self.draw(PartOfSpeech::Noun, Some(&object_filter), rng)
    }

    /// Run both word validators over the whole dictionary.
    pub fn validate(&self, rules: &RuleTable) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        for word in self.iter() {
            diagnostics.extend(validate_word(word));
            diagnostics.extend(validate_with_grammar(word, rules));
        }
        diagnostics
    }
}

fn describe(word: &Word) -> String {
    format!("{} '{}'", word.pos(), word.text)
}

fn warning(word: &Word, message: String) -> Diagnostic {
    Diagnostic {
        level: Level::Warn,
        line: None,
        message: format!("{}: {}", describe(word), message),
    }
}

fn overlap<'a>(a: &'a [String], b: &[String]) -> Option<&'a String> {
    a.iter().find(|x| b.contains(x))
}

/// Self-contradictory declarations on a single word.
pub fn validate_word(word: &Word) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let p = &word.properties;

    if p.only_subject && p.only_object {
        out.push(warning(word, "ONLY_SUBJECT and ONLY_OBJECT together".to_string()));
    }
    let pairs = [
        ("ONLY_WITH", &p.only_with, "NOT_WITH", &p.not_with),
        ("ONLY_WITH_WORD", &p.only_with_word, "NOT_WITH_WORD", &p.not_with_word),
        ("TAKES_ONLY", &p.takes_only, "TAKES_NO", &p.takes_no),
        ("TAKES_ONLY_WORD", &p.takes_only_word, "TAKES_NO_WORD", &p.takes_no_word),
    ];
    for (yes_name, yes, no_name, no) in pairs {
        if let Some(tag) = overlap(yes, no) {
            out.push(warning(
                word,
                format!("'{}' is in both {} and {}", tag, yes_name, no_name),
            ));
        }
    }
    let word_lists = [
        ("ONLY_WITH_WORD", &p.only_with_word),
        ("NOT_WITH_WORD", &p.not_with_word),
        ("TAKES_ONLY_WORD", &p.takes_only_word),
        ("TAKES_NO_WORD", &p.takes_no_word),
    ];
    for (name, list) in word_lists {
        if list.contains(&word.text) {
            out.push(warning(word, format!("{} names the word itself", name)));
        }
    }
    if p.object_frequency.is_some() && word.pos() != PartOfSpeech::Noun {
        out.push(warning(word, "OBJECT_FREQ has no effect outside nouns".to_string()));
    }
    if let Some(adj) = word.as_adjective() {
        if adj.only_singular && adj.only_plural {
            out.push(warning(word, "ONLY_SINGULAR and ONLY_PLURAL together".to_string()));
        }
    }
    out
}

/// Declared tags that no rule for the word's part of speech uses.
pub fn validate_with_grammar(word: &Word, rules: &RuleTable) -> Vec<Diagnostic> {
    if !word.pos().is_inflected() {
        return Vec::new();
    }
    word.tags
        .iter()
        .filter(|tag| !rules.has_tag(word.pos(), **tag))
        .map(|tag| warning(word, format!("tag '{}' matches no inflection rule", tag)))
        .collect()
}

/// Split off the next whitespace-delimited field.
fn next_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (field, tail) = trimmed.split_at(end);
    *rest = tail;
    Some(field)
}

/// Parse the `text[/tags]` field, which may be quoted and contain spaces.
fn take_text<'a>(rest: &mut &'a str) -> Result<(String, &'a str), String> {
    let trimmed = rest.trim_start();
    if let Some(quoted) = trimmed.strip_prefix('"') {
        let close = quoted
            .find('"')
            .ok_or_else(|| "unterminated quoted text".to_string())?;
        let text = quoted[..close].to_string();
        let after = &quoted[close + 1..];
        let end = after.find(char::is_whitespace).unwrap_or(after.len());
        let (tag_part, tail) = after.split_at(end);
        *rest = tail;
        let tags = match tag_part {
            "" => "",
            t => t
                .strip_prefix('/')
                .ok_or_else(|| format!("unexpected '{}' after quoted text", t))?,
        };
        Ok((text, tags))
    } else {
        let field = next_field(rest).ok_or_else(|| "missing word text".to_string())?;
        let (text, tags) = field.split_once('/').unwrap_or((field, ""));
        Ok((text.to_string(), tags))
    }
}

fn parse_tags(tags: &str) -> Vec<char> {
    let mut out = Vec::new();
    for c in tags.chars() {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

fn list_param(opt: &ParsedOption) -> Result<Vec<String>, String> {
    match &opt.params {
        Some(params) if !params.is_empty() => Ok(params.iter().map(|p| p.name.clone()).collect()),
        _ => Err(format!("option {} needs at least one parameter", opt.name)),
    }
}

fn single_number<T: FromStr>(opt: &ParsedOption) -> Result<T, String> {
    match opt.param_names().as_slice() {
        [n] => n
            .parse()
            .map_err(|_| format!("option {} expects a number, got '{}'", opt.name, n)),
        _ => Err(format!("option {} expects exactly one parameter", opt.name)),
    }
}

/// `OBJECT(case[,prep])`, `OBJECT(ADJ)` or `OBJECT(INF[,prep])`.
pub(crate) fn parse_object_spec(opt: &ParsedOption) -> Result<ObjectSpec, String> {
    let params = opt.param_names();
    let preposition = params.get(1).map(|p| p.to_string());
    match params.first() {
        None => Err("OBJECT needs a case, ADJ or INF".to_string()),
        Some(_) if params.len() > 2 => Err("OBJECT takes at most two parameters".to_string()),
        Some(kind) if kind.eq_ignore_ascii_case("ADJ") => {
            if preposition.is_some() {
                return Err("OBJECT(ADJ) takes no preposition".to_string());
            }
            Ok(ObjectSpec::Adjective)
        }
        Some(kind) if kind.eq_ignore_ascii_case("INF") => Ok(ObjectSpec::Infinitive { preposition }),
        Some(case) => {
            let n: u16 = case
                .parse()
                .map_err(|_| format!("invalid object case '{}'", case))?;
            let case = Case::from_number(n).map_err(|e| e.to_string())?;
            Ok(ObjectSpec::Noun { case, preposition })
        }
    }
}

/// Options every word kind accepts. Returns false when `opt` is not one.
fn apply_common(opt: &ParsedOption, props: &mut Properties) -> Result<bool, String> {
    let name = opt.name.to_ascii_uppercase();
    match name.as_str() {
        "SEMANTIC" => props.semantic = list_param(opt)?,
        "ONLY_WITH" => props.only_with = list_param(opt)?,
        "NOT_WITH" => props.not_with = list_param(opt)?,
        "ONLY_WITH_WORD" => props.only_with_word = list_param(opt)?,
        "NOT_WITH_WORD" => props.not_with_word = list_param(opt)?,
        "TAKES_ONLY" => props.takes_only = list_param(opt)?,
        "TAKES_NO" => props.takes_no = list_param(opt)?,
        "TAKES_ONLY_WORD" => props.takes_only_word = list_param(opt)?,
        "TAKES_NO_WORD" => props.takes_no_word = list_param(opt)?,
        "ONLY_SUBJECT" => props.only_subject = true,
        "ONLY_OBJECT" => props.only_object = true,
        "NO_ADJECTIVE" => props.no_adjective = true,
        "NO_NOUN_NOUN" => props.no_noun_noun = true,
        "OBJECT_FREQ" => props.object_frequency = Some(single_number(opt)?),
        "SUFFIX" => props.suffix = Some(list_param(opt)?.join(",")),
        _ => return Ok(false),
    }
    Ok(true)
}

fn bound_noun_object(opt: &ParsedOption, slot: &mut Option<ObjectSpec>) -> Result<(), String> {
    if slot.is_some() {
        return Err("at most one OBJECT may be declared".to_string());
    }
    match parse_object_spec(opt)? {
        spec @ ObjectSpec::Noun { .. } => {
            *slot = Some(spec);
            Ok(())
        }
        _ => Err("only noun objects can be bound here".to_string()),
    }
}

fn apply_kind(opt: &ParsedOption, kind: &mut WordKind) -> Result<bool, String> {
    let name = opt.name.to_ascii_uppercase();
    match (kind, name.as_str()) {
        (WordKind::Noun(n), "MASCULINE") => n.gender = Gender::Masculine,
        (WordKind::Noun(n), "FEMININE") => n.gender = Gender::Feminine,
        (WordKind::Noun(n), "NEUTER") => n.gender = Gender::Neuter,
        (WordKind::Noun(n), "SINGULAR") => n.number = Number::Singular,
        (WordKind::Noun(n), "PLURAL") => n.number = Number::Plural,
        (WordKind::Noun(n), "ANIMATE") => n.animate = true,
        (WordKind::Noun(n), "INANIMATE") => n.animate = false,
        (WordKind::Noun(n), "PERSON") => {
            n.person = Person::from_number(single_number(opt)?).map_err(|e| e.to_string())?
        }
        (WordKind::Noun(n), "OBJECT") => bound_noun_object(opt, &mut n.attribute)?,
        (WordKind::Verb(v), "REFLEXIVE") => v.reflexive = true,
        (WordKind::Verb(v), "OBJECT") => v.objects.push(parse_object_spec(opt)?),
        (WordKind::Adjective(a), "POSSESSIVE" | "DOUBLE") => a.possessive = true,
        (WordKind::Adjective(a), "ONLY_SINGULAR") => a.only_singular = true,
        (WordKind::Adjective(a), "ONLY_PLURAL") => a.only_plural = true,
        (WordKind::Adjective(a), "OBJECT") => bound_noun_object(opt, &mut a.object)?,
        _ => return Ok(false),
    }
    Ok(true)
}

/// Parse one non-empty, comment-free dictionary line.
pub fn parse_word_line(line: &str, id: LexemeId) -> Result<Word, String> {
    let mut rest = line;
    let pos_code = next_field(&mut rest).ok_or_else(|| "empty line".to_string())?;
    let pos = PartOfSpeech::from_code(pos_code)
        .ok_or_else(|| format!("unknown part of speech '{}'", pos_code))?;
    let freq_field = next_field(&mut rest).ok_or_else(|| "missing frequency".to_string())?;
    let frequency: u32 = freq_field
        .parse()
        .map_err(|_| format!("frequency must be a non-negative integer, got '{}'", freq_field))?;
    let (text, tags) = take_text(&mut rest)?;

    let mut kind = match pos {
        PartOfSpeech::Noun => WordKind::Noun(NounInfo::default()),
        PartOfSpeech::Verb => WordKind::Verb(VerbInfo::default()),
        PartOfSpeech::Adjective => WordKind::Adjective(AdjectiveInfo::default()),
        PartOfSpeech::Adverb => WordKind::Adverb,
        PartOfSpeech::Filler => WordKind::Filler,
    };
    let mut properties = Properties::default();

    let parsed = options::parse(rest.trim(), Delimiter::Space).map_err(|e| e.to_string())?;
    for opt in &parsed {
        if apply_common(opt, &mut properties)? || apply_kind(opt, &mut kind)? {
            continue;
        }
        return Err(format!("unknown option '{}' for {}", opt.name, pos));
    }

    Ok(Word {
        id,
        text,
        frequency,
        tags: parse_tags(tags),
        properties,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lexicon(source: &str) -> Lexicon {
        let mut lex = Lexicon::new();
        lex.load(source);
        lex
    }

    #[test]
    fn parses_noun_with_options() {
        let w = parse_word_line(
            "N 40 lipa/ab FEMININE ANIMATE SEMANTIC(tree,plant) OBJECT(2)",
            LexemeId(3),
        )
        .unwrap();
        assert_eq!(w.id, LexemeId(3));
        assert_eq!(w.text, "lipa");
        assert_eq!(w.frequency, 40);
        assert_eq!(w.tags, vec!['a', 'b']);
        assert_eq!(w.properties.semantic, vec!["tree", "plant"]);
        let noun = w.as_noun().unwrap();
        assert_eq!(noun.gender, Gender::Feminine);
        assert!(noun.animate);
        assert_eq!(
            noun.attribute,
            Some(ObjectSpec::Noun {
                case: Case::Genitive,
                preposition: None
            })
        );
    }

    #[test]
    fn parses_quoted_and_empty_text() {
        let w = parse_word_line("D 5 \"po cichu\"/x", LexemeId(0)).unwrap();
        assert_eq!(w.text, "po cichu");
        assert_eq!(w.tags, vec!['x']);
        let w = parse_word_line("N 5 \"\" PERSON(1) PLURAL", LexemeId(0)).unwrap();
        assert_eq!(w.text, "");
        assert_eq!(w.as_noun().unwrap().person, Person::First);
        assert_eq!(w.as_noun().unwrap().number, Number::Plural);
    }

    #[test]
    fn parses_verb_objects_in_order() {
        let w = parse_word_line("V 10 iść/c OBJECT(6,w) OBJECT(INF,żeby) OBJECT(ADJ)", LexemeId(0))
            .unwrap();
        let verb = w.as_verb().unwrap();
        assert_eq!(
            verb.objects,
            vec![
                ObjectSpec::Noun {
                    case: Case::Locative,
                    preposition: Some("w".to_string())
                },
                ObjectSpec::Infinitive {
                    preposition: Some("żeby".to_string())
                },
                ObjectSpec::Adjective,
            ]
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_word_line("X 10 foo", LexemeId(0)).is_err());
        assert!(parse_word_line("N -3 foo", LexemeId(0)).is_err());
        assert!(parse_word_line("N ten foo", LexemeId(0)).is_err());
        assert!(parse_word_line("N 10", LexemeId(0)).is_err());
        assert!(parse_word_line("N 10 \"foo", LexemeId(0)).is_err());
        assert!(parse_word_line("N 10 foo REFLEXIVE", LexemeId(0)).is_err());
        assert!(parse_word_line("N 10 foo OBJECT(2) OBJECT(3)", LexemeId(0)).is_err());
        assert!(parse_word_line("A 10 foo OBJECT(ADJ)", LexemeId(0)).is_err());
        assert!(parse_word_line("V 10 foo OBJECT(9)", LexemeId(0)).is_err());
        assert!(parse_word_line("N 10 foo SEMANTIC(a", LexemeId(0)).is_err());
    }

    #[test]
    fn bad_lines_do_not_abort_load() {
        let mut lex = Lexicon::new();
        let d = lex.load("N 10 las\nQ 3 what\n# comment only\n\nV 5 iść # trailing\nN x bad\n");
        assert_eq!(lex.len(), 2);
        assert_eq!(d.count_at_least(Level::Warn), 2);
        assert_eq!(d.entries()[0].line, Some(2));
        assert_eq!(lex.words(PartOfSpeech::Verb)[0].text, "iść");
    }

    #[test]
    fn ids_follow_accepted_order() {
        let lex = lexicon("N 1 a\nbroken\nV 1 b\nN 1 c\n");
        assert_eq!(lex.get(LexemeId(0)).unwrap().text, "a");
        assert_eq!(lex.get(LexemeId(1)).unwrap().text, "b");
        assert_eq!(lex.get(LexemeId(2)).unwrap().text, "c");
    }

    #[test]
    fn zero_frequency_is_never_drawn() {
        let lex = lexicon("N 0 never\nN 3 always\n");
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            assert_eq!(lex.draw(PartOfSpeech::Noun, None, &mut rng).unwrap().text, "always");
        }
        let none = lexicon("N 0 a\nN 0 b\n");
        assert!(none.draw(PartOfSpeech::Noun, None, &mut rng).is_none());
        assert!(none.draw(PartOfSpeech::Verb, None, &mut rng).is_none());
    }

    #[test]
    fn override_remaps_frequency() {
        let lex = lexicon("N 100 common\nN 1 rare\n");
        let mut rng = StdRng::seed_from_u64(3);
        let only_rare = |f: u32, w: &Word| if w.text == "rare" { f } else { 0 };
        for _ in 0..100 {
            let w = lex.draw(PartOfSpeech::Noun, Some(&only_rare), &mut rng).unwrap();
            assert_eq!(w.text, "rare");
        }
    }

    #[test]
    fn subject_and_object_draws_respect_role_flags() {
        let lex = lexicon("N 10 ja ONLY_SUBJECT\nN 10 mnie ONLY_OBJECT\n");
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            assert_eq!(lex.draw_subject(None, &mut rng).unwrap().text, "ja");
            assert_eq!(lex.draw_object(None, &mut rng).unwrap().text, "mnie");
        }
    }

    #[test]
    fn object_frequency_replaces_base() {
        let lex = lexicon("N 100 sun OBJECT_FREQ(0)\nN 1 moon\n");
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            assert_eq!(lex.draw_object(None, &mut rng).unwrap().text, "moon");
        }
        let seen_base = |f: u32, _: &Word| f;
        let lex = lexicon("N 1 sun OBJECT_FREQ(7)\n");
        assert!(lex.draw_object(Some(&seen_base), &mut rng).is_some());
    }

    #[test]
    fn word_validation_reports_contradictions() {
        let w = parse_word_line(
            "A 1 dziwny ONLY_SUBJECT ONLY_OBJECT ONLY_SINGULAR ONLY_PLURAL ONLY_WITH(x,y) NOT_WITH(y)",
            LexemeId(0),
        )
        .unwrap();
        let d = validate_word(&w);
        assert_eq!(d.len(), 3);
        assert!(d.iter().all(|d| d.level == Level::Warn));
        let clean = parse_word_line("N 1 las SEMANTIC(tree)", LexemeId(0)).unwrap();
        assert!(validate_word(&clean).is_empty());
    }

    #[test]
    fn word_lists_naming_the_word_itself_are_reported() {
        let w = parse_word_line("N 1 las ONLY_WITH_WORD(las) TAKES_NO_WORD(las,dąb)", LexemeId(0))
            .unwrap();
        let d = validate_word(&w);
        assert_eq!(d.len(), 2);
        assert!(d[0].message.contains("ONLY_WITH_WORD"));
        assert!(d[1].message.contains("TAKES_NO_WORD"));
        let other = parse_word_line("N 1 las TAKES_NO_WORD(dąb)", LexemeId(0)).unwrap();
        assert!(validate_word(&other).is_empty());
    }

    #[test]
    fn object_frequency_accepts_large_values() {
        let w = parse_word_line("N 1 las OBJECT_FREQ(100000)", LexemeId(0)).unwrap();
        assert_eq!(w.properties.object_frequency, Some(100_000));
    }

    #[test]
    fn hash_inside_quoted_text_is_kept() {
        let mut lex = Lexicon::new();
        let d = lex.load("O 1 \"nr #1\" # trailing comment\n");
        assert_eq!(d.count_at_least(Level::Warn), 0);
        assert_eq!(lex.words(PartOfSpeech::Filler)[0].text, "nr #1");
    }

    #[test]
    fn grammar_validation_reports_unused_tags() {
        let mut rules = RuleTable::default();
        rules.load("N a 6 a ze ra\n");
        let w = parse_word_line("N 1 pora/ab", LexemeId(0)).unwrap();
        let d = validate_with_grammar(&w, &rules);
        assert_eq!(d.len(), 1);
        assert!(d[0].message.contains("'b'"));
        let adverb = parse_word_line("D 1 cicho/q", LexemeId(0)).unwrap();
        assert!(validate_with_grammar(&adverb, &rules).is_empty());
    }
}
