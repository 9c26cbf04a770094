/// Registry and template integrity tests against the fixture corpus.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sentence_engine::core::registry::TemplateRegistry;
use sentence_engine::core::template::{Role, Template, TemplateError};
use sentence_engine::Level;
use std::path::Path;

#[test]
fn fixture_corpus_loads_every_template() {
    let mut registry = TemplateRegistry::new();
    let diagnostics = registry
        .load_from_path(Path::new("tests/fixtures/templates.txt"))
        .unwrap();
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.entries());
    assert_eq!(registry.len(), 5);
    assert_eq!(registry.templates()[4].frequency, 0);
}

#[test]
fn zero_weight_templates_are_never_drawn() {
    let mut registry = TemplateRegistry::new();
    registry
        .load_from_path(Path::new("tests/fixtures/templates.txt"))
        .unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..500 {
        let template = registry.draw(&mut rng).unwrap();
        assert!(!template.source().contains("nigdy"));
    }
}

#[test]
fn references_must_follow_declarations() {
    assert!(matches!(
        Template::parse("${ADJ} ${NOUN}"),
        Err(TemplateError::UnresolvedSlot { .. })
    ));
    assert!(matches!(
        Template::parse("${SUBJ} ${OBJ}"),
        Err(TemplateError::UnresolvedSlot { .. })
    ));
    assert!(matches!(
        Template::parse("${SUBJ} ${VERB2}"),
        Err(TemplateError::UnresolvedSlot { .. })
    ));
    assert!(Template::parse("${SUBJ} ${VERB} ${SUBJ2}").is_ok());
    assert!(Template::parse("${VERB2(INF)} ${ADJ2}").is_ok());
    assert!(Template::parse("${SUBJ} ${VERB} ${OBJ}").is_ok());
}

#[test]
fn malformed_placeholders_are_rejected() {
    assert!(matches!(
        Template::parse("${SUBJ"),
        Err(TemplateError::Syntax(_))
    ));
    assert!(Template::parse("${WHAT}").is_err());
    assert!(Template::parse("${ADV(SINGLE)}").is_err());
    assert!(Template::parse("${NOUN(SEMANTIC(tree)}").is_err());
}

#[test]
fn placeholders_keep_their_order() {
    let template = Template::parse("${OTHER} ${SUBJ} ${ADJ} ${VERB} ${OBJ} ${ADV}.").unwrap();
    let roles: Vec<Role> = template.placeholders().map(|p| p.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::Filler,
            Role::Subject,
            Role::Adjective,
            Role::Verb,
            Role::Object,
            Role::Adverb
        ]
    );
    assert_eq!(template.to_string(), "${OTHER} ${SUBJ} ${ADJ} ${VERB} ${OBJ} ${ADV}.");
}

#[test]
fn bad_corpus_lines_are_reported_by_line() {
    let mut registry = TemplateRegistry::new();
    let diagnostics = registry.load("3 ${SUBJ} ${VERB}.\nmany ${SUBJ}\n2 ${OBJ}\n");
    assert_eq!(registry.len(), 1);
    let errors: Vec<Option<usize>> = diagnostics
        .entries()
        .iter()
        .filter(|d| d.level == Level::Error)
        .map(|d| d.line)
        .collect();
    assert_eq!(errors, vec![Some(2), Some(3)]);
}
