/// Semantic compatibility between a context word and a candidate.
///
/// The context is an already chosen word (the noun an adjective describes,
/// the verb governing an object, ...). Any violated constraint, in either
/// direction, zeroes the candidate's frequency.

use crate::schema::word::Word;

fn shares_any(a: &[String], b: &[String]) -> bool {
    a.iter().any(|x| b.contains(x))
}

fn mentions(list: &[String], text: &str) -> bool {
    list.iter().any(|w| w == text)
}

/// Whether `candidate` may appear next to `context`.
pub fn compatible(context: &Word, candidate: &Word) -> bool {
    let ctx = &context.properties;
    let cand = &candidate.properties;

    // Candidate's requirements on the context.
    if !cand.only_with.is_empty() && !shares_any(&cand.only_with, &ctx.semantic) {
        return false;
    }
    if shares_any(&cand.not_with, &ctx.semantic) {
        return false;
    }
    if !cand.only_with_word.is_empty() && !mentions(&cand.only_with_word, &context.text) {
        return false;
    }
    if mentions(&cand.not_with_word, &context.text) {
        return false;
    }

    // Context acting as governor.
    if !ctx.takes_only.is_empty() && !shares_any(&ctx.takes_only, &cand.semantic) {
        return false;
    }
    if shares_any(&ctx.takes_no, &cand.semantic) {
        return false;
    }
    if !ctx.takes_only_word.is_empty() && !mentions(&ctx.takes_only_word, &candidate.text) {
        return false;
    }
    if mentions(&ctx.takes_no_word, &candidate.text) {
        return false;
    }
    true
}

/// Frequency filter built from `context`'s constraints.
pub fn semantic_filter(context: &Word) -> impl Fn(u32, &Word) -> u32 + '_ {
    move |frequency, candidate| {
        if compatible(context, candidate) {
            frequency
        } else {
            0
        }
    }
}
