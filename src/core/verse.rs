/// Verse assembly: sentences wrapped into lines, lines grouped into verses.
use crate::core::pipeline::{GeneratorError, SentenceGenerator};

/// Wrap `text` at word boundaries so no line is longer than `max_len`
/// characters. A word longer than `max_len` gets a line to itself.
pub fn split_lines(text: &str, max_len: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if !current.is_empty() && current_len + 1 + word_len > max_len {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Upper-case the first letter of a sentence.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compose a poem from the generator's configured layout. Each verse
/// starts from a fresh subject; the sentences after it continue that
/// subject. Verses are separated by a blank line.
pub fn compose_poem(generator: &mut SentenceGenerator) -> Result<String, GeneratorError> {
    let verses = generator.config().verses();
    let sentences_per_verse = generator.config().lines_per_verse();
    let max_len = generator.config().max_line_length();

    let mut poem = Vec::with_capacity(verses);
    for _ in 0..verses {
        generator.clear_subject();
        let mut lines = Vec::new();
        for _ in 0..sentences_per_verse {
            let sentence = generator.draw_sentence()?;
            if sentence.is_empty() {
                continue;
            }
            lines.extend(split_lines(&capitalize(&sentence), max_len));
        }
        poem.push(lines.join("\n"));
    }
    tracing::debug!(verses, seed = generator.seed(), "poem composed");
    Ok(poem.join("\n\n"))
}
