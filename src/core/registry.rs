/// Weighted corpus of sentence templates.
///
/// One template per line: `<frequency> <template text>`. `#` starts a
/// comment. Templates that fail to parse or reference undeclared slots are
/// reported at error level and left out.

use rand::Rng;
use std::path::Path;

use crate::core::diagnostics::Diagnostics;
use crate::core::rules::strip_comment;
use crate::core::sampling::weighted_pick;
use crate::core::template::Template;

#[derive(Debug, Clone)]
pub struct WeightedTemplate {
    pub frequency: u32,
    pub template: Template,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<WeightedTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the corpus with the templates in `source`.
    pub fn load(&mut self, source: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        self.templates.clear();

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw);
            if line.is_empty() {
                continue;
            }
            let (freq, text) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let Ok(frequency) = freq.parse::<u32>() else {
                diagnostics.error(Some(line_no), format!("invalid template frequency '{}'", freq));
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                diagnostics.error(Some(line_no), "template text is missing");
                continue;
            }
            match Template::parse(text) {
                Ok(template) => self.templates.push(WeightedTemplate {
                    frequency,
                    template,
                }),
                Err(e) => diagnostics.error(Some(line_no), format!("{} in '{}'", e, text)),
            }
        }

        diagnostics.debug(None, format!("loaded {} templates", self.templates.len()));
        diagnostics
    }

    pub fn load_from_path(&mut self, path: &Path) -> Result<Diagnostics, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(self.load(&contents))
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Template> {
        let idx = weighted_pick(&self.templates, |t| t.frequency, rng)?;
        Some(&self.templates[idx].template)
    }

    pub fn templates(&self) -> &[WeightedTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::Level;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn invalid_templates_are_dropped_with_errors() {
        let mut reg = TemplateRegistry::new();
        let d = reg.load(
            "# corpus\n10 ${SUBJ} ${VERB}.\n5 ${ADJ} ${NOUN}\nx ${SUBJ}\n3\n2 ${SUBJ} ${VERB} ${SUBJ2} # trailing\n",
        );
        assert_eq!(reg.len(), 2);
        assert_eq!(d.count_at_least(Level::Error), 3);
        let lines: Vec<Option<usize>> = d
            .entries()
            .iter()
            .filter(|e| e.level == Level::Error)
            .map(|e| e.line)
            .collect();
        assert_eq!(lines, vec![Some(3), Some(4), Some(5)]);
        assert_eq!(reg.templates()[1].template.source(), "${SUBJ} ${VERB} ${SUBJ2}");
    }

    #[test]
    fn draw_respects_weights() {
        let mut reg = TemplateRegistry::new();
        reg.load("0 never ${SUBJ}\n4 always ${SUBJ}\n");
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..200 {
            assert_eq!(reg.draw(&mut rng).unwrap().source(), "always ${SUBJ}");
        }
    }

    #[test]
    fn empty_registry_draws_nothing() {
        let reg = TemplateRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(reg.draw(&mut rng).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn load_replaces_previous_corpus() {
        let mut reg = TemplateRegistry::new();
        reg.load("1 a\n1 b\n");
        reg.load("1 c\n");
        assert_eq!(reg.len(), 1);
    }
}
