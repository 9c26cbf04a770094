/// Leveled load diagnostics.
///
/// Loaders record per-record problems here instead of failing. Every entry
/// is also emitted as a `tracing` event so hosts with a subscriber see them
/// without inspecting the returned list.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    /// 1-based source line, when the problem is tied to one.
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Level::Debug => "DEBUG",
            Level::Warn => "WARNING",
            Level::Error => "ERROR",
        };
        match self.line {
            Some(line) => write!(f, "{}: line {}: {}", level, line, self.message),
            None => write!(f, "{}: {}", level, self.message),
        }
    }
}

/// Collected diagnostics from one load or validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Debug => tracing::debug!(line = ?diagnostic.line, "{}", diagnostic.message),
            Level::Warn => tracing::warn!(line = ?diagnostic.line, "{}", diagnostic.message),
            Level::Error => tracing::error!(line = ?diagnostic.line, "{}", diagnostic.message),
        }
        self.entries.push(diagnostic);
    }

    pub fn debug(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.push(Diagnostic {
            level: Level::Debug,
            line,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.push(Diagnostic {
            level: Level::Warn,
            line,
            message: message.into(),
        });
    }

    pub fn error(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.push(Diagnostic {
            level: Level::Error,
            line,
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        for d in other {
            self.push(d);
        }
    }

    /// Move entries already emitted by another pass in, without logging
    /// them again.
    pub fn append(&mut self, mut other: Diagnostics) {
        self.entries.append(&mut other.entries);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries at `level` or above.
    pub fn count_at_least(&self, level: Level) -> usize {
        self.entries.iter().filter(|d| d.level >= level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count_at_least(Level::Error) > 0
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_level() {
        let mut d = Diagnostics::new();
        d.debug(None, "loaded");
        d.warn(Some(3), "bad frequency");
        d.error(Some(7), "unresolved slot");
        assert_eq!(d.len(), 3);
        assert_eq!(d.count_at_least(Level::Warn), 2);
        assert!(d.has_errors());
    }

    #[test]
    fn display_includes_line() {
        let mut d = Diagnostics::new();
        d.warn(Some(12), "unknown part of speech 'X'");
        assert_eq!(
            d.entries()[0].to_string(),
            "WARNING: line 12: unknown part of speech 'X'"
        );
    }
}
