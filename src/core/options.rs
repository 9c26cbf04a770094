/// Nested option lists: `NAME`, `NAME(p1,p2)`, `NAME(INNER(x),y)`.
///
/// Parenthesised groups are escaped innermost-first into placeholder tokens,
/// the top level is split on the delimiter, and the groups are restored while
/// their parameters are parsed. Parameters are always comma separated.

use std::fmt;
use thiserror::Error;

/// Deepest parenthesis nesting accepted.
pub const MAX_DEPTH: usize = 5;

const ESCAPE_OPEN: char = '\u{E000}';
const ESCAPE_CLOSE: char = '\u{E001}';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unbalanced parentheses in '{0}'")]
    Unbalanced(String),
    #[error("options nested deeper than {MAX_DEPTH} levels in '{0}'")]
    TooDeep(String),
    #[error("unresolvable escape placeholder in '{0}'")]
    UnresolvedEscape(String),
    #[error("parameter group not attached to an option name in '{0}'")]
    MisplacedGroup(String),
}

/// Separator between top-level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Space,
}

impl Delimiter {
    fn as_str(self) -> &'static str {
        match self {
            Delimiter::Comma => ",",
            Delimiter::Space => " ",
        }
    }
}

/// One option with its (possibly nested) parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOption {
    pub name: String,
    pub params: Option<Vec<ParsedOption>>,
}

impl ParsedOption {
    pub fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: None,
        }
    }

    /// The parameter names, ignoring any nesting below them.
    pub fn param_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .flatten()
            .map(|p| p.name.as_str())
            .collect()
    }
}

impl fmt::Display for ParsedOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(params) = &self.params {
            f.write_str("(")?;
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", p)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Serialise an option list so that `parse` yields it back unchanged.
pub fn to_canonical(options: &[ParsedOption], delimiter: Delimiter) -> String {
    options
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(delimiter.as_str())
}

/// Parse an option list. The input is left untouched.
pub fn parse(source: &str, delimiter: Delimiter) -> Result<Vec<ParsedOption>, OptionError> {
    if source.contains(ESCAPE_OPEN) || source.contains(ESCAPE_CLOSE) {
        return Err(OptionError::UnresolvedEscape(source.to_string()));
    }
    check_balance(source)?;

    let mut groups = Vec::new();
    let mut escaped = source.to_string();
    for _ in 0..MAX_DEPTH {
        if !escaped.contains('(') {
            break;
        }
        escaped = escape_innermost(&escaped, &mut groups);
    }
    if escaped.contains('(') {
        return Err(OptionError::TooDeep(source.to_string()));
    }

    split_escaped(&escaped, delimiter, &groups, source)
}

fn check_balance(source: &str) -> Result<(), OptionError> {
    let mut depth = 0i32;
    for c in source.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(OptionError::Unbalanced(source.to_string()));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(OptionError::Unbalanced(source.to_string()));
    }
    Ok(())
}

/// Replace every group that contains no further parentheses with a token.
fn escape_innermost(text: &str, groups: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut open: Option<usize> = None;
    for c in text.chars() {
        match c {
            '(' => {
                open = Some(out.len());
                out.push(c);
            }
            ')' => match open.take() {
                Some(pos) => {
                    groups.push(out[pos + 1..].to_string());
                    out.truncate(pos);
                    out.push(ESCAPE_OPEN);
                    out.push_str(&(groups.len() - 1).to_string());
                    out.push(ESCAPE_CLOSE);
                }
                None => out.push(c),
            },
            _ => out.push(c),
        }
    }
    out
}

fn split_escaped(
    text: &str,
    delimiter: Delimiter,
    groups: &[String],
    source: &str,
) -> Result<Vec<ParsedOption>, OptionError> {
    let pieces: Vec<&str> = match delimiter {
        Delimiter::Comma => text.split(',').collect(),
        Delimiter::Space => text.split_whitespace().collect(),
    };
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| restore_piece(piece, groups, source))
        .collect()
}

fn restore_piece(piece: &str, groups: &[String], source: &str) -> Result<ParsedOption, OptionError> {
    let Some(open) = piece.find(ESCAPE_OPEN) else {
        if piece.contains(ESCAPE_CLOSE) {
            return Err(OptionError::UnresolvedEscape(source.to_string()));
        }
        return Ok(ParsedOption::bare(piece));
    };

    let name = piece[..open].trim();
    if name.is_empty() || name.contains(ESCAPE_CLOSE) {
        return Err(OptionError::MisplacedGroup(source.to_string()));
    }

    let token_start = open + ESCAPE_OPEN.len_utf8();
    let close = piece[token_start..]
        .find(ESCAPE_CLOSE)
        .map(|i| token_start + i)
        .ok_or_else(|| OptionError::UnresolvedEscape(source.to_string()))?;
    if !piece[close + ESCAPE_CLOSE.len_utf8()..].trim().is_empty() {
        return Err(OptionError::MisplacedGroup(source.to_string()));
    }

    let content = piece[token_start..close]
        .parse::<usize>()
        .ok()
        .and_then(|idx| groups.get(idx))
        .ok_or_else(|| OptionError::UnresolvedEscape(source.to_string()))?;

    let params = split_escaped(content, Delimiter::Comma, groups, source)?;
    Ok(ParsedOption {
        name: name.to_string(),
        params: Some(params),
    })
}
