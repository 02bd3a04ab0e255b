//! The directive mini-language.
//!
//! A directive attribute holds a comma-separated list of `key:value` pairs
//! where a value may itself be a brace-delimited nested object of the same
//! grammar:
//!
//! ```text
//! if:show,style:{color:textColor,fontSize:size},foreach:items->todo
//! ```
//!
//! Parsing is a small recursive descent over that grammar. Literal commas or
//! colons inside values are not expressible; malformed input yields a
//! [`DirectiveParseError`] and the engine skips the element after logging.

use indexmap::IndexMap;
use thiserror::Error;

/// Parsed target descriptor of one directive: a bare path, or a nested
/// mapping of sub-keys (used by `style` and `attr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    Path(String),
    Map(IndexMap<String, DirectiveValue>),
}

impl DirectiveValue {
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Self::Path(path) => Some(path),
            Self::Map(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveParseError {
    #[error("expected ':' after key at offset {0}")]
    MissingColon(usize),
    #[error("empty key at offset {0}")]
    EmptyKey(usize),
    #[error("unterminated nested object opened at offset {0}")]
    UnterminatedObject(usize),
    #[error("unexpected '}}' at offset {0}")]
    UnexpectedClosingBrace(usize),
}

/// Parse one directive attribute's text into a key → descriptor mapping.
/// Keys are assumed unique per level; a later duplicate overwrites.
pub fn parse(text: &str) -> Result<IndexMap<String, DirectiveValue>, DirectiveParseError> {
    let mut parser = Parser {
        chars: text.char_indices().peekable(),
        len: text.len(),
    };
    parser.parse_entries(None)
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    len: usize,
}

impl Parser<'_> {
    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn pos(&mut self) -> usize {
        self.peek().map(|(i, _)| i).unwrap_or(self.len)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            self.bump();
        }
    }

    /// Take characters until one of `stops`, returning the trimmed slice.
    fn take_until(&mut self, stops: &[char]) -> String {
        let mut out = String::new();
        while let Some((_, c)) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out.trim().to_owned()
    }

    /// Parse a property list. `opened_at` is `Some(offset)` when inside a
    /// brace-delimited nested object, which must end with `}`.
    fn parse_entries(
        &mut self,
        opened_at: Option<usize>,
    ) -> Result<IndexMap<String, DirectiveValue>, DirectiveParseError> {
        let mut entries = IndexMap::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => match opened_at {
                    Some(open) => return Err(DirectiveParseError::UnterminatedObject(open)),
                    None => break,
                },
                Some((at, '}')) => match opened_at {
                    Some(_) => break,
                    None => return Err(DirectiveParseError::UnexpectedClosingBrace(at)),
                },
                Some((_, ',')) => {
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }

            let key_at = self.pos();
            let key = self.take_until(&[':', ',', '{', '}']);
            match self.peek() {
                Some((_, ':')) => {
                    self.bump();
                }
                _ => return Err(DirectiveParseError::MissingColon(self.pos())),
            }
            if key.is_empty() {
                return Err(DirectiveParseError::EmptyKey(key_at));
            }

            self.skip_ws();
            let value = if let Some((open, '{')) = self.peek() {
                self.bump();
                let inner = self.parse_entries(Some(open))?;
                match self.peek() {
                    Some((_, '}')) => {
                        self.bump();
                    }
                    _ => return Err(DirectiveParseError::UnterminatedObject(open)),
                }
                self.skip_ws();
                if self.peek().is_some_and(|(_, c)| c == ',') {
                    self.bump();
                }
                DirectiveValue::Map(inner)
            } else {
                let raw = self.take_until(&[',', '}']);
                if self.peek().is_some_and(|(_, c)| c == ',') {
                    self.bump();
                }
                DirectiveValue::Path(raw)
            };
            entries.insert(key, value);
        }
        Ok(entries)
    }
}

/// The fixed dispatch table of directive names. Names outside this table are
/// skipped per element (with a warning log).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    If,
    IfNot,
    Style,
    Css,
    Attr,
    Html,
    Foreach,
}

impl DirectiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "if" => Some(Self::If),
            "ifnot" => Some(Self::IfNot),
            "style" => Some(Self::Style),
            "css" => Some(Self::Css),
            "attr" => Some(Self::Attr),
            "html" => Some(Self::Html),
            "foreach" => Some(Self::Foreach),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::IfNot => "ifnot",
            Self::Style => "style",
            Self::Css => "css",
            Self::Attr => "attr",
            Self::Html => "html",
            Self::Foreach => "foreach",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> DirectiveValue {
        DirectiveValue::Path(p.to_owned())
    }

    #[test]
    fn flat_pairs() {
        let parsed = parse("if:show,html:content").unwrap();
        assert_eq!(parsed.get("if"), Some(&path("show")));
        assert_eq!(parsed.get("html"), Some(&path("content")));
    }

    #[test]
    fn nested_object_value() {
        let parsed = parse("if:show,style:{color:textColor}").unwrap();
        assert_eq!(parsed.get("if"), Some(&path("show")));
        let DirectiveValue::Map(style) = parsed.get("style").unwrap() else {
            panic!("style should parse as a nested object");
        };
        assert_eq!(style.get("color"), Some(&path("textColor")));
    }

    #[test]
    fn nested_object_followed_by_more_pairs() {
        let parsed = parse("style:{color:c,fontSize:s},if:show").unwrap();
        let DirectiveValue::Map(style) = parsed.get("style").unwrap() else {
            panic!("style should parse as a nested object");
        };
        assert_eq!(style.len(), 2);
        assert_eq!(parsed.get("if"), Some(&path("show")));
    }

    #[test]
    fn whitespace_is_trimmed() {
        let parsed = parse(" if : show , css : active ").unwrap();
        assert_eq!(parsed.get("if"), Some(&path("show")));
        assert_eq!(parsed.get("css"), Some(&path("active")));
    }

    #[test]
    fn deeply_nested_objects() {
        let parsed = parse("a:{b:{c:leaf}}").unwrap();
        let DirectiveValue::Map(a) = parsed.get("a").unwrap() else {
            panic!("a should be nested");
        };
        let DirectiveValue::Map(b) = a.get("b").unwrap() else {
            panic!("b should be nested");
        };
        assert_eq!(b.get("c"), Some(&path("leaf")));
    }

    #[test]
    fn foreach_arrow_stays_in_the_value() {
        let parsed = parse("foreach:items->todo").unwrap();
        assert_eq!(parsed.get("foreach"), Some(&path("items->todo")));
    }

    #[test]
    fn missing_colon_is_an_error() {
        assert!(matches!(
            parse("if"),
            Err(DirectiveParseError::MissingColon(_))
        ));
    }

    #[test]
    fn empty_key_is_an_error() {
        assert!(matches!(parse(":show"), Err(DirectiveParseError::EmptyKey(_))));
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        assert!(matches!(
            parse("style:{color:c"),
            Err(DirectiveParseError::UnterminatedObject(_))
        ));
        assert!(matches!(
            parse("if:show}"),
            Err(DirectiveParseError::UnexpectedClosingBrace(_))
        ));
    }

    #[test]
    fn empty_input_parses_to_an_empty_map() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn dispatch_table_is_closed() {
        assert_eq!(DirectiveKind::from_name("foreach"), Some(DirectiveKind::Foreach));
        assert_eq!(DirectiveKind::from_name("unknown"), None);
        assert_eq!(DirectiveKind::IfNot.name(), "ifnot");
    }
}
