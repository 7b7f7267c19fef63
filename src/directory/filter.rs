//! Directory filter expressions.
//!
//! A [`Filter`] is a plain expression tree. Building one performs no I/O; it is
//! rendered to the RFC 4515 string form through `Display` and can be parsed
//! back from that form with [`Filter::parse`]. The in-memory directory also
//! evaluates filters directly against entries via [`Filter::matches`].

use crate::directory::DirectoryEntry;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A composable directory search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equality {
        attribute: String,
        value: String,
    },
    Present {
        attribute: String,
    },
    /// `initial*any*...*terminal`; every part is optional.
    Substring {
        attribute: String,
        initial: Option<String>,
        any: Vec<String>,
        terminal: Option<String>,
    },
}

/// Error raised when a filter string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid filter at position {position}: {message}")]
pub struct FilterParseError {
    pub position: usize,
    pub message: String,
}

impl FilterParseError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

impl Filter {
    /// `(attribute=value)`
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// `(attribute=*)`
    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present {
            attribute: attribute.into(),
        }
    }

    /// `(attribute=value*)`
    pub fn starts_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Substring {
            attribute: attribute.into(),
            initial: Some(value.into()),
            any: Vec::new(),
            terminal: None,
        }
    }

    /// `(attribute=*value*)`
    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Substring {
            attribute: attribute.into(),
            initial: None,
            any: vec![value.into()],
            terminal: None,
        }
    }

    /// Combine with another filter under a conjunction, flattening nested ANDs.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut children) => {
                children.push(other);
                Filter::And(children)
            }
            single => Filter::And(vec![single, other]),
        }
    }

    /// Combine with another filter under a disjunction, flattening nested ORs.
    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut children) => {
                children.push(other);
                Filter::Or(children)
            }
            single => Filter::Or(vec![single, other]),
        }
    }

    /// OR of equality terms, one per value. `None` when `values` is empty.
    pub fn any_of<I, S>(attribute: &str, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut terms: Vec<Filter> = values
            .into_iter()
            .map(|value| Filter::eq(attribute, value))
            .collect();
        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => Some(Filter::Or(terms)),
        }
    }

    /// Parse an RFC 4515 filter string. A bare `attr=value` item is accepted
    /// without the surrounding parentheses.
    pub fn parse(input: &str) -> Result<Self, FilterParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FilterParseError::new(0, "empty filter"));
        }
        let wrapped;
        let source = if trimmed.starts_with('(') {
            trimmed
        } else {
            wrapped = format!("({})", trimmed);
            wrapped.as_str()
        };

        let mut parser = Parser {
            input: source,
            pos: 0,
        };
        let filter = parser.parse_filter()?;
        if parser.pos != source.len() {
            return Err(FilterParseError::new(parser.pos, "trailing characters"));
        }
        Ok(filter)
    }

    /// Evaluate the filter against an entry.
    ///
    /// Attribute names and values are compared case-insensitively, which is the
    /// matching rule directories apply to the string attributes used here.
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|c| c.matches(entry)),
            Filter::Or(children) => children.iter().any(|c| c.matches(entry)),
            Filter::Not(inner) => !inner.matches(entry),
            Filter::Present { attribute } => entry.has_attr(attribute),
            Filter::Equality { attribute, value } => {
                let expected = value.to_lowercase();
                entry
                    .get_attrs(attribute)
                    .iter()
                    .any(|v| v.to_lowercase() == expected)
            }
            Filter::Substring {
                attribute,
                initial,
                any,
                terminal,
            } => entry.get_attrs(attribute).iter().any(|v| {
                substring_matches(v, initial.as_deref(), any, terminal.as_deref())
            }),
        }
    }
}

fn substring_matches(
    value: &str,
    initial: Option<&str>,
    any: &[String],
    terminal: Option<&str>,
) -> bool {
    let value = value.to_lowercase();
    let mut rest = value.as_str();

    if let Some(initial) = initial {
        let initial = initial.to_lowercase();
        match rest.strip_prefix(initial.as_str()) {
            Some(remaining) => rest = remaining,
            None => return false,
        }
    }

    for part in any {
        let part = part.to_lowercase();
        match rest.find(part.as_str()) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }

    match terminal {
        Some(terminal) => rest.ends_with(terminal.to_lowercase().as_str()),
        None => true,
    }
}

/// Escape a value for inclusion in a filter string.
pub fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            other => escaped.push(other),
        }
    }
    escaped
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(children) => {
                write!(f, "(&")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Filter::Or(children) => {
                write!(f, "(|")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Filter::Not(inner) => write!(f, "(!{})", inner),
            Filter::Equality { attribute, value } => {
                write!(f, "({}={})", attribute, escape_value(value))
            }
            Filter::Present { attribute } => write!(f, "({}=*)", attribute),
            Filter::Substring {
                attribute,
                initial,
                any,
                terminal,
            } => {
                write!(f, "({}=", attribute)?;
                if let Some(initial) = initial {
                    write!(f, "{}", escape_value(initial))?;
                }
                write!(f, "*")?;
                for part in any {
                    write!(f, "{}*", escape_value(part))?;
                }
                if let Some(terminal) = terminal {
                    write!(f, "{}", escape_value(terminal))?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Filter::parse(&raw).map_err(serde::de::Error::custom)
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), FilterParseError> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(FilterParseError::new(
                self.pos,
                format!("expected '{}', found '{}'", byte as char, b as char),
            )),
            None => Err(FilterParseError::new(
                self.pos,
                format!("expected '{}', found end of input", byte as char),
            )),
        }
    }

    fn parse_filter(&mut self) -> Result<Filter, FilterParseError> {
        self.expect(b'(')?;
        let filter = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                Filter::And(self.parse_list()?)
            }
            Some(b'|') => {
                self.pos += 1;
                Filter::Or(self.parse_list()?)
            }
            Some(b'!') => {
                self.pos += 1;
                Filter::Not(Box::new(self.parse_filter()?))
            }
            Some(_) => self.parse_item()?,
            None => return Err(FilterParseError::new(self.pos, "unexpected end of input")),
        };
        self.expect(b')')?;
        Ok(filter)
    }

    fn parse_list(&mut self) -> Result<Vec<Filter>, FilterParseError> {
        let mut children = Vec::new();
        while self.peek() == Some(b'(') {
            children.push(self.parse_filter()?);
        }
        if children.is_empty() {
            return Err(FilterParseError::new(self.pos, "empty filter list"));
        }
        Ok(children)
    }

    fn parse_item(&mut self) -> Result<Filter, FilterParseError> {
        let start = self.pos;
        let eq = self.input[start..]
            .find('=')
            .map(|i| start + i)
            .ok_or_else(|| FilterParseError::new(start, "missing '='"))?;
        let close = self.input[start..]
            .find(')')
            .map(|i| start + i)
            .ok_or_else(|| FilterParseError::new(start, "unterminated item"))?;
        if eq > close {
            return Err(FilterParseError::new(start, "missing '='"));
        }

        let attribute = &self.input[start..eq];
        if attribute.ends_with(['~', '>', '<', ':']) {
            return Err(FilterParseError::new(
                start,
                "only equality, presence and substring items are supported",
            ));
        }
        if attribute.is_empty()
            || !attribute
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == ';')
        {
            return Err(FilterParseError::new(
                start,
                format!("invalid attribute description '{}'", attribute),
            ));
        }

        let raw = &self.input[eq + 1..close];
        self.pos = close;

        if raw == "*" {
            return Ok(Filter::present(attribute));
        }
        if !raw.contains('*') {
            return Ok(Filter::eq(attribute, unescape(raw, eq + 1)?));
        }

        let parts: Vec<&str> = raw.split('*').collect();
        let last = parts.len() - 1;
        let mut initial = None;
        let mut terminal = None;
        let mut any = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            let value = unescape(part, eq + 1)?;
            if i == 0 {
                initial = Some(value);
            } else if i == last {
                terminal = Some(value);
            } else {
                any.push(value);
            }
        }
        Ok(Filter::Substring {
            attribute: attribute.to_string(),
            initial,
            any,
            terminal,
        })
    }
}

fn unescape(raw: &str, offset: usize) -> Result<String, FilterParseError> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let hex = raw
                .get(i + 1..i + 3)
                .ok_or_else(|| FilterParseError::new(offset + i, "truncated escape"))?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|_| FilterParseError::new(offset + i, "invalid escape"))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| FilterParseError::new(offset, "escaped value is not UTF-8"))
}
