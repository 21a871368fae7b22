//! Path expressions over status documents.
//!
//! Supports the single-value subset of kubectl-style JSONPath:
//!
//! ```text
//! path      = ["$"] segment*            (optionally wrapped in "{" "}")
//! segment   = "." name
//!           / "[" quoted "]"
//!           / "[" index "]"
//!           / "[?(" "@" subpath "==" literal ")]"
//! subpath   = ("." name / "[" quoted "]")*
//! literal   = quoted / integer / "true" / "false"
//! ```
//!
//! Evaluation tolerates missing keys: a segment that does not apply to the
//! current node simply yields no result.
//!
//! # Examples
//!
//! ```text
//! .status.readyReplicas
//! {.status.phase}
//! .status.conditions[?(@.type=="Ready")].status
//! .metadata.annotations['example.com/owner']
//! ```

use serde_json::Value;
use std::fmt;

/// A parse failure with the character position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {position}")]
pub struct PathError {
    pub message: String,
    pub position: usize,
}

/// Literal compared against in a filter predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl Literal {
    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(expected), Value::String(actual)) => expected == actual,
            (Self::Integer(expected), Value::Number(actual)) => actual.as_i64() == Some(*expected),
            (Self::Boolean(expected), Value::Bool(actual)) => expected == actual,
            _ => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// `@.field... == literal`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub path: Vec<String>,
    pub literal: Literal,
}

impl Filter {
    fn matches(&self, element: &Value) -> bool {
        let mut current = element;
        for field in &self.path {
            match current.as_object().and_then(|o| o.get(field)) {
                Some(next) => current = next,
                None => return false,
            }
        }
        self.literal.matches(current)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Filter(Filter),
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(input: &str) -> Result<Self, PathError> {
        Parser::new(input).parse()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns every node the path resolves to, in document order.
    pub fn find<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![document];

        for segment in &self.segments {
            let mut next = Vec::new();
            for node in current {
                match segment {
                    Segment::Field(name) => {
                        if let Some(child) = node.as_object().and_then(|o| o.get(name)) {
                            next.push(child);
                        }
                    }
                    Segment::Index(index) => {
                        if let Some(child) = node.as_array().and_then(|a| a.get(*index)) {
                            next.push(child);
                        }
                    }
                    Segment::Filter(filter) => {
                        if let Some(items) = node.as_array() {
                            next.extend(items.iter().filter(|item| filter.matches(item)));
                        }
                    }
                }
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }

        current
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.trim().chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> PathError {
        PathError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PathError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn parse(mut self) -> Result<JsonPath, PathError> {
        self.strip_braces()?;
        if self.at_end() {
            return Err(self.error("empty path expression"));
        }

        if self.peek() == Some('$') {
            self.pos += 1;
        }

        let mut segments = Vec::new();

        // A leading bare name is read as a field, e.g. `status.phase`.
        if self.peek().is_some_and(is_name_char) {
            segments.push(Segment::Field(self.parse_name()?));
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.pos += 1;
                    if self.peek() == Some('.') {
                        return Err(self.error("recursive descent is not supported"));
                    }
                    segments.push(Segment::Field(self.parse_name()?));
                }
                '[' => {
                    self.pos += 1;
                    segments.push(self.parse_bracket()?);
                }
                other => return Err(self.error(format!("unexpected character '{other}'"))),
            }
        }

        Ok(JsonPath { segments })
    }

    fn strip_braces(&mut self) -> Result<(), PathError> {
        let opens = self.chars.first() == Some(&'{');
        let closes = self.chars.last() == Some(&'}');
        match (opens, closes) {
            (true, true) => {
                self.chars.pop();
                self.chars.remove(0);
                let inner: String = self.chars.iter().collect();
                self.chars = inner.trim().chars().collect();
                Ok(())
            }
            (true, false) => Err(self.error("unclosed '{'")),
            (false, true) => {
                self.pos = self.chars.len() - 1;
                Err(self.error("unexpected '}'"))
            }
            (false, false) => Ok(()),
        }
    }

    fn parse_name(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return match self.peek() {
                Some('*') => Err(self.error("wildcards are not supported")),
                _ => Err(self.error("expected field name")),
            };
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_bracket(&mut self) -> Result<Segment, PathError> {
        self.skip_whitespace();
        let segment = match self.peek() {
            Some('\'') | Some('"') => Segment::Field(self.parse_quoted()?),
            Some('?') => {
                self.pos += 1;
                self.expect('(')?;
                let filter = self.parse_filter()?;
                self.expect(')')?;
                Segment::Filter(filter)
            }
            Some(c) if c.is_ascii_digit() => {
                let index = self.parse_integer()?;
                let index = usize::try_from(index).map_err(|_| self.error("invalid array index"))?;
                Segment::Index(index)
            }
            Some('-') => return Err(self.error("negative indexes are not supported")),
            Some('*') => return Err(self.error("wildcards are not supported")),
            Some(c) => return Err(self.error(format!("unexpected character '{c}' in brackets"))),
            None => return Err(self.error("unterminated '['")),
        };
        self.skip_whitespace();
        self.expect(']')?;
        Ok(segment)
    }

    fn parse_filter(&mut self) -> Result<Filter, PathError> {
        self.skip_whitespace();
        self.expect('@')?;

        let mut path = Vec::new();
        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    path.push(self.parse_name()?);
                }
                Some('[') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    path.push(self.parse_quoted()?);
                    self.skip_whitespace();
                    self.expect(']')?;
                }
                _ => break,
            }
        }

        self.skip_whitespace();
        self.expect('=')?;
        self.expect('=')?;
        self.skip_whitespace();
        let literal = self.parse_literal()?;
        self.skip_whitespace();

        Ok(Filter { path, literal })
    }

    fn parse_literal(&mut self) -> Result<Literal, PathError> {
        match self.peek() {
            Some('\'') | Some('"') => Ok(Literal::String(self.parse_quoted()?)),
            Some(c) if c.is_ascii_digit() || c == '-' => Ok(Literal::Integer(self.parse_integer()?)),
            Some(c) if c.is_ascii_alphabetic() => {
                let word = self.parse_name()?;
                match word.as_str() {
                    "true" => Ok(Literal::Boolean(true)),
                    "false" => Ok(Literal::Boolean(false)),
                    _ => Err(self.error(format!("unsupported literal '{word}'"))),
                }
            }
            Some(c) => Err(self.error(format!("unexpected character '{c}' in filter"))),
            None => Err(self.error("expected literal, found end of input")),
        }
    }

    fn parse_quoted(&mut self) -> Result<String, PathError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected quoted string")),
        };
        self.pos += 1;

        let mut value = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => match self.peek() {
                    Some(escaped) => {
                        value.push(escaped);
                        self.pos += 1;
                    }
                    None => break,
                },
                c if c == quote => return Ok(value),
                c => value.push(c),
            }
        }
        Err(self.error("unterminated quoted string"))
    }

    fn parse_integer(&mut self) -> Result<i64, PathError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse()
            .map_err(|_| self.error(format!("invalid integer '{text}'")))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
