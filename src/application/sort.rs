//! Parsing of the `sort` query parameter.
//!
//! Two syntaxes are accepted:
//!
//! - a field list: `name,-age` (leading `-` means descending);
//! - a literal such as `[("name", -1), ["age"]]`: nested lists/tuples of quoted
//!   strings, numbers, `True`/`False`/`None`.
//!
//! The literal is parsed by a small recursive-descent parser; nothing is
//! evaluated.

use crate::error::{Error, Result};

use regex::Regex;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::{Number, Value};
use std::sync::LazyLock;

static FIELD_LIST_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-,\w]+$").unwrap());

/// Deepest bracket nesting accepted by the literal parser.
pub const MAX_LITERAL_DEPTH: usize = 32;

/// Anything carrying a raw `sort` value.
pub trait SortSource {
    fn sort(&self) -> Option<&str>;
}

impl SortSource for str {
    fn sort(&self) -> Option<&str> {
        Some(self)
    }
}

impl SortSource for String {
    fn sort(&self) -> Option<&str> {
        Some(self)
    }
}

impl SortSource for Option<&str> {
    fn sort(&self) -> Option<&str> {
        *self
    }
}

impl SortSource for Option<String> {
    fn sort(&self) -> Option<&str> {
        self.as_deref()
    }
}

/// One sort key of the field-list syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// `["field"]` or `["field", -1]`.
    pub fn to_value(&self) -> Value {
        let mut pair = vec![Value::String(self.field.clone())];
        if self.descending {
            pair.push(Value::from(-1));
        }
        Value::Array(pair)
    }
}

impl Serialize for SortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(if self.descending { 2 } else { 1 }))?;
        seq.serialize_element(&self.field)?;
        if self.descending {
            seq.serialize_element(&-1)?;
        }
        seq.end()
    }
}

/// A parsed literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Self::None => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Str(s) => Value::String(s.clone()),
            Self::List(items) | Self::Tuple(items) => {
                Value::Array(items.iter().map(Literal::to_value).collect())
            }
        }
    }

    fn items(&self) -> Option<&[Literal]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

/// Result of [`extract_sort_arg`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SortArg {
    Fields(Vec<SortKey>),
    Literal(Literal),
}

impl SortArg {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Fields(keys) => Value::Array(keys.iter().map(SortKey::to_value).collect()),
            Self::Literal(literal) => literal.to_value(),
        }
    }

    /// Interprets the sort as a list of keys.
    ///
    /// A literal must be a list or tuple of `[field]` / `[field, direction]`
    /// entries, where direction is `1` or `-1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SortSyntax`] if the literal has any other shape.
    pub fn into_keys(self) -> Result<Vec<SortKey>> {
        let literal = match self {
            Self::Fields(keys) => return Ok(keys),
            Self::Literal(literal) => literal,
        };

        let entries = literal
            .items()
            .ok_or_else(|| Error::sort_syntax(0, "sort literal must be a list"))?;

        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| match entry.items() {
                Some([Literal::Str(field)]) | Some([Literal::Str(field), Literal::Int(1)]) => {
                    Ok(SortKey::asc(field.clone()))
                }
                Some([Literal::Str(field), Literal::Int(-1)]) => Ok(SortKey::desc(field.clone())),
                _ => Err(Error::sort_syntax(
                    0,
                    format!("sort entry {i} must be [field] or [field, 1|-1]"),
                )),
            })
            .collect()
    }
}

/// Parses the `sort` value of `request`.
///
/// # Returns
///
/// - `Ok(None)` when no sort was requested (absent or empty)
/// - `Ok(Some(SortArg::Fields(..)))` for the `name,-age` syntax, in textual order
/// - `Ok(Some(SortArg::Literal(..)))` for anything else that parses as a literal
///
/// # Errors
///
/// Returns [`Error::SortSyntax`] when the value is neither a field list nor a
/// valid literal.
///
/// # Examples
///
/// ```ignore
/// let arg = extract_sort_arg("name,-age").unwrap().unwrap();
/// assert_eq!(arg, SortArg::Fields(vec![SortKey::asc("name"), SortKey::desc("age")]));
/// ```
pub fn extract_sort_arg<R: SortSource + ?Sized>(request: &R) -> Result<Option<SortArg>> {
    let sort = match request.sort() {
        Some(sort) if !sort.is_empty() => sort,
        _ => return Ok(None),
    };

    if FIELD_LIST_REGEX.is_match(sort) {
        let keys = sort
            .split(',')
            .map(|token| match token.strip_prefix('-') {
                Some(field) => SortKey::desc(field),
                None => SortKey::asc(token),
            })
            .collect();
        return Ok(Some(SortArg::Fields(keys)));
    }

    tracing::trace!(sort, "Sort is not a field list, parsing as literal");
    parse_literal(sort).map(|literal| Some(SortArg::Literal(literal)))
}

/// Parses a complete literal expression.
///
/// # Errors
///
/// Returns [`Error::SortSyntax`] with the byte offset of the first problem,
/// including brackets nested deeper than [`MAX_LITERAL_DEPTH`].
pub fn parse_literal(input: &str) -> Result<Literal> {
    let mut parser = LiteralParser::new(input);
    let literal = parser.parse_top()?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected trailing character '{c}'")));
    }
    Ok(literal)
}

struct LiteralParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::sort_syntax(self.pos, message)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// A bare comma-separated sequence at top level is a tuple, as in `'a', 'b'`.
    fn parse_top(&mut self) -> Result<Literal> {
        let first = self.parse_value()?;
        self.skip_whitespace();
        if self.peek() != Some(',') {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.peek() == Some(',') {
            self.bump();
            self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
        }
        Ok(Literal::Tuple(items))
    }

    fn parse_value(&mut self) -> Result<Literal> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(open @ ('[' | '(')) => {
                if self.depth >= MAX_LITERAL_DEPTH {
                    return Err(self.error("nesting too deep"));
                }
                self.bump();
                self.depth += 1;
                let parsed = self.parse_bracketed(open);
                self.depth -= 1;
                parsed
            }
            Some(quote @ ('\'' | '"')) => {
                self.bump();
                self.parse_string(quote).map(Literal::Str)
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
        }
    }

    fn parse_bracketed(&mut self, open: char) -> Result<Literal> {
        if open == '[' {
            return self
                .parse_sequence(']')
                .map(|(items, _)| Literal::List(items));
        }

        let (mut items, trailing_comma) = self.parse_sequence(')')?;
        // `(x)` is just a parenthesised value; `(x,)` is a tuple.
        if items.len() == 1 && !trailing_comma {
            Ok(items.remove(0))
        } else {
            Ok(Literal::Tuple(items))
        }
    }

    /// Parses items up to `close`; returns them and whether a comma preceded `close`.
    fn parse_sequence(&mut self, close: char) -> Result<(Vec<Literal>, bool)> {
        let mut items = Vec::new();
        let mut trailing_comma = false;

        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok((items, trailing_comma));
            }
            if !items.is_empty() && !trailing_comma {
                return Err(self.error(format!("expected ',' or '{close}'")));
            }

            items.push(self.parse_value()?);
            self.skip_whitespace();

            trailing_comma = self.peek() == Some(',');
            if trailing_comma {
                self.bump();
            } else if self.peek().is_none() {
                return Err(self.error(format!("missing closing '{close}'")));
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(self.error("unterminated string")),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Literal> {
        let start = self.pos;
        let negative = match self.peek() {
            Some(sign @ ('-' | '+')) => {
                self.bump();
                self.skip_whitespace();
                sign == '-'
            }
            _ => false,
        };

        let digits_start = self.pos;
        let mut is_float = false;
        let mut prev = None;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' => is_float = true,
                // only between two digits, as in `1_000`
                '_' => {
                    let next = self.rest()[1..].chars().next();
                    if !prev.is_some_and(|p: char| p.is_ascii_digit())
                        || !next.is_some_and(|n| n.is_ascii_digit())
                    {
                        return Err(self.error("'_' must separate digits"));
                    }
                }
                'e' | 'E' => {
                    is_float = true;
                    self.bump();
                    if let Some('-' | '+') = self.peek() {
                        self.bump();
                    }
                    prev = Some(c);
                    continue;
                }
                _ => break,
            }
            prev = Some(c);
            self.bump();
        }

        let digits: String = self.input[digits_start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if digits.is_empty() || digits == "." {
            self.pos = start;
            return Err(self.error("expected a number"));
        }

        let literal = if is_float {
            let value: f64 = digits
                .parse()
                .map_err(|_| Error::sort_syntax(start, format!("invalid number '{digits}'")))?;
            Literal::Float(if negative { -value } else { value })
        } else {
            let value: i64 = digits
                .parse()
                .map_err(|_| Error::sort_syntax(start, format!("invalid integer '{digits}'")))?;
            Literal::Int(if negative { -value } else { value })
        };
        Ok(literal)
    }

    fn parse_keyword(&mut self) -> Result<Literal> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }

        match &self.input[start..self.pos] {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            word => Err(Error::sort_syntax(
                start,
                format!("malformed literal: bare name '{word}'"),
            )),
        }
    }
}
