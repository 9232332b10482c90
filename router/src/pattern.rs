//! Pattern compiler
//!
//! Route patterns mix two variable syntaxes with square-bracket optional
//! groups:
//!
//! - `{name}` and `{name:regex}`; the regex may contain balanced braces
//! - `:name`, optionally suffixed by `?` (optional), `*` (zero or more
//!   segments) or `+` (one or more segments)
//! - `[...]` optional content, nestable
//!
//! A pattern compiles to a list of [`PatternVariant`]s, one per combination of
//! optional groups, ordered so that variants carrying more optional content
//! come first. Both the matcher and the generator depend on that order.

use crate::error::{RouteError, RouteResult};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Regex for single-segment variables
pub const SEGMENT_REGEX: &str = "[^/]+";
/// Regex for variables spanning the rest of the path
pub const WILDCARD_REGEX: &str = ".+";

/// How many path segments a variable may absorb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    None,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Quantifier {
    #[inline]
    pub fn is_wildcard(self) -> bool {
        matches!(self, Quantifier::ZeroOrMore | Quantifier::OneOrMore)
    }
}

/// Named capture with its validation regex
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: String,
    pub regex: String,
    pub quantifier: Quantifier,
}

impl Variable {
    fn new(name: &str, regex: Option<&str>, quantifier: Quantifier) -> Self {
        let regex = match regex {
            Some(regex) if !regex.is_empty() => regex,
            _ if quantifier.is_wildcard() => WILDCARD_REGEX,
            _ => SEGMENT_REGEX,
        };
        Self {
            name: name.to_string(),
            regex: regex.to_string(),
            quantifier,
        }
    }
}

/// Literal text or a variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(String),
    Variable(Variable),
}

/// One concrete expansion of a pattern's optional groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PatternVariant {
    tokens: Vec<Token>,
}

impl PatternVariant {
    fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
        for token in tokens {
            match (merged.last_mut(), token) {
                (Some(Token::Literal(prev)), Token::Literal(next)) => prev.push_str(&next),
                (_, token) => merged.push(token),
            }
        }
        Self { tokens: merged }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Variable(variable) => Some(variable),
            Token::Literal(_) => None,
        })
    }

    /// Template in the radix tree's colon syntax, always rooted at `/`.
    ///
    /// Tree captures span whole segments, so a variable sharing its segment
    /// with literal text or another variable is a configuration error.
    pub fn to_tree_template(&self) -> RouteResult<String> {
        let mut template = String::with_capacity(32);
        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Literal(text) => template.push_str(text),
                Token::Variable(variable) => {
                    let starts_segment = match i.checked_sub(1).map(|prev| &self.tokens[prev]) {
                        None => true,
                        Some(Token::Literal(text)) => text.ends_with('/'),
                        Some(Token::Variable(_)) => false,
                    };
                    let ends_segment = match self.tokens.get(i + 1) {
                        None => true,
                        Some(Token::Literal(text)) => text.starts_with('/'),
                        Some(Token::Variable(_)) => false,
                    };
                    if !starts_segment || !ends_segment {
                        return Err(RouteError::Config(format!(
                            "Variable \"{}\" must span a whole path segment",
                            variable.name
                        )));
                    }
                    template.push(':');
                    template.push_str(&variable.name);
                    match variable.quantifier {
                        Quantifier::ZeroOrMore => template.push('*'),
                        Quantifier::OneOrMore => template.push('+'),
                        Quantifier::None | Quantifier::Optional => {}
                    }
                }
            }
        }
        if !template.starts_with('/') {
            template.insert(0, '/');
        }
        Ok(template)
    }
}

/// Memoizing pattern compiler, safe to share between threads
#[derive(Debug, Default)]
pub struct PatternCompiler {
    cache: RwLock<AHashMap<String, Arc<[PatternVariant]>>>,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` into its variants, most optional content first.
    ///
    /// Results are memoized by pattern string; a second call returns the same
    /// shared list.
    pub fn parse(&self, pattern: &str) -> RouteResult<Arc<[PatternVariant]>> {
        if let Some(variants) = self.cache.read().get(pattern) {
            return Ok(Arc::clone(variants));
        }

        let variants = compile(pattern)?;
        let mut cache = self.cache.write();
        Ok(Arc::clone(
            cache.entry(pattern.to_string()).or_insert(variants),
        ))
    }

    /// Number of memoized patterns
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

/// Compile without memoization
pub fn compile(pattern: &str) -> RouteResult<Arc<[PatternVariant]>> {
    let mut scanner = Scanner::new(pattern, true);
    let parts = scanner.group(0)?;
    let mut variants: Vec<PatternVariant> = expand(&parts)
        .into_iter()
        .map(PatternVariant::from_tokens)
        .collect();
    variants.reverse();
    Ok(variants.into())
}

/// Tokenize text where square brackets are plain characters (host names)
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(text, false);
    let tokens = match scanner.group(0) {
        Ok(parts) => {
            let mut tokens = Vec::with_capacity(parts.len());
            flatten(parts, &mut tokens);
            tokens
        }
        Err(_) => vec![Token::Literal(text.to_string())],
    };
    PatternVariant::from_tokens(tokens).tokens
}

/// Without bracket groups the only optional parts are `?` variables; keep them
fn flatten(parts: Vec<Part>, tokens: &mut Vec<Token>) {
    for part in parts {
        match part {
            Part::Token(token) => tokens.push(token),
            Part::Optional(inner) => flatten(inner, tokens),
        }
    }
}

/// Whether `text` contains at least one variable in either syntax
pub fn has_variables(text: &str) -> bool {
    tokenize(text).iter().any(|token| matches!(token, Token::Variable(_)))
}

#[derive(Debug, Clone)]
enum Part {
    Token(Token),
    Optional(Vec<Part>),
}

/// Cross product of optional groups, "without" before "with"
fn expand(parts: &[Part]) -> Vec<Vec<Token>> {
    let mut routes: Vec<Vec<Token>> = vec![Vec::new()];
    for part in parts {
        match part {
            Part::Token(token) => {
                for route in &mut routes {
                    route.push(token.clone());
                }
            }
            Part::Optional(inner) => {
                let optional = expand(inner);
                let mut next = Vec::with_capacity(routes.len() * (optional.len() + 1));
                for route in routes {
                    let extended: Vec<Vec<Token>> = optional
                        .iter()
                        .map(|tail| {
                            let mut extended = route.clone();
                            extended.extend(tail.iter().cloned());
                            extended
                        })
                        .collect();
                    next.push(route);
                    next.extend(extended);
                }
                routes = next;
            }
        }
    }
    routes
}

/// Single pass over a pattern producing literals, variables and groups
struct Scanner<'p> {
    pattern: &'p str,
    pos: usize,
    brackets: bool,
}

impl<'p> Scanner<'p> {
    fn new(pattern: &'p str, brackets: bool) -> Self {
        Self {
            pattern,
            pos: 0,
            brackets,
        }
    }

    fn group(&mut self, depth: usize) -> RouteResult<Vec<Part>> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        while let Some(c) = self.peek() {
            match c {
                '[' if self.brackets => {
                    self.pos += 1;
                    flush(&mut literal, &mut parts);
                    let inner = self.group(depth + 1)?;
                    parts.push(Part::Optional(inner));
                }
                ']' if self.brackets => {
                    if depth == 0 {
                        return Err(self.unmatched());
                    }
                    self.pos += 1;
                    flush(&mut literal, &mut parts);
                    return Ok(parts);
                }
                '{' | ':' => match self.variable() {
                    Some(part) => {
                        flush(&mut literal, &mut parts);
                        parts.push(part);
                    }
                    None => {
                        literal.push(c);
                        self.pos += c.len_utf8();
                    }
                },
                _ => {
                    literal.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }

        if depth > 0 {
            return Err(self.unmatched());
        }
        flush(&mut literal, &mut parts);
        Ok(parts)
    }

    /// Try to read a variable at the cursor; leaves the cursor alone on failure
    fn variable(&mut self) -> Option<Part> {
        let rest = &self.pattern[self.pos..];
        let (part, consumed) = if rest.starts_with('{') {
            curly_variable(rest)?
        } else {
            colon_variable(rest)?
        };
        self.pos += consumed;
        Some(part)
    }

    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    fn unmatched(&self) -> RouteError {
        RouteError::Config(format!(
            "Unmatched square brackets in pattern: {}",
            self.pattern
        ))
    }
}

fn flush(literal: &mut String, parts: &mut Vec<Part>) {
    if !literal.is_empty() {
        parts.push(Part::Token(Token::Literal(std::mem::take(literal))));
    }
}

/// `{ name }` or `{ name : regex }`, returning the part and bytes consumed
fn curly_variable(input: &str) -> Option<(Part, usize)> {
    let bytes = input.as_bytes();
    let mut i = skip_whitespace(bytes, 1);

    let name_start = i;
    if !bytes.get(i).is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') {
        return None;
    }
    while bytes
        .get(i)
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
    {
        i += 1;
    }
    let name = &input[name_start..i];
    i = skip_whitespace(bytes, i);

    let quantifier = match bytes.get(i) {
        Some(b'?') => Quantifier::Optional,
        Some(b'*') => Quantifier::ZeroOrMore,
        Some(b'+') => Quantifier::OneOrMore,
        _ => Quantifier::None,
    };
    if quantifier != Quantifier::None {
        i = skip_whitespace(bytes, i + 1);
    }

    let mut regex = None;
    if bytes.get(i) == Some(&b':') {
        i = skip_whitespace(bytes, i + 1);
        let regex_start = i;
        let mut depth = 0usize;
        loop {
            match bytes.get(i)? {
                b'{' => depth += 1,
                b'}' if depth == 0 => break,
                b'}' => depth -= 1,
                _ => {}
            }
            i += 1;
        }
        regex = Some(input[regex_start..i].trim_end());
    }

    if bytes.get(i) != Some(&b'}') {
        return None;
    }
    Some((variable_part(name, regex, quantifier), i + 1))
}

/// `:name` with an optional `?`, `*` or `+` suffix
fn colon_variable(input: &str) -> Option<(Part, usize)> {
    let bytes = input.as_bytes();
    if !bytes.get(1).is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') {
        return None;
    }
    let mut i = 2;
    while bytes.get(i).is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_') {
        i += 1;
    }
    let name = &input[1..i];

    let quantifier = match bytes.get(i) {
        Some(b'?') => Quantifier::Optional,
        Some(b'*') => Quantifier::ZeroOrMore,
        Some(b'+') => Quantifier::OneOrMore,
        _ => return Some((variable_part(name, None, Quantifier::None), i)),
    };
    Some((variable_part(name, None, quantifier), i + 1))
}

/// An optional variable is a group holding only that variable
fn variable_part(name: &str, regex: Option<&str>, quantifier: Quantifier) -> Part {
    let token = Part::Token(Token::Variable(Variable::new(name, regex, quantifier)));
    match quantifier {
        Quantifier::Optional => Part::Optional(vec![token]),
        _ => token,
    }
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}
