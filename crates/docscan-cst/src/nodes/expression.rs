// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use super::Span;
use crate::tokenizer::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression<'a> {
    Name(Name<'a>),
    Attribute(Box<Attribute<'a>>),
    Subscript(Box<Subscript<'a>>),
    Call(Box<Call<'a>>),
    Tuple(Sequence<'a>),
    List(Sequence<'a>),
    Starred(Box<Starred<'a>>),
    String(StringLiteral<'a>),
    /// Any expression whose inner structure is not modelled.
    Other(Opaque<'a>),
}

impl<'a> Expression<'a> {
    pub fn span(&self) -> Span {
        match self {
            Expression::Name(node) => node.span,
            Expression::Attribute(node) => node.span,
            Expression::Subscript(node) => node.span,
            Expression::Call(node) => node.span,
            Expression::Tuple(node) | Expression::List(node) => node.span,
            Expression::Starred(node) => node.span,
            Expression::String(node) => node.span,
            Expression::Other(node) => node.span,
        }
    }

    /// The source text of this expression.
    pub fn text(&self, source: &'a str) -> &'a str {
        self.span().slice(source)
    }

    pub fn as_name(&self) -> Option<&Name<'a>> {
        match self {
            Expression::Name(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Name<'a> {
    pub value: &'a str,
    pub span: Span,
}

impl<'a> Name<'a> {
    pub(crate) fn from_token(tok: &Token<'a>) -> Self {
        Name {
            value: tok.text,
            span: Span::new(tok.start_offset, tok.end_offset),
        }
    }
}

/// `value.attr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub value: Expression<'a>,
    pub attr: Name<'a>,
    pub span: Span,
}

/// `value[slice]`, with the slice kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscript<'a> {
    pub value: Expression<'a>,
    pub slice: &'a str,
    pub span: Span,
}

/// `func(args)`, with the arguments kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call<'a> {
    pub func: Expression<'a>,
    pub args: &'a str,
    pub span: Span,
}

/// Elements of a tuple or list display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence<'a> {
    pub elements: Vec<Expression<'a>>,
    pub parenthesized: bool,
    pub span: Span,
}

/// `*value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Starred<'a> {
    pub value: Expression<'a>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque<'a> {
    pub text: &'a str,
    pub span: Span,
}

/// One string literal, possibly made of several implicitly concatenated
/// parts (`"a" "b"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral<'a> {
    pub parts: Vec<&'a str>,
    /// The concatenated value with prefixes, quotes and escapes resolved.
    pub value: String,
    pub is_bytes: bool,
    /// Whether any part is an f-string or t-string.
    pub is_formatted: bool,
    pub span: Span,
}

impl<'a> StringLiteral<'a> {
    /// Build a literal from consecutive string tokens.
    pub(crate) fn from_tokens(tokens: &[Token<'a>]) -> Self {
        let mut value = String::new();
        let mut is_bytes = false;
        let mut is_formatted = false;
        for tok in tokens {
            let quote_at = tok.text.find(['\'', '"']).unwrap_or(0);
            let prefix = tok.text[..quote_at].to_ascii_lowercase();
            is_bytes |= prefix.contains('b');
            is_formatted |= prefix.contains('f') || prefix.contains('t');
            let body = strip_quotes(&tok.text[quote_at..]);
            if prefix.contains('r') {
                value.push_str(body);
            } else {
                unescape_into(body, &mut value);
            }
        }
        let span = match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => Span::new(first.start_offset, last.end_offset),
            _ => Span::default(),
        };
        StringLiteral {
            parts: tokens.iter().map(|tok| tok.text).collect(),
            value,
            is_bytes,
            is_formatted,
            span,
        }
    }
}

fn strip_quotes(quoted: &str) -> &str {
    let triple = quoted.len() >= 6 && (quoted.starts_with("'''") || quoted.starts_with("\"\"\""));
    let width = if triple { 3 } else { 1 };
    quoted
        .get(width..quoted.len().saturating_sub(width))
        .unwrap_or("")
}

/// Resolve backslash escapes the way Python does for `str` literals.
/// Unknown escapes are kept verbatim.
fn unescape_into(body: &str, out: &mut String) {
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' | '\'' | '"' => out.push(escaped),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'x' | 'u' | 'U' => {
                let width = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars
                    .clone()
                    .take(width)
                    .take_while(|d| d.is_ascii_hexdigit())
                    .collect();
                let decoded = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(escaped);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
}
