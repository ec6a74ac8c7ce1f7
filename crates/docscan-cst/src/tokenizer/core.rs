// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A lazy Python tokenizer.
//!
//! Unlike a tokenizer that only feeds a grammar, this one keeps everything a
//! documentation tool needs to look at: comments are emitted as [`TokType::Comment`]
//! tokens, line breaks that do not end a logical line are emitted as
//! [`TokType::Nl`], and blocks are delimited by [`TokType::Indent`] and
//! [`TokType::Dedent`] tokens. Dedent tokens are positioned at the start of the
//! logical line that closes the block.
//!
//! Positions use 1-based line numbers and 0-based byte columns.

use std::fmt;

use memchr::{memchr, memchr2};
use thiserror::Error;

/// The kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokType {
    Name,
    Number,
    String,
    Op,
    Comment,
    Newline,
    Nl,
    Indent,
    Dedent,
    EndMarker,
}

impl TokType {
    pub fn as_str(self) -> &'static str {
        match self {
            TokType::Name => "NAME",
            TokType::Number => "NUMBER",
            TokType::String => "STRING",
            TokType::Op => "OP",
            TokType::Comment => "COMMENT",
            TokType::Newline => "NEWLINE",
            TokType::Nl => "NL",
            TokType::Indent => "INDENT",
            TokType::Dedent => "DEDENT",
            TokType::EndMarker => "ENDMARKER",
        }
    }

    /// Whether a token of this kind can be part of an expression.
    pub fn is_expression_part(self) -> bool {
        matches!(
            self,
            TokType::Name | TokType::Number | TokType::String | TokType::Op
        )
    }
}

impl fmt::Display for TokType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(line, column)` position. Lines are 1-based, columns are 0-based bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single token borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokType,
    pub text: &'a str,
    pub start: Position,
    pub end: Position,
    pub start_offset: usize,
    pub end_offset: usize,
    /// The physical source line the token starts on, line break included.
    pub line: &'a str,
}

impl Token<'_> {
    pub fn is_op(&self, text: &str) -> bool {
        self.kind == TokType::Op && self.text == text
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokType::Name && self.text == text
    }
}

impl PartialEq<TokType> for Token<'_> {
    fn eq(&self, other: &TokType) -> bool {
        self.kind == *other
    }
}

impl PartialEq<&str> for Token<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl PartialEq<(TokType, &str)> for Token<'_> {
    fn eq(&self, other: &(TokType, &str)) -> bool {
        self.kind == other.0 && self.text == other.1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokError {
    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: usize },
    #[error("unterminated triple-quoted string literal starting at line {line}")]
    UnterminatedTripleQuotedString { line: usize },
    #[error("unindent does not match any outer indentation level at line {line}")]
    Dedent { line: usize },
    #[error("unmatched '{close}' at line {line}")]
    UnmatchedClose { close: char, line: usize },
    #[error("closing '{close}' does not match '{open}' at line {line}")]
    MismatchedClose { open: char, close: char, line: usize },
    #[error("'{open}' opened at line {line} was never closed")]
    UnclosedBracket { open: char, line: usize },
    #[error("invalid character {ch:?} at line {line}")]
    BadCharacter { ch: char, line: usize },
}

impl TokError {
    /// The 1-based line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            TokError::UnterminatedString { line }
            | TokError::UnterminatedTripleQuotedString { line }
            | TokError::Dedent { line }
            | TokError::UnmatchedClose { line, .. }
            | TokError::MismatchedClose { line, .. }
            | TokError::UnclosedBracket { line, .. }
            | TokError::BadCharacter { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokConfig {
    /// Width of a tab stop when measuring indentation.
    pub tab_size: usize,
}

impl Default for TokConfig {
    fn default() -> Self {
        TokConfig { tab_size: 8 }
    }
}

// Longest operators first so that prefix matching picks the maximal munch.
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "**", "//", ">>", "<<", "<=", ">=", "==", "!=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "(", ")", "[", "]", "{", "}", ",", ":",
    ";", ".", "+", "-", "*", "/", "%", "&", "|", "^", "~", "<", ">", "=", "@", "!",
];

const STRING_PREFIXES: &[&str] = &[
    "r", "u", "b", "f", "t", "br", "rb", "fr", "rf", "tr", "rt",
];

#[derive(Debug, Clone, Copy)]
struct Mark<'t> {
    offset: usize,
    line: usize,
    line_start: usize,
    line_text: &'t str,
}

/// Tokenizer state. Drive it with [`TokState::next_token`] or wrap it in a
/// [`TokenIterator`].
#[derive(Debug)]
pub struct TokState<'t> {
    text: &'t str,
    pos: usize,
    line: usize,
    line_start: usize,
    current_line: &'t str,
    at_bol: bool,
    /// Whether the current logical line has produced a non-comment token.
    logical_content: bool,
    indents: Vec<usize>,
    pending_dedents: usize,
    dedent_at: (Position, usize),
    brackets: Vec<(char, usize)>,
    tab_size: usize,
    finished: bool,
}

impl<'t> TokState<'t> {
    pub fn new(text: &'t str, config: &TokConfig) -> Self {
        TokState {
            text,
            pos: 0,
            line: 1,
            line_start: 0,
            current_line: line_at(text, 0),
            at_bol: true,
            logical_content: false,
            indents: vec![0],
            pending_dedents: 0,
            dedent_at: (Position::default(), 0),
            brackets: Vec::new(),
            tab_size: config.tab_size.max(1),
            finished: false,
        }
    }

    /// Produce the next token, `Ok(None)` once the end marker has been emitted.
    pub fn next_token(&mut self) -> Result<Option<Token<'t>>, TokError> {
        if self.finished {
            return Ok(None);
        }
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            let (position, offset) = self.dedent_at;
            return Ok(Some(self.zero_width(TokType::Dedent, position, offset)));
        }
        if self.at_bol {
            self.at_bol = false;
            if let Some(token) = self.indentation()? {
                return Ok(Some(token));
            }
        }

        self.skip_blanks();
        let Some(c) = self.peek() else {
            return self.end_of_input();
        };
        let mark = self.mark();
        match c {
            '#' => {
                let rest = self.rest().as_bytes();
                self.pos += memchr2(b'\n', b'\r', rest).unwrap_or(rest.len());
                Ok(Some(self.token(TokType::Comment, mark)))
            }
            '\n' | '\r' => Ok(Some(self.newline())),
            '\'' | '"' => self.string(mark).map(Some),
            c if c.is_ascii_digit() => Ok(Some(self.number(mark))),
            '.' if self.rest()[1..].starts_with(|n: char| n.is_ascii_digit()) => {
                Ok(Some(self.number(mark)))
            }
            c if is_identifier_start(c) => self.name_or_string(mark).map(Some),
            c => self.operator(mark, c).map(Some),
        }
    }

    fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn mark(&self) -> Mark<'t> {
        Mark {
            offset: self.pos,
            line: self.line,
            line_start: self.line_start,
            line_text: self.current_line,
        }
    }

    /// Move to the physical line starting at byte `start`.
    fn start_line(&mut self, start: usize) {
        self.line += 1;
        self.line_start = start;
        self.current_line = line_at(self.text, start);
    }

    fn token(&self, kind: TokType, mark: Mark<'t>) -> Token<'t> {
        Token {
            kind,
            text: &self.text[mark.offset..self.pos],
            start: Position::new(mark.line, mark.offset - mark.line_start),
            end: Position::new(self.line, self.pos - self.line_start),
            start_offset: mark.offset,
            end_offset: self.pos,
            line: mark.line_text,
        }
    }

    fn zero_width(&self, kind: TokType, position: Position, offset: usize) -> Token<'t> {
        let line = if offset >= self.text.len() {
            ""
        } else {
            self.current_line
        };
        Token {
            kind,
            text: "",
            start: position,
            end: position,
            start_offset: offset,
            end_offset: offset,
            line,
        }
    }

    /// Measure the indentation of a new logical line and emit an indent or
    /// the first of a run of dedents. Blank and comment-only lines never
    /// change the indentation level.
    fn indentation(&mut self) -> Result<Option<Token<'t>>, TokError> {
        let bytes = self.text.as_bytes();
        let mut width = 0;
        let mut p = self.pos;
        while let Some(&b) = bytes.get(p) {
            match b {
                b' ' => width += 1,
                b'\t' => width = (width / self.tab_size + 1) * self.tab_size,
                0x0c => width = 0,
                _ => break,
            }
            p += 1;
        }
        if matches!(bytes.get(p), None | Some(b'#' | b'\n' | b'\r')) {
            return Ok(None);
        }

        let mark = self.mark();
        self.pos = p;
        let top = self.indents.last().copied().unwrap_or(0);
        if width > top {
            self.indents.push(width);
            return Ok(Some(self.token(TokType::Indent, mark)));
        }
        if width < top {
            let mut count = 0;
            while self.indents.last().is_some_and(|&w| w > width) {
                self.indents.pop();
                count += 1;
            }
            if self.indents.last().copied().unwrap_or(0) != width {
                return Err(TokError::Dedent { line: self.line });
            }
            let position = Position::new(self.line, p - self.line_start);
            self.dedent_at = (position, p);
            self.pending_dedents = count - 1;
            return Ok(Some(self.zero_width(TokType::Dedent, position, p)));
        }
        Ok(None)
    }

    fn skip_blanks(&mut self) {
        let bytes = self.text.as_bytes();
        loop {
            match bytes.get(self.pos) {
                Some(b' ' | b'\t' | 0x0c) => self.pos += 1,
                Some(b'\\') => {
                    let after = self.pos + 1;
                    let len = match (bytes.get(after), bytes.get(after + 1)) {
                        (Some(b'\r'), Some(b'\n')) => 2,
                        (Some(b'\n' | b'\r'), _) => 1,
                        _ => break,
                    };
                    self.pos = after + len;
                    self.start_line(self.pos);
                }
                _ => break,
            }
        }
    }

    fn newline(&mut self) -> Token<'t> {
        let mark = self.mark();
        self.pos += if self.rest().starts_with("\r\n") { 2 } else { 1 };
        let kind = if self.brackets.is_empty() && self.logical_content {
            TokType::Newline
        } else {
            TokType::Nl
        };
        let token = self.token(kind, mark);
        self.start_line(self.pos);
        if kind == TokType::Newline {
            self.logical_content = false;
        }
        self.at_bol = self.brackets.is_empty();
        token
    }

    fn name_or_string(&mut self, mark: Mark<'t>) -> Result<Token<'t>, TokError> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, ch)| !is_identifier_continue(ch))
            .map_or(rest.len(), |(index, _)| index);
        let word = &rest[..len];
        self.pos += len;
        let quoted = self.rest().starts_with(['\'', '"']);
        if quoted && STRING_PREFIXES.contains(&word.to_ascii_lowercase().as_str()) {
            return self.string(mark);
        }
        self.logical_content = true;
        Ok(self.token(TokType::Name, mark))
    }

    /// Scan a string literal. `self.pos` is at the opening quote, `mark` at
    /// the start of the prefix (if any).
    fn string(&mut self, mark: Mark<'t>) -> Result<Token<'t>, TokError> {
        let bytes = self.text.as_bytes();
        let quote = bytes[self.pos];
        let triple = bytes[self.pos..].starts_with(&[quote, quote, quote]);
        let unterminated = if triple {
            TokError::UnterminatedTripleQuotedString { line: mark.line }
        } else {
            TokError::UnterminatedString { line: mark.line }
        };
        let mut p = self.pos + if triple { 3 } else { 1 };
        loop {
            let Some(&b) = bytes.get(p) else {
                return Err(unterminated);
            };
            match b {
                b'\\' => {
                    p += 1;
                    match bytes.get(p) {
                        Some(b'\r') => {
                            p += 1;
                            if bytes.get(p) == Some(&b'\n') {
                                p += 1;
                            }
                            self.start_line(p);
                        }
                        Some(b'\n') => {
                            p += 1;
                            self.start_line(p);
                        }
                        // Continuation bytes of a multi-byte character never
                        // look like ASCII, so stepping a single byte is fine.
                        Some(_) => p += 1,
                        None => {}
                    }
                }
                b'\n' | b'\r' => {
                    if !triple {
                        return Err(unterminated);
                    }
                    if b == b'\r' && bytes.get(p + 1) == Some(&b'\n') {
                        p += 1;
                    }
                    p += 1;
                    self.start_line(p);
                }
                _ if b == quote => {
                    if !triple {
                        p += 1;
                        break;
                    }
                    if bytes[p..].starts_with(&[quote, quote, quote]) {
                        p += 3;
                        break;
                    }
                    p += 1;
                }
                _ => p += 1,
            }
        }
        self.pos = p;
        self.logical_content = true;
        Ok(self.token(TokType::String, mark))
    }

    fn number(&mut self, mark: Mark<'t>) -> Token<'t> {
        let bytes = self.text.as_bytes();
        let hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        let mut previous = 0u8;
        let mut p = self.pos;
        while let Some(&b) = bytes.get(p) {
            let exponent_sign = matches!(b, b'+' | b'-') && matches!(previous, b'e' | b'E') && !hex;
            if !(b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign) {
                break;
            }
            previous = b;
            p += 1;
        }
        self.pos = p;
        self.logical_content = true;
        self.token(TokType::Number, mark)
    }

    fn operator(&mut self, mark: Mark<'t>, c: char) -> Result<Token<'t>, TokError> {
        let rest = self.rest();
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            return Err(TokError::BadCharacter { ch: c, line: self.line });
        };
        match *op {
            "(" | "[" | "{" => self.brackets.push((c, self.line)),
            ")" | "]" | "}" => match self.brackets.pop() {
                None => {
                    return Err(TokError::UnmatchedClose {
                        close: c,
                        line: self.line,
                    })
                }
                Some((open, _)) if closer_for(open) != c => {
                    return Err(TokError::MismatchedClose {
                        open,
                        close: c,
                        line: self.line,
                    })
                }
                Some(_) => {}
            },
            _ => {}
        }
        self.pos += op.len();
        self.logical_content = true;
        Ok(self.token(TokType::Op, mark))
    }

    fn end_of_input(&mut self) -> Result<Option<Token<'t>>, TokError> {
        if let Some(&(open, line)) = self.brackets.last() {
            self.brackets.clear();
            return Err(TokError::UnclosedBracket { open, line });
        }
        if self.logical_content {
            self.logical_content = false;
            let mark = self.mark();
            return Ok(Some(self.token(TokType::Newline, mark)));
        }
        let position = if self.pos == self.line_start {
            Position::new(self.line, 0)
        } else {
            Position::new(self.line + 1, 0)
        };
        if self.indents.len() > 1 {
            let count = self.indents.len() - 1;
            self.indents.truncate(1);
            self.dedent_at = (position, self.pos);
            self.pending_dedents = count - 1;
            return Ok(Some(self.zero_width(TokType::Dedent, position, self.pos)));
        }
        self.finished = true;
        Ok(Some(self.zero_width(TokType::EndMarker, position, self.pos)))
    }
}

/// The physical line starting at byte `start`, line break included.
fn line_at(text: &str, start: usize) -> &str {
    let rest = &text[start..];
    match memchr(b'\n', rest.as_bytes()) {
        Some(index) => &rest[..=index],
        None => rest,
    }
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Iterator adapter over [`TokState`]. After an error it yields `None`.
#[derive(Debug)]
pub struct TokenIterator<'t> {
    state: TokState<'t>,
}

impl<'t> TokenIterator<'t> {
    pub fn new(text: &'t str, config: &TokConfig) -> Self {
        TokenIterator {
            state: TokState::new(text, config),
        }
    }
}

impl<'t> Iterator for TokenIterator<'t> {
    type Item = Result<Token<'t>, TokError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => None,
            Err(err) => {
                self.state.finished = true;
                Some(Err(err))
            }
        }
    }
}
