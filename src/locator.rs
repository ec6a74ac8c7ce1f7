//! Definition line spans recovered from the raw token stream.
//!
//! The locator does not use the syntax tree. It follows `class`/`def`
//! keywords and the INDENT/DEDENT structure of the tokens, so it sees
//! decorators, one-line bodies and trailing blank lines exactly as written.
//! Definitions inside `except` and `finally` blocks are not recorded, which
//! keeps the spans in step with the names the walker collects.

use std::collections::BTreeMap;

use docscan_cst::{TokType, Token};
use serde::{Deserialize, Serialize};

use crate::cursor::TokenCursor;
use crate::qualname::QualName;
use crate::text::{is_empty_line, split_lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Class,
    Function,
    AsyncFunction,
}

impl DefinitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DefinitionKind::Class => "class",
            DefinitionKind::Function => "function",
            DefinitionKind::AsyncFunction => "async_function",
        }
    }

    pub fn is_function(self) -> bool {
        matches!(self, DefinitionKind::Function | DefinitionKind::AsyncFunction)
    }
}

/// Where a definition lives: first line (its first decorator, if any) and
/// last line, both inclusive and 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionSpan {
    pub kind: DefinitionKind,
    pub start: usize,
    pub end: usize,
}

impl DefinitionSpan {
    pub fn contains(&self, other: &DefinitionSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn shifted(self, offset: usize) -> Self {
        DefinitionSpan {
            start: self.start + offset,
            end: self.end + offset,
            ..self
        }
    }
}

#[derive(Debug, Clone)]
enum Block {
    Other,
    /// The body of an `except` or `finally` clause.
    Handler,
    Definition {
        kind: DefinitionKind,
        name: QualName,
        start: usize,
    },
}

pub struct DefinitionLocator<'a> {
    cursor: TokenCursor<'a>,
    lines: Vec<&'a str>,
    decorator: Option<Token<'a>>,
    context: Vec<String>,
    indents: Vec<Block>,
    definitions: BTreeMap<QualName, DefinitionSpan>,
}

impl<'a> DefinitionLocator<'a> {
    pub fn new(source: &'a str) -> Self {
        DefinitionLocator {
            cursor: TokenCursor::new(source),
            lines: split_lines(source),
            decorator: None,
            context: Vec::new(),
            indents: Vec::new(),
            definitions: BTreeMap::new(),
        }
    }

    pub fn parse(mut self) -> BTreeMap<QualName, DefinitionSpan> {
        while let Some(token) = self.cursor.fetch_token() {
            match token.kind {
                TokType::Op if token.text == "@" && self.at_statement_start() => {
                    if self.decorator.is_none() {
                        self.decorator = Some(token);
                    }
                }
                TokType::Name if token.text == "class" => {
                    self.parse_definition(DefinitionKind::Class, token);
                }
                TokType::Name
                    if matches!(token.text, "except" | "finally") && self.at_statement_start() =>
                {
                    self.parse_handler();
                }
                TokType::Name if token.text == "def" => {
                    let kind = match self.cursor.previous() {
                        Some(prev) if prev.is_keyword("async") => DefinitionKind::AsyncFunction,
                        _ => DefinitionKind::Function,
                    };
                    self.parse_definition(kind, token);
                }
                TokType::Indent => self.indents.push(Block::Other),
                TokType::Dedent => self.finalize_block(token.start.line),
                _ => {}
            }
        }
        self.finish();
        self.definitions
    }

    fn at_statement_start(&self) -> bool {
        match self.cursor.previous() {
            None => true,
            Some(prev) => matches!(
                prev.kind,
                TokType::Newline | TokType::Nl | TokType::Indent | TokType::Dedent
            ),
        }
    }

    fn parse_definition(&mut self, kind: DefinitionKind, keyword: Token<'a>) {
        let Some(name) = self.cursor.fetch_token() else {
            return;
        };
        if name.kind != TokType::Name {
            return;
        }
        self.context.push(name.text.to_string());
        let qualname = QualName::new(self.context.clone());
        let start = match self.decorator.take() {
            Some(decorator) => decorator.start.line,
            None => keyword.start.line,
        };

        self.cursor.fetch_until((TokType::Op, ":"));
        match self.cursor.fetch_token() {
            Some(token) if matches!(token.kind, TokType::Comment | TokType::Newline) => {
                self.cursor.fetch_until(TokType::Indent);
                self.indents.push(Block::Definition {
                    kind,
                    name: qualname,
                    start,
                });
            }
            Some(token) => {
                // One-line body.
                let rest = self.cursor.fetch_until(TokType::Newline);
                let end = rest.last().unwrap_or(&token).end.line;
                self.add_definition(qualname, DefinitionSpan { kind, start, end: end.max(start) });
                self.context.pop();
            }
            None => {
                let end = self.cursor.last_line().max(start);
                self.add_definition(qualname, DefinitionSpan { kind, start, end });
                self.context.pop();
            }
        }
    }

    /// Open a handler block if the clause header ends its line. A one-line
    /// handler body cannot hold a definition, so it is skipped.
    fn parse_handler(&mut self) {
        self.cursor.fetch_until((TokType::Op, ":"));
        if let Some(token) = self.cursor.fetch_token() {
            if matches!(token.kind, TokType::Comment | TokType::Newline) {
                self.cursor.fetch_until(TokType::Indent);
                self.indents.push(Block::Handler);
            }
        }
    }

    /// Close the innermost block at a DEDENT found on `dedent_line`.
    fn finalize_block(&mut self, dedent_line: usize) {
        let Some(block) = self.indents.pop() else {
            return;
        };
        if let Block::Definition { kind, name, start } = block {
            let mut end = dedent_line.saturating_sub(1).max(start);
            while end > start && self.is_empty_line(end) {
                end -= 1;
            }
            self.add_definition(name, DefinitionSpan { kind, start, end });
            self.context.pop();
        }
    }

    /// Close every block still open when the token stream ends.
    fn finish(&mut self) {
        let eof_line = self.cursor.last_line() + 1;
        while !self.indents.is_empty() {
            self.finalize_block(eof_line);
        }
    }

    fn is_empty_line(&self, lineno: usize) -> bool {
        match lineno.checked_sub(1).and_then(|index| self.lines.get(index)) {
            Some(line) => is_empty_line(line),
            None => true,
        }
    }

    /// Record a definition unless it is a function defined directly inside
    /// another function, or it sits in an exception handler.
    fn add_definition(&mut self, name: QualName, span: DefinitionSpan) {
        if self.indents.iter().any(|block| matches!(block, Block::Handler)) {
            tracing::trace!(%name, "skipping definition in exception handler");
            return;
        }
        let in_function = matches!(
            self.indents.last(),
            Some(Block::Definition { kind, .. }) if kind.is_function()
        );
        if span.kind.is_function() && in_function {
            tracing::trace!(%name, "skipping nested function");
            return;
        }
        self.definitions.insert(name, span);
    }
}

/// Locate every class, function and method definition in `source`.
pub fn locate_definitions(source: &str) -> BTreeMap<QualName, DefinitionSpan> {
    DefinitionLocator::new(source).parse()
}
