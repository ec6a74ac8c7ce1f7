//! Forward-only token cursor with one token of lookback.
//!
//! The cursor wraps the lazy tokenizer, so scanning a statement only
//! tokenizes as far as the scan needs. A tokenizer error ends the stream:
//! the scanners built on the cursor treat malformed input as exhaustion.

use docscan_cst::tokenizer::TokenIterator;
use docscan_cst::{TokConfig, TokType, Token};

/// What [`TokenCursor::fetch_until`] stops at.
pub enum Stop<'s> {
    /// A token with this literal text.
    Text(&'s str),
    /// A token of this kind.
    Kind(TokType),
    /// A token of this kind and text.
    Exact(TokType, &'s str),
    /// A token whose text is any of these.
    AnyText(&'s [&'s str]),
    /// A token of any of these kinds.
    AnyKind(&'s [TokType]),
    Predicate(&'s dyn Fn(&Token<'_>) -> bool),
}

impl Stop<'_> {
    pub fn matches(&self, token: &Token<'_>) -> bool {
        match self {
            Stop::Text(text) => token.text == *text,
            Stop::Kind(kind) => token.kind == *kind,
            Stop::Exact(kind, text) => token.kind == *kind && token.text == *text,
            Stop::AnyText(texts) => texts.contains(&token.text),
            Stop::AnyKind(kinds) => kinds.contains(&token.kind),
            Stop::Predicate(pred) => pred(token),
        }
    }
}

impl<'s> From<&'s str> for Stop<'s> {
    fn from(text: &'s str) -> Self {
        Stop::Text(text)
    }
}

impl From<TokType> for Stop<'_> {
    fn from(kind: TokType) -> Self {
        Stop::Kind(kind)
    }
}

impl<'s> From<(TokType, &'s str)> for Stop<'s> {
    fn from((kind, text): (TokType, &'s str)) -> Self {
        Stop::Exact(kind, text)
    }
}

impl<'s> From<&'s [&'s str]> for Stop<'s> {
    fn from(texts: &'s [&'s str]) -> Self {
        Stop::AnyText(texts)
    }
}

impl<'s> From<&'s [TokType]> for Stop<'s> {
    fn from(kinds: &'s [TokType]) -> Self {
        Stop::AnyKind(kinds)
    }
}

/// The closer expected for an opening bracket token.
pub fn closer_for(token: &Token<'_>) -> Option<&'static str> {
    if token.kind != TokType::Op {
        return None;
    }
    match token.text {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        _ => None,
    }
}

pub struct TokenCursor<'a> {
    tokens: TokenIterator<'a>,
    current: Option<Token<'a>>,
    previous: Option<Token<'a>>,
    last_line: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(source: &'a str) -> Self {
        TokenCursor {
            tokens: TokenIterator::new(source, &TokConfig::default()),
            current: None,
            previous: None,
            last_line: 0,
        }
    }

    /// Advance by one token. `None` means the stream is exhausted, either at
    /// the end of input or because the tokenizer hit an error.
    pub fn fetch_token(&mut self) -> Option<Token<'a>> {
        self.previous = self.current;
        self.current = match self.tokens.next() {
            Some(Ok(token)) => Some(token),
            Some(Err(err)) => {
                tracing::trace!(%err, "token stream ended early");
                None
            }
            None => None,
        };
        if let Some(token) = &self.current {
            self.last_line = self.last_line.max(token.end.line);
        }
        self.current
    }

    pub fn current(&self) -> Option<&Token<'a>> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Token<'a>> {
        self.previous.as_ref()
    }

    /// The highest line number reached by any fetched token.
    pub fn last_line(&self) -> usize {
        self.last_line
    }

    /// Collect tokens until one matches `stop` at the top nesting level.
    /// The matching token is left in [`current`](Self::current) and is not
    /// part of the result. Bracket groups are consumed whole, closers
    /// included, so a `stop` inside brackets is never seen.
    pub fn fetch_until<'s>(&mut self, stop: impl Into<Stop<'s>>) -> Vec<Token<'a>> {
        let stop = stop.into();
        let mut tokens = Vec::new();
        while let Some(token) = self.fetch_token() {
            if stop.matches(&token) {
                break;
            }
            tokens.push(token);
            if let Some(closer) = closer_for(&token) {
                self.collect_group(closer, &mut tokens);
            }
        }
        tokens
    }

    /// Consume the balanced group opened by `open` (which must be the
    /// current token) and return it, opener and closer included. If the
    /// input ends first, everything read is returned.
    pub fn fetch_group(&mut self, open: Token<'a>) -> Vec<Token<'a>> {
        let mut tokens = vec![open];
        if let Some(closer) = closer_for(&open) {
            self.collect_group(closer, &mut tokens);
        }
        tokens
    }

    fn collect_group(&mut self, closer: &'static str, tokens: &mut Vec<Token<'a>>) {
        let mut closers = vec![closer];
        while let Some(expected) = closers.last().copied() {
            let Some(token) = self.fetch_token() else {
                return;
            };
            tokens.push(token);
            if let Some(inner) = closer_for(&token) {
                closers.push(inner);
            } else if token.kind == TokType::Op && token.text == expected {
                closers.pop();
            }
        }
    }
}
