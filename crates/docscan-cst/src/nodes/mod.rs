// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Structural syntax tree for Python modules.
//!
//! The tree is deliberately shallow: statements are fully structured down to
//! the level of blocks, assignment targets and function signatures, while
//! expressions are only broken up where a consumer needs to look inside them
//! (names, attribute chains, tuples and lists, string literals). Everything
//! else is kept as an [`Opaque`] source slice.

pub mod expression;
pub mod statement;

pub use expression::{
    Attribute, Call, Expression, Name, Opaque, Sequence, Starred, StringLiteral, Subscript,
};
pub use statement::{
    AnnAssign, Assign, AugAssign, ClassDef, Decorator, ExceptHandler, Expr, For, FunctionDef, If,
    Import, ImportAlias, ImportFrom, Match, MatchCase, Module, Param, ParamKind, Parameters,
    Statement, Try, While, With,
};

use serde::Serialize;

/// A half-open byte range into the module source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The source text covered by this span, or `""` if it is out of range.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// Where a statement begins: 1-based line, 0-based byte column, byte offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}
