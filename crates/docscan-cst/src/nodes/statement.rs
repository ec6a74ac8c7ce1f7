// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use serde::{Deserialize, Serialize};

use super::{Expression, Location, Name};

/// A parsed module. `source` is the text the tree's spans refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module<'a> {
    pub body: Vec<Statement<'a>>,
    pub source: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    Import(Import<'a>),
    ImportFrom(ImportFrom<'a>),
    Assign(Assign<'a>),
    AnnAssign(AnnAssign<'a>),
    AugAssign(AugAssign<'a>),
    Expr(Expr<'a>),
    FunctionDef(FunctionDef<'a>),
    ClassDef(ClassDef<'a>),
    If(If<'a>),
    For(For<'a>),
    While(While<'a>),
    With(With<'a>),
    Try(Try<'a>),
    Match(Match<'a>),
    /// Any other simple statement (`pass`, `return`, `del`, `global`, ...).
    Simple(Location),
}

impl Statement<'_> {
    pub fn location(&self) -> Location {
        match self {
            Statement::Import(node) => node.location,
            Statement::ImportFrom(node) => node.location,
            Statement::Assign(node) => node.location,
            Statement::AnnAssign(node) => node.location,
            Statement::AugAssign(node) => node.location,
            Statement::Expr(node) => node.location,
            Statement::FunctionDef(node) => node.location,
            Statement::ClassDef(node) => node.location,
            Statement::If(node) => node.location,
            Statement::For(node) => node.location,
            Statement::While(node) => node.location,
            Statement::With(node) => node.location,
            Statement::Try(node) => node.location,
            Statement::Match(node) => node.location,
            Statement::Simple(location) => *location,
        }
    }
}

// ============================================================================
// Simple statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAlias<'a> {
    /// Dotted name as written, e.g. `os.path`.
    pub name: String,
    pub asname: Option<&'a str>,
}

impl ImportAlias<'_> {
    /// The name bound in the importing scope.
    pub fn binding(&self) -> &str {
        match self.asname {
            Some(asname) => asname,
            None => &self.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import<'a> {
    pub names: Vec<ImportAlias<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFrom<'a> {
    pub module: Option<String>,
    /// Number of leading dots in a relative import.
    pub level: usize,
    pub names: Vec<ImportAlias<'a>>,
    pub location: Location,
}

/// `a = b = value`, with an optional trailing `# type:` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assign<'a> {
    pub targets: Vec<Expression<'a>>,
    pub value: Expression<'a>,
    pub type_comment: Option<&'a str>,
    pub location: Location,
}

/// `target: annotation [= value]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnAssign<'a> {
    pub target: Expression<'a>,
    pub annotation: Expression<'a>,
    pub value: Option<Expression<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugAssign<'a> {
    pub target: Expression<'a>,
    pub operator: &'a str,
    pub value: Expression<'a>,
    pub location: Location,
}

/// An expression used as a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr<'a> {
    pub value: Expression<'a>,
    pub location: Location,
}

// ============================================================================
// Definitions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorator<'a> {
    pub expression: Expression<'a>,
    pub location: Location,
}

/// The kind of a function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    Regular,
    VarArgs,
    KeywordOnly,
    KwArgs,
}

impl ParamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::PositionalOnly => "positional_only",
            ParamKind::Regular => "regular",
            ParamKind::VarArgs => "var_args",
            ParamKind::KeywordOnly => "keyword_only",
            ParamKind::KwArgs => "kw_args",
        }
    }

    pub fn is_positional(self) -> bool {
        matches!(self, ParamKind::PositionalOnly | ParamKind::Regular)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param<'a> {
    pub name: Name<'a>,
    pub kind: ParamKind,
    pub annotation: Option<Expression<'a>>,
    pub default: Option<Expression<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters<'a> {
    pub params: Vec<Param<'a>>,
}

impl<'a> Parameters<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, Param<'a>> {
        self.params.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The first positional parameter, the receiver of a method.
    pub fn first_positional(&self) -> Option<&Param<'a>> {
        self.params.first().filter(|param| param.kind.is_positional())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef<'a> {
    pub name: Name<'a>,
    pub is_async: bool,
    pub decorators: Vec<Decorator<'a>>,
    /// PEP 695 type parameters, as written between the brackets.
    pub type_params: Option<&'a str>,
    pub params: Parameters<'a>,
    pub returns: Option<Expression<'a>>,
    pub body: Vec<Statement<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef<'a> {
    pub name: Name<'a>,
    pub decorators: Vec<Decorator<'a>>,
    pub type_params: Option<&'a str>,
    /// Base classes and keywords, as written between the parentheses.
    pub bases: Option<&'a str>,
    pub body: Vec<Statement<'a>>,
    pub location: Location,
}

// ============================================================================
// Compound statements
// ============================================================================

/// `if`/`elif` chains nest: an `elif` is an `If` alone in `orelse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If<'a> {
    pub test: Expression<'a>,
    pub body: Vec<Statement<'a>>,
    pub orelse: Vec<Statement<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct For<'a> {
    pub is_async: bool,
    pub target: Expression<'a>,
    pub iter: Expression<'a>,
    pub body: Vec<Statement<'a>>,
    pub orelse: Vec<Statement<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct While<'a> {
    pub test: Expression<'a>,
    pub body: Vec<Statement<'a>>,
    pub orelse: Vec<Statement<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct With<'a> {
    pub is_async: bool,
    /// The context managers, as written.
    pub items: &'a str,
    pub body: Vec<Statement<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptHandler<'a> {
    pub kind: Option<Expression<'a>>,
    pub name: Option<&'a str>,
    pub body: Vec<Statement<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Try<'a> {
    pub body: Vec<Statement<'a>>,
    pub handlers: Vec<ExceptHandler<'a>>,
    pub orelse: Vec<Statement<'a>>,
    pub finalbody: Vec<Statement<'a>>,
    /// `except*` handlers.
    pub is_star: bool,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCase<'a> {
    pub pattern: &'a str,
    pub guard: Option<Expression<'a>>,
    pub body: Vec<Statement<'a>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a> {
    pub subject: Expression<'a>,
    pub cases: Vec<MatchCase<'a>>,
    pub location: Location,
}
