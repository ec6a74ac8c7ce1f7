//! Declaration walker over the structural syntax tree.
//!
//! The walker visits statements in source order and records, for every
//! name bound by a plain assignment at module or class level (or on `self`
//! inside `__init__`):
//!
//! - its documentation comment (trailing `#:` comment, a `#:` block on the
//!   lines above, or an attribute docstring right after the assignment),
//! - its annotation text,
//! - the order of its first appearance.
//!
//! Class and function definitions take part in the ordering and are checked
//! for `final` and `overload` decorators.

use std::collections::{BTreeMap, BTreeSet};

use docscan_cst::{
    ClassDef, Decorator, Expression, FunctionDef, Import, ImportFrom, Location, Module, Statement,
};
use thiserror::Error;
use tracing::trace;

use crate::comment::scan_trailing_comment;
use crate::qualname::{QualName, ScopedName};
use crate::signature::Signature;
use crate::text::{dedent_docstring, doc_comment_body, split_lines};

/// Modules whose `final`, `Final` and `overload` members are recognized.
const TYPING_MODULES: &[&str] = &["typing", "typing_extensions"];

// ============================================================================
// Assignment targets
// ============================================================================

/// The assignment target does not bind a plain name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("assignment target does not bind a plain name")]
pub struct NotPlainAssignment;

/// Names bound by assigning to `target`.
///
/// `self_name` is the receiver of the enclosing function, if any. Inside a
/// function only attributes of the receiver count (`self.attr` binds
/// `attr`); at module and class level only bare names do. Starred targets
/// bind no plain name. Elements of a tuple or list target that bind nothing
/// are skipped.
pub fn lvar_names(
    target: &Expression<'_>,
    self_name: Option<&str>,
) -> Result<Vec<String>, NotPlainAssignment> {
    match target {
        Expression::Name(name) => match self_name {
            None => Ok(vec![name.value.to_string()]),
            Some(receiver) if receiver == name.value => Ok(vec![name.value.to_string()]),
            Some(_) => Err(NotPlainAssignment),
        },
        Expression::Attribute(attribute) => match (&attribute.value, self_name) {
            (Expression::Name(value), Some(receiver)) if value.value == receiver => {
                Ok(vec![attribute.attr.value.to_string()])
            }
            _ => Err(NotPlainAssignment),
        },
        Expression::Tuple(sequence) | Expression::List(sequence) => Ok(sequence
            .elements
            .iter()
            .filter_map(|element| lvar_names(element, self_name).ok())
            .flatten()
            .collect()),
        Expression::Starred(_)
        | Expression::Subscript(_)
        | Expression::Call(_)
        | Expression::String(_)
        | Expression::Other(_) => Err(NotPlainAssignment),
    }
}

// ============================================================================
// Records
// ============================================================================

/// What the walker found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationRecords {
    pub comments: BTreeMap<ScopedName, String>,
    pub annotations: BTreeMap<ScopedName, String>,
    pub order: BTreeMap<QualName, usize>,
    pub finals: BTreeSet<QualName>,
    pub overloads: BTreeMap<QualName, Vec<Signature>>,
}

/// Names bound to members of the typing modules by imports seen so far.
#[derive(Debug, Default)]
struct TypingAliases {
    /// Names bound to a typing module itself (`import typing as t`).
    modules: BTreeSet<String>,
    /// Names bound to `final` (the decorator).
    final_decorators: BTreeSet<String>,
    /// Names bound to `Final` (the annotation qualifier).
    final_qualifiers: BTreeSet<String>,
    overloads: BTreeSet<String>,
}

impl TypingAliases {
    fn import(&mut self, node: &Import<'_>) {
        for alias in &node.names {
            if TYPING_MODULES.contains(&alias.name.as_str()) {
                self.modules.insert(alias.binding().to_string());
            }
        }
    }

    fn import_from(&mut self, node: &ImportFrom<'_>) {
        let from_typing = node.level == 0
            && node
                .module
                .as_deref()
                .is_some_and(|module| TYPING_MODULES.contains(&module));
        if !from_typing {
            return;
        }
        for alias in &node.names {
            let set = match alias.name.as_str() {
                "final" => &mut self.final_decorators,
                "Final" => &mut self.final_qualifiers,
                "overload" => &mut self.overloads,
                _ => continue,
            };
            set.insert(alias.binding().to_string());
        }
    }

    /// Whether `text` names `member` through one of the recorded aliases.
    fn refers_to(&self, text: &str, member: &str, direct: &BTreeSet<String>) -> bool {
        if direct.contains(text) {
            return true;
        }
        match text.rsplit_once('.') {
            Some((module, name)) => name == member && self.modules.contains(module),
            None => false,
        }
    }

    fn is_final_decorator(&self, text: &str) -> bool {
        self.refers_to(text, "final", &self.final_decorators)
    }

    fn is_overload_decorator(&self, text: &str) -> bool {
        self.refers_to(text, "overload", &self.overloads)
    }

    /// `Final` and `Final[...]`, spelled any way the module can see it.
    fn is_final_qualifier(&self, annotation: &Expression<'_>, source: &str) -> bool {
        let head = match annotation {
            Expression::Subscript(subscript) => &subscript.value,
            other => other,
        };
        let text = head.text(source);
        let qualified = text
            .strip_suffix(".Final")
            .is_some_and(|module| TYPING_MODULES.contains(&module));
        if text == "Final" || qualified {
            return true;
        }
        self.refers_to(text, "Final", &self.final_qualifiers)
    }
}

// ============================================================================
// Walker
// ============================================================================

#[derive(Debug)]
struct FunctionFrame {
    /// First positional parameter, the receiver of a method.
    self_name: Option<String>,
    /// `__init__` of a class: `self.attr` assignments document the class.
    records_on_class: bool,
}

/// Mutable state of one walk.
struct WalkState<'t, 'a> {
    context: Vec<String>,
    classes: Vec<String>,
    function: Option<FunctionFrame>,
    previous: Option<&'t Statement<'a>>,
    counter: usize,
    typing: TypingAliases,
    records: DeclarationRecords,
}

impl<'t, 'a> WalkState<'t, 'a> {
    fn new() -> Self {
        WalkState {
            context: Vec::new(),
            classes: Vec::new(),
            function: None,
            previous: None,
            counter: 0,
            typing: TypingAliases::default(),
            records: DeclarationRecords::default(),
        }
    }

    fn self_name(&self) -> Option<&str> {
        self.function.as_ref().and_then(|frame| frame.self_name.as_deref())
    }

    /// The scope names are recorded in, or `None` when names in the current
    /// scope are not recorded.
    fn scope(&self) -> Option<&[String]> {
        match &self.function {
            None => Some(&self.context[..]),
            Some(frame) if frame.records_on_class => {
                Some(&self.context[..self.context.len().saturating_sub(1)])
            }
            Some(_) => None,
        }
    }

    fn qualname_for(&self, name: &str) -> Option<QualName> {
        let mut segments = self.scope()?.to_vec();
        segments.push(name.to_string());
        Some(QualName::new(segments))
    }

    fn scoped_for(&self, name: &str) -> Option<ScopedName> {
        let scope = QualName::new(self.scope()?.to_vec());
        Some(ScopedName::new(scope, name))
    }

    fn add_entry(&mut self, name: &str) {
        let Some(qualname) = self.qualname_for(name) else {
            return;
        };
        let counter = &mut self.counter;
        self.records.order.entry(qualname).or_insert_with(|| {
            let index = *counter;
            *counter += 1;
            index
        });
    }

    fn add_final_entry(&mut self, name: &str) {
        if let Some(qualname) = self.qualname_for(name) {
            self.records.finals.insert(qualname);
        }
    }

    fn add_comment(&mut self, name: &str, comment: String) {
        if let Some(key) = self.scoped_for(name) {
            self.records.comments.insert(key, comment);
        }
    }

    /// Store `comment` unless the name already has one.
    fn fill_comment(&mut self, name: &str, comment: String) {
        if let Some(key) = self.scoped_for(name) {
            self.records.comments.entry(key).or_insert(comment);
        }
    }

    fn add_annotation(&mut self, name: &str, annotation: &str) {
        if let Some(key) = self.scoped_for(name) {
            self.records.annotations.insert(key, annotation.to_string());
        }
    }
}

/// Where an assignment's annotation comes from.
enum AnnotationSource<'e, 'a> {
    Expression(&'e Expression<'a>),
    TypeComment(&'a str),
    None,
}

/// Walks a parsed module and collects [`DeclarationRecords`].
pub struct DeclarationWalker<'t, 'a> {
    module: &'t Module<'a>,
    lines: Vec<&'a str>,
    marker: &'t str,
}

impl<'t, 'a> DeclarationWalker<'t, 'a> {
    pub fn new(module: &'t Module<'a>, marker: &'t str) -> Self {
        DeclarationWalker {
            module,
            lines: split_lines(module.source),
            marker,
        }
    }

    pub fn walk(self) -> DeclarationRecords {
        let mut state = WalkState::new();
        self.visit_body(&mut state, &self.module.body);
        state.records
    }

    fn source(&self) -> &'a str {
        self.module.source
    }

    fn visit_body(&self, state: &mut WalkState<'t, 'a>, body: &'t [Statement<'a>]) {
        state.previous = None;
        for statement in body {
            self.visit(state, statement);
            state.previous = Some(statement);
        }
    }

    fn visit(&self, state: &mut WalkState<'t, 'a>, statement: &'t Statement<'a>) {
        match statement {
            Statement::Import(node) => {
                for alias in &node.names {
                    state.add_entry(alias.binding());
                }
                state.typing.import(node);
            }
            Statement::ImportFrom(node) => {
                for alias in &node.names {
                    state.add_entry(alias.binding());
                }
                state.typing.import_from(node);
            }
            Statement::Assign(node) => {
                let annotation = match node.type_comment {
                    Some(text) => AnnotationSource::TypeComment(text),
                    None => AnnotationSource::None,
                };
                let targets: Vec<&Expression<'a>> = node.targets.iter().collect();
                self.visit_assignment(state, &targets, annotation, node.location);
            }
            Statement::AnnAssign(node) => {
                let annotation = AnnotationSource::Expression(&node.annotation);
                self.visit_assignment(state, &[&node.target], annotation, node.location);
            }
            Statement::Expr(node) => self.visit_docstring(state, &node.value),
            Statement::ClassDef(node) => self.visit_class(state, node),
            Statement::FunctionDef(node) => self.visit_function(state, node),
            Statement::If(node) => {
                self.visit_body(state, &node.body);
                self.visit_body(state, &node.orelse);
            }
            Statement::For(node) => {
                self.visit_body(state, &node.body);
                self.visit_body(state, &node.orelse);
            }
            Statement::While(node) => {
                self.visit_body(state, &node.body);
                self.visit_body(state, &node.orelse);
            }
            Statement::With(node) => self.visit_body(state, &node.body),
            Statement::Match(node) => {
                for case in &node.cases {
                    self.visit_body(state, &case.body);
                }
            }
            // Handlers and `finally` describe failure paths, not declarations.
            Statement::Try(node) => {
                self.visit_body(state, &node.body);
                self.visit_body(state, &node.orelse);
            }
            Statement::AugAssign(_) | Statement::Simple(_) => {}
        }
    }

    fn visit_assignment(
        &self,
        state: &mut WalkState<'t, 'a>,
        targets: &[&Expression<'a>],
        annotation: AnnotationSource<'_, 'a>,
        location: Location,
    ) {
        let mut names = Vec::new();
        for target in targets {
            match lvar_names(target, state.self_name()) {
                Ok(found) => names.extend(found),
                Err(err) => {
                    trace!(line = location.line, %err, "skipping assignment");
                    return;
                }
            }
        }

        let source = self.source();
        match annotation {
            AnnotationSource::Expression(expr) => {
                let text = expr.text(source);
                let is_final = state.typing.is_final_qualifier(expr, source);
                for name in &names {
                    state.add_annotation(name, text);
                    if is_final {
                        state.add_final_entry(name);
                    }
                }
            }
            AnnotationSource::TypeComment(text) => {
                for name in &names {
                    state.add_annotation(name, text);
                }
            }
            AnnotationSource::None => {}
        }

        let statement = source.get(location.offset..).unwrap_or("");
        let comment = scan_trailing_comment(statement, self.marker)
            .or_else(|| self.comment_block_above(location));
        for name in &names {
            if let Some(comment) = &comment {
                state.add_comment(name, comment.clone());
            }
            state.add_entry(name);
        }
    }

    /// The `#:` lines directly above a statement that starts its line.
    fn comment_block_above(&self, location: Location) -> Option<String> {
        let line_start = location.offset.checked_sub(location.column)?;
        let indent = self.source().get(line_start..location.offset)?;
        if !indent.trim().is_empty() {
            return None;
        }

        let mut block: Vec<&str> = self
            .lines
            .get(..location.line.saturating_sub(1))?
            .iter()
            .rev()
            .map_while(|line| doc_comment_body(line, self.marker))
            .collect();
        if block.is_empty() {
            return None;
        }
        block.reverse();
        Some(dedent_docstring(&block.join("\n")))
    }

    /// A string statement right after an assignment documents its names.
    fn visit_docstring(&self, state: &mut WalkState<'t, 'a>, value: &Expression<'a>) {
        let Expression::String(literal) = value else {
            return;
        };
        if literal.is_bytes || literal.is_formatted {
            return;
        }
        let target = match state.previous {
            Some(Statement::Assign(assign)) => assign.targets.first(),
            Some(Statement::AnnAssign(ann)) => Some(&ann.target),
            _ => None,
        };
        let Some(target) = target else {
            return;
        };
        let Ok(names) = lvar_names(target, state.self_name()) else {
            return;
        };
        let docstring = dedent_docstring(&literal.value);
        for name in &names {
            state.fill_comment(name, docstring.clone());
            state.add_entry(name);
        }
    }

    fn has_decorator(
        &self,
        decorators: &[Decorator<'a>],
        matches: impl Fn(&str) -> bool,
    ) -> bool {
        decorators
            .iter()
            .any(|decorator| matches(decorator.expression.text(self.source())))
    }

    fn visit_class(&self, state: &mut WalkState<'t, 'a>, node: &'t ClassDef<'a>) {
        let name = node.name.value;
        state.add_entry(name);
        if self.has_decorator(&node.decorators, |text| state.typing.is_final_decorator(text)) {
            state.add_final_entry(name);
        }
        state.classes.push(name.to_string());
        state.context.push(name.to_string());
        self.visit_body(state, &node.body);
        state.context.pop();
        state.classes.pop();
    }

    fn visit_function(&self, state: &mut WalkState<'t, 'a>, node: &'t FunctionDef<'a>) {
        let name = node.name.value;
        if state.function.is_some() {
            trace!(name, "skipping nested function");
            return;
        }
        state.add_entry(name);
        if self.has_decorator(&node.decorators, |text| state.typing.is_final_decorator(text)) {
            state.add_final_entry(name);
        }
        if self.has_decorator(&node.decorators, |text| state.typing.is_overload_decorator(text)) {
            if let Some(qualname) = state.qualname_for(name) {
                let signature = Signature::from_function(node, self.source());
                state.records.overloads.entry(qualname).or_default().push(signature);
            }
        }

        state.function = Some(FunctionFrame {
            self_name: node
                .params
                .first_positional()
                .map(|param| param.name.value.to_string()),
            records_on_class: name == "__init__" && !state.classes.is_empty(),
        });
        state.context.push(name.to_string());
        self.visit_body(state, &node.body);
        state.context.pop();
        state.function = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_cst::parse_module;

    fn walk(source: &str) -> DeclarationRecords {
        let module = parse_module(source).expect("parse error");
        DeclarationWalker::new(&module, "#:").walk()
    }

    fn key(scope: &str, name: &str) -> ScopedName {
        ScopedName::new(QualName::from(scope), name)
    }

    fn target(source: &str) -> Expression<'_> {
        let module = parse_module(source).expect("parse error");
        match module.body.into_iter().next() {
            Some(Statement::Assign(assign)) => assign.targets.into_iter().next().expect("target"),
            other => panic!("expected an assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_lvar_names() {
        assert_eq!(lvar_names(&target("x = 1\n"), None), Ok(vec!["x".to_string()]));
        assert_eq!(
            lvar_names(&target("a, (b, *c) = v\n"), None),
            Ok(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(lvar_names(&target("*rest, = v\n"), None), Ok(Vec::new()));
        assert_eq!(
            lvar_names(&target("self.x = 1\n"), Some("self")),
            Ok(vec!["x".to_string()])
        );
        assert_eq!(lvar_names(&target("x = 1\n"), Some("self")), Err(NotPlainAssignment));
        assert_eq!(lvar_names(&target("other.x = 1\n"), Some("self")), Err(NotPlainAssignment));
        assert_eq!(lvar_names(&target("x[0] = 1\n"), None), Err(NotPlainAssignment));
        assert_eq!(
            lvar_names(&target("a, b[0] = 1, 2\n"), None),
            Ok(vec!["a".to_string()])
        );
    }

    #[test]
    fn test_comments_and_order() {
        let records = walk(
            "\
import os
x = 1  #: the answer
y = 2
#: first line
#: second line
z = 3
",
        );
        assert_eq!(records.comments[&key("", "x")], "the answer");
        assert_eq!(records.comments[&key("", "z")], "first line\nsecond line");
        assert!(!records.comments.contains_key(&key("", "y")));
        let order: Vec<(String, usize)> = records
            .order
            .iter()
            .map(|(name, index)| (name.to_string(), *index))
            .collect();
        assert_eq!(
            order,
            vec![
                ("os".to_string(), 0),
                ("x".to_string(), 1),
                ("y".to_string(), 2),
                ("z".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_trailing_comment_wins_over_block() {
        let records = walk("#: above\nx = 1  #: trailing\n");
        assert_eq!(records.comments[&key("", "x")], "trailing");
    }

    #[test]
    fn test_block_requires_statement_at_line_start() {
        let records = walk("#: above\nx = 1; y = 2\n");
        assert_eq!(records.comments[&key("", "x")], "above");
        assert!(!records.comments.contains_key(&key("", "y")));
    }

    #[test]
    fn test_docstring_fills_empty_slot() {
        let records = walk(
            "\
class A:
    a = 1
    '''Docstring for a.'''
    b = 2  #: comment for b
    '''Docstring for b.'''
",
        );
        assert_eq!(records.comments[&key("A", "a")], "Docstring for a.");
        assert_eq!(records.comments[&key("A", "b")], "comment for b");
    }

    #[test]
    fn test_instance_attributes() {
        let records = walk(
            "\
class A:
    def __init__(self, value):
        self.value = value  #: the value
        local = 1  #: not recorded
        self.other: int = 0

    def method(self):
        self.ignored = 1  #: not in __init__
",
        );
        assert_eq!(records.comments[&key("A", "value")], "the value");
        assert_eq!(records.annotations[&key("A", "other")], "int");
        assert_eq!(records.comments.len(), 1);
        assert!(records.order.contains_key(&QualName::from("A.__init__")));
        assert!(records.order.contains_key(&QualName::from("A.value")));
        assert!(!records.order.contains_key(&QualName::from("A.local")));
    }

    #[test]
    fn test_annotations_and_type_comments() {
        let records = walk("x: dict[str, int] = {}\ny = []  # type: list[str]\nz: int\n");
        assert_eq!(records.annotations[&key("", "x")], "dict[str, int]");
        assert_eq!(records.annotations[&key("", "y")], "list[str]");
        assert_eq!(records.annotations[&key("", "z")], "int");
    }

    #[test]
    fn test_finals() {
        let records = walk(
            "\
import typing
from typing import final, Final as F

@final
class A:
    x: F[int] = 1
    y: typing.Final = 2

    @typing.final
    def m(self): ...

@other.final
def f(): ...
",
        );
        let finals: Vec<String> = records.finals.iter().map(ToString::to_string).collect();
        assert_eq!(finals, vec!["A", "A.m", "A.x", "A.y"]);
    }

    #[test]
    fn test_final_decorator_requires_import() {
        let records = walk("@final\nclass A: pass\n");
        assert!(records.finals.is_empty());
    }

    #[test]
    fn test_overloads() {
        let records = walk(
            "\
from typing import overload

@overload
def f(x: int) -> int: ...
@overload
def f(x: str) -> str: ...
def f(x): return x
",
        );
        let signatures: Vec<String> = records.overloads[&QualName::from("f")]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(signatures, vec!["(x: int) -> int", "(x: str) -> str"]);
    }

    #[test]
    fn test_try_handlers_are_skipped() {
        let records = walk(
            "\
try:
    a = 1  #: tried
except ImportError:
    a = 2  #: fallback
    b = 3  #: only here
else:
    c = 4  #: else branch
finally:
    d = 5  #: cleanup
",
        );
        assert_eq!(records.comments[&key("", "a")], "tried");
        assert_eq!(records.comments[&key("", "c")], "else branch");
        assert!(!records.comments.contains_key(&key("", "b")));
        assert!(!records.comments.contains_key(&key("", "d")));
    }

    #[test]
    fn test_nested_functions_are_not_visited() {
        let records = walk("def f():\n    def g():\n        pass\n    x = 1  #: local\n");
        assert!(records.order.contains_key(&QualName::from("f")));
        assert!(!records.order.contains_key(&QualName::from("f.g")));
        assert!(records.comments.is_empty());
    }

    #[test]
    fn test_compound_bodies_are_visited() {
        let records = walk(
            "\
if DEBUG:
    level = 10  #: debug level
else:
    level = 20
for i in range(3):
    pass
with open(p) as fh:
    data = 1  #: data
",
        );
        assert_eq!(records.comments[&key("", "level")], "debug level");
        assert_eq!(records.comments[&key("", "data")], "data");
        assert!(!records.order.contains_key(&QualName::from("i")));
    }
}
