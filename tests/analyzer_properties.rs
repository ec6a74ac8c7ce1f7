//! Behavioural properties of a full analysis.
//!
//! Each test feeds a small module through [`docscan::analyze`] and checks one
//! observable property of the resulting maps.

use docscan::{analyze, Analysis, Analyzer, AnalyzerOptions, DefinitionKind, QualName};

fn order_of(analysis: &Analysis, qualname: &str) -> usize {
    analysis
        .order_of(qualname)
        .unwrap_or_else(|| panic!("no order entry for {qualname}"))
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn trailing_comment_on_plain_assignment() {
    let analysis = analyze("x = 1  #: the comment\n");
    assert_eq!(analysis.comment("", "x"), Some("the comment"));
}

#[test]
fn annotation_without_value_has_no_comment() {
    let analysis = analyze("x: int\n");
    assert_eq!(analysis.comment("", "x"), None);
    assert_eq!(analysis.annotation("", "x"), Some("int"));
}

#[test]
fn nested_brackets_on_instance_attribute() {
    let analysis = analyze(
        "\
class Worker:
    def __init__(self, a, b, c, d):
        self.y = compute(a, (b, c), [d])  #: note
",
    );
    assert_eq!(analysis.comment("Worker", "y"), Some("note"));
}

#[test]
fn non_plain_target_is_skipped() {
    let analysis = analyze(
        "\
d = {}
d[0] = 'x'  #: not recorded
after = 2  #: still processed
",
    );
    assert_eq!(analysis.comments.len(), 1);
    assert_eq!(analysis.comment("", "after"), Some("still processed"));
    assert!(analysis.order_of("d[0]").is_none());
}

#[test]
fn starred_target_binds_no_name() {
    let analysis = analyze("a, *b = 1, 2, 3  #: doc\n");
    assert_eq!(analysis.comment("", "a"), Some("doc"));
    assert_eq!(analysis.comment("", "b"), None);
    assert!(analysis.order_of("b").is_none());
    assert_eq!(analysis.comments.len(), 1);
}

#[test]
fn comment_block_above_assignment() {
    let analysis = analyze(
        "\
#: Maximum number of connections.
#:
#: Zero disables the limit.
MAX = 10

#: ignored, trailing wins
MIN = 1  #: smallest value
",
    );
    assert_eq!(
        analysis.comment("", "MAX"),
        Some("Maximum number of connections.\n\nZero disables the limit.")
    );
    assert_eq!(analysis.comment("", "MIN"), Some("smallest value"));
}

#[test]
fn inline_comment_beats_docstring() {
    let analysis = analyze(
        "\
a = 1  #: inline
'''docstring'''
b = 2
'''
    Docstring for b.
'''
",
    );
    assert_eq!(analysis.comment("", "a"), Some("inline"));
    assert_eq!(analysis.comment("", "b"), Some("Docstring for b."));
}

#[test]
fn type_comment_is_an_annotation() {
    let analysis = analyze("x = 1  # type: int\ny = []  # type: ignore\n");
    assert_eq!(analysis.annotation("", "x"), Some("int"));
    assert_eq!(analysis.annotation("", "y"), None);
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn imports_take_part_in_order() {
    let analysis = analyze("import a\nb = 1\n");
    assert!(order_of(&analysis, "a") < order_of(&analysis, "b"));
}

#[test]
fn order_is_strictly_increasing_in_source_order() {
    let analysis = analyze(
        "\
from os import path as p
class A:
    x = 1
    def m(self): pass
def f(): pass
y = 2
",
    );
    let names = ["p", "A", "A.x", "A.m", "f", "y"];
    let indices: Vec<usize> = names.iter().map(|n| order_of(&analysis, n)).collect();
    assert!(indices.windows(2).all(|pair| pair[0] < pair[1]), "{indices:?}");
}

// ============================================================================
// Definitions
// ============================================================================

#[test]
fn method_span_inside_class_span() {
    let analysis = analyze(
        "\
class A:
    '''Doc.'''

    def method(self):
        return 1


other = 2
",
    );
    let class = analysis.definition("A").copied().expect("class span");
    let method = analysis.definition("A.method").copied().expect("method span");
    assert_eq!(class.kind, DefinitionKind::Class);
    assert!(class.end >= class.start);
    assert!(method.end >= method.start);
    assert!(class.contains(&method));
    assert_eq!((class.start, class.end), (1, 5));
    assert_eq!((method.start, method.end), (4, 5));
}

#[test]
fn decorator_shifts_start_line() {
    let analysis = analyze(
        "\
import functools

@functools.lru_cache(maxsize=None)
def cached(x):
    return x
",
    );
    let span = analysis.definition("cached").copied().expect("span");
    assert_eq!(span.start, 3);
    assert_eq!(span.end, 5);
}

#[test]
fn async_functions_are_tagged() {
    let analysis = analyze("async def fetch():\n    await go()\n");
    let span = analysis.definition("fetch").copied().expect("span");
    assert_eq!(span.kind, DefinitionKind::AsyncFunction);
}

// ============================================================================
// Exception handlers
// ============================================================================

#[test]
fn exception_handler_bodies_are_excluded() {
    let analysis = analyze(
        "\
try:
    fast = True  #: accelerated
except ImportError:
    fast = False  #: fallback
    slow: bool = True  #: handler only
    def helper(): pass
",
    );
    assert_eq!(analysis.comment("", "fast"), Some("accelerated"));
    assert_eq!(analysis.comment("", "slow"), None);
    assert_eq!(analysis.annotation("", "slow"), None);
    assert!(analysis.order_of("slow").is_none());
    assert!(analysis.order_of("helper").is_none());
    assert!(analysis.definition("helper").is_none());
}

#[test]
fn handler_definitions_have_no_spans() {
    let analysis = analyze(
        "try:\n    import x\nexcept ImportError:\n    def helper():\n        pass\n",
    );
    assert!(analysis.definition("helper").is_none());

    let analysis = analyze("try:\n    pass\nfinally:\n    class Cleanup:\n        pass\n");
    assert!(analysis.definition("Cleanup").is_none());
}

// ============================================================================
// Finals and overloads
// ============================================================================

#[test]
fn final_markers() {
    let analysis = analyze(
        "\
from typing import Final, final

@final
class A:
    LIMIT: Final = 3
    other: int = 4
",
    );
    assert!(analysis.is_final("A"));
    assert!(analysis.is_final("A.LIMIT"));
    assert!(!analysis.is_final("A.other"));
}

#[test]
fn overloads_in_declaration_order() {
    let analysis = analyze(
        "\
import typing

class Parser:
    @typing.overload
    def parse(self, data: bytes) -> bytes: ...
    @typing.overload
    def parse(self, data: str, *, strict: bool = False) -> str: ...
    def parse(self, data, *, strict=False):
        return data
",
    );
    let rendered: Vec<String> = analysis
        .overloads_of("Parser.parse")
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        rendered,
        vec![
            "(self, data: bytes) -> bytes",
            "(self, data: str, *, strict: bool = False) -> str",
        ]
    );
    let last = analysis.definition("Parser.parse").copied().expect("span");
    assert_eq!((last.start, last.end), (8, 9));
}

// ============================================================================
// Whole-analysis behaviour
// ============================================================================

#[test]
fn analysis_is_idempotent() {
    let source = "\
import os
x = 1  #: x
class A:
    y: int = 2  #: y
    def f(self):
        self.z = 3  #: z
";
    let first = analyze(source);
    let second = analyze(source);
    assert_eq!(first, second);
    assert_eq!(first.order, second.order);
}

#[test]
fn malformed_source_degrades_to_empty_maps() {
    let analysis = analyze("x = (1,\ny = 2  #: doc\n");
    assert!(!analysis.is_complete());
    assert!(analysis.comments.is_empty());
    assert!(analysis.definitions.is_empty());
}

#[test]
fn line_offset_applies_to_definitions() {
    let analysis = Analyzer::new("def f():\n    pass\n")
        .with_options(AnalyzerOptions::new().with_line_offset(99))
        .run();
    let span = analysis.definitions[&QualName::from("f")];
    assert_eq!((span.start, span.end), (100, 101));
}
