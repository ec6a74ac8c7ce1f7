// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Structural parsing tests: statement shapes, nesting, and syntax errors.

use docscan_cst::{parse_module, Expression, ParamKind, ParserError, Statement};

fn parse(source: &str) -> Vec<Statement<'_>> {
    parse_module(source).expect("parse error").body
}

/// The line and message of the grammar error `source` fails with.
fn syntax_error(source: &str) -> (usize, String) {
    match parse_module(source) {
        Err(err @ ParserError::ParserError(..)) => (err.line(), err.message()),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn test_assignment_shapes() {
    let source = "a = b = 1\nx: int = 2\ny: str\nz += 1\nself.attr, (p, q) = f()\n";
    let body = parse(source);
    assert_eq!(body.len(), 5);

    let Statement::Assign(chained) = &body[0] else {
        panic!("expected assign");
    };
    assert_eq!(chained.targets.len(), 2);

    let Statement::AnnAssign(annotated) = &body[1] else {
        panic!("expected annotated assign");
    };
    assert_eq!(annotated.annotation.text(source), "int");
    assert!(annotated.value.is_some());

    let Statement::AnnAssign(bare) = &body[2] else {
        panic!("expected annotated assign");
    };
    assert!(bare.value.is_none());

    assert!(matches!(body[3], Statement::AugAssign(_)));

    let Statement::Assign(unpacking) = &body[4] else {
        panic!("expected assign");
    };
    let Expression::Tuple(targets) = &unpacking.targets[0] else {
        panic!("expected tuple target");
    };
    assert!(matches!(targets.elements[0], Expression::Attribute(_)));
    assert!(matches!(targets.elements[1], Expression::Tuple(_)));
}

#[test]
fn test_type_comment() {
    let body = parse("x = []  # type: list[int]\ny = 1  # type: ignore\n");
    let Statement::Assign(first) = &body[0] else {
        panic!("expected assign");
    };
    assert_eq!(first.type_comment, Some("list[int]"));
    let Statement::Assign(second) = &body[1] else {
        panic!("expected assign");
    };
    assert_eq!(second.type_comment, None);
}

#[test]
fn test_semicolons_and_lambdas() {
    let body = parse("a = 1; b = 2;\nf = lambda x=1: x\nd = {'k': 1}\n");
    assert_eq!(body.len(), 4);
    let Statement::Assign(lambda) = &body[2] else {
        panic!("expected assign");
    };
    assert_eq!(lambda.targets.len(), 1);
    assert!(matches!(body[3], Statement::Assign(_)));
}

#[test]
fn test_function_signature() {
    let source = "async def f(a, /, b: int = 1, *args, c, d=2, **kw) -> str:\n    pass\n";
    let body = parse(source);
    let Statement::FunctionDef(func) = &body[0] else {
        panic!("expected function");
    };
    assert!(func.is_async);
    assert_eq!(func.name.value, "f");
    let kinds: Vec<ParamKind> = func.params.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ParamKind::PositionalOnly,
            ParamKind::Regular,
            ParamKind::VarArgs,
            ParamKind::KeywordOnly,
            ParamKind::KeywordOnly,
            ParamKind::KwArgs,
        ]
    );
    let b = &func.params.params[1];
    assert_eq!(b.annotation.as_ref().map(|e| e.text(source)), Some("int"));
    assert_eq!(b.default.as_ref().map(|e| e.text(source)), Some("1"));
    assert_eq!(func.returns.as_ref().map(|e| e.text(source)), Some("str"));
    assert_eq!(
        func.params.first_positional().map(|p| p.name.value),
        Some("a")
    );
}

#[test]
fn test_decorated_class_with_methods() {
    let source = "\
@dataclass(frozen=True)
class Point[T](Base, metaclass=Meta):
    '''A point.'''

    x: int = 0

    @property
    def norm(self): return 0
";
    let body = parse(source);
    let Statement::ClassDef(class) = &body[0] else {
        panic!("expected class");
    };
    assert_eq!(class.name.value, "Point");
    assert_eq!(class.decorators.len(), 1);
    assert_eq!(class.decorators[0].location.line, 1);
    assert_eq!(class.type_params, Some("T"));
    assert_eq!(class.bases, Some("Base, metaclass=Meta"));
    assert_eq!(class.location.line, 2);
    assert_eq!(class.body.len(), 3);
    assert!(matches!(&class.body[0], Statement::Expr(expr) if matches!(expr.value, Expression::String(_))));
    let Statement::FunctionDef(method) = &class.body[2] else {
        panic!("expected method");
    };
    assert_eq!(method.body.len(), 1);
    assert_eq!(method.decorators[0].expression.text(source), "property");
}

#[test]
fn test_compound_statements() {
    let source = "\
if a:
    x = 1
elif b:
    x = 2
else:
    x = 3
for i in range(3):
    pass
else:
    done = True
while cond: step()
with open(p) as fh, lock:
    data = fh.read()
try:
    import fast
except* ImportError as err:
    fast = None
else:
    ok = True
finally:
    cleanup()
match command:
    case [x, y] if x > y:
        pass
    case _:
        pass
";
    let body = parse(source);
    assert_eq!(body.len(), 6);

    let Statement::If(branch) = &body[0] else {
        panic!("expected if");
    };
    let Statement::If(elif) = &branch.orelse[0] else {
        panic!("expected elif");
    };
    assert_eq!(elif.orelse.len(), 1);

    let Statement::For(for_loop) = &body[1] else {
        panic!("expected for");
    };
    assert_eq!(for_loop.target.text(source), "i");
    assert_eq!(for_loop.orelse.len(), 1);

    assert!(matches!(&body[2], Statement::While(w) if w.body.len() == 1));

    let Statement::With(with) = &body[3] else {
        panic!("expected with");
    };
    assert_eq!(with.items, "open(p) as fh, lock");

    let Statement::Try(try_stmt) = &body[4] else {
        panic!("expected try");
    };
    assert!(try_stmt.is_star);
    assert_eq!(try_stmt.handlers.len(), 1);
    assert_eq!(try_stmt.handlers[0].name, Some("err"));
    assert_eq!(try_stmt.orelse.len(), 1);
    assert_eq!(try_stmt.finalbody.len(), 1);

    let Statement::Match(matcher) = &body[5] else {
        panic!("expected match");
    };
    assert_eq!(matcher.cases.len(), 2);
    assert_eq!(matcher.cases[0].pattern, "[x, y]");
    assert!(matcher.cases[0].guard.is_some());
}

#[test]
fn test_soft_keywords_as_names() {
    let body = parse("match = 1\ntype = 'x'\ncase = match\n");
    assert_eq!(body.len(), 3);
    assert!(body.iter().all(|stmt| matches!(stmt, Statement::Assign(_))));
}

#[test]
fn test_imports() {
    let body = parse("import os.path as osp, sys\nfrom ..pkg import (a, b as c,)\nfrom . import *\n");
    let Statement::Import(import) = &body[0] else {
        panic!("expected import");
    };
    assert_eq!(import.names[0].name, "os.path");
    assert_eq!(import.names[0].binding(), "osp");
    assert_eq!(import.names[1].binding(), "sys");

    let Statement::ImportFrom(from) = &body[1] else {
        panic!("expected import from");
    };
    assert_eq!(from.level, 2);
    assert_eq!(from.module.as_deref(), Some("pkg"));
    assert_eq!(from.names.len(), 2);
    assert_eq!(from.names[1].binding(), "c");

    let Statement::ImportFrom(star) = &body[2] else {
        panic!("expected import from");
    };
    assert_eq!(star.module, None);
    assert_eq!(star.names[0].name, "*");
}

#[test]
fn test_statement_locations() {
    let source = "x = 1\n\nclass A:\n    y = 2\n";
    let body = parse(source);
    assert_eq!(body[1].location().line, 3);
    let Statement::ClassDef(class) = &body[1] else {
        panic!("expected class");
    };
    let location = class.body[0].location();
    assert_eq!(location.line, 4);
    assert_eq!(location.column, 4);
    assert_eq!(&source[location.offset..location.offset + 5], "y = 2");
}

#[test]
fn test_syntax_errors() {
    assert_eq!(
        syntax_error("def f():\nreturn 1\n"),
        (2, "expected an indented block".to_string())
    );
    assert_eq!(syntax_error("def (x):\n    pass\n"), (1, "expected NAME".to_string()));

    let (line, _) = syntax_error("x = 1\n    y = 2\n");
    assert_eq!(line, 2);

    let (line, message) = syntax_error("if x\n    pass\n");
    assert_eq!(line, 1);
    assert!(message.contains(':'), "{message}");

    let (line, message) = syntax_error("@decorator\nx = 1\n");
    assert_eq!(line, 2);
    assert!(message.contains("def"), "{message}");

    let (line, _) = syntax_error("else:\n    pass\n");
    assert_eq!(line, 1);

    let (line, message) = syntax_error("try:\n    pass\nx = 1\n");
    assert_eq!(line, 3);
    assert!(message.contains("except or finally"), "{message}");

    let (line, _) = syntax_error("= 1\n");
    assert_eq!(line, 1);
}

#[test]
fn test_tokenizer_errors_are_not_grammar_errors() {
    let err = parse_module("x = (1,\n").expect_err("unclosed bracket");
    assert!(matches!(err, ParserError::TokenizerError(..)));
}
