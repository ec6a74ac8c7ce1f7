// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! PEG grammar for Python modules, run over the token stream.
//!
//! The grammar sees the tokens with non-logical newlines and comments
//! removed, except a comment that ends a logical line, which is kept so
//! assignments can pick up `# type:` annotations. Expressions are parsed
//! with full operator precedence, but only the shapes a consumer looks
//! inside (names, attribute chains, subscripts, calls, tuples, lists,
//! starred targets and strings) become nodes; every other expression is
//! kept as an [`Opaque`] source slice.

use std::fmt;

use peg::{Parse, ParseElem, RuleResult};

use crate::nodes::{
    AnnAssign, Assign, Attribute, AugAssign, Call, ClassDef, Decorator, ExceptHandler, Expr,
    Expression, For, FunctionDef, If, Import, ImportAlias, ImportFrom, Location, Match, MatchCase,
    Module, Name, Opaque, Param, ParamKind, Parameters, Sequence, Span, Starred, Statement,
    StringLiteral, Subscript, Try, While, With,
};
use crate::tokenizer::{Position, TokType, Token};

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

const AUGMENTED_OPERATORS: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "**=", ">>=", "<<=", "&=", "|=", "^=", "@=",
];

const SIMPLE_KEYWORDS: &[&str] = &[
    "pass", "break", "continue", "return", "raise", "global", "nonlocal", "del", "assert",
];

fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

// ============================================================================
// Token input
// ============================================================================

/// The token stream as the grammar sees it.
#[derive(Debug)]
pub struct TokVec<'a>(Vec<Token<'a>>);

impl<'a> From<Vec<Token<'a>>> for TokVec<'a> {
    fn from(tokens: Vec<Token<'a>>) -> Self {
        let mut kept = Vec::with_capacity(tokens.len());
        let mut iter = tokens.into_iter().peekable();
        while let Some(tok) = iter.next() {
            match tok.kind {
                TokType::Nl => {}
                TokType::Comment => {
                    if iter.peek().is_some_and(|next| next.kind == TokType::Newline) {
                        kept.push(tok);
                    }
                }
                _ => kept.push(tok),
            }
        }
        TokVec(kept)
    }
}

/// Where the grammar failed: the extent of the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLoc {
    pub start_pos: Position,
    pub end_pos: Position,
    /// Byte offset of the offending token.
    pub offset: usize,
}

impl fmt::Display for ParseLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.start_pos.fmt(f)
    }
}

impl Parse for TokVec<'_> {
    type PositionRepr = ParseLoc;

    fn start(&self) -> usize {
        0
    }

    fn is_eof(&self, pos: usize) -> bool {
        pos >= self.0.len()
    }

    fn position_repr(&self, pos: usize) -> Self::PositionRepr {
        match self.0.get(pos).or_else(|| self.0.last()) {
            Some(tok) => ParseLoc {
                start_pos: tok.start,
                end_pos: tok.end,
                offset: tok.start_offset,
            },
            None => ParseLoc {
                start_pos: Position::new(1, 0),
                end_pos: Position::new(1, 0),
                offset: 0,
            },
        }
    }
}

impl<'input, 'a> ParseElem<'input> for TokVec<'a> {
    type Element = Token<'a>;

    fn parse_elem(&'input self, pos: usize) -> RuleResult<Self::Element> {
        match self.0.get(pos) {
            Some(tok) => RuleResult::Matched(pos + 1, *tok),
            None => RuleResult::Failed,
        }
    }
}

// ============================================================================
// Grammar
// ============================================================================

peg::parser! {
    pub grammar python<'a>(source: &'a str) for TokVec<'a> {

        pub rule file() -> Module<'a>
            = body:statements()? tok(TokType::EndMarker, "end of file") {
                Module { body: body.unwrap_or_default(), source }
            }

        rule statements() -> Vec<Statement<'a>>
            = groups:statement()+ { groups.into_iter().flatten().collect() }

        rule statement() -> Vec<Statement<'a>>
            = c:compound_stmt() { vec![c] }
            / simple_stmts()

        // An indented block, or simple statements on the header line.
        rule block() -> Vec<Statement<'a>>
            = eol() tok(TokType::Indent, "an indented block") body:statements()
              tok(TokType::Dedent, "end of block") { body }
            / simple_stmts()

        // The end of a logical line, with the comment that closes it.
        rule eol() -> Option<Token<'a>>
            = c:tok(TokType::Comment, "comment")? tok(TokType::Newline, "NEWLINE") { c }

        // --------------------------------------------------------------------
        // Simple statements
        // --------------------------------------------------------------------

        rule simple_stmts() -> Vec<Statement<'a>>
            = first:simple_stmt() rest:(lit(";") s:simple_stmt() { s })* lit(";")? comment:eol() {
                let mut statements = Vec::with_capacity(rest.len() + 1);
                statements.push(first);
                statements.extend(rest);
                if let Some(Statement::Assign(assign)) = statements.last_mut() {
                    assign.type_comment = comment.as_ref().and_then(type_comment);
                }
                statements
            }

        rule simple_stmt() -> Statement<'a>
            = import_name()
            / import_from()
            / k:simple_keyword() statement_rest() { Statement::Simple(location(&k)) }
            / t:lit("type") name() type_params()? lit("=") expression() {
                Statement::Simple(location(&t))
            }
            / expression_stmt()

        rule simple_keyword() -> Token<'a>
            = [t] {?
                if t.kind == TokType::Name && SIMPLE_KEYWORDS.contains(&t.text) {
                    Ok(t)
                } else {
                    Err("statement")
                }
            }

        rule statement_rest() -> Vec<Span>
            = (g:group() { g } / !lit(";") p:plain() { p })*

        rule expression_stmt() -> Statement<'a>
            = y:yield_expr() { Statement::Expr(Expr { value: y.expr, location: y.start }) }
            / first:star_expressions() tail:assign_tail()? { assignment(first, tail) }

        rule assign_tail() -> AssignTail<'a>
            = lit(":") annotation:expression() value:(lit("=") v:assigned_value() { v.expr })? {
                AssignTail::Annotated(annotation.expr, value)
            }
            / targets:(lit("=") t:star_expressions() &lit("=") { t.expr })* lit("=") value:assigned_value() {
                AssignTail::Chained(targets, value.expr)
            }
            / op:augmented_operator() value:assigned_value() {
                AssignTail::Augmented(op.text, value.expr)
            }

        rule assigned_value() -> Operand<'a>
            = yield_expr()
            / star_expressions()

        rule augmented_operator() -> Token<'a>
            = [t] {?
                if t.kind == TokType::Op && AUGMENTED_OPERATORS.contains(&t.text) {
                    Ok(t)
                } else {
                    Err("augmented assignment")
                }
            }

        rule import_name() -> Statement<'a>
            = i:lit("import") names:dotted_as_name() ++ lit(",") {
                Statement::Import(Import { names, location: location(&i) })
            }

        rule dotted_as_name() -> ImportAlias<'a>
            = name:dotted_name() asname:(lit("as") n:name() { n.value })? {
                ImportAlias { name, asname }
            }

        rule dotted_name() -> String
            = parts:name() ++ lit(".") {
                parts.iter().map(|part| part.value).collect::<Vec<_>>().join(".")
            }

        rule import_from() -> Statement<'a>
            = f:lit("from") dots:import_dots()* module:dotted_name()? lit("import") names:import_targets() {?
                let level: usize = dots.iter().sum();
                if module.is_none() && level == 0 {
                    Err("module name")
                } else {
                    Ok(Statement::ImportFrom(ImportFrom { module, level, names, location: location(&f) }))
                }
            }

        rule import_dots() -> usize
            = lit(".") { 1 }
            / lit("...") { 3 }

        rule import_targets() -> Vec<ImportAlias<'a>>
            = lit("(") names:import_as_name() ++ lit(",") lit(",")? lit(")") { names }
            / lit("*") { vec![ImportAlias { name: "*".to_string(), asname: None }] }
            / names:import_as_name() ++ lit(",") { names }

        rule import_as_name() -> ImportAlias<'a>
            = n:name() asname:(lit("as") a:name() { a.value })? {
                ImportAlias { name: n.value.to_string(), asname }
            }

        // --------------------------------------------------------------------
        // Compound statements
        // --------------------------------------------------------------------

        rule compound_stmt() -> Statement<'a>
            = definition()
            / if_stmt()
            / while_stmt()
            / for_stmt()
            / with_stmt()
            / try_stmt()
            / match_stmt()

        rule definition() -> Statement<'a>
            = decorators:decorator()* f:function_def() {
                Statement::FunctionDef(FunctionDef { decorators, ..f })
            }
            / decorators:decorator()* c:class_def() {
                Statement::ClassDef(ClassDef { decorators, ..c })
            }

        rule decorator() -> Decorator<'a>
            = at:lit("@") e:named_expression() eol() {
                Decorator { expression: e.expr, location: location(&at) }
            }

        rule function_def() -> FunctionDef<'a>
            = a:lit("async")? d:lit("def") name:name() type_params:type_params()?
              lit("(") params:parameters() lit(")")
              returns:(lit("->") e:expression() { e.expr })? lit(":") body:block() {
                FunctionDef {
                    name,
                    is_async: a.is_some(),
                    decorators: Vec::new(),
                    type_params,
                    params,
                    returns,
                    body,
                    location: location(&a.unwrap_or(d)),
                }
            }

        rule parameters() -> Parameters<'a>
            = items:param_item() ** lit(",") lit(",")? { collect_parameters(items) }

        rule param_item() -> ParamItem<'a>
            = lit("/") { ParamItem::Slash }
            / lit("**") p:param() { ParamItem::KwArgs(p) }
            / lit("*") p:param()? { ParamItem::Star(p) }
            / p:param() { ParamItem::Plain(p) }

        rule param() -> Param<'a>
            = name:name()
              annotation:(lit(":") e:star_expression() { e.expr })?
              default:(lit("=") e:expression() { e.expr })? {
                Param { name, kind: ParamKind::Regular, annotation, default }
            }

        rule class_def() -> ClassDef<'a>
            = c:lit("class") name:name() type_params:type_params()?
              bases:(lit("(") i:inner() lit(")") { text_of(i, source) })? lit(":") body:block() {
                ClassDef {
                    name,
                    decorators: Vec::new(),
                    type_params,
                    bases,
                    body,
                    location: location(&c),
                }
            }

        // PEP 695 type parameters, as written between the brackets.
        rule type_params() -> &'a str
            = lit("[") i:inner() lit("]") { text_of(i, source) }

        rule if_stmt() -> Statement<'a>
            = i:lit("if") test:named_expression() lit(":") body:block() orelse:elif_tail() {
                Statement::If(If { test: test.expr, body, orelse, location: location(&i) })
            }

        rule elif_tail() -> Vec<Statement<'a>>
            = e:lit("elif") test:named_expression() lit(":") body:block() orelse:elif_tail() {
                vec![Statement::If(If { test: test.expr, body, orelse, location: location(&e) })]
            }
            / else_block()

        rule else_block() -> Vec<Statement<'a>>
            = body:(lit("else") lit(":") b:block() { b })? { body.unwrap_or_default() }

        rule while_stmt() -> Statement<'a>
            = w:lit("while") test:named_expression() lit(":") body:block() orelse:else_block() {
                Statement::While(While { test: test.expr, body, orelse, location: location(&w) })
            }

        rule for_stmt() -> Statement<'a>
            = a:lit("async")? f:lit("for") target:star_targets() lit("in") iter:star_expressions()
              lit(":") body:block() orelse:else_block() {
                Statement::For(For {
                    is_async: a.is_some(),
                    target: target.expr,
                    iter: iter.expr,
                    body,
                    orelse,
                    location: location(&a.unwrap_or(f)),
                })
            }

        rule with_stmt() -> Statement<'a>
            = a:lit("async")? w:lit("with") items:header_run() lit(":") body:block() {
                Statement::With(With {
                    is_async: a.is_some(),
                    items: items.slice(source),
                    body,
                    location: location(&a.unwrap_or(w)),
                })
            }

        rule try_stmt() -> Statement<'a>
            = t:lit("try") lit(":") body:block() handlers:except_block()* orelse:else_block()
              finalbody:finally_block()? {?
                if handlers.is_empty() && finalbody.is_none() {
                    Err("except or finally")
                } else {
                    let is_star = handlers.iter().any(|(_, star)| *star);
                    Ok(Statement::Try(Try {
                        body,
                        handlers: handlers.into_iter().map(|(handler, _)| handler).collect(),
                        orelse,
                        finalbody: finalbody.unwrap_or_default(),
                        is_star,
                        location: location(&t),
                    }))
                }
            }

        rule except_block() -> (ExceptHandler<'a>, bool)
            = e:lit("except") star:lit("*")? kind:star_expressions()?
              name:(lit("as") n:name() { n.value })? lit(":") body:block() {
                let handler = ExceptHandler {
                    kind: kind.map(|kind| kind.expr),
                    name,
                    body,
                    location: location(&e),
                };
                (handler, star.is_some())
            }

        rule finally_block() -> Vec<Statement<'a>>
            = lit("finally") lit(":") b:block() { b }

        rule match_stmt() -> Statement<'a>
            = m:lit("match") subject:star_expressions() lit(":") eol()
              tok(TokType::Indent, "an indented block") cases:case_block()+
              tok(TokType::Dedent, "end of block") {
                Statement::Match(Match { subject: subject.expr, cases, location: location(&m) })
            }

        rule case_block() -> MatchCase<'a>
            = c:lit("case") pattern:pattern_run()
              guard:(lit("if") g:named_expression() { g.expr })? lit(":") body:block() {
                MatchCase { pattern: pattern.slice(source), guard, body, location: location(&c) }
            }

        rule pattern_run() -> Span
            = parts:(g:group() { g } / !lit(":") !lit("if") p:plain() { p })+ {?
                join_spans(&parts).ok_or("pattern")
            }

        // A header whose contents are kept as text, up to its colon.
        rule header_run() -> Span
            = parts:(g:group() { g } / !lit(":") p:plain() { p })+ {?
                join_spans(&parts).ok_or("expression")
            }

        // --------------------------------------------------------------------
        // Expressions
        // --------------------------------------------------------------------

        rule star_expressions() -> Operand<'a>
            = first:star_expression() rest:(lit(",") e:star_expression() { e })* trailing:lit(",")? {
                Operand::sequence(first, rest, trailing)
            }

        rule star_expression() -> Operand<'a>
            = star:lit("*") e:bitwise_or() { Operand::starred(&star, e) }
            / expression()

        rule star_named_expression() -> Operand<'a>
            = star:lit("*") e:bitwise_or() { Operand::starred(&star, e) }
            / named_expression()

        rule named_expression() -> Operand<'a>
            = n:tok(TokType::Name, "NAME") lit(":=") e:expression() { Operand::prefixed(source, &n, e) }
            / expression()

        rule expression() -> Operand<'a>
            = lambdef()
            / body:disjunction() orelse:(lit("if") disjunction() lit("else") e:expression() { e })? {
                match orelse {
                    Some(orelse) => Operand::fold(source, body, vec![orelse]),
                    None => body,
                }
            }

        rule lambdef() -> Operand<'a>
            = l:lit("lambda") (g:group() { g } / !lit(":") p:plain() { p })* lit(":") body:expression() {
                Operand::prefixed(source, &l, body)
            }

        rule yield_expr() -> Operand<'a>
            = y:lit("yield") lit("from") e:expression() { Operand::prefixed(source, &y, e) }
            / y:lit("yield") e:star_expressions()? {
                match e {
                    Some(e) => Operand::prefixed(source, &y, e),
                    None => Operand::token(source, &y),
                }
            }

        rule disjunction() -> Operand<'a>
            = first:conjunction() rest:(lit("or") e:conjunction() { e })* {
                Operand::fold(source, first, rest)
            }

        rule conjunction() -> Operand<'a>
            = first:inversion() rest:(lit("and") e:inversion() { e })* {
                Operand::fold(source, first, rest)
            }

        rule inversion() -> Operand<'a>
            = n:lit("not") e:inversion() { Operand::prefixed(source, &n, e) }
            / comparison()

        rule comparison() -> Operand<'a>
            = first:bitwise_or() rest:(compare_op() e:bitwise_or() { e })* {
                Operand::fold(source, first, rest)
            }

        rule compare_op() -> Token<'a>
            = lit("==") / lit("!=") / lit("<=") / lit(">=") / lit("<") / lit(">")
            / n:lit("not") lit("in") { n }
            / lit("in")
            / i:lit("is") lit("not") { i }
            / lit("is")

        rule bitwise_or() -> Operand<'a>
            = first:bitwise_xor() rest:(lit("|") e:bitwise_xor() { e })* {
                Operand::fold(source, first, rest)
            }

        rule bitwise_xor() -> Operand<'a>
            = first:bitwise_and() rest:(lit("^") e:bitwise_and() { e })* {
                Operand::fold(source, first, rest)
            }

        rule bitwise_and() -> Operand<'a>
            = first:shift_expr() rest:(lit("&") e:shift_expr() { e })* {
                Operand::fold(source, first, rest)
            }

        rule shift_expr() -> Operand<'a>
            = first:sum() rest:((lit("<<") / lit(">>")) e:sum() { e })* {
                Operand::fold(source, first, rest)
            }

        rule sum() -> Operand<'a>
            = first:term() rest:((lit("+") / lit("-")) e:term() { e })* {
                Operand::fold(source, first, rest)
            }

        rule term() -> Operand<'a>
            = first:factor() rest:((lit("*") / lit("/") / lit("//") / lit("%") / lit("@")) e:factor() { e })* {
                Operand::fold(source, first, rest)
            }

        rule factor() -> Operand<'a>
            = op:(lit("+") / lit("-") / lit("~")) e:factor() { Operand::prefixed(source, &op, e) }
            / power()

        rule power() -> Operand<'a>
            = base:await_primary() exponent:(lit("**") e:factor() { e })? {
                match exponent {
                    Some(exponent) => Operand::fold(source, base, vec![exponent]),
                    None => base,
                }
            }

        rule await_primary() -> Operand<'a>
            = a:lit("await") e:primary() { Operand::prefixed(source, &a, e) }
            / primary()

        rule primary() -> Operand<'a>
            = a:atom() trailers:trailer()* { Operand::with_trailers(a, trailers) }

        rule trailer() -> Trailer<'a>
            = lit(".") n:name() { Trailer::Attribute(n) }
            / lit("[") i:inner() c:lit("]") { Trailer::Subscript(text_of(i, source), c.end_offset) }
            / lit("(") i:inner() c:lit(")") { Trailer::Call(text_of(i, source), c.end_offset) }

        rule atom() -> Operand<'a>
            = n:tok(TokType::Name, "NAME") {?
                match n.text {
                    "None" | "True" | "False" => Ok(Operand::token(source, &n)),
                    text if is_keyword(text) => Err("expression"),
                    _ => Ok(Operand::new(Expression::Name(Name::from_token(&n)), location(&n))),
                }
            }
            / parts:tok(TokType::String, "STRING")+ {
                let start = parts.first().map(location).unwrap_or_default();
                Operand::new(Expression::String(StringLiteral::from_tokens(&parts)), start)
            }
            / n:tok(TokType::Number, "NUMBER") { Operand::token(source, &n) }
            / e:lit("...") { Operand::token(source, &e) }
            / paren_atom()
            / list_atom()
            / o:lit("{") inner() c:lit("}") { Operand::enclosed(source, &o, &c) }

        rule paren_atom() -> Operand<'a>
            = o:lit("(") c:lit(")") {
                Operand::display(Vec::new(), &o, &c, Expression::Tuple)
            }
            / o:lit("(") y:yield_expr() c:lit(")") { y.parenthesized(&o, &c) }
            / o:lit("(") first:star_named_expression() tail:items_tail() c:lit(")") {
                match tail {
                    ItemsTail::Comprehension => Operand::enclosed(source, &o, &c),
                    ItemsTail::Items(rest, None) if rest.is_empty() => first.parenthesized(&o, &c),
                    ItemsTail::Items(rest, _) => {
                        let elements = std::iter::once(first).chain(rest).map(|e| e.expr).collect();
                        Operand::display(elements, &o, &c, Expression::Tuple)
                    }
                }
            }
            / o:lit("(") inner() c:lit(")") { Operand::enclosed(source, &o, &c) }

        rule list_atom() -> Operand<'a>
            = o:lit("[") c:lit("]") {
                Operand::display(Vec::new(), &o, &c, Expression::List)
            }
            / o:lit("[") first:star_named_expression() tail:items_tail() c:lit("]") {
                match tail {
                    ItemsTail::Comprehension => Operand::enclosed(source, &o, &c),
                    ItemsTail::Items(rest, _) => {
                        let elements = std::iter::once(first).chain(rest).map(|e| e.expr).collect();
                        Operand::display(elements, &o, &c, Expression::List)
                    }
                }
            }
            / o:lit("[") inner() c:lit("]") { Operand::enclosed(source, &o, &c) }

        rule items_tail() -> ItemsTail<'a>
            = comp_for() { ItemsTail::Comprehension }
            / rest:(lit(",") e:star_named_expression() { e })* trailing:lit(",")? {
                ItemsTail::Items(rest, trailing)
            }

        rule comp_for() -> Vec<Operand<'a>>
            = comp_clause()+

        rule comp_clause() -> Operand<'a>
            = lit("async")? lit("for") star_targets() lit("in") iter:disjunction()
              (lit("if") c:disjunction() { c })* { iter }

        rule star_targets() -> Operand<'a>
            = first:star_target() rest:(lit(",") e:star_target() { e })* trailing:lit(",")? {
                Operand::sequence(first, rest, trailing)
            }

        rule star_target() -> Operand<'a>
            = star:lit("*") t:star_target() { Operand::starred(&star, t) }
            / primary()

        // --------------------------------------------------------------------
        // Tokens
        // --------------------------------------------------------------------

        // The contents of a bracket pair, as a span over its tokens.
        rule inner() -> Option<Span>
            = parts:(g:group() { g } / p:plain() { p })* { join_spans(&parts) }

        rule group() -> Span
            = o:lit("(") inner() c:lit(")") { Span::new(o.start_offset, c.end_offset) }
            / o:lit("[") inner() c:lit("]") { Span::new(o.start_offset, c.end_offset) }
            / o:lit("{") inner() c:lit("}") { Span::new(o.start_offset, c.end_offset) }

        // Any expression-level token other than a bracket.
        rule plain() -> Span
            = [t] {?
                if t.kind.is_expression_part() && !is_opener(&t) && !is_closer(&t) {
                    Ok(token_span(&t))
                } else {
                    Err("token")
                }
            }

        rule name() -> Name<'a>
            = [t] {?
                if t.kind == TokType::Name && !is_keyword(t.text) {
                    Ok(Name::from_token(&t))
                } else {
                    Err("NAME")
                }
            }

        rule lit(lit: &'static str) -> Token<'a>
            = [t] {?
                if t.kind != TokType::String && t.text == lit { Ok(t) } else { Err(lit) }
            }

        rule tok(kind: TokType, err: &'static str) -> Token<'a>
            = [t] {? if t.kind == kind { Ok(t) } else { Err(err) } }
    }
}

// ============================================================================
// Node construction
// ============================================================================

/// An expression with the source extent it was parsed from, enclosing
/// parentheses included, and where that extent starts.
#[derive(Debug, Clone)]
struct Operand<'a> {
    expr: Expression<'a>,
    span: Span,
    start: Location,
}

impl<'a> Operand<'a> {
    fn new(expr: Expression<'a>, start: Location) -> Self {
        let span = expr.span();
        Operand { expr, span, start }
    }

    fn opaque(source: &'a str, span: Span, start: Location) -> Self {
        let expr = Expression::Other(Opaque {
            text: span.slice(source),
            span,
        });
        Operand::new(expr, start)
    }

    fn token(source: &'a str, tok: &Token<'a>) -> Self {
        Operand::opaque(source, token_span(tok), location(tok))
    }

    /// `tok` followed by `operand`, as in `not x` or `await f()`.
    fn prefixed(source: &'a str, tok: &Token<'a>, operand: Operand<'a>) -> Self {
        let span = Span::new(tok.start_offset, operand.span.end);
        Operand::opaque(source, span, location(tok))
    }

    /// A bracketed display whose contents are not modelled.
    fn enclosed(source: &'a str, open: &Token<'a>, close: &Token<'a>) -> Self {
        let span = Span::new(open.start_offset, close.end_offset);
        Operand::opaque(source, span, location(open))
    }

    /// A parenthesized tuple or a list display.
    fn display<F>(elements: Vec<Expression<'a>>, open: &Token<'a>, close: &Token<'a>, wrap: F) -> Self
    where
        F: FnOnce(Sequence<'a>) -> Expression<'a>,
    {
        let span = Span::new(open.start_offset, close.end_offset);
        let expr = wrap(Sequence {
            elements,
            parenthesized: true,
            span,
        });
        Operand::new(expr, location(open))
    }

    fn parenthesized(self, open: &Token<'a>, close: &Token<'a>) -> Self {
        Operand {
            span: Span::new(open.start_offset, close.end_offset),
            start: location(open),
            ..self
        }
    }

    fn starred(star: &Token<'a>, operand: Operand<'a>) -> Self {
        let span = Span::new(star.start_offset, operand.span.end);
        let expr = Expression::Starred(Box::new(Starred {
            value: operand.expr,
            span,
        }));
        Operand::new(expr, location(star))
    }

    /// Operands joined by operators; a lone operand is returned as is.
    fn fold(source: &'a str, first: Operand<'a>, rest: Vec<Operand<'a>>) -> Self {
        let Some(end) = rest.last().map(|operand| operand.span.end) else {
            return first;
        };
        Operand::opaque(source, Span::new(first.span.start, end), first.start)
    }

    /// Comma-separated operands; a lone operand without a comma is
    /// returned as is.
    fn sequence(first: Operand<'a>, rest: Vec<Operand<'a>>, trailing: Option<Token<'a>>) -> Self {
        if rest.is_empty() && trailing.is_none() {
            return first;
        }
        let start = first.start;
        let begin = first.span.start;
        let end = match (trailing, rest.last()) {
            (Some(comma), _) => comma.end_offset,
            (None, Some(last)) => last.span.end,
            (None, None) => first.span.end,
        };
        let span = Span::new(begin, end);
        let elements = std::iter::once(first).chain(rest).map(|e| e.expr).collect();
        let expr = Expression::Tuple(Sequence {
            elements,
            parenthesized: false,
            span,
        });
        Operand { expr, span, start }
    }

    fn with_trailers(atom: Operand<'a>, trailers: Vec<Trailer<'a>>) -> Self {
        trailers.into_iter().fold(atom, |operand, trailer| {
            let start = operand.span.start;
            let expr = match trailer {
                Trailer::Attribute(attr) => Expression::Attribute(Box::new(Attribute {
                    value: operand.expr,
                    attr,
                    span: Span::new(start, attr.span.end),
                })),
                Trailer::Subscript(slice, end) => Expression::Subscript(Box::new(Subscript {
                    value: operand.expr,
                    slice,
                    span: Span::new(start, end),
                })),
                Trailer::Call(args, end) => Expression::Call(Box::new(Call {
                    func: operand.expr,
                    args,
                    span: Span::new(start, end),
                })),
            };
            Operand::new(expr, operand.start)
        })
    }
}

/// `.name`, `[slice]` or `(args)`, with the bracket contents as text and
/// the offset just past the closing bracket.
enum Trailer<'a> {
    Attribute(Name<'a>),
    Subscript(&'a str, usize),
    Call(&'a str, usize),
}

/// What follows the first element inside a tuple or list display.
enum ItemsTail<'a> {
    Comprehension,
    Items(Vec<Operand<'a>>, Option<Token<'a>>),
}

/// What follows the leading expression of an expression statement.
enum AssignTail<'a> {
    Annotated(Expression<'a>, Option<Expression<'a>>),
    /// Further targets, then the value.
    Chained(Vec<Expression<'a>>, Expression<'a>),
    Augmented(&'a str, Expression<'a>),
}

fn assignment<'a>(first: Operand<'a>, tail: Option<AssignTail<'a>>) -> Statement<'a> {
    let location = first.start;
    match tail {
        None => Statement::Expr(Expr {
            value: first.expr,
            location,
        }),
        Some(AssignTail::Annotated(annotation, value)) => Statement::AnnAssign(AnnAssign {
            target: first.expr,
            annotation,
            value,
            location,
        }),
        Some(AssignTail::Chained(more, value)) => {
            let mut targets = Vec::with_capacity(more.len() + 1);
            targets.push(first.expr);
            targets.extend(more);
            Statement::Assign(Assign {
                targets,
                value,
                type_comment: None,
                location,
            })
        }
        Some(AssignTail::Augmented(operator, value)) => Statement::AugAssign(AugAssign {
            target: first.expr,
            operator,
            value,
            location,
        }),
    }
}

enum ParamItem<'a> {
    Slash,
    Star(Option<Param<'a>>),
    KwArgs(Param<'a>),
    Plain(Param<'a>),
}

fn collect_parameters(items: Vec<ParamItem<'_>>) -> Parameters<'_> {
    let mut params: Vec<Param<'_>> = Vec::with_capacity(items.len());
    let mut keyword_only = false;
    for item in items {
        match item {
            ParamItem::Slash => {
                for param in params.iter_mut() {
                    if param.kind == ParamKind::Regular {
                        param.kind = ParamKind::PositionalOnly;
                    }
                }
            }
            ParamItem::Star(param) => {
                keyword_only = true;
                if let Some(param) = param {
                    params.push(Param {
                        kind: ParamKind::VarArgs,
                        ..param
                    });
                }
            }
            ParamItem::KwArgs(param) => params.push(Param {
                kind: ParamKind::KwArgs,
                ..param
            }),
            ParamItem::Plain(param) => {
                let kind = if keyword_only {
                    ParamKind::KeywordOnly
                } else {
                    ParamKind::Regular
                };
                params.push(Param { kind, ..param });
            }
        }
    }
    Parameters { params }
}

fn location(tok: &Token<'_>) -> Location {
    Location {
        line: tok.start.line,
        column: tok.start.column,
        offset: tok.start_offset,
    }
}

fn token_span(tok: &Token<'_>) -> Span {
    Span::new(tok.start_offset, tok.end_offset)
}

fn join_spans(parts: &[Span]) -> Option<Span> {
    match (parts.first(), parts.last()) {
        (Some(first), Some(last)) => Some(Span::new(first.start, last.end)),
        _ => None,
    }
}

fn text_of(span: Option<Span>, source: &str) -> &str {
    span.map_or("", |span| span.slice(source))
}

fn is_opener(tok: &Token<'_>) -> bool {
    tok.kind == TokType::Op && matches!(tok.text, "(" | "[" | "{")
}

fn is_closer(tok: &Token<'_>) -> bool {
    tok.kind == TokType::Op && matches!(tok.text, ")" | "]" | "}")
}

/// The annotation carried by a `# type: T` comment. `# type: ignore` is not one.
fn type_comment<'a>(tok: &Token<'a>) -> Option<&'a str> {
    let body = tok.text.strip_prefix('#')?.trim_start();
    let annotation = body.strip_prefix("type:")?.trim();
    if annotation.is_empty() || annotation.starts_with("ignore") {
        None
    } else {
        Some(annotation)
    }
}
