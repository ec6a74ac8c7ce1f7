// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A Python tokenizer and structural syntax tree.
//!
//! # Overview
//!
//! - **Tokenizing**: [`tokenize`] produces the full token stream, comments and
//!   non-logical newlines included. [`tokenizer::TokenIterator`] produces the
//!   same stream lazily.
//! - **Parsing**: [`parse_module`] builds a [`Module`] whose statements are
//!   closed enums ([`Statement`], [`Expression`]) carrying source spans.
//! - **Diagnostics**: [`prettify_error`] renders a [`ParserError`] with the
//!   offending source lines.
//!
//! # Quick Start
//!
//! ```
//! use docscan_cst::{parse_module, Statement};
//!
//! let module = parse_module("x = 1  #: the answer\n").expect("parse error");
//! assert!(matches!(module.body[0], Statement::Assign(_)));
//! ```

use std::cmp::{max, min};

// ============================================================================
// Public modules and re-exports
// ============================================================================

pub mod tokenizer;
pub use tokenizer::{Position, TokConfig, TokError, TokType, Token};

mod nodes;
pub use nodes::*;

mod parser;
use parser::TokVec;
pub use parser::{ParseLoc, ParserError, Result};

// ============================================================================
// Entry points
// ============================================================================

/// Tokenizes Python source code into a vector of tokens ending with
/// [`TokType::EndMarker`].
pub fn tokenize(text: &str) -> Result<'_, Vec<Token<'_>>> {
    tokenizer::TokenIterator::new(text, &TokConfig::default())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| ParserError::TokenizerError(err, text))
}

/// Parses a Python module.
///
/// A leading byte order mark is skipped; spans in the returned tree refer to
/// [`Module::source`].
pub fn parse_module(module_text: &str) -> Result<'_, Module<'_>> {
    let text = module_text.strip_prefix('\u{feff}').unwrap_or(module_text);
    let tokens = tokenize(text)?;
    let tokvec = TokVec::from(tokens);
    parse_tokens(&tokvec, text)
}

fn parse_tokens<'a>(tokens: &TokVec<'a>, module_text: &'a str) -> Result<'a, Module<'a>> {
    parser::python::file(tokens, module_text)
        .map_err(|err| ParserError::ParserError(err, module_text))
}

// ============================================================================
// Error formatting
// ============================================================================

/// Returns the byte offset of the beginning of line `n` (1-indexed).
fn bol_offset(source: &str, n: i64) -> usize {
    if n <= 1 {
        return 0;
    }
    source
        .match_indices('\n')
        .nth((n - 2) as usize)
        .map(|(index, _)| index + 1)
        .unwrap_or_else(|| source.len())
}

/// Formats a parser error into a human-readable string with the relevant
/// source lines and the error location highlighted.
///
/// ```
/// use docscan_cst::{parse_module, prettify_error};
///
/// if let Err(e) = parse_module("def f(:\n    pass\n") {
///     let formatted = prettify_error(e, "example.py");
///     assert!(formatted.contains("example.py"));
/// }
/// ```
pub fn prettify_error(err: ParserError<'_>, label: &str) -> String {
    let (line, offset, module_text) = match &err {
        ParserError::ParserError(e, text) => (e.location.start_pos.line, Some(e.location.offset), *text),
        ParserError::TokenizerError(e, text) => (e.line(), None, *text),
    };
    use annotate_snippets::{Level, Renderer, Snippet};

    let context = 1;
    let line_start = max(1, line.saturating_sub(context));
    let start_offset = bol_offset(module_text, line as i64 - context as i64);
    let end_offset = bol_offset(module_text, line as i64 + context as i64 + 1);
    if start_offset >= end_offset {
        return format!("Parse error for {}: {}", label, err);
    }
    let source = &module_text[start_offset..end_offset];
    let start = match offset {
        Some(offset) => offset.saturating_sub(start_offset),
        None => bol_offset(module_text, line as i64) - start_offset,
    };
    let end = min(start + 1, source.len());
    let message = err.message();
    let rendered = Renderer::plain()
        .render(
            Level::Error.title(label).snippet(
                Snippet::source(source)
                    .line_start(line_start)
                    .fold(false)
                    .annotations(vec![Level::Error.span(start..end).label(&message)]),
            ),
        )
        .to_string();
    rendered
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tokenizer_error() {
        assert_eq!(
            parse_module("x = 'abc\n").err(),
            Some(ParserError::TokenizerError(
                TokError::UnterminatedString { line: 1 },
                "x = 'abc\n"
            ))
        );
    }

    #[test]
    fn test_bom_is_skipped() {
        let module = parse_module("\u{feff}x = 1\n").expect("parse");
        assert_eq!(module.source, "x = 1\n");
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn test_bol_offset() {
        let source = "a\nbb\nccc\n";
        assert_eq!(bol_offset(source, 1), 0);
        assert_eq!(bol_offset(source, 2), 2);
        assert_eq!(bol_offset(source, 3), 5);
        assert_eq!(bol_offset(source, 10), source.len());
    }

    #[test]
    fn test_prettify_error() {
        let err = parse_module("class A:\nx = 1\n").expect_err("missing block");
        assert_eq!(err.line(), 2);
        let rendered = prettify_error(err, "broken.py");
        assert!(rendered.contains("broken.py"));
        assert!(rendered.contains("expected an indented block"));
        assert!(rendered.contains("x = 1"));
    }
}
