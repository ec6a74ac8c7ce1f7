//! Trailing documentation comments: `x = 1  #: the comment`.

use docscan_cst::{TokType, Token};

use crate::cursor::{closer_for, Stop, TokenCursor};

/// The marker that makes a comment a documentation comment.
pub const DEFAULT_COMMENT_MARKER: &str = "#:";

/// Picks up the documentation comment trailing an assignment.
///
/// The scanner is given the source starting at the assignment's first byte.
/// It skips the left-hand side, consumes the right-hand side and looks at
/// the token that ends it. Only the rest of the statement is tokenized.
pub struct TrailingCommentScanner<'a> {
    cursor: TokenCursor<'a>,
    marker: &'a str,
}

impl<'a> TrailingCommentScanner<'a> {
    pub fn new(statement: &'a str, marker: &'a str) -> Self {
        TrailingCommentScanner {
            cursor: TokenCursor::new(statement),
            marker,
        }
    }

    pub fn scan(mut self) -> Option<String> {
        if !self.skip_lvalue() {
            return None;
        }
        if self.fetch_rvalue().is_empty() {
            return None;
        }
        let terminator = self.cursor.current().copied()?;
        if terminator.kind == TokType::Comment {
            if let Some(body) = terminator.text.strip_prefix(self.marker) {
                return Some(body.trim().to_string());
            }
        }
        self.cursor.fetch_until(TokType::Newline);
        None
    }

    /// Skip to just past the top-level `=` that starts the value. Returns
    /// `false` when the statement ends first (an annotation without value).
    fn skip_lvalue(&mut self) -> bool {
        let mut annotated = false;
        loop {
            let is_separator = |tok: &Token<'_>| is_assignment_separator(tok, annotated);
            self.cursor.fetch_until(Stop::Predicate(&is_separator));
            match self.cursor.current() {
                Some(tok) if tok.is_op("=") => return true,
                Some(tok) if tok.is_op(":") => annotated = true,
                _ => return false,
            }
        }
    }

    /// Consume the right-hand side. The cursor is left on the token that
    /// ended it (or exhausted).
    fn fetch_rvalue(&mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.cursor.fetch_token() {
            if !token.kind.is_expression_part() || token.is_op(";") {
                break;
            }
            if matches!(token.text, ")" | "]" | "}") && token.kind == TokType::Op {
                break;
            }
            tokens.push(token);
            if closer_for(&token).is_some() {
                let group = self.cursor.fetch_group(token);
                tokens.extend(group.into_iter().skip(1));
            }
        }
        tokens
    }
}

fn is_assignment_separator(tok: &Token<'_>, annotated: bool) -> bool {
    match tok.kind {
        TokType::Op => tok.text == "=" || (!annotated && tok.text == ":"),
        TokType::Newline | TokType::EndMarker => true,
        _ => false,
    }
}

/// The documentation comment trailing the assignment at the start of
/// `statement`, if any.
pub fn scan_trailing_comment(statement: &str, marker: &str) -> Option<String> {
    TrailingCommentScanner::new(statement, marker).scan()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Option<String> {
        scan_trailing_comment(source, DEFAULT_COMMENT_MARKER)
    }

    #[test]
    fn test_simple_assignment() {
        assert_eq!(scan("x = 1  #: the answer\n"), Some("the answer".to_string()));
        assert_eq!(scan("x = 1  # plain comment\n"), None);
        assert_eq!(scan("x = 1\n#: next line\n"), None);
    }

    #[test]
    fn test_annotated_assignment() {
        assert_eq!(scan("x: int = 1  #: typed\n"), Some("typed".to_string()));
        assert_eq!(scan("x: int  #: no value\n"), None);
        assert_eq!(
            scan("x: dict[str, int] = {}  #: mapping\n"),
            Some("mapping".to_string())
        );
    }

    #[test]
    fn test_multiline_value() {
        let source = "x = {\n    'a': 1,\n    'b': (2, 3),\n}  #: a table\ny = 2\n";
        assert_eq!(scan(source), Some("a table".to_string()));
    }

    #[test]
    fn test_tuple_value() {
        assert_eq!(scan("a, b = 1, 2  #: pair\n"), Some("pair".to_string()));
        assert_eq!(
            scan("f = lambda x: x  #: identity\n"),
            Some("identity".to_string())
        );
    }

    #[test]
    fn test_semicolon_ends_value() {
        assert_eq!(scan("x = 1; y = 2  #: for y\n"), None);
    }

    #[test]
    fn test_value_ending_at_close_paren() {
        assert_eq!(scan("x = 1)  #: stray\n"), None);
    }

    #[test]
    fn test_custom_marker() {
        assert_eq!(
            scan_trailing_comment("x = 1  #! doc\n", "#!"),
            Some("doc".to_string())
        );
        assert_eq!(scan_trailing_comment("x = 1  #: doc\n", "#!"), None);
    }

    #[test]
    fn test_malformed_input_is_exhaustion() {
        assert_eq!(scan("x = (1,\n"), None);
        assert_eq!(scan("x"), None);
    }
}
