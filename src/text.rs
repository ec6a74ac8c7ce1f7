//! Line and docstring text helpers.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// A blank line or a line holding nothing but a comment.
static EMPTY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t\x0c]*(?:#[^\r\n]*)?\r?\n?$").unwrap());

/// A comment-only line; group 1 is the comment text without the line break.
static COMMENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t\x0c]*(#[^\r\n]*)\r?\n?$").unwrap());

const TAB_SIZE: usize = 8;

/// Split `source` into physical lines, line breaks included. `\n`, `\r\n`
/// and a lone `\r` all end a line, matching the tokenizer's line numbering.
pub fn split_lines(source: &str) -> Vec<&str> {
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\n' => {
                lines.push(&source[start..=index]);
                start = index + 1;
            }
            b'\r' => {
                let end = if bytes.get(index + 1) == Some(&b'\n') {
                    index + 1
                } else {
                    index
                };
                lines.push(&source[start..=end]);
                start = end + 1;
                index = end;
            }
            _ => {}
        }
        index += 1;
    }
    if start < source.len() {
        lines.push(&source[start..]);
    }
    lines
}

pub fn is_empty_line(line: &str) -> bool {
    EMPTY_LINE.is_match(line)
}

/// If `line` is a documentation comment line starting with `marker`, return
/// its text with the marker and one following space removed.
pub fn doc_comment_body<'l>(line: &'l str, marker: &str) -> Option<&'l str> {
    let comment = COMMENT_LINE.captures(line)?.get(1)?.as_str();
    let body = comment.strip_prefix(marker)?;
    Some(body.strip_prefix(' ').unwrap_or(body))
}

/// Replace tabs with spaces up to the next multiple of eight columns.
pub fn expand_tabs(line: &str) -> Cow<'_, str> {
    if !line.contains('\t') {
        return Cow::Borrowed(line);
    }
    let mut expanded = String::with_capacity(line.len() + 8);
    let mut column = 0;
    for ch in line.chars() {
        match ch {
            '\t' => {
                let width = TAB_SIZE - column % TAB_SIZE;
                expanded.push_str(&" ".repeat(width));
                column += width;
            }
            '\n' | '\r' => {
                expanded.push(ch);
                column = 0;
            }
            _ => {
                expanded.push(ch);
                column += 1;
            }
        }
    }
    Cow::Owned(expanded)
}

/// Skip the first `count` characters of `line`.
fn skip_chars(line: &str, count: usize) -> &str {
    match line.char_indices().nth(count) {
        Some((index, _)) => &line[index..],
        None => "",
    }
}

/// Remove common leading indentation from a docstring.
///
/// The first line is stripped on its own; the indentation of the remaining
/// non-blank lines determines how much is removed from each of them.
/// Leading and trailing blank lines are dropped.
pub fn dedent_docstring(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let expanded = expand_tabs(text);
    let lines: Vec<&str> = expanded.lines().collect();
    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().count() - line.trim_start().chars().count())
        .min()
        .unwrap_or(0);

    let mut result: Vec<&str> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first() {
        result.push(first.trim());
    }
    result.extend(
        lines
            .iter()
            .skip(1)
            .map(|line| skip_chars(line, indent).trim_end()),
    );
    while result.last().is_some_and(|line| line.is_empty()) {
        result.pop();
    }
    let leading = result.iter().take_while(|line| line.is_empty()).count();
    result[leading..].join("\n")
}

/// Prepare a unit of source for analysis: drop a byte order mark, turn form
/// feeds in leading indentation into spaces and, when every non-blank line
/// shares the same leading whitespace (a nested class body cut out of its
/// file), remove it.
pub fn prepare_source(source: &str) -> Cow<'_, str> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let source = indent_form_feeds_to_spaces(source);
    match dedent_source(&source) {
        Some(dedented) => Cow::Owned(dedented),
        None => source,
    }
}

/// Form feeds elsewhere in a line, string literals included, are kept.
fn indent_form_feeds_to_spaces(source: &str) -> Cow<'_, str> {
    if !source.contains('\x0c') {
        return Cow::Borrowed(source);
    }
    let mut result = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        let content = line.trim_start_matches([' ', '\t', '\x0c']);
        let indent = &line[..line.len() - content.len()];
        result.extend(indent.chars().map(|c| if c == '\x0c' { ' ' } else { c }));
        result.push_str(content);
    }
    Cow::Owned(result)
}

/// Strip whitespace common to every non-blank line, `None` if there is none.
fn dedent_source(source: &str) -> Option<String> {
    let lines = split_lines(source);
    let mut common: Option<&str> = None;
    for line in &lines {
        if line.trim().is_empty() {
            continue;
        }
        let content = line.trim_start_matches([' ', '\t']);
        let leading = &line[..line.len() - content.len()];
        common = Some(match common {
            None => leading,
            Some(prefix) => {
                let shared = prefix
                    .bytes()
                    .zip(leading.bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                &prefix[..shared]
            }
        });
        if common == Some("") {
            return None;
        }
    }
    let prefix = common?;
    let mut dedented = String::with_capacity(source.len());
    for line in lines {
        match line.strip_prefix(prefix) {
            Some(rest) => dedented.push_str(rest),
            None => dedented.push_str(line.trim_start_matches([' ', '\t'])),
        }
    }
    Some(dedented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a\n", "b\r\n", "c\r", "d"]);
        assert_eq!(split_lines("a\n"), vec!["a\n"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_empty_lines() {
        assert!(is_empty_line("\n"));
        assert!(is_empty_line("    # just a note\n"));
        assert!(is_empty_line(""));
        assert!(!is_empty_line("    x = 1\n"));
    }

    #[test]
    fn test_doc_comment_body() {
        assert_eq!(doc_comment_body("    #: the answer\n", "#:"), Some("the answer"));
        assert_eq!(doc_comment_body("#:  indented\r\n", "#:"), Some(" indented"));
        assert_eq!(doc_comment_body("#:\n", "#:"), Some(""));
        assert_eq!(doc_comment_body("# plain\n", "#:"), None);
        assert_eq!(doc_comment_body("x = 1  #: trailing\n", "#:"), None);
        assert_eq!(doc_comment_body("#! custom\n", "#!"), Some("custom"));
    }

    #[test]
    fn test_dedent_docstring() {
        assert_eq!(
            dedent_docstring("First line.\n\n    Indented body\n      more\n    "),
            "First line.\n\nIndented body\n  more"
        );
        assert_eq!(dedent_docstring("\n    only body\n"), "only body");
        assert_eq!(dedent_docstring("single"), "single");
        assert_eq!(dedent_docstring("a\n\tb"), "a\nb");
        assert_eq!(dedent_docstring(""), "");
    }

    #[test]
    fn test_prepare_source() {
        assert_eq!(
            prepare_source("    x = 1\n\n    def f():\n        pass\n"),
            "x = 1\n\ndef f():\n    pass\n"
        );
        assert_eq!(prepare_source("x = 1\n  y\n"), "x = 1\n  y\n");
        assert_eq!(prepare_source("\u{feff}\x0cx = 1\n"), "x = 1\n");
        assert!(matches!(prepare_source("x = 1\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_form_feeds_outside_indentation_are_kept() {
        assert_eq!(
            prepare_source("s = 'a\x0cb'\n\x0cclass A:\n    x = 1\x0c\n"),
            "s = 'a\x0cb'\n class A:\n    x = 1\x0c\n"
        );
        assert_eq!(
            prepare_source("    \x0cx = 1\n     y = 2\n"),
            "x = 1\ny = 2\n"
        );
    }
}
