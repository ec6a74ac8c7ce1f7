//! Analyzer configuration.

use crate::comment::DEFAULT_COMMENT_MARKER;

/// Options for one analysis.
///
/// # Example
///
/// ```
/// use docscan::AnalyzerOptions;
///
/// let options = AnalyzerOptions::new().with_line_offset(10).with_comment_marker("#!");
/// assert_eq!(options.line_offset, 10);
/// assert_eq!(options.comment_marker, "#!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Added to every definition line. Used when the analyzed text is a
    /// slice of a larger file starting at line `line_offset + 1`.
    pub line_offset: usize,
    /// Prefix that makes a comment a documentation comment.
    pub comment_marker: String,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        AnalyzerOptions {
            line_offset: 0,
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
        }
    }
}

impl AnalyzerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_offset(mut self, line_offset: usize) -> Self {
        self.line_offset = line_offset;
        self
    }

    pub fn with_comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_marker = marker.into();
        self
    }
}
