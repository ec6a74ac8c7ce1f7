//! Error types and error code constants for docscan.
//!
//! ## Error Code Mapping
//!
//! Exit codes of the `docscan` binary:
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: File not found or unreadable
//! - `10`: Internal errors (bugs, unexpected state, output failures)

use std::fmt;

use docscan_cst::ParserError;
use thiserror::Error;

// ============================================================================
// Analysis Errors
// ============================================================================

/// Why a unit of source could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The structural parser rejected the source.
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },
}

impl From<&ParserError<'_>> for AnalysisError {
    fn from(err: &ParserError<'_>) -> Self {
        AnalysisError::Syntax {
            line: err.line(),
            message: err.message(),
        }
    }
}

impl From<ParserError<'_>> for AnalysisError {
    fn from(err: ParserError<'_>) -> Self {
        AnalysisError::from(&err)
    }
}

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// File not found or unreadable.
    FileError = 3,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// CLI Error Type
// ============================================================================

/// Error type for CLI output.
///
/// Every failure of the binary is converted to this type before being
/// rendered as a JSON error response.
#[derive(Debug, Error)]
pub enum DocscanError {
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

impl DocscanError {
    /// Classify a failure to read `path`.
    pub fn from_read_error(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            DocscanError::FileNotFound { path }
        } else {
            DocscanError::Io { path, source: err }
        }
    }
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&DocscanError> for OutputErrorCode {
    fn from(err: &DocscanError) -> Self {
        match err {
            DocscanError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            DocscanError::FileNotFound { .. } => OutputErrorCode::FileError,
            DocscanError::Io { .. } => OutputErrorCode::FileError,
            DocscanError::Output(_) => OutputErrorCode::InternalError,
        }
    }
}

impl From<DocscanError> for OutputErrorCode {
    fn from(err: DocscanError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Tests
// ============================================================================
