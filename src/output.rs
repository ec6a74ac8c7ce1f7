//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Always JSON:** All CLI output is valid JSON (no mixed text/JSON)
//! 2. **Status first:** Every response has `status` as first field
//! 3. **Deterministic:** Same input -> same output (field order, array ordering)
//! 4. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::analyzer::{Analysis, AnalysisStatus};
use crate::error::{DocscanError, OutputErrorCode};
use crate::locator::DefinitionKind;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Entries
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentEntry {
    /// Dotted scope, `""` for the module.
    pub scope: String,
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationEntry {
    pub scope: String,
    pub name: String,
    pub annotation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefinitionEntry {
    pub qualname: String,
    pub kind: DefinitionKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderEntry {
    pub qualname: String,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverloadEntry {
    pub qualname: String,
    /// Rendered signatures in declaration order.
    pub signatures: Vec<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Response for one analyzed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Status: "ok" or "unavailable".
    pub status: String,
    pub schema_version: String,
    pub file: String,
    /// Why the analysis is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub comments: Vec<CommentEntry>,
    pub annotations: Vec<AnnotationEntry>,
    pub definitions: Vec<DefinitionEntry>,
    /// Sorted by index.
    pub order: Vec<OrderEntry>,
    pub finals: Vec<String>,
    pub overloads: Vec<OverloadEntry>,
}

impl AnalysisResponse {
    pub fn from_analysis(file: impl Into<String>, analysis: &Analysis) -> Self {
        let (status, reason) = match &analysis.status {
            AnalysisStatus::Complete => ("ok", None),
            AnalysisStatus::Unavailable { reason } => ("unavailable", Some(reason.to_string())),
        };

        let comments = analysis
            .comments
            .iter()
            .map(|(key, comment)| CommentEntry {
                scope: key.scope.to_string(),
                name: key.name.clone(),
                comment: comment.clone(),
            })
            .collect();
        let annotations = analysis
            .annotations
            .iter()
            .map(|(key, annotation)| AnnotationEntry {
                scope: key.scope.to_string(),
                name: key.name.clone(),
                annotation: annotation.clone(),
            })
            .collect();
        let definitions = analysis
            .definitions
            .iter()
            .map(|(qualname, span)| DefinitionEntry {
                qualname: qualname.to_string(),
                kind: span.kind,
                start: span.start,
                end: span.end,
            })
            .collect();
        let mut order: Vec<OrderEntry> = analysis
            .order
            .iter()
            .map(|(qualname, index)| OrderEntry {
                qualname: qualname.to_string(),
                index: *index,
            })
            .collect();
        order.sort_by_key(|entry| entry.index);
        let finals = analysis.finals.iter().map(ToString::to_string).collect();
        let overloads = analysis
            .overloads
            .iter()
            .map(|(qualname, signatures)| OverloadEntry {
                qualname: qualname.to_string(),
                signatures: signatures.iter().map(ToString::to_string).collect(),
            })
            .collect();

        AnalysisResponse {
            status: status.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            reason,
            comments,
            annotations,
            definitions,
            order,
            finals,
            overloads,
        }
    }
}

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code (also the exit code).
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn from_error(err: &DocscanError) -> Self {
        let details = match err {
            DocscanError::FileNotFound { path } | DocscanError::Io { path, .. } => {
                Some(serde_json::json!({ "path": path }))
            }
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &DocscanError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as JSON to a writer, pretty-printed unless `compact`.
pub fn emit_response<T: Serialize>(
    response: &T,
    writer: &mut impl Write,
    compact: bool,
) -> io::Result<()> {
    let json = if compact {
        serde_json::to_string(response)
    } else {
        serde_json::to_string_pretty(response)
    }
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
