//! docscan: recover documentation from Python source text.
//!
//! A documentation pipeline can introspect live objects, but some facts only
//! exist in the source: the `#:` comment next to a constant, the text of an
//! annotation, the exact lines a class spans, the order definitions appear
//! in. This crate recovers them.
//!
//! # Quick Start
//!
//! ```
//! let analysis = docscan::analyze("\
//! class Config:
//!     retries: int = 3  #: How often to retry.
//!
//!     def load(self):
//!         pass
//! ");
//! assert_eq!(analysis.comment("Config", "retries"), Some("How often to retry."));
//! assert_eq!(analysis.annotation("Config", "retries"), Some("int"));
//! assert_eq!(analysis.definition("Config.load").map(|d| (d.start, d.end)), Some((4, 5)));
//! ```

// Core data types
pub mod error;
pub mod options;
pub mod qualname;
pub mod signature;

// Text and token scanning
pub mod comment;
pub mod cursor;
pub mod text;

// Analysis passes
pub mod analyzer;
pub mod locator;
pub mod walker;

// JSON front door
pub mod output;

pub use analyzer::{analyze, try_analyze, Analysis, AnalysisStatus, Analyzer};
pub use error::{AnalysisError, DocscanError, OutputErrorCode};
pub use locator::{DefinitionKind, DefinitionSpan};
pub use options::AnalyzerOptions;
pub use qualname::{QualName, ScopedName};
pub use signature::{Parameter, Signature};
