//! The analyzer façade: one unit of source in, every record out.
//!
//! Two independent passes run over the same text:
//!
//! 1. The [`DeclarationWalker`] visits the structural syntax tree and
//!    collects comments, annotations, ordering, finals and overloads.
//! 2. The [`DefinitionLocator`](crate::locator::DefinitionLocator) follows
//!    the raw tokens and collects definition line spans.
//!
//! They share nothing but the qualified-name scheme.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::locator::{locate_definitions, DefinitionSpan};
use crate::options::AnalyzerOptions;
use crate::qualname::{QualName, ScopedName};
use crate::signature::Signature;
use crate::text::prepare_source;
use crate::walker::{DeclarationRecords, DeclarationWalker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStatus {
    Complete,
    /// The source could not be parsed; every map is empty.
    Unavailable { reason: AnalysisError },
}

/// Everything recovered from one unit of source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub status: AnalysisStatus,
    pub comments: BTreeMap<ScopedName, String>,
    pub annotations: BTreeMap<ScopedName, String>,
    pub definitions: BTreeMap<QualName, DefinitionSpan>,
    pub order: BTreeMap<QualName, usize>,
    pub finals: BTreeSet<QualName>,
    pub overloads: BTreeMap<QualName, Vec<Signature>>,
}

impl Analysis {
    fn unavailable(reason: AnalysisError) -> Self {
        Analysis {
            status: AnalysisStatus::Unavailable { reason },
            comments: BTreeMap::new(),
            annotations: BTreeMap::new(),
            definitions: BTreeMap::new(),
            order: BTreeMap::new(),
            finals: BTreeSet::new(),
            overloads: BTreeMap::new(),
        }
    }

    fn from_records(
        records: DeclarationRecords,
        definitions: BTreeMap<QualName, DefinitionSpan>,
    ) -> Self {
        Analysis {
            status: AnalysisStatus::Complete,
            comments: records.comments,
            annotations: records.annotations,
            definitions,
            order: records.order,
            finals: records.finals,
            overloads: records.overloads,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }

    /// The documentation comment of `name` in `scope` (dotted, `""` for the
    /// module).
    pub fn comment(&self, scope: &str, name: &str) -> Option<&str> {
        let key = ScopedName::new(QualName::from_dotted(scope), name);
        self.comments.get(&key).map(String::as_str)
    }

    pub fn annotation(&self, scope: &str, name: &str) -> Option<&str> {
        let key = ScopedName::new(QualName::from_dotted(scope), name);
        self.annotations.get(&key).map(String::as_str)
    }

    pub fn definition(&self, qualname: &str) -> Option<&DefinitionSpan> {
        self.definitions.get(&QualName::from_dotted(qualname))
    }

    pub fn order_of(&self, qualname: &str) -> Option<usize> {
        self.order.get(&QualName::from_dotted(qualname)).copied()
    }

    pub fn is_final(&self, qualname: &str) -> bool {
        self.finals.contains(&QualName::from_dotted(qualname))
    }

    pub fn overloads_of(&self, qualname: &str) -> &[Signature] {
        self.overloads
            .get(&QualName::from_dotted(qualname))
            .map_or(&[], Vec::as_slice)
    }
}

/// Single-use analyzer for one unit of source.
///
/// # Example
///
/// ```
/// use docscan::{Analyzer, AnalyzerOptions};
///
/// let analysis = Analyzer::new("x = 1  #: the answer\n")
///     .with_options(AnalyzerOptions::new().with_line_offset(4))
///     .run();
/// assert_eq!(analysis.comment("", "x"), Some("the answer"));
/// ```
pub struct Analyzer<'s> {
    source: &'s str,
    options: AnalyzerOptions,
}

impl<'s> Analyzer<'s> {
    pub fn new(source: &'s str) -> Self {
        Analyzer {
            source,
            options: AnalyzerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalyzerOptions) -> Self {
        self.options = options;
        self
    }

    /// Analyze the source. Unparseable source yields an
    /// [`AnalysisStatus::Unavailable`] analysis with empty maps.
    pub fn run(self) -> Analysis {
        match self.try_run() {
            Ok(analysis) => analysis,
            Err(reason) => {
                warn!(%reason, "analysis unavailable");
                Analysis::unavailable(reason)
            }
        }
    }

    /// Analyze the source, returning parse failures as errors.
    pub fn try_run(self) -> Result<Analysis, AnalysisError> {
        let source = prepare_source(self.source);
        let module = match docscan_cst::parse_module(&source) {
            Ok(module) => module,
            Err(err) => {
                let reason = AnalysisError::from(&err);
                debug!("{}", docscan_cst::prettify_error(err, "source"));
                return Err(reason);
            }
        };
        let records = DeclarationWalker::new(&module, &self.options.comment_marker).walk();
        debug!(
            comments = records.comments.len(),
            annotations = records.annotations.len(),
            entries = records.order.len(),
            "declarations collected"
        );

        let offset = self.options.line_offset;
        let definitions: BTreeMap<QualName, DefinitionSpan> = locate_definitions(&source)
            .into_iter()
            .map(|(name, span)| (name, span.shifted(offset)))
            .collect();
        debug!(definitions = definitions.len(), "definitions located");

        Ok(Analysis::from_records(records, definitions))
    }
}

/// Analyze `source` with default options.
pub fn analyze(source: &str) -> Analysis {
    Analyzer::new(source).run()
}

/// Analyze `source` with default options, returning parse failures as
/// errors.
pub fn try_analyze(source: &str) -> Result<Analysis, AnalysisError> {
    Analyzer::new(source).try_run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::DefinitionKind;

    #[test]
    fn test_unavailable_analysis_is_empty() {
        let analysis = analyze("def f(:\n");
        assert!(!analysis.is_complete());
        assert!(matches!(
            analysis.status,
            AnalysisStatus::Unavailable {
                reason: AnalysisError::Syntax { .. }
            }
        ));
        assert!(analysis.comments.is_empty());
        assert!(analysis.definitions.is_empty());
        assert!(analysis.order.is_empty());
        assert!(try_analyze("def f(:\n").is_err());
    }

    #[test]
    fn test_line_offset_shifts_definitions_only() {
        let source = "x = 1  #: doc\n\ndef f():\n    pass\n";
        let analysis = Analyzer::new(source)
            .with_options(AnalyzerOptions::new().with_line_offset(10))
            .run();
        let span = analysis.definition("f").copied();
        assert_eq!(
            span,
            Some(DefinitionSpan {
                kind: DefinitionKind::Function,
                start: 13,
                end: 14
            })
        );
        assert_eq!(analysis.comment("", "x"), Some("doc"));
        assert_eq!(analysis.order_of("f"), Some(1));
    }

    #[test]
    fn test_indented_unit_is_dedented() {
        let source = "    class Inner:\n        attr = 1  #: nested\n";
        let analysis = analyze(source);
        assert!(analysis.is_complete());
        assert_eq!(analysis.comment("Inner", "attr"), Some("nested"));
        assert_eq!(analysis.definition("Inner").map(|d| (d.start, d.end)), Some((1, 2)));
    }

    #[test]
    fn test_custom_marker() {
        let analysis = Analyzer::new("x = 1  #! doc\ny = 2  #: ignored\n")
            .with_options(AnalyzerOptions::new().with_comment_marker("#!"))
            .run();
        assert_eq!(analysis.comment("", "x"), Some("doc"));
        assert_eq!(analysis.comment("", "y"), None);
    }
}
