//! Qualified names: the join key between the declaration walker and the
//! definition locator.

use std::fmt;

use serde::{Serialize, Serializer};

/// An ordered sequence of identifiers. The empty name is the module scope.
///
/// Qualified names order lexicographically by segment and display dotted
/// (`Outer.Inner.method`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualName(Vec<String>);

impl QualName {
    /// The module scope.
    pub fn root() -> Self {
        QualName(Vec::new())
    }

    pub fn new(segments: Vec<String>) -> Self {
        QualName(segments)
    }

    /// Parse dotted text. `""` is the module scope.
    pub fn from_dotted(text: &str) -> Self {
        if text.is_empty() {
            return QualName::root();
        }
        QualName(text.split('.').map(str::to_string).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for QualName {
    fn from(text: &str) -> Self {
        QualName::from_dotted(text)
    }
}

impl Serialize for QualName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A name recorded inside a scope: the key of the comment and annotation
/// maps. `scope` is empty at module level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopedName {
    pub scope: QualName,
    pub name: String,
}

impl ScopedName {
    pub fn new(scope: QualName, name: impl Into<String>) -> Self {
        ScopedName {
            scope,
            name: name.into(),
        }
    }
}

impl fmt::Display for ScopedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope.is_root() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.scope, self.name)
        }
    }
}
