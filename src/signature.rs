//! Call signatures of function definitions.
//!
//! A [`Signature`] keeps the parameters of a `def` with their annotation and
//! default text as written in the source. It renders in the familiar
//! introspection form:
//!
//! ```text
//! (a, /, b: int = 1, *args, c, **kw) -> str
//! ```

use std::fmt;

use docscan_cst::{FunctionDef, ParamKind};
use serde::Serialize;

/// One parameter of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    /// Annotation text (if present).
    pub annotation: Option<String>,
    /// Default value text (if present).
    pub default: Option<String>,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::VarArgs => write!(f, "*")?,
            ParamKind::KwArgs => write!(f, "**")?,
            _ => {}
        }
        write!(f, "{}", self.name)?;
        if let Some(annotation) = &self.annotation {
            write!(f, ": {annotation}")?;
        }
        match (&self.default, &self.annotation) {
            (Some(default), Some(_)) => write!(f, " = {default}"),
            (Some(default), None) => write!(f, "={default}"),
            (None, _) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signature {
    /// Parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Return annotation text (if present).
    pub return_annotation: Option<String>,
}

impl Signature {
    pub fn new(parameters: Vec<Parameter>, return_annotation: Option<String>) -> Self {
        Signature {
            parameters,
            return_annotation,
        }
    }

    /// Build the signature of `def`, whose spans refer to `source`.
    pub fn from_function(def: &FunctionDef<'_>, source: &str) -> Self {
        let parameters = def
            .params
            .iter()
            .map(|param| Parameter {
                name: param.name.value.to_string(),
                kind: param.kind,
                annotation: param.annotation.as_ref().map(|e| e.text(source).to_string()),
                default: param.default.as_ref().map(|e| e.text(source).to_string()),
            })
            .collect();
        let return_annotation = def.returns.as_ref().map(|e| e.text(source).to_string());
        Signature::new(parameters, return_annotation)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered: Vec<String> = Vec::with_capacity(self.parameters.len() + 2);
        let mut positional_only = false;
        let mut star_written = false;
        for param in &self.parameters {
            if positional_only && param.kind != ParamKind::PositionalOnly {
                rendered.push("/".to_string());
                positional_only = false;
            }
            match param.kind {
                ParamKind::PositionalOnly => positional_only = true,
                ParamKind::VarArgs => star_written = true,
                ParamKind::KeywordOnly if !star_written => {
                    rendered.push("*".to_string());
                    star_written = true;
                }
                _ => {}
            }
            rendered.push(param.to_string());
        }
        if positional_only {
            rendered.push("/".to_string());
        }

        write!(f, "({})", rendered.join(", "))?;
        if let Some(returns) = &self.return_annotation {
            write!(f, " -> {returns}")?;
        }
        Ok(())
    }
}
