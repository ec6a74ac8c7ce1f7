// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use peg::Parse;
use thiserror::Error;

use crate::parser::TokVec;
use crate::tokenizer::TokError;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParserError<'a> {
    #[error("tokenizer error: {0}")]
    TokenizerError(TokError, &'a str),
    #[error("parser error: {0}")]
    ParserError(
        peg::error::ParseError<<TokVec<'a> as Parse>::PositionRepr>,
        &'a str,
    ),
}

impl ParserError<'_> {
    /// The 1-based line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            ParserError::TokenizerError(err, _) => err.line(),
            ParserError::ParserError(err, _) => err.location.start_pos.line,
        }
    }

    /// The error message without the error-class prefix.
    pub fn message(&self) -> String {
        match self {
            ParserError::TokenizerError(err, _) => err.to_string(),
            ParserError::ParserError(err, _) => format!("expected {}", err.expected),
        }
    }
}
