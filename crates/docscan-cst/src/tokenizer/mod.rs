// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

mod core;

pub use self::core::{Position, TokConfig, TokError, TokState, TokType, Token, TokenIterator};
