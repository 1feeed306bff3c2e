// SPDX-License-Identifier: PMPL-1.0-or-later

//! Embedded Prolog session built on Scryer Prolog
//!
//! Provides:
//! - **Engine**: a Scryer `Machine` with the clause file consulted and a
//!   small goal runner loaded next to it
//! - **Source splitting**: clause boundaries and load statistics for the
//!   clause file, checked before anything is consulted
//! - **Term text**: canonical, quoted rendering of answer terms
//!
//! Goals never reach Scryer's query parser directly. The goal text is passed
//! as a string to the runner, which reads it, applies the inference budget
//! and the unknown-procedure policy, and reports failures as exceptions.

pub mod engine;
pub mod error;
pub mod source;
pub mod term;

pub use self::engine::{Answer, Answers, ClauseStats, PredicateKey, PrologEngine, RawBindings};
pub use self::error::{ConsultError, EngineError, GoalError};
pub use self::term::Term;

use serde::{Deserialize, Serialize};

/// Inferences one goal may spend across all of its answers
pub const DEFAULT_INFERENCE_LIMIT: u64 = 1_000_000;

/// What a call to an undefined procedure does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// The call fails
    Fail,
    /// The call raises an existence error
    Error,
}

impl UnknownPolicy {
    fn as_atom(self) -> &'static str {
        match self {
            UnknownPolicy::Fail => "fail",
            UnknownPolicy::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub inference_limit: u64,
    pub unknown: UnknownPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            inference_limit: DEFAULT_INFERENCE_LIMIT,
            unknown: UnknownPolicy::Fail,
        }
    }
}
