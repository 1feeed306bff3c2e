// SPDX-License-Identifier: PMPL-1.0-or-later

//! Engine error types

use thiserror::Error;

/// Goal text that could not be read as a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct GoalError {
    /// Reader message, or the syntax error term raised by the engine
    pub detail: String,
}

impl GoalError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// An exception that escaped the goal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("uncaught exception: {ball}")]
pub struct EngineError {
    /// Canonical text of the thrown term
    pub ball: String,
}

/// Failure while loading a clause base
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsultError {
    #[error("line {line}: clause is missing its terminating '.'")]
    Unterminated { line: usize },

    #[error("line {line}: unclosed {what}")]
    Unclosed { what: &'static str, line: usize },

    #[error("line {line}: {detail}")]
    Syntax { detail: String, line: usize },
}
