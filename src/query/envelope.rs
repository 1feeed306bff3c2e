// SPDX-License-Identifier: PMPL-1.0-or-later

//! Result envelope returned for every executed goal

use crate::prolog::{EngineError, GoalError};
use crate::query::normalize::Substitution;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Why a query stopped early
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The goal text is not a well-formed query
    #[error("invalid goal: {0}")]
    GoalLoad(#[from] GoalError),

    /// An exception escaped the goal during resolution
    #[error("resolution failed: {0}")]
    Resolution(#[from] EngineError),

    /// The goal spent the engine's inference budget
    #[error("inference limit of {inferences} exceeded")]
    LimitExceeded { inferences: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SyntaxError,
    Error,
    LimitError,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::GoalLoad(_) => ErrorKind::SyntaxError,
            QueryError::Resolution(_) => ErrorKind::Error,
            QueryError::LimitExceeded { .. } => ErrorKind::LimitError,
        }
    }

    /// A narrower goal may succeed where this one hit the limit; other
    /// failures repeat identically
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::LimitExceeded { .. })
    }

    fn message(&self) -> &'static str {
        match self {
            QueryError::GoalLoad(_) => "Invalid goal",
            QueryError::Resolution(_) => "Error occurred",
            QueryError::LimitExceeded { .. } => "Limit Exceeded",
        }
    }

    /// Diagnostic text: reader error, thrown term or inference budget
    pub fn detail(&self) -> String {
        match self {
            QueryError::GoalLoad(err) => err.detail.clone(),
            QueryError::Resolution(err) => err.ball.clone(),
            QueryError::LimitExceeded { inferences } => format!("{} inferences", inferences),
        }
    }
}

impl Serialize for QueryError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("QueryError", 4)?;
        state.serialize_field("type", &self.kind())?;
        state.serialize_field("message", self.message())?;
        state.serialize_field("detail", &self.detail())?;
        state.serialize_field("retryable", &self.is_retryable())?;
        state.end()
    }
}

/// `{status, results, truncated?, error?}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub status: Status,
    /// Answers in engine order; on error, only those found before it
    pub results: Vec<Substitution>,
    /// More answers existed than the result cap allowed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

impl ResultEnvelope {
    pub fn ok(results: Vec<Substitution>, truncated: bool) -> Self {
        Self {
            status: Status::Ok,
            results,
            truncated,
            error: None,
        }
    }

    pub fn failed(error: QueryError, partial: Vec<Substitution>) -> Self {
        Self {
            status: Status::Error,
            results: partial,
            truncated: false,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
