// SPDX-License-Identifier: PMPL-1.0-or-later

//! Query driver: load a goal and drain every answer

use crate::query::answer::{next_answer, Step};
use crate::query::envelope::{QueryError, ResultEnvelope};
use crate::query::Solver;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RESULTS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Stop draining after this many answers
    pub max_results: Option<usize>,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_results: Some(DEFAULT_MAX_RESULTS),
        }
    }
}

impl QueryLimits {
    pub fn unbounded() -> Self {
        Self { max_results: None }
    }

    /// Tighten the result cap with a caller-supplied one
    pub fn capped(self, requested: Option<usize>) -> Self {
        let max_results = match (self.max_results, requested) {
            (Some(max), Some(req)) => Some(max.min(req)),
            (None, req) => req,
            (max, None) => max,
        };
        Self { max_results }
    }
}

/// Execute `goal` against the session and collect all of its answers.
///
/// Answers keep engine order. A runtime error or an exceeded limit ends
/// the query with status `error`, keeping the answers found before it.
pub fn execute<S: Solver + ?Sized>(
    session: &mut S,
    goal: &str,
    limits: &QueryLimits,
) -> ResultEnvelope {
    let mut answers = match session.load_goal(goal) {
        Ok(answers) => answers,
        Err(err) => {
            warn!(goal, error = %err, "goal rejected");
            return ResultEnvelope::failed(QueryError::GoalLoad(err), Vec::new());
        }
    };

    let mut results = Vec::new();
    loop {
        match next_answer(&mut answers) {
            Step::Solution(substitution) => {
                if limits.max_results.is_some_and(|max| results.len() >= max) {
                    debug!(goal, answers = results.len(), "result cap reached");
                    return ResultEnvelope::ok(results, true);
                }
                results.push(substitution);
            }
            Step::Exhausted => {
                debug!(goal, answers = results.len(), "goal exhausted");
                return ResultEnvelope::ok(results, false);
            }
            Step::RuntimeError(err) => {
                warn!(goal, answers = results.len(), error = %err, "resolution failed");
                return ResultEnvelope::failed(QueryError::Resolution(err), results);
            }
            Step::LimitExceeded { inferences } => {
                warn!(goal, answers = results.len(), inferences, "inference limit exceeded");
                return ResultEnvelope::failed(QueryError::LimitExceeded { inferences }, results);
            }
        }
    }
}
