// SPDX-License-Identifier: PMPL-1.0-or-later

//! One answer-retrieval cycle against a session

use crate::prolog::{Answer, EngineError};
use crate::query::normalize::{normalize, Substitution};

/// Classified outcome of asking for one more answer
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Solution(Substitution),
    /// No further answers exist
    Exhausted,
    RuntimeError(EngineError),
    LimitExceeded { inferences: u64 },
}

/// Ask the loaded goal for its next answer.
///
/// Advances the goal: calling again yields the following answer.
pub fn next_answer<I: Iterator<Item = Answer> + ?Sized>(answers: &mut I) -> Step {
    match answers.next() {
        Some(Answer::Solution(raw)) => Step::Solution(normalize(&raw)),
        Some(Answer::Error(err)) => Step::RuntimeError(err),
        Some(Answer::LimitExceeded { inferences }) => Step::LimitExceeded { inferences },
        None => Step::Exhausted,
    }
}
