// SPDX-License-Identifier: PMPL-1.0-or-later

//! Query execution against an inference session
//!
//! A goal is loaded into the session, then answers are drained one at a
//! time. Each answer's bindings are normalized into a flat substitution
//! and collected into a [`ResultEnvelope`].

pub mod answer;
pub mod driver;
pub mod envelope;
pub mod goal;
pub mod normalize;

pub use answer::{next_answer, Step};
pub use driver::{execute, QueryLimits};
pub use envelope::{ErrorKind, QueryError, ResultEnvelope, Status};
pub use goal::{GoalArg, GoalBuilder};
pub use normalize::{normalize, Substitution, Value};

use crate::prolog::{Answer, Answers, GoalError, PrologEngine};

/// An inference session that resolves one goal at a time
pub trait Solver {
    /// Answers of a loaded goal; the session stays borrowed while they
    /// are drained
    type Answers<'a>: Iterator<Item = Answer>
    where
        Self: 'a;

    /// Make `goal` the active goal, discarding any previous one
    fn load_goal(&mut self, goal: &str) -> Result<Self::Answers<'_>, GoalError>;
}

impl Solver for PrologEngine {
    type Answers<'a> = Answers<'a>;

    fn load_goal(&mut self, goal: &str) -> Result<Answers<'_>, GoalError> {
        PrologEngine::load_goal(self, goal)
    }
}
