// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scryer Prolog machine holding the clause file

use crate::prolog::error::{ConsultError, EngineError, GoalError};
use crate::prolog::source::split_clauses;
use crate::prolog::term::{format_atom, format_string, render, Term};
use crate::prolog::EngineOptions;
use scryer_prolog::{LeafAnswer, Machine, MachineBuilder};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

const RUNTIME: &str = include_str!("runtime.pl");

/// Deepest bracket nesting accepted in goal text
pub const MAX_GOAL_NESTING: usize = 1_000;

/// Query variable the runner binds to the goal's `Name = Value` list
const BINDINGS_VAR: &str = "Bindings";

/// Predicate indicator `name/arity`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PredicateKey {
    pub name: String,
    pub arity: usize,
}

impl fmt::Display for PredicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", format_atom(&self.name), self.arity)
    }
}

/// What was loaded from the clause file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClauseStats {
    /// Facts and rules, directives excluded
    pub clauses: usize,
    /// Clause count per predicate; declared-only predicates count zero
    pub predicates: BTreeMap<PredicateKey, usize>,
}

/// Bindings of one answer in goal variable order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBindings {
    pub bindings: Vec<(String, Term)>,
}

/// One answer from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Solution(RawBindings),
    /// An exception escaped the goal
    Error(EngineError),
    /// The goal spent its inference budget
    LimitExceeded { inferences: u64 },
}

enum ClauseKind {
    Clause(PredicateKey),
    Declared(PredicateKey),
    Directive,
}

pub struct PrologEngine {
    machine: Machine,
    options: EngineOptions,
    stats: ClauseStats,
}

impl PrologEngine {
    pub fn new(options: EngineOptions) -> Self {
        let mut machine = MachineBuilder::default().build();
        machine.consult_module_string("casefile_runtime", RUNTIME.to_string());
        Self {
            machine,
            options,
            stats: ClauseStats::default(),
        }
    }

    /// Consult a clause file.
    ///
    /// Every clause is read before anything is consulted, so a syntax error
    /// leaves the engine as it was.
    pub fn consult(&mut self, source: &str) -> Result<ClauseStats, ConsultError> {
        let mut stats = ClauseStats::default();
        for clause in split_clauses(source)? {
            let kind = self
                .clause_kind(&clause.text)
                .map_err(|detail| ConsultError::Syntax {
                    detail,
                    line: clause.line,
                })?;
            match kind {
                ClauseKind::Clause(key) => {
                    stats.clauses += 1;
                    *stats.predicates.entry(key).or_default() += 1;
                }
                ClauseKind::Declared(key) => {
                    stats.predicates.entry(key).or_default();
                }
                ClauseKind::Directive => {}
            }
        }

        self.machine
            .consult_module_string("casefile", source.to_string());
        debug!(clauses = stats.clauses, predicates = stats.predicates.len(), "clause file consulted");
        self.stats = stats.clone();
        Ok(stats)
    }

    pub fn stats(&self) -> &ClauseStats {
        &self.stats
    }

    fn clause_kind(&mut self, text: &str) -> Result<ClauseKind, String> {
        let query = format!("casefile_clause_key({}, Key).", format_string(text));
        let answer = self.machine.run_query(query).next();
        let key = match answer {
            Some(Ok(LeafAnswer::LeafAnswer { bindings, .. })) => bindings.get("Key").cloned(),
            Some(Ok(LeafAnswer::Exception(ball))) | Some(Err(ball)) => {
                return Err(render(&ball));
            }
            _ => None,
        };
        match key {
            Some(Term::Atom(name)) if name == "directive" => Ok(ClauseKind::Directive),
            Some(Term::Compound(kind, args)) if args.len() == 2 => {
                let key = predicate_key(&args[0], &args[1])
                    .ok_or_else(|| format!("unexpected clause key {}", kind))?;
                match kind.as_str() {
                    "declared" => Ok(ClauseKind::Declared(key)),
                    _ => Ok(ClauseKind::Clause(key)),
                }
            }
            _ => Err("clause could not be read".to_string()),
        }
    }

    /// Start resolving `goal`, discarding whatever the previous goal left.
    ///
    /// The goal is read by the engine before this returns, so a malformed
    /// goal is reported here and not as an answer.
    pub fn load_goal(&mut self, goal: &str) -> Result<Answers<'_>, GoalError> {
        let text = goal.trim();
        if text.is_empty() {
            return Err(GoalError::new("empty goal"));
        }
        if nesting_depth(text) > MAX_GOAL_NESTING {
            return Err(GoalError::new("term nesting too deep"));
        }
        let text = if text.ends_with('.') {
            text.to_string()
        } else {
            format!("{} .", text)
        };

        let query = format!(
            "casefile_answer({}, {}, {}, {}).",
            format_string(&text),
            self.options.inference_limit,
            self.options.unknown.as_atom(),
            BINDINGS_VAR
        );
        let mut answers = Answers {
            inner: Box::new(self.machine.run_query(query)),
            first: None,
            done: false,
        };
        answers.first = answers.pull()?;
        Ok(answers)
    }
}

/// Answers of the active goal, produced lazily
pub struct Answers<'a> {
    inner: Box<dyn Iterator<Item = Result<LeafAnswer, Term>> + 'a>,
    /// Answer read while loading the goal
    first: Option<Answer>,
    done: bool,
}

impl Answers<'_> {
    fn pull(&mut self) -> Result<Option<Answer>, GoalError> {
        if self.done {
            return Ok(None);
        }
        let ball = match self.inner.next() {
            Some(Ok(LeafAnswer::LeafAnswer { bindings, .. })) => {
                return Ok(Some(Answer::Solution(decode_bindings(bindings.get(BINDINGS_VAR)))));
            }
            Some(Ok(LeafAnswer::True)) => return Ok(Some(Answer::Solution(RawBindings::default()))),
            Some(Ok(LeafAnswer::Exception(ball))) | Some(Err(ball)) => ball,
            None | Some(Ok(_)) => {
                self.done = true;
                return Ok(None);
            }
        };
        self.done = true;
        classify_exception(&ball).map(Some)
    }
}

impl Iterator for Answers<'_> {
    type Item = Answer;

    fn next(&mut self) -> Option<Answer> {
        if let Some(first) = self.first.take() {
            return Some(first);
        }
        match self.pull() {
            Ok(answer) => answer,
            Err(err) => Some(Answer::Error(EngineError { ball: err.detail })),
        }
    }
}

fn classify_exception(ball: &Term) -> Result<Answer, GoalError> {
    match ball {
        Term::Compound(name, args) if name == "casefile_goal_error" && args.len() == 1 => {
            Err(GoalError::new(render(&args[0])))
        }
        Term::Compound(name, args) if name == "casefile_limit_exceeded" && args.len() == 1 => {
            Ok(Answer::LimitExceeded {
                inferences: integer(&args[0]).unwrap_or_default(),
            })
        }
        other => Ok(Answer::Error(EngineError {
            ball: render(other),
        })),
    }
}

fn decode_bindings(list: Option<&Term>) -> RawBindings {
    let Some(Term::List(pairs)) = list else {
        return RawBindings::default();
    };
    let bindings = pairs
        .iter()
        .filter_map(|pair| match pair {
            Term::Compound(eq, args) if eq == "=" && args.len() == 2 => match &args[0] {
                Term::Atom(name) | Term::String(name) => Some((name.clone(), args[1].clone())),
                _ => None,
            },
            _ => None,
        })
        .collect();
    RawBindings { bindings }
}

fn predicate_key(name: &Term, arity: &Term) -> Option<PredicateKey> {
    let Term::Atom(name) = name else {
        return None;
    };
    Some(PredicateKey {
        name: name.clone(),
        arity: usize::try_from(integer(arity)?).ok()?,
    })
}

fn integer(term: &Term) -> Option<u64> {
    match term {
        Term::Integer(value) => value.to_string().parse().ok(),
        _ => None,
    }
}

fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    for ch in text.chars() {
        match ch {
            '(' | '[' | '{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prolog::UnknownPolicy;

    fn engine(source: &str) -> PrologEngine {
        let mut engine = PrologEngine::new(EngineOptions::default());
        engine.consult(source).expect("clauses should load");
        engine
    }

    fn names(answer: &Answer) -> Vec<String> {
        match answer {
            Answer::Solution(raw) => raw.bindings.iter().map(|(name, _)| name.clone()).collect(),
            other => panic!("expected a solution, got {:?}", other),
        }
    }

    #[test]
    fn test_consult_statistics() {
        let mut engine = PrologEngine::new(EngineOptions::default());
        let stats = engine
            .consult(":- dynamic(suspect/1).\nscene(1). scene(2).\nfirst(S) :- scene(S), !.\n")
            .expect("clauses should load");
        assert_eq!(stats.clauses, 3);
        let listed: Vec<(String, usize)> = stats
            .predicates
            .iter()
            .map(|(key, count)| (key.to_string(), *count))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("first/1".to_string(), 1),
                ("scene/1".to_string(), 2),
                ("suspect/1".to_string(), 0)
            ]
        );
        assert_eq!(engine.stats(), &stats);
    }

    #[test]
    fn test_consult_reports_line_of_bad_clause() {
        let mut engine = PrologEngine::new(EngineOptions::default());
        let err = engine
            .consult("scene(1).\nscene(2).\nscene(3 4).\n")
            .expect_err("a syntax error must fail the load");
        assert!(matches!(err, ConsultError::Syntax { line: 3, .. }));

        let err = engine.consult("42.\n").expect_err("numbers are not clauses");
        assert!(matches!(err, ConsultError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_answers_in_clause_order() {
        let mut engine = engine("scene(1). scene(2). scene(3).");
        let answers: Vec<Answer> = engine.load_goal("scene(ID).").expect("goal loads").collect();
        assert_eq!(answers.len(), 3);
        assert_eq!(names(&answers[0]), vec!["ID"]);
    }

    #[test]
    fn test_goal_terminator_is_optional() {
        let mut engine = engine("scene(1).");
        assert_eq!(engine.load_goal("scene(ID)").expect("goal loads").count(), 1);
        assert_eq!(engine.load_goal("  scene(ID) .  ").expect("goal loads").count(), 1);
    }

    #[test]
    fn test_malformed_goal_is_rejected_on_load() {
        let mut engine = engine("scene(1).");
        let err = engine.load_goal("scene(ID").err().expect("syntax error");
        assert!(err.detail.contains("syntax_error"), "{}", err.detail);
        assert!(engine.load_goal("   ").is_err());
        // the machine still answers afterwards
        assert_eq!(engine.load_goal("scene(ID).").expect("goal loads").count(), 1);
    }

    #[test]
    fn test_deeply_nested_goal_is_rejected() {
        let mut engine = engine("a.");
        let depth = MAX_GOAL_NESTING * 10;
        let goal = format!("{}a{}.", "(".repeat(depth), ")".repeat(depth));
        let err = engine.load_goal(&goal).err().expect("nesting error");
        assert_eq!(err.detail, "term nesting too deep");

        let shallow = format!("{}a{}.", "(".repeat(50), ")".repeat(50));
        assert_eq!(engine.load_goal(&shallow).expect("goal loads").count(), 1);
    }

    #[test]
    fn test_exceptions_end_the_answers() {
        let mut engine = engine("item(1). item(boom). item(3).");
        let answers: Vec<Answer> = engine
            .load_goal("item(X), Y is X * 2.")
            .expect("goal loads")
            .collect();
        assert_eq!(answers.len(), 2);
        match &answers[1] {
            Answer::Error(err) => assert!(err.ball.contains("type_error"), "{}", err.ball),
            other => panic!("expected an error, got {:?}", other),
        }
    }

    #[test]
    fn test_inference_budget() {
        let mut engine = PrologEngine::new(EngineOptions {
            inference_limit: 1_000,
            ..EngineOptions::default()
        });
        engine.consult("spin :- spin.").expect("clauses should load");
        let answers: Vec<Answer> = engine.load_goal("spin.").expect("goal loads").collect();
        assert_eq!(answers, vec![Answer::LimitExceeded { inferences: 1_000 }]);
    }

    #[test]
    fn test_unknown_procedure_policy() {
        let mut engine = engine("a.");
        assert_eq!(engine.load_goal("nonexistent(X).").expect("goal loads").count(), 0);

        let mut strict = PrologEngine::new(EngineOptions {
            unknown: UnknownPolicy::Error,
            ..EngineOptions::default()
        });
        strict.consult("a.").expect("clauses should load");
        let answers: Vec<Answer> = strict
            .load_goal("nonexistent(X).")
            .expect("goal loads")
            .collect();
        assert!(matches!(&answers[..], [Answer::Error(err)] if err.ball.contains("existence_error")));
    }

    #[test]
    fn test_cyclic_binding_is_an_error() {
        let mut engine = engine("a.");
        let answers: Vec<Answer> = engine.load_goal("X = f(X).").expect("goal loads").collect();
        match &answers[..] {
            [Answer::Error(err)] => assert!(err.ball.contains("cyclic_term"), "{}", err.ball),
            other => panic!("expected a cyclic term error, got {:?}", other),
        }
    }

    #[test]
    fn test_nesting_depth() {
        assert_eq!(nesting_depth("a"), 0);
        assert_eq!(nesting_depth("f(g([x]), {y})"), 3);
        assert_eq!(nesting_depth("))(("), 2);
    }
}
