// SPDX-License-Identifier: PMPL-1.0-or-later

//! Session lifecycle: one long-lived inference session per process
//!
//! The Prolog machine lives on a dedicated engine thread, created once at
//! start-up with the clause file consulted. Requests reach it over a
//! command channel and are answered in arrival order, so at most one goal
//! is ever being resolved and no two queries interleave answers.

use crate::prolog::{ClauseStats, EngineError, EngineOptions, PredicateKey, PrologEngine};
use crate::query::{self, QueryError, QueryLimits, ResultEnvelope};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, error, info};

/// Stack for the engine thread; deep terms are built and walked there
const ENGINE_STACK_SIZE: usize = 64 * 1024 * 1024;

enum Command {
    Execute {
        goal: String,
        limits: QueryLimits,
        reply: mpsc::Sender<ResultEnvelope>,
    },
}

pub struct Session {
    commands: mpsc::Sender<Command>,
    stats: ClauseStats,
    source: Option<PathBuf>,
}

impl Session {
    /// Consult the clause file at `path` into a fresh engine.
    ///
    /// Loading is all-or-nothing: a syntax error anywhere in the file
    /// fails start-up and no session is created.
    pub fn open(path: &Path, options: EngineOptions) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("reading clause file {}", path.display()))?;
        let mut session = Self::from_source(&source, options)
            .with_context(|| format!("consulting clause file {}", path.display()))?;
        session.source = Some(path.to_path_buf());
        Ok(session)
    }

    /// Build a session from clause text held in memory
    pub fn from_source(source: &str, options: EngineOptions) -> Result<Self> {
        let (commands, inbox) = mpsc::channel();
        let (loaded_tx, loaded_rx) = mpsc::channel();
        let source = source.to_string();

        thread::Builder::new()
            .name("casefile-engine".to_string())
            .stack_size(ENGINE_STACK_SIZE)
            .spawn(move || {
                let mut engine = PrologEngine::new(options);
                let loaded = engine.consult(&source);
                let ready = loaded.is_ok();
                if loaded_tx.send(loaded).is_err() || !ready {
                    return;
                }
                serve(&mut engine, inbox);
            })
            .context("spawning engine thread")?;

        let stats = loaded_rx
            .recv()
            .map_err(|_| anyhow!("engine thread stopped while consulting"))??;
        info!(
            clauses = stats.clauses,
            predicates = stats.predicates.len(),
            inference_limit = options.inference_limit,
            unknown = ?options.unknown,
            "inference session ready"
        );
        Ok(Self {
            commands,
            stats,
            source: None,
        })
    }

    /// Run one goal to completion.
    ///
    /// Blocks while earlier goals are being resolved.
    pub fn execute(&self, goal: &str, limits: &QueryLimits) -> ResultEnvelope {
        let (reply, answer) = mpsc::channel();
        let command = Command::Execute {
            goal: goal.to_string(),
            limits: *limits,
            reply,
        };
        if self.commands.send(command).is_err() {
            return engine_stopped(goal);
        }
        answer.recv().unwrap_or_else(|_| engine_stopped(goal))
    }

    pub fn clause_count(&self) -> usize {
        self.stats.clauses
    }

    /// Loaded predicates with their clause counts, in name/arity order
    pub fn predicates(&self) -> Vec<(PredicateKey, usize)> {
        self.stats
            .predicates
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect()
    }

    /// Clause file this session was opened from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Engine thread loop; ends when the session is dropped
fn serve(engine: &mut PrologEngine, inbox: mpsc::Receiver<Command>) {
    while let Ok(command) = inbox.recv() {
        match command {
            Command::Execute {
                goal,
                limits,
                reply,
            } => {
                debug!(goal = %goal, "executing goal");
                let envelope = query::execute(engine, &goal, &limits);
                // the caller may have gone away; the next goal still runs
                let _ = reply.send(envelope);
            }
        }
    }
    debug!("engine thread stopped");
}

fn engine_stopped(goal: &str) -> ResultEnvelope {
    error!(goal, "inference session is not running");
    ResultEnvelope::failed(
        QueryError::Resolution(EngineError {
            ball: "inference session stopped".to_string(),
        }),
        Vec::new(),
    )
}
