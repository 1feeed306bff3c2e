// SPDX-License-Identifier: PMPL-1.0-or-later

//! casefile: a case-file fact database behind a Prolog-style query session.
//!
//! Scenes and clues are loaded from a clause file into one long-lived
//! inference session. Goals arrive over HTTP (or the CLI), are resolved
//! by the session, and every answer is flattened into a plain
//! variable-to-value substitution.
//!
//! LAYERS:
//! 1. **prolog**: the embedded Scryer machine, clause splitting and
//!    answer rendering.
//! 2. **query**: goal loading, answer iteration, normalization and the
//!    result envelope.
//! 3. **session**: the shared, serialized inference session.
//! 4. **server**: HTTP routes mapping requests to goals.

pub mod config;
pub mod prolog;
pub mod query;
pub mod server;
pub mod session;

pub use config::Config;
pub use query::{QueryLimits, ResultEnvelope};
pub use session::Session;
