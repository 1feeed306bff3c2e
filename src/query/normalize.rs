// SPDX-License-Identifier: PMPL-1.0-or-later

//! Flattening of engine bindings into plain substitutions

use crate::prolog::term::render;
use crate::prolog::{RawBindings, Term};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A normalized binding value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Atom, reported by name
    Atom(String),
    Int(i64),
    Float(f64),
    /// String literal
    Text(String),
    /// Compound, list or integer beyond 64 bits, reported by its
    /// canonical text
    Term(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Atom(text) | Value::Text(text) | Value::Term(text) => f.write_str(text),
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
        }
    }
}

/// Variable name to value for one answer
pub type Substitution = BTreeMap<String, Value>;

/// Normalize the bindings of one answer.
///
/// Unbound variables and variables whose names start with `_` are left out.
pub fn normalize(raw: &RawBindings) -> Substitution {
    raw.bindings
        .iter()
        .filter(|(name, _)| !name.starts_with('_'))
        .filter_map(|(name, term)| value_of(term).map(|value| (name.clone(), value)))
        .collect()
}

fn value_of(term: &Term) -> Option<Value> {
    let value = match term {
        Term::Var(_) => return None,
        Term::Atom(name) => Value::Atom(name.clone()),
        Term::Integer(value) => {
            let text = value.to_string();
            match text.parse::<i64>() {
                Ok(value) => Value::Int(value),
                Err(_) => Value::Term(text),
            }
        }
        Term::Float(value) => Value::Float(*value),
        Term::String(text) => Value::Text(text.clone()),
        Term::List(items) => match char_list(items) {
            Some(text) => Value::Text(text),
            None => Value::Term(render(term)),
        },
        other => Value::Term(render(other)),
    };
    Some(value)
}

/// Text of a non-empty list of one-character atoms, the form a
/// double-quoted string takes under `double_quotes(chars)`
fn char_list(items: &[Term]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| match item {
            Term::Atom(name) if name.chars().count() == 1 => name.chars().next(),
            _ => None,
        })
        .collect()
}
