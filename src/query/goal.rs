// SPDX-License-Identifier: PMPL-1.0-or-later

//! Structured goal construction for parameterized lookups
//!
//! Caller-supplied values are written as properly quoted terms, so a
//! parameter can never change the shape of the goal it is placed in.

use crate::prolog::term::{format_atom, format_string};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalArg {
    Int(i64),
    Atom(String),
    Text(String),
    /// Named query variable; names are fixed by the route table
    Var(&'static str),
    Anonymous,
}

impl GoalArg {
    /// Interpret a raw parameter: integers stay integers, anything else
    /// becomes an atom. Surrounding whitespace is dropped either way.
    pub fn from_param(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(value) => GoalArg::Int(value),
            Err(_) => GoalArg::Atom(raw.to_string()),
        }
    }

    fn render(&self) -> String {
        match self {
            GoalArg::Int(value) => value.to_string(),
            GoalArg::Atom(name) => format_atom(name),
            GoalArg::Text(text) => format_string(text),
            GoalArg::Var(name) => (*name).to_string(),
            GoalArg::Anonymous => "_".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoalBuilder {
    functor: String,
    args: Vec<GoalArg>,
}

impl GoalBuilder {
    pub fn new(functor: &str) -> Self {
        Self {
            functor: functor.to_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: GoalArg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn var(self, name: &'static str) -> Self {
        self.arg(GoalArg::Var(name))
    }

    pub fn anonymous(self) -> Self {
        self.arg(GoalArg::Anonymous)
    }

    pub fn param(self, raw: &str) -> Self {
        self.arg(GoalArg::from_param(raw))
    }

    /// Goal text terminated with `.`
    pub fn build(&self) -> String {
        let functor = format_atom(&self.functor);
        if self.args.is_empty() {
            return format!("{}.", functor);
        }
        let args: Vec<String> = self.args.iter().map(GoalArg::render).collect();
        format!("{}({}).", functor, args.join(", "))
    }
}
