// SPDX-License-Identifier: PMPL-1.0-or-later

//! Canonical text for engine terms and quoting for goal text

use std::fmt::Write;

pub use scryer_prolog::Term;

fn is_symbol_char(ch: char) -> bool {
    "+-*/\\^<>=~:.?@#&$".contains(ch)
}

/// Whether an atom can be written without quotes
fn atom_is_plain(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        None => false,
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|ch| ch.is_alphanumeric() || ch == '_')
        }
        Some(_) if name == "[]" || name == "!" || name == ";" || name == "{}" => true,
        Some(_) => name != "." && !name.contains("/*") && name.chars().all(is_symbol_char),
    }
}

fn escape_into(out: &mut String, text: &str, quote: char) {
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\x{:x}\\", c as u32);
            }
            c => out.push(c),
        }
    }
}

/// Write an atom, quoting it when it would not read back as the same atom
pub fn format_atom(name: &str) -> String {
    if atom_is_plain(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push('\'');
    escape_into(&mut out, name, '\'');
    out.push('\'');
    out
}

/// Write a string literal in double quotes
pub fn format_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    escape_into(&mut out, text, '"');
    out.push('"');
    out
}

fn format_float(value: f64) -> String {
    let text = format!("{:?}", value);
    if text.contains('.') || text.contains('e') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

enum Piece<'a> {
    Term(&'a Term),
    Text(&'static str),
}

/// Canonical text of a term.
///
/// Free variables are numbered `_G0`, `_G1`, ... by first appearance, so
/// the text does not depend on the engine's internal variable names. The
/// walk keeps its own stack and handles arbitrarily deep terms.
pub fn render(term: &Term) -> String {
    let mut out = String::new();
    let mut vars: Vec<&str> = Vec::new();
    let mut stack = vec![Piece::Term(term)];

    while let Some(piece) = stack.pop() {
        let term = match piece {
            Piece::Text(text) => {
                out.push_str(text);
                continue;
            }
            Piece::Term(term) => term,
        };
        match term {
            Term::Integer(value) => {
                let _ = write!(out, "{}", value);
            }
            Term::Float(value) => out.push_str(&format_float(*value)),
            Term::Atom(name) => out.push_str(&format_atom(name)),
            Term::String(text) => out.push_str(&format_string(text)),
            Term::Var(name) => {
                let index = match vars.iter().position(|seen| *seen == name.as_str()) {
                    Some(index) => index,
                    None => {
                        vars.push(name.as_str());
                        vars.len() - 1
                    }
                };
                let _ = write!(out, "_G{}", index);
            }
            Term::List(items) => {
                out.push('[');
                push_args(&mut stack, items, "]");
            }
            Term::Compound(name, args) => {
                out.push_str(&format_atom(name));
                if !args.is_empty() {
                    out.push('(');
                    push_args(&mut stack, args, ")");
                }
            }
            other => {
                let _ = write!(out, "{:?}", other);
            }
        }
    }
    out
}

/// Queue `items` separated by commas, followed by `close`
fn push_args<'a>(stack: &mut Vec<Piece<'a>>, items: &'a [Term], close: &'static str) {
    stack.push(Piece::Text(close));
    for (i, item) in items.iter().enumerate().rev() {
        stack.push(Piece::Term(item));
        if i > 0 {
            stack.push(Piece::Text(","));
        }
    }
}
