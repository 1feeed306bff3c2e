// SPDX-License-Identifier: PMPL-1.0-or-later

//! Clause boundaries in a clause file
//!
//! The file is cut at end tokens (a `.` followed by layout, a `%` or the end
//! of input) while skipping quoted text, `0'c` character codes and comments.
//! Each piece is then read by the engine on its own, which gives a line
//! number for every syntax error before anything is consulted.

use crate::prolog::error::ConsultError;

/// One clause or directive, with its end token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseText {
    /// Line of the clause's first character
    pub line: usize,
    pub text: String,
}

fn is_symbol_char(ch: char) -> bool {
    "+-*/\\^<>=~:.?@#&$".contains(ch)
}

fn is_alphanumeric(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

struct Splitter<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    current: String,
    start: usize,
    clauses: Vec<ClauseText>,
}

impl Splitter<'_> {
    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn push(&mut self, ch: char) {
        if self.current.trim().is_empty() && !ch.is_whitespace() {
            self.current.clear();
            self.start = self.line;
        }
        self.current.push(ch);
    }

    fn finish_clause(&mut self) {
        let text = std::mem::take(&mut self.current);
        self.clauses.push(ClauseText {
            line: self.start,
            text,
        });
    }

    fn skip_line_comment(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self, line: usize) -> Result<(), ConsultError> {
        let mut star = false;
        while let Some(ch) = self.bump() {
            if star && ch == '/' {
                self.current.push(' ');
                return Ok(());
            }
            star = ch == '*';
        }
        Err(ConsultError::Unclosed {
            what: "block comment",
            line,
        })
    }

    fn copy_quoted(&mut self, quote: char) -> Result<(), ConsultError> {
        let line = self.line;
        self.push(quote);
        while let Some(ch) = self.bump() {
            self.current.push(ch);
            if ch == '\\' {
                if let Some(escaped) = self.bump() {
                    self.current.push(escaped);
                }
            } else if ch == quote {
                // a doubled quote stands for the quote character itself
                if self.chars.peek() == Some(&quote) {
                    self.bump();
                    self.current.push(quote);
                } else {
                    return Ok(());
                }
            }
        }
        Err(ConsultError::Unclosed {
            what: "quoted text",
            line,
        })
    }

    /// `0'c`, where `c` may itself be a quote or an escape
    fn copy_char_code(&mut self) {
        self.current.push('\'');
        match self.bump() {
            Some('\\') => {
                self.current.push('\\');
                if let Some(escaped) = self.bump() {
                    self.current.push(escaped);
                }
            }
            Some('\'') => {
                self.current.push('\'');
                if self.chars.peek() == Some(&'\'') {
                    self.bump();
                    self.current.push('\'');
                }
            }
            Some(ch) => self.current.push(ch),
            None => {}
        }
    }

    fn at_char_code(&self) -> bool {
        let mut before = self.current.chars().rev();
        before.next() == Some('0') && !before.next().is_some_and(is_alphanumeric)
    }
}

/// Cut `source` into clause texts, each ending with its `.`
pub fn split_clauses(source: &str) -> Result<Vec<ClauseText>, ConsultError> {
    let mut splitter = Splitter {
        chars: source.chars().peekable(),
        line: 1,
        current: String::new(),
        start: 1,
        clauses: Vec::new(),
    };

    while let Some(ch) = splitter.bump() {
        match ch {
            '%' => splitter.skip_line_comment(),
            '/' if splitter.chars.peek() == Some(&'*') => {
                let line = splitter.line;
                splitter.bump();
                splitter.skip_block_comment(line)?;
            }
            '\'' if splitter.at_char_code() => splitter.copy_char_code(),
            '\'' | '"' | '`' => splitter.copy_quoted(ch)?,
            '.' => {
                let joined = splitter.current.chars().last().is_some_and(is_symbol_char);
                let ends = splitter
                    .chars
                    .peek()
                    .is_none_or(|next| next.is_whitespace() || *next == '%');
                splitter.push('.');
                if ends && !joined {
                    splitter.finish_clause();
                }
            }
            other => splitter.push(other),
        }
    }

    if !splitter.current.trim().is_empty() {
        return Err(ConsultError::Unterminated {
            line: splitter.start,
        });
    }
    Ok(splitter.clauses)
}
