//! Token stream: an explicit cursor over the command-line arguments.

use std::fmt;

use serde::Serialize;

use super::diag::Span;
use crate::error::CommandError;

/// A single command-line argument together with its position in the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Zero-based index of the argument in the stream.
    pub index: usize,
    /// The argument text exactly as given.
    pub text: String,
}

impl Token {
    /// The argument text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An ordered, read-only sequence of arguments with a cursor.
///
/// The arguments are captured once and never modified; only the cursor
/// moves. Advancing past the end is an [`CommandError::IncompleteCommand`].
#[derive(Debug, Clone)]
pub struct TokenStream {
    args: Vec<String>,
    pos: usize,
}

impl TokenStream {
    /// Capture a sequence of arguments, cursor on the first one.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            pos: 0,
        }
    }

    /// The token under the cursor, without consuming it.
    pub fn peek(&self) -> Option<&str> {
        self.args.get(self.pos).map(String::as_str)
    }

    /// Consume and return the token under the cursor.
    ///
    /// `expected` names what the caller needed; it ends up in the error
    /// when the stream is exhausted.
    pub fn advance(&mut self, expected: &'static str) -> Result<Token, CommandError> {
        let Some(text) = self.args.get(self.pos) else {
            return Err(CommandError::IncompleteCommand {
                index: self.pos,
                expected,
            });
        };
        let token = Token {
            index: self.pos,
            text: text.clone(),
        };
        self.pos += 1;
        Ok(token)
    }

    /// Number of tokens not yet consumed.
    pub fn remaining(&self) -> usize {
        self.args.len() - self.pos
    }

    /// Whether every token has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Index of the token under the cursor (equals `len()` when exhausted).
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total number of tokens, consumed or not.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether the stream holds no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The tokens joined by single spaces, as they are shown in diagnostics.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }

    /// Byte span of token `index` within [`command_line`](Self::command_line).
    ///
    /// Indices past the end map to a zero-width span after the last token,
    /// which is where a missing argument would have gone.
    pub fn span_of(&self, index: usize) -> Span {
        let mut start = 0usize;
        for (i, arg) in self.args.iter().enumerate() {
            if i == index {
                return Span::new(start, start + arg.len());
            }
            start += arg.len() + 1;
        }
        Span::empty(self.command_line().len())
    }
}
