//! Error types for interpretation and composition.

use std::collections::BTreeMap;

use canlink_diagnostics::{Diagnostic, codes};

use crate::command::decode::DecodeError;
use crate::command::tokens::{Token, TokenStream};

/// A problem with the command line. These are user errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// The stream ended where another token was required.
    #[error("command line is not complete, expected {expected}")]
    IncompleteCommand {
        /// Stream index where the missing token would have been.
        index: usize,
        /// What was expected there.
        expected: &'static str,
    },

    /// A single-valued argument was given twice.
    #[error("either \"{key}\" is duplicate, or \"{token}\" is garbage")]
    DuplicateArgument {
        /// The argument name (`dev`).
        key: &'static str,
        /// The second occurrence.
        token: Token,
    },

    /// A value failed to decode or lies outside its domain.
    #[error("argument \"{token}\" is wrong: invalid \"{option}\" value")]
    InvalidValue {
        /// Option the value belongs to.
        option: &'static str,
        /// The offending value.
        token: Token,
        /// Why it was rejected.
        #[source]
        reason: InvalidReason,
    },

    /// No keyword of the current options loop matched.
    #[error("unknown option \"{token}\"")]
    UnknownOption {
        /// The unrecognized token.
        token: Token,
    },

    /// A link type other than `can` was requested.
    #[error("unknown type \"{token}\"")]
    UnknownType {
        /// The requested type.
        token: Token,
    },
}

/// Why a value was rejected.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidReason {
    /// The text is not a valid number of the required width.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// A toggle got something other than `on`/`off`.
    #[error("must be \"on\" or \"off\"")]
    NotOnOff,
    /// A sample point outside `0.000..0.999` once scaled to thousandths.
    #[error("sample point {value} is outside 0.000..0.999")]
    SamplePointRange {
        /// The decoded value.
        value: f32,
    },
    /// An interface name that does not fit `IFNAMSIZ`.
    #[error("interface name is {len} bytes, at most {max} allowed")]
    NameTooLong {
        /// Length of the given name in bytes.
        len: usize,
        /// Longest name the kernel accepts.
        max: usize,
    },
}

impl CommandError {
    /// Stream index of the offending token (or of the missing one).
    pub fn index(&self) -> usize {
        match self {
            CommandError::IncompleteCommand { index, .. } => *index,
            CommandError::DuplicateArgument { token, .. }
            | CommandError::InvalidValue { token, .. }
            | CommandError::UnknownOption { token }
            | CommandError::UnknownType { token } => token.index,
        }
    }

    /// Whether usage text should accompany this error.
    ///
    /// Unknown options and types are recoverable by reading the usage;
    /// malformed values and duplicates point at a specific mistake.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            CommandError::UnknownOption { .. } | CommandError::UnknownType { .. }
        )
    }

    /// Diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::IncompleteCommand { .. } => codes::INCOMPLETE_COMMAND,
            CommandError::DuplicateArgument { .. } => codes::DUPLICATE_ARGUMENT,
            CommandError::InvalidValue { .. } => codes::INVALID_VALUE,
            CommandError::UnknownOption { .. } => codes::UNKNOWN_OPTION,
            CommandError::UnknownType { .. } => codes::UNKNOWN_TYPE,
        }
    }

    /// Build a diagnostic whose span covers the offending token of `tokens`.
    pub fn to_diagnostic(&self, tokens: &TokenStream) -> Diagnostic {
        let span = tokens.span_of(self.index());
        let mut ctx: BTreeMap<String, String> = BTreeMap::new();
        match self {
            CommandError::IncompleteCommand { expected, .. } => {
                ctx.insert("expected".into(), (*expected).into());
            }
            CommandError::DuplicateArgument { key, token } => {
                ctx.insert("argument".into(), (*key).into());
                ctx.insert("token".into(), token.text.clone());
            }
            CommandError::InvalidValue {
                option,
                token,
                reason,
            } => {
                ctx.insert("option".into(), (*option).into());
                ctx.insert("token".into(), token.text.clone());
                ctx.insert("reason".into(), reason.to_string());
            }
            CommandError::UnknownOption { token } | CommandError::UnknownType { token } => {
                ctx.insert("token".into(), token.text.clone());
            }
        }
        Diagnostic::error(self.code(), self.to_string(), Some(span)).with_context(ctx)
    }
}

/// Why an attribute buffer is not balanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NestingFault {
    /// A nest was closed while a more recently opened one was still open.
    #[error("closed nest at offset {closing} while nest at offset {innermost} is innermost")]
    OutOfOrder {
        /// Offset of the nest being closed.
        closing: usize,
        /// Offset of the innermost open nest.
        innermost: usize,
    },
    /// A nest was closed that is not open.
    #[error("closed nest at offset {closing} which is not open")]
    NotOpen {
        /// Offset of the nest being closed.
        closing: usize,
    },
    /// The buffer was finished with nests still open.
    #[error("{open} nest(s) still open at finish")]
    LeftOpen {
        /// Number of open nests.
        open: usize,
    },
}

/// An invariant violation inside the attribute builder.
///
/// These indicate a defect in the composer, never bad input.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttrError {
    /// Nests were not closed in strict LIFO order before finishing.
    #[error("unbalanced attribute nesting: {0}")]
    UnbalancedNesting(NestingFault),
    /// An attribute does not fit its 16-bit length field, or the message
    /// would exceed the request buffer.
    #[error("attribute type {kind} too large ({len} bytes, max {max})")]
    Oversized {
        /// Attribute type (flags stripped).
        kind: u16,
        /// Length the attribute would have had.
        len: usize,
        /// Largest length allowed.
        max: usize,
    },
}

impl AttrError {
    /// Diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AttrError::UnbalancedNesting(_) => codes::UNBALANCED_NESTING,
            AttrError::Oversized { .. } => codes::ATTRIBUTE_OVERSIZED,
        }
    }

    /// Build a span-less diagnostic for this error.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code(), format!("internal error: {self}"), None)
    }
}

/// Any failure of [`interpret`](crate::interpret) or [`compose`](crate::compose).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Bad command line.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// Attribute builder invariant violation.
    #[error(transparent)]
    Attr(#[from] AttrError),
}

impl Error {
    /// Whether this is a defect in the composer rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Attr(_))
    }

    /// Build a diagnostic for this error against the interpreted `tokens`.
    pub fn to_diagnostic(&self, tokens: &TokenStream) -> Diagnostic {
        match self {
            Error::Command(e) => e.to_diagnostic(tokens),
            Error::Attr(e) => e.to_diagnostic(),
        }
    }
}
