//! Diagnostics for canlink.
//!
//! Provides [`Diagnostic`], [`Severity`], and [`Span`] types used to report
//! errors found while interpreting a command line, composing the netlink
//! request, or talking to the kernel. Diagnostic codes are defined in the
//! [`codes`] module.

#![warn(missing_docs)]

/// Diagnostic ID constants.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// Hard error: the request was not sent or was rejected.
    Error,
}

/// Byte span in the rendered command line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// A diagnostic message produced by the interpreter, composer, or transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code from [`codes`], e.g. `"CAN1003"`.
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// One-line description for humans.
    pub message: String,
    /// Offending token within the joined command line. Transport and
    /// internal failures have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Structured details such as `option`, `token`, `reason` or `errno`.
    /// Sorted so JSON output is stable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic without context.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Error, message, span)
    }

    /// Attach structured details.
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Longer explanation of this diagnostic's code, if one exists.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    let text = match id {
        codes::INCOMPLETE_COMMAND => {
            "The command line ended where another token was required: the `ip link set` \
             signature, a device name after `dev`, a link type after `type`, or the value \
             of an option such as `bitrate`."
        }
        codes::DUPLICATE_ARGUMENT => {
            "The device name may be given only once. Either the name is duplicated or a \
             misspelled keyword was taken as a second device name."
        }
        codes::INVALID_VALUE => {
            "Numeric values must be complete decimal, octal (leading 0), or hexadecimal \
             (leading 0x) numbers that fit the option's width; sample points are floats \
             in 0.000..0.999; toggles take exactly `on` or `off`."
        }
        codes::UNKNOWN_OPTION => {
            "The token does not abbreviate any option accepted at this position. Run with \
             `help` to list the accepted options."
        }
        codes::UNKNOWN_TYPE => "Only the `can` link type can be configured.",
        codes::UNBALANCED_NESTING => {
            "Internal error: a nested netlink attribute was left open or closed out of order \
             while composing the request."
        }
        codes::ATTRIBUTE_OVERSIZED => {
            "Internal error: an attribute exceeded the 65535-byte limit of its length field."
        }
        codes::TRANSPORT_FAILED => {
            "The rtnetlink socket could not be opened, or the request could not be sent or \
             acknowledged in time."
        }
        codes::KERNEL_REJECTED => {
            "The kernel rejected the request. Common causes: the interface does not exist, \
             it must be down before bit-timing changes, or the driver does not support the \
             requested control mode."
        }
        _ => return None,
    };
    Some(text)
}
