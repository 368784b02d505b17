//! canlink core library.
//!
//! Interprets `ip link set ... type can ...` command lines and composes the
//! matching `RTM_NEWLINK` rtnetlink request. The main entry points are
//! [`interpret`] to turn tokens into a [`LinkCommand`] and [`compose`] to
//! build the wire [`Message`]. Sending the message is left to a transport.

#![warn(missing_docs)]

/// Command interpretation: tokens, decoders, keyword matching, records.
pub mod command;
/// Error types.
pub mod error;
/// Wire format: attribute builder, message framing, composer, dumps.
pub mod wire;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat paths for the most common entry points. The full module paths
// remain available for less common types.

pub use command::{decode, interp, keyword};

// Interpreter
pub use command::interp::{InterpreterOptions, interpret};
pub use command::tokens::{Token, TokenStream};

// Records
pub use command::model::{
    AdminState, BitTiming, CanOptions, CtrlMode, Invocation, LinkCommand, LinkKind, ctrlmode,
};

// Wire
pub use wire::attr::{self, Attr, AttrBuilder, AttrIter, NestHandle};
pub use wire::compose::{self, compose, link_kind, sequence_from_clock};
pub use wire::dump::{MessageDump, describe};
pub use wire::message::{IfInfoMsg, Message, NlMsgHdr};

// Errors
pub use error::{AttrError, CommandError, Error, InvalidReason, NestingFault};

// Diagnostics (re-exported from the diagnostics crate)
pub use command::diag::{Diagnostic, Severity, Span, codes};
