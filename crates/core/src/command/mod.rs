/// Value decoders for integer and float arguments.
pub mod decode;
/// Re-exports from the diagnostics crate.
pub mod diag {
    pub use canlink_diagnostics::{Diagnostic, Severity, Span, codes};
}
/// `ip link set` interpreter.
pub mod interp;
/// Abbreviated keyword matching.
pub mod keyword;
/// Records produced by the interpreter.
pub mod model;
/// Token stream with an explicit cursor.
pub mod tokens;
