//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. `CAN1xxx` codes describe command-line input,
//! `CAN2xxx` internal invariants of the attribute builder, and `CAN3xxx`
//! failures reported by the transport or the kernel.

/// The command line ended where another token was required.
pub const INCOMPLETE_COMMAND: &str = "CAN1001";

/// A single-valued argument (the device name) was given twice.
pub const DUPLICATE_ARGUMENT: &str = "CAN1002";

/// A value could not be decoded or is outside its allowed domain.
pub const INVALID_VALUE: &str = "CAN1003";

/// A token did not match any keyword of the current options loop.
pub const UNKNOWN_OPTION: &str = "CAN1004";

/// A link type other than `can` was requested.
pub const UNKNOWN_TYPE: &str = "CAN1005";

/// A nested attribute was left open or closed out of order.
pub const UNBALANCED_NESTING: &str = "CAN2001";

/// An attribute grew past the 16-bit length field of its header.
pub const ATTRIBUTE_OVERSIZED: &str = "CAN2002";

/// The netlink socket could not be opened, written, or read.
pub const TRANSPORT_FAILED: &str = "CAN3001";

/// The kernel acknowledged the request with a non-zero error code.
pub const KERNEL_REJECTED: &str = "CAN3002";

/// Every code defined in this module, in numeric order.
pub const ALL: &[&str] = &[
    INCOMPLETE_COMMAND,
    DUPLICATE_ARGUMENT,
    INVALID_VALUE,
    UNKNOWN_OPTION,
    UNKNOWN_TYPE,
    UNBALANCED_NESTING,
    ATTRIBUTE_OVERSIZED,
    TRANSPORT_FAILED,
    KERNEL_REJECTED,
];
