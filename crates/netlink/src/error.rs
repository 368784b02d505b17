//! Typed error types for the netlink transport.

use std::fmt;
use std::io;
use std::time::Duration;

/// Transport failure conditions, categorized by stage.
///
/// Use [`TransportError::is_kernel_rejection()`] to tell a request the kernel
/// refused apart from a failure to talk to the kernel at all.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    // -- Socket setup --
    /// The `NETLINK_ROUTE` socket could not be created.
    #[error("cannot open netlink socket")]
    Open(#[source] io::Error),

    /// Binding the socket to an automatic port id failed.
    #[error("cannot bind netlink socket")]
    Bind(#[source] io::Error),

    // -- I/O --
    /// Sending the request failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    /// Receiving the reply failed.
    #[error("receive failed: {0}")]
    ReadFailed(#[source] io::Error),

    /// No acknowledgement arrived within the read timeout.
    #[error("no acknowledgement within {timeout:?}")]
    ReadTimeout {
        /// The configured timeout that elapsed.
        timeout: Duration,
    },

    /// The socket returned an empty read.
    #[error("netlink socket closed")]
    ConnectionClosed,

    // -- Protocol --
    /// A reply could not be parsed as netlink messages.
    #[error("malformed netlink reply: {details}")]
    Malformed {
        /// Human-readable description of the parsing failure.
        details: String,
    },

    /// The kernel reported `NLMSG_OVERRUN`: replies for this socket were
    /// dropped, so the acknowledgement may never arrive.
    #[error("netlink receive overrun, replies were dropped")]
    Overrun,

    /// A reply carried a sequence number other than the request's.
    #[error("reply sequence {got} does not match request sequence {expected}")]
    SequenceMismatch {
        /// Sequence number of the request.
        expected: u32,
        /// Sequence number found in the reply.
        got: u32,
    },

    /// A reply was addressed to another port id.
    #[error("reply for port {got} received on port {expected}")]
    PortMismatch {
        /// Port id of this socket.
        expected: u32,
        /// Port id found in the reply.
        got: u32,
    },

    // -- Kernel --
    /// The kernel answered with a negative acknowledgement.
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

impl TransportError {
    /// Returns `true` if the kernel received and refused the request.
    pub fn is_kernel_rejection(&self) -> bool {
        matches!(self, TransportError::Kernel(_))
    }

    pub(crate) fn malformed(details: impl Into<String>) -> Self {
        TransportError::Malformed {
            details: details.into(),
        }
    }
}

/// A negative acknowledgement from the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("kernel rejected the request: {}", os_error(.errno))]
pub struct KernelError {
    /// Positive errno value (`ENODEV`, `EPERM`, ...).
    pub errno: i32,
}

impl KernelError {
    /// The errno as an [`io::Error`], for its OS message.
    pub fn to_io_error(&self) -> io::Error {
        io::Error::from_raw_os_error(self.errno)
    }
}

fn os_error(errno: &i32) -> impl fmt::Display {
    io::Error::from_raw_os_error(*errno)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_rejection_classification() {
        assert!(TransportError::Kernel(KernelError { errno: 19 }).is_kernel_rejection());
        assert!(!TransportError::ConnectionClosed.is_kernel_rejection());
        assert!(
            !TransportError::ReadTimeout {
                timeout: Duration::from_secs(1)
            }
            .is_kernel_rejection()
        );
        assert!(
            !TransportError::SendFailed(io::Error::new(io::ErrorKind::BrokenPipe, "test"))
                .is_kernel_rejection()
        );
        assert!(!TransportError::malformed("x").is_kernel_rejection());
        assert!(!TransportError::Overrun.is_kernel_rejection());
    }

    #[test]
    fn kernel_error_uses_os_message() {
        let err = KernelError { errno: 1 };
        let want = io::Error::from_raw_os_error(1).to_string();
        assert_eq!(err.to_string(), format!("kernel rejected the request: {want}"));
        assert_eq!(err.to_io_error().raw_os_error(), Some(1));
    }

    #[test]
    fn transport_wraps_kernel_error_transparently() {
        let err: TransportError = KernelError { errno: 19 }.into();
        assert_eq!(err.to_string(), KernelError { errno: 19 }.to_string());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn kernel_error_serializes_errno() {
        let v = serde_json::to_value(KernelError { errno: 19 }).unwrap();
        assert_eq!(v, serde_json::json!({ "errno": 19 }));
    }

    #[test]
    fn mismatch_messages() {
        let err = TransportError::SequenceMismatch {
            expected: 7,
            got: 8,
        };
        assert_eq!(
            err.to_string(),
            "reply sequence 8 does not match request sequence 7"
        );
    }
}
