//! Configuration types for the netlink transport.

use std::time::Duration;

/// Default size of the receive buffer, large enough for any ack.
pub const DEFAULT_RECV_BUFFER: usize = 8192;

/// Complete transport configuration: timeouts, buffer size and tracing.
#[non_exhaustive]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransportConfig {
    /// Socket timeout settings.
    pub timeouts: Timeouts,
    /// Bytes read per `recv` call. Replies longer than this are truncated
    /// by the kernel and rejected as malformed.
    pub recv_buffer: usize,
    /// Emit hex dumps of every datagram at `trace` level.
    pub trace_io: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            recv_buffer: DEFAULT_RECV_BUFFER,
            trace_io: false,
        }
    }
}

/// Timeout settings for the netlink socket.
///
/// The kernel answers configuration requests synchronously, so the only
/// wait is for the acknowledgement. 5 s covers drivers that restart the
/// controller while handling the request.
#[non_exhaustive]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Timeouts {
    /// Maximum time to wait for the acknowledgement after sending.
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(5),
        }
    }
}

impl TransportConfig {
    /// Replace the read timeout.
    pub fn with_read_timeout(mut self, read: Duration) -> Self {
        self.timeouts.read = read;
        self
    }

    /// Enable or disable datagram hex dumps.
    pub fn with_trace_io(mut self, trace_io: bool) -> Self {
        self.trace_io = trace_io;
        self
    }
}
