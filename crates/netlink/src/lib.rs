//! canlink netlink transport: deliver composed requests to the kernel.
//!
//! [`NetlinkSocket`] talks `NETLINK_ROUTE` on Linux. The [`Transport`]
//! trait keeps the rest of the program independent of the socket so that
//! tests can substitute an in-memory transport.
mod ack;
mod config;
mod error;
#[cfg(all(feature = "socket", target_os = "linux"))]
mod socket;

pub use ack::{AckStatus, parse_reply, read_ack};
pub use config::{DEFAULT_RECV_BUFFER, Timeouts, TransportConfig};
pub use error::{KernelError, TransportError};
#[cfg(all(feature = "socket", target_os = "linux"))]
pub use socket::NetlinkSocket;

use canlink_core::Message;

// ── Traits ──────────────────────────────────────────────────────────────

/// Deliver a netlink request and wait for its acknowledgement.
pub trait Transport {
    /// Send one complete, encoded netlink message.
    fn send(&mut self, buffer: &[u8]) -> Result<(), TransportError>;

    /// Wait for the acknowledgement of the request numbered `expected_seq`.
    ///
    /// A negative acknowledgement surfaces as [`TransportError::Kernel`].
    fn receive_ack(&mut self, expected_seq: u32) -> Result<(), TransportError>;

    /// Send `message` and wait for its acknowledgement.
    fn request(&mut self, message: &Message) -> Result<(), TransportError> {
        let bytes = message.encode();
        tracing::debug!(seq = message.seq(), len = bytes.len(), "sending request");
        self.send(&bytes)?;
        self.receive_ack(message.seq())
    }
}
