//! Acknowledgement parsing for netlink replies.
//!
//! A request sent with `NLM_F_ACK` is answered by an `NLMSG_ERROR` message
//! whose payload starts with an `i32` error code: 0 for success, a negative
//! errno for rejection. The rest of the payload echoes the request header.
//!
//! ```text
//! ┌────────────────────┬──────────────┬──────────────────────────┐
//! │ nlmsghdr (type 2)  │ error: i32   │ request nlmsghdr (echo)  │
//! └────────────────────┴──────────────┴──────────────────────────┘
//! ```
//!
//! One datagram may carry several messages; each is aligned to 4 bytes.

use std::io::Read;
use std::time::{Duration, Instant};

use canlink_core::NlMsgHdr;
use canlink_core::wire::consts::{NLMSG_DONE, NLMSG_ERROR, NLMSG_HDRLEN, nlmsg_align};

use crate::{KernelError, TransportError};

/// `NLMSG_NOOP`: padding message, always skipped.
const NLMSG_NOOP: u16 = 1;
/// `NLMSG_OVERRUN`: the kernel dropped data for this socket.
const NLMSG_OVERRUN: u16 = 4;

/// Pause between polls of a socket that has nothing to read yet.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What a datagram said about the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    /// The kernel accepted the request.
    Acked,
    /// A dump terminator arrived; treated as completion.
    Done,
    /// Nothing conclusive; keep reading.
    Pending,
}

/// Parse one received datagram.
///
/// `expected_seq` and `port_id` are checked against every message header
/// unless either side is zero, matching how the kernel addresses replies.
pub fn parse_reply(
    data: &[u8],
    expected_seq: u32,
    port_id: u32,
) -> Result<AckStatus, TransportError> {
    let mut rest = data;
    while !rest.is_empty() {
        let header = NlMsgHdr::from_bytes(rest).ok_or_else(|| {
            TransportError::malformed(format!("{} trailing bytes after last message", rest.len()))
        })?;
        let len = header.len as usize;
        if len < NLMSG_HDRLEN || len > rest.len() {
            return Err(TransportError::malformed(format!(
                "message length {len} with {} bytes available",
                rest.len()
            )));
        }

        if header.pid != 0 && port_id != 0 && header.pid != port_id {
            return Err(TransportError::PortMismatch {
                expected: port_id,
                got: header.pid,
            });
        }
        if header.seq != 0 && expected_seq != 0 && header.seq != expected_seq {
            return Err(TransportError::SequenceMismatch {
                expected: expected_seq,
                got: header.seq,
            });
        }

        let payload = &rest[NLMSG_HDRLEN..len];
        match header.kind {
            NLMSG_ERROR => {
                let code = payload
                    .get(..4)
                    .map(|b| i32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
                    .ok_or_else(|| TransportError::malformed("error message without code"))?;
                if code == 0 {
                    return Ok(AckStatus::Acked);
                }
                return Err(KernelError {
                    errno: code.saturating_neg(),
                }
                .into());
            }
            NLMSG_DONE => return Ok(AckStatus::Done),
            NLMSG_OVERRUN => return Err(TransportError::Overrun),
            NLMSG_NOOP => {}
            other => {
                tracing::warn!(kind = other, len, "ignoring unexpected netlink message");
            }
        }

        rest = &rest[nlmsg_align(len).min(rest.len())..];
    }
    Ok(AckStatus::Pending)
}

/// Read datagrams from `source` until one acknowledges `expected_seq`.
///
/// Each `read` call is expected to return one whole datagram, which is
/// what a netlink socket does. `buffer_size` bounds a single read. A source
/// with nothing to read yet (`WouldBlock`/`TimedOut`) is polled until the
/// deadline passes.
pub fn read_ack(
    source: &mut impl Read,
    expected_seq: u32,
    port_id: u32,
    timeout: Duration,
    buffer_size: usize,
    trace_io: bool,
) -> Result<(), TransportError> {
    let now = Instant::now();
    let deadline = now
        .checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(86400));
    let mut buf = vec![0u8; buffer_size];

    loop {
        if Instant::now() >= deadline {
            return Err(TransportError::ReadTimeout { timeout });
        }

        let n = match source.read(&mut buf) {
            Ok(0) => return Err(TransportError::ConnectionClosed),
            Ok(n) => n,
            Err(ref e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                ) =>
            {
                std::thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::ReadFailed(e)),
        };

        if trace_io {
            tracing::trace!(
                len = n,
                bytes = %canlink_core::wire::dump::hex(&buf[..n]),
                "netlink <<<"
            );
        }

        match parse_reply(&buf[..n], expected_seq, port_id)? {
            AckStatus::Acked | AckStatus::Done => {
                tracing::debug!(seq = expected_seq, "request acknowledged");
                return Ok(());
            }
            AckStatus::Pending => continue,
        }
    }
}
