//! Integration tests for the netlink transport: uses an in-memory kernel.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::time::Duration;

use canlink_core::wire::consts::{NLMSG_ERROR, NLMSG_HDRLEN};
use canlink_core::{InterpreterOptions, Invocation, Message, NlMsgHdr, TokenStream};
use canlink_netlink::{KernelError, Transport, TransportError, read_ack};

// ── Mock kernel ─────────────────────────────────────────────────────────

/// Queued reply datagrams, one per read.
struct Inbox(VecDeque<Vec<u8>>);

impl Read for Inbox {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(d) = self.0.pop_front() else {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "no reply"));
        };
        let n = d.len().min(buf.len());
        buf[..n].copy_from_slice(&d[..n]);
        Ok(n)
    }
}

/// Accepts every request it can decode and answers with `errno`.
struct MockKernel {
    port_id: u32,
    errno: i32,
    requests: Vec<Message>,
    inbox: Inbox,
}

impl MockKernel {
    fn new(errno: i32) -> Self {
        Self {
            port_id: 4242,
            errno,
            requests: Vec::new(),
            inbox: Inbox(VecDeque::new()),
        }
    }

    fn reply(&self, request: &NlMsgHdr) -> Vec<u8> {
        let len = NLMSG_HDRLEN * 2 + 4;
        let mut out = NlMsgHdr {
            len: len as u32,
            kind: NLMSG_ERROR,
            flags: 0,
            seq: request.seq,
            pid: self.port_id,
        }
        .to_bytes()
        .to_vec();
        out.extend_from_slice(&(-self.errno).to_ne_bytes());
        out.extend_from_slice(&request.to_bytes());
        out
    }
}

impl Transport for MockKernel {
    fn send(&mut self, buffer: &[u8]) -> Result<(), TransportError> {
        let msg = Message::decode(buffer).ok_or(TransportError::Malformed {
            details: "mock kernel could not decode request".into(),
        })?;
        let reply = self.reply(msg.header());
        self.inbox.0.push_back(reply);
        self.requests.push(msg);
        Ok(())
    }

    fn receive_ack(&mut self, expected_seq: u32) -> Result<(), TransportError> {
        read_ack(
            &mut self.inbox,
            expected_seq,
            self.port_id,
            Duration::from_millis(50),
            8192,
            false,
        )
    }
}

fn message(line: &str, seq: u32) -> Message {
    let mut ts = TokenStream::new(line.split_whitespace());
    match canlink_core::interpret(&mut ts, &InterpreterOptions::default()).unwrap() {
        Invocation::Set(cmd) => canlink_core::compose(&cmd, seq).unwrap(),
        Invocation::Help => panic!("unexpected help"),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[test]
fn accepted_request_round_trip() {
    let mut kernel = MockKernel::new(0);
    let msg = message("ip link set can0 type can bitrate 125000", 17);
    kernel.request(&msg).unwrap();
    assert_eq!(kernel.requests, vec![msg]);
}

#[test]
fn rejected_request_reports_errno() {
    let mut kernel = MockKernel::new(19);
    let msg = message("ip link set nosuch0 up", 3);
    let err = kernel.request(&msg).unwrap_err();
    assert!(matches!(
        err,
        TransportError::Kernel(KernelError { errno: 19 })
    ));
}

#[test]
fn missing_ack_times_out() {
    let mut kernel = MockKernel::new(0);
    let err = kernel.receive_ack(5).unwrap_err();
    assert!(matches!(err, TransportError::ReadTimeout { .. }));
}

#[test]
fn stale_reply_is_a_sequence_mismatch() {
    let mut kernel = MockKernel::new(0);
    let msg = message("ip link set can0 down", 10);
    kernel.send(&msg.encode()).unwrap();
    let err = kernel.receive_ack(11).unwrap_err();
    assert!(matches!(
        err,
        TransportError::SequenceMismatch {
            expected: 11,
            got: 10
        }
    ));
}

// ── Real socket (Linux only) ────────────────────────────────────────────

#[cfg(target_os = "linux")]
#[test]
fn kernel_rejects_unknown_device() {
    use canlink_netlink::{NetlinkSocket, TransportConfig};

    // Sandboxes without netlink support cannot run this test.
    let Ok(mut socket) = NetlinkSocket::open(
        TransportConfig::default().with_read_timeout(Duration::from_secs(2)),
    ) else {
        return;
    };
    assert_ne!(socket.port_id(), 0);

    let msg = message("ip link set canlink-none0 up", 1);
    match socket.request(&msg) {
        Err(TransportError::Kernel(e)) => assert!(e.errno > 0),
        Err(TransportError::ReadTimeout { .. } | TransportError::SendFailed(_)) => {}
        other => panic!("expected a kernel rejection, got {other:?}"),
    }
}
