//! `NETLINK_ROUTE` socket transport.
//!
//! Provides [`NetlinkSocket`], a datagram socket bound to a kernel-assigned
//! port id. Requests go to the kernel (port 0) and the acknowledgement is
//! polled for until the configured read timeout passes.

use std::io;

use netlink_sys::{Socket, SocketAddr, protocols::NETLINK_ROUTE};

use crate::ack::read_ack;
use crate::{Transport, TransportConfig, TransportError};

/// An open, bound `AF_NETLINK`/`NETLINK_ROUTE` socket.
pub struct NetlinkSocket {
    socket: Socket,
    port_id: u32,
    config: TransportConfig,
}

impl NetlinkSocket {
    /// Open a non-blocking `NETLINK_ROUTE` socket bound to an automatic
    /// port id.
    pub fn open(config: TransportConfig) -> Result<Self, TransportError> {
        let mut socket = Socket::new(NETLINK_ROUTE).map_err(TransportError::Open)?;
        let port_id = socket
            .bind_auto()
            .map_err(TransportError::Bind)?
            .port_number();
        socket
            .set_non_blocking(true)
            .map_err(TransportError::Open)?;
        tracing::debug!(port_id, "netlink socket bound");

        Ok(Self {
            socket,
            port_id,
            config,
        })
    }

    /// Port id the kernel assigned to this socket.
    pub fn port_id(&self) -> u32 {
        self.port_id
    }
}

impl Transport for NetlinkSocket {
    fn send(&mut self, buffer: &[u8]) -> Result<(), TransportError> {
        if self.config.trace_io {
            tracing::trace!(
                len = buffer.len(),
                bytes = %canlink_core::wire::dump::hex(buffer),
                "netlink >>>"
            );
        }
        let sent = self
            .socket
            .send_to(buffer, &kernel(), 0)
            .map_err(TransportError::SendFailed)?;
        if sent != buffer.len() {
            return Err(TransportError::SendFailed(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} bytes", buffer.len()),
            )));
        }
        Ok(())
    }

    fn receive_ack(&mut self, expected_seq: u32) -> Result<(), TransportError> {
        read_ack(
            &mut Datagrams(&self.socket),
            expected_seq,
            self.port_id,
            self.config.timeouts.read,
            self.config.recv_buffer,
            self.config.trace_io,
        )
    }
}

/// The kernel's address: port 0, no multicast groups.
fn kernel() -> SocketAddr {
    SocketAddr::new(0, 0)
}

/// One `recv` per `read`, so each read yields a whole datagram.
struct Datagrams<'a>(&'a Socket);

impl io::Read for Datagrams<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut window = buf;
        self.0.recv(&mut window, 0)
    }
}
