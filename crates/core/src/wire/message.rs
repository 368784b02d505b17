//! Netlink message framing for `RTM_NEWLINK` requests.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ nlmsghdr (16 bytes)                     │
//! │   len u32, type u16, flags u16,         │
//! │   seq u32, pid u32                      │
//! ├─────────────────────────────────────────┤
//! │ ifinfomsg (16 bytes)                    │
//! │   family u8, pad u8, type u16,          │
//! │   index i32, flags u32, change u32      │
//! ├─────────────────────────────────────────┤
//! │ attributes (TLV)                        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! All fields are in host byte order.

use serde::Serialize;

use crate::wire::consts::{
    AF_UNSPEC, IFINFOMSG_LEN, NLM_F_ACK, NLM_F_REQUEST, NLMSG_HDRLEN, RTM_NEWLINK, nlmsg_align,
};

/// `struct nlmsghdr`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NlMsgHdr {
    /// Total message length including this header.
    pub len: u32,
    /// Message type.
    pub kind: u16,
    /// `NLM_F_*` flags.
    pub flags: u16,
    /// Sequence number.
    pub seq: u32,
    /// Sender port id (0 for the kernel or an unbound socket).
    pub pid: u32,
}

impl NlMsgHdr {
    /// Serialize in host byte order.
    pub fn to_bytes(&self) -> [u8; NLMSG_HDRLEN] {
        let mut out = [0u8; NLMSG_HDRLEN];
        out[0..4].copy_from_slice(&self.len.to_ne_bytes());
        out[4..6].copy_from_slice(&self.kind.to_ne_bytes());
        out[6..8].copy_from_slice(&self.flags.to_ne_bytes());
        out[8..12].copy_from_slice(&self.seq.to_ne_bytes());
        out[12..16].copy_from_slice(&self.pid.to_ne_bytes());
        out
    }

    /// Parse a header from the start of `data`.
    ///
    /// Returns `None` if `data` is shorter than a header.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let h = data.get(..NLMSG_HDRLEN)?;
        Some(Self {
            len: u32::from_ne_bytes([h[0], h[1], h[2], h[3]]),
            kind: u16::from_ne_bytes([h[4], h[5]]),
            flags: u16::from_ne_bytes([h[6], h[7]]),
            seq: u32::from_ne_bytes([h[8], h[9], h[10], h[11]]),
            pid: u32::from_ne_bytes([h[12], h[13], h[14], h[15]]),
        })
    }
}

/// `struct ifinfomsg`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IfInfoMsg {
    /// Address family.
    pub family: u8,
    /// Device type (`ARPHRD_*`), 0 when unspecified.
    pub device_type: u16,
    /// Interface index, 0 when the device is named by `IFLA_IFNAME`.
    pub index: i32,
    /// Interface flags (`IFF_*`).
    pub flags: u32,
    /// Which bits of `flags` the request changes.
    pub change: u32,
}

impl IfInfoMsg {
    /// Serialize in host byte order; the pad byte is zero.
    pub fn to_bytes(&self) -> [u8; IFINFOMSG_LEN] {
        let mut out = [0u8; IFINFOMSG_LEN];
        out[0] = self.family;
        out[2..4].copy_from_slice(&self.device_type.to_ne_bytes());
        out[4..8].copy_from_slice(&self.index.to_ne_bytes());
        out[8..12].copy_from_slice(&self.flags.to_ne_bytes());
        out[12..16].copy_from_slice(&self.change.to_ne_bytes());
        out
    }

    /// Parse from the start of `data`.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let m = data.get(..IFINFOMSG_LEN)?;
        Some(Self {
            family: m[0],
            device_type: u16::from_ne_bytes([m[2], m[3]]),
            index: i32::from_ne_bytes([m[4], m[5], m[6], m[7]]),
            flags: u32::from_ne_bytes([m[8], m[9], m[10], m[11]]),
            change: u32::from_ne_bytes([m[12], m[13], m[14], m[15]]),
        })
    }
}

/// A complete `RTM_NEWLINK` request: header, link header, attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    header: NlMsgHdr,
    ifinfo: IfInfoMsg,
    attrs: Vec<u8>,
}

impl Message {
    /// Build a create/modify-link request that asks for an acknowledgement.
    ///
    /// `attrs` must be a finished attribute run (see
    /// [`AttrBuilder::finish`](crate::wire::attr::AttrBuilder::finish)).
    pub fn new_link(seq: u32, ifinfo: IfInfoMsg, attrs: Vec<u8>) -> Self {
        let len = NLMSG_HDRLEN + IFINFOMSG_LEN + nlmsg_align(attrs.len());
        Self {
            header: NlMsgHdr {
                len: len as u32,
                kind: RTM_NEWLINK,
                flags: NLM_F_REQUEST | NLM_F_ACK,
                seq,
                pid: 0,
            },
            ifinfo,
            attrs,
        }
    }

    /// The netlink header.
    pub fn header(&self) -> &NlMsgHdr {
        &self.header
    }

    /// The link header.
    pub fn ifinfo(&self) -> &IfInfoMsg {
        &self.ifinfo
    }

    /// The top-level attribute bytes.
    pub fn attrs(&self) -> &[u8] {
        &self.attrs
    }

    /// Sequence number used to match the kernel's acknowledgement.
    pub fn seq(&self) -> u32 {
        self.header.seq
    }

    /// Total encoded length in bytes.
    pub fn len(&self) -> usize {
        self.header.len as usize
    }

    /// Always false: a message carries at least its two headers.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.ifinfo.to_bytes());
        out.extend_from_slice(&self.attrs);
        out.resize(self.len(), 0);
        out
    }

    /// Decode wire bytes produced by [`encode`](Self::encode).
    ///
    /// Returns `None` when the buffer is shorter than the headers or than
    /// the length the header claims.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let header = NlMsgHdr::from_bytes(data)?;
        let len = header.len as usize;
        if len < NLMSG_HDRLEN + IFINFOMSG_LEN || len > data.len() {
            return None;
        }
        let ifinfo = IfInfoMsg::from_bytes(&data[NLMSG_HDRLEN..])?;
        let attrs = data[NLMSG_HDRLEN + IFINFOMSG_LEN..len].to_vec();
        Some(Self {
            header,
            ifinfo,
            attrs,
        })
    }
}

/// Link header for a request that touches no interface flags.
pub fn unspec_ifinfo() -> IfInfoMsg {
    IfInfoMsg {
        family: AF_UNSPEC,
        ..IfInfoMsg::default()
    }
}
