//! Kernel ABI constants for `RTM_NEWLINK` requests carrying CAN link data.
//!
//! Values mirror `linux/netlink.h`, `linux/rtnetlink.h`, `linux/if_link.h`,
//! and `linux/can/netlink.h`. They are part of the stable kernel ABI.

// ── netlink ─────────────────────────────────────────────────────────────

/// Size of `struct nlmsghdr`.
pub const NLMSG_HDRLEN: usize = 16;
/// Netlink message alignment.
pub const NLMSG_ALIGNTO: usize = 4;

/// Message type of an error/acknowledgement reply.
pub const NLMSG_ERROR: u16 = 2;
/// Message type terminating a multipart reply.
pub const NLMSG_DONE: u16 = 3;

/// Request flag: the message is a request.
pub const NLM_F_REQUEST: u16 = 0x01;
/// Request flag: ask the kernel for an acknowledgement.
pub const NLM_F_ACK: u16 = 0x04;

/// Attribute header size (`struct nlattr`).
pub const NLA_HDRLEN: usize = 4;
/// Attribute alignment.
pub const NLA_ALIGNTO: usize = 4;
/// Type flag marking a nested attribute.
pub const NLA_F_NESTED: u16 = 1 << 15;
/// Type flag marking a payload in network byte order.
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
/// Mask stripping the flag bits from an attribute type.
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

// ── rtnetlink link messages ─────────────────────────────────────────────

/// Create or modify a link.
pub const RTM_NEWLINK: u16 = 16;
/// Size of `struct ifinfomsg`.
pub const IFINFOMSG_LEN: usize = 16;
/// `AF_UNSPEC` address family.
pub const AF_UNSPEC: u8 = 0;
/// Interface flag: administratively up.
pub const IFF_UP: u32 = 0x1;

/// Size of an interface name buffer, NUL included.
pub const IFNAMSIZ: usize = 16;

/// `IFLA_IFNAME`: interface name, NUL-terminated string.
pub const IFLA_IFNAME: u16 = 3;
/// `IFLA_LINKINFO`: nest of link-type information.
pub const IFLA_LINKINFO: u16 = 18;
/// `IFLA_INFO_KIND`: link type name inside `IFLA_LINKINFO`.
pub const IFLA_INFO_KIND: u16 = 1;
/// `IFLA_INFO_DATA`: type-specific nest inside `IFLA_LINKINFO`.
pub const IFLA_INFO_DATA: u16 = 2;

// ── CAN link data (inside IFLA_INFO_DATA) ───────────────────────────────

/// `struct can_bittiming` for the nominal (arbitration) phase.
pub const IFLA_CAN_BITTIMING: u16 = 1;
/// `struct can_ctrlmode`.
pub const IFLA_CAN_CTRLMODE: u16 = 5;
/// Automatic restart delay in milliseconds (u32).
pub const IFLA_CAN_RESTART_MS: u16 = 6;
/// Trigger a manual bus-off restart (u32).
pub const IFLA_CAN_RESTART: u16 = 7;
/// `struct can_bittiming` for the CAN FD data phase.
pub const IFLA_CAN_DATA_BITTIMING: u16 = 9;
/// Bus termination resistance in ohms (u16).
pub const IFLA_CAN_TERMINATION: u16 = 11;

/// Upper bound of a request buffer (libmnl's `MNL_SOCKET_BUFFER_SIZE`).
pub const MAX_MESSAGE_LEN: usize = 8192;

/// Round `len` up to the attribute alignment.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Round `len` up to the message alignment.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_rounds_up_to_four() {
        assert_eq!(nla_align(0), 0);
        assert_eq!(nla_align(1), 4);
        assert_eq!(nla_align(4), 4);
        assert_eq!(nla_align(5), 8);
        assert_eq!(nlmsg_align(17), 20);
    }

    #[test]
    fn type_mask_strips_flags() {
        assert_eq!((IFLA_LINKINFO | NLA_F_NESTED) & NLA_TYPE_MASK, IFLA_LINKINFO);
    }
}
