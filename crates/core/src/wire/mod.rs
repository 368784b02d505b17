/// TLV attribute builder and reader.
pub mod attr;
/// `LinkCommand` to `RTM_NEWLINK` request.
pub mod compose;
/// Kernel ABI constants.
pub mod consts;
/// Human- and machine-readable views of a composed message.
pub mod dump;
/// Netlink message framing.
pub mod message;
