//! Readable views of a composed [`Message`], used by dry runs.
//!
//! [`describe`] decodes the attribute tree with names for the attribute
//! types this crate emits. The result serializes to JSON and also renders
//! as an indented text listing via [`MessageDump::to_text`].

use std::fmt::Write as _;

use serde::Serialize;

use crate::command::model::{BitTiming, CtrlMode};
use crate::wire::attr::{Attr, AttrIter};
use crate::wire::consts::{
    IFLA_CAN_BITTIMING, IFLA_CAN_CTRLMODE, IFLA_CAN_DATA_BITTIMING, IFLA_CAN_RESTART,
    IFLA_CAN_RESTART_MS, IFLA_CAN_TERMINATION, IFLA_IFNAME, IFLA_INFO_DATA, IFLA_INFO_KIND,
    IFLA_LINKINFO,
};
use crate::wire::message::{IfInfoMsg, Message, NlMsgHdr};

/// A decoded message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageDump {
    /// Netlink header.
    pub header: NlMsgHdr,
    /// Link header.
    pub ifinfo: IfInfoMsg,
    /// Top-level attributes.
    pub attributes: Vec<AttrNode>,
    /// The encoded message as lowercase hex.
    pub hex: String,
}

/// One attribute in the decoded tree.
#[derive(Debug, Clone, Serialize)]
pub struct AttrNode {
    /// Attribute type with flag bits stripped.
    #[serde(rename = "type")]
    pub kind: u16,
    /// Symbolic name, if known in this position.
    pub name: Option<&'static str>,
    /// Payload length in bytes.
    pub len: usize,
    /// Decoded payload.
    pub value: AttrValue,
}

/// Decoded attribute payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    /// Child attributes of a nest.
    Nest(Vec<AttrNode>),
    /// NUL-terminated string.
    String(String),
    /// 16-bit integer.
    U16(u16),
    /// 32-bit integer.
    U32(u32),
    /// `struct can_bittiming`.
    BitTiming(BitTiming),
    /// `struct can_ctrlmode`.
    CtrlMode(CtrlMode),
    /// Anything else, as hex.
    Bytes(String),
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Link,
    LinkInfo,
    CanData,
    Unknown,
}

/// Decode `message` for display.
pub fn describe(message: &Message) -> MessageDump {
    MessageDump {
        header: *message.header(),
        ifinfo: *message.ifinfo(),
        attributes: nodes(AttrIter::new(message.attrs()), Scope::Link),
        hex: hex(&message.encode()),
    }
}

fn nodes(iter: AttrIter<'_>, scope: Scope) -> Vec<AttrNode> {
    iter.map(|attr| node(&attr, scope)).collect()
}

fn node(attr: &Attr<'_>, scope: Scope) -> AttrNode {
    let name = name_of(scope, attr.kind);
    let value = if attr.nested {
        let inner = match (scope, attr.kind) {
            (Scope::Link, IFLA_LINKINFO) => Scope::LinkInfo,
            (Scope::LinkInfo, IFLA_INFO_DATA) => Scope::CanData,
            _ => Scope::Unknown,
        };
        AttrValue::Nest(nodes(attr.children(), inner))
    } else {
        leaf_value(attr, scope)
    };
    AttrNode {
        kind: attr.kind,
        name,
        len: attr.payload.len(),
        value,
    }
}

fn name_of(scope: Scope, kind: u16) -> Option<&'static str> {
    let name = match (scope, kind) {
        (Scope::Link, IFLA_IFNAME) => "IFLA_IFNAME",
        (Scope::Link, IFLA_LINKINFO) => "IFLA_LINKINFO",
        (Scope::LinkInfo, IFLA_INFO_KIND) => "IFLA_INFO_KIND",
        (Scope::LinkInfo, IFLA_INFO_DATA) => "IFLA_INFO_DATA",
        (Scope::CanData, IFLA_CAN_BITTIMING) => "IFLA_CAN_BITTIMING",
        (Scope::CanData, IFLA_CAN_CTRLMODE) => "IFLA_CAN_CTRLMODE",
        (Scope::CanData, IFLA_CAN_RESTART_MS) => "IFLA_CAN_RESTART_MS",
        (Scope::CanData, IFLA_CAN_RESTART) => "IFLA_CAN_RESTART",
        (Scope::CanData, IFLA_CAN_DATA_BITTIMING) => "IFLA_CAN_DATA_BITTIMING",
        (Scope::CanData, IFLA_CAN_TERMINATION) => "IFLA_CAN_TERMINATION",
        _ => return None,
    };
    Some(name)
}

fn leaf_value(attr: &Attr<'_>, scope: Scope) -> AttrValue {
    let decoded = match (scope, attr.kind) {
        (Scope::Link, IFLA_IFNAME) | (Scope::LinkInfo, IFLA_INFO_KIND) => {
            attr.as_str().map(|s| AttrValue::String(s.to_owned()))
        }
        (Scope::CanData, IFLA_CAN_BITTIMING | IFLA_CAN_DATA_BITTIMING) => {
            BitTiming::from_bytes(attr.payload).map(AttrValue::BitTiming)
        }
        (Scope::CanData, IFLA_CAN_CTRLMODE) => {
            CtrlMode::from_bytes(attr.payload).map(AttrValue::CtrlMode)
        }
        (Scope::CanData, IFLA_CAN_RESTART | IFLA_CAN_RESTART_MS) => {
            attr.as_u32().map(AttrValue::U32)
        }
        (Scope::CanData, IFLA_CAN_TERMINATION) => attr.as_u16().map(AttrValue::U16),
        _ => None,
    };
    decoded.unwrap_or_else(|| AttrValue::Bytes(hex(attr.payload)))
}

/// Lowercase hex without separators.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

impl MessageDump {
    /// Render as an indented listing followed by a hex dump, 16 bytes per
    /// line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let h = &self.header;
        let _ = writeln!(
            out,
            "nlmsghdr  len={} type={} flags={:#06x} seq={} pid={}",
            h.len, h.kind, h.flags, h.seq, h.pid
        );
        let i = &self.ifinfo;
        let _ = writeln!(
            out,
            "ifinfomsg family={} type={} index={} flags={:#x} change={:#x}",
            i.family, i.device_type, i.index, i.flags, i.change
        );
        for node in &self.attributes {
            write_node(&mut out, node, 1);
        }
        let bytes = self.hex.as_bytes();
        for (line, chunk) in bytes.chunks(32).enumerate() {
            let _ = write!(out, "{:04x} ", line * 16);
            for pair in chunk.chunks(2) {
                out.push(' ');
                out.push_str(std::str::from_utf8(pair).unwrap_or("??"));
            }
            out.push('\n');
        }
        out
    }
}

fn write_node(out: &mut String, node: &AttrNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = node.name.map_or_else(|| format!("type {}", node.kind), str::to_owned);
    match &node.value {
        AttrValue::Nest(children) => {
            let _ = writeln!(out, "{indent}{label} (nest, {} bytes)", node.len);
            for child in children {
                write_node(out, child, depth + 1);
            }
        }
        AttrValue::String(s) => {
            let _ = writeln!(out, "{indent}{label} = \"{s}\"");
        }
        AttrValue::U16(v) => {
            let _ = writeln!(out, "{indent}{label} = {v}");
        }
        AttrValue::U32(v) => {
            let _ = writeln!(out, "{indent}{label} = {v}");
        }
        AttrValue::BitTiming(bt) => {
            let _ = writeln!(
                out,
                "{indent}{label} bitrate={} sample-point={} tq={} prop-seg={} phase-seg1={} phase-seg2={} sjw={}",
                bt.bitrate, bt.sample_point, bt.tq, bt.prop_seg, bt.phase_seg1, bt.phase_seg2, bt.sjw
            );
        }
        AttrValue::CtrlMode(cm) => {
            let _ = writeln!(
                out,
                "{indent}{label} flags={:#x} mask={:#x}",
                cm.flags, cm.mask
            );
        }
        AttrValue::Bytes(h) => {
            let _ = writeln!(out, "{indent}{label} = 0x{h}");
        }
    }
}
