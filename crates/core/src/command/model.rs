//! Records produced by the command interpreter.
//!
//! [`BitTiming`] and [`CtrlMode`] mirror the kernel's `struct can_bittiming`
//! and `struct can_ctrlmode`. Their wire form is written field by field in
//! host byte order, which is what the kernel reads for these payloads.

use serde::Serialize;

// ── Bit timing ──────────────────────────────────────────────────────────

/// CAN bit-timing parameters for one bus phase.
///
/// `sample_point` is in tenths of a percent (875 = 87.5 %). A record is
/// "set" once either `bitrate` or `tq` is non-zero; unset records are not
/// sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BitTiming {
    /// Bit rate in bits per second.
    pub bitrate: u32,
    /// Sample point in parts per thousand.
    pub sample_point: u32,
    /// Time quantum in nanoseconds.
    pub tq: u32,
    /// Propagation segment in time quanta.
    pub prop_seg: u32,
    /// Phase buffer segment 1 in time quanta.
    pub phase_seg1: u32,
    /// Phase buffer segment 2 in time quanta.
    pub phase_seg2: u32,
    /// Synchronisation jump width in time quanta.
    pub sjw: u32,
}

impl BitTiming {
    /// Size of the wire form: seven `u32` fields.
    pub const WIRE_LEN: usize = 28;

    /// Whether the record carries anything worth sending.
    pub fn is_set(&self) -> bool {
        self.bitrate != 0 || self.tq != 0
    }

    /// Serialize in kernel field order, host byte order.
    pub fn to_bytes(&self) -> [u8; Self::WIRE_LEN] {
        let fields = [
            self.bitrate,
            self.sample_point,
            self.tq,
            self.prop_seg,
            self.phase_seg1,
            self.phase_seg2,
            self.sjw,
        ];
        let mut out = [0u8; Self::WIRE_LEN];
        for (chunk, field) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_ne_bytes());
        }
        out
    }

    /// Parse the wire form. Returns `None` unless `data` is exactly
    /// [`WIRE_LEN`](Self::WIRE_LEN) bytes.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() != Self::WIRE_LEN {
            return None;
        }
        let mut f = data
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]));
        Some(Self {
            bitrate: f.next()?,
            sample_point: f.next()?,
            tq: f.next()?,
            prop_seg: f.next()?,
            phase_seg1: f.next()?,
            phase_seg2: f.next()?,
            sjw: f.next()?,
        })
    }
}

// ── Control mode ────────────────────────────────────────────────────────

/// Control-mode bits (`CAN_CTRLMODE_*`).
pub mod ctrlmode {
    /// Loopback mode.
    pub const LOOPBACK: u32 = 0x01;
    /// Listen-only mode.
    pub const LISTENONLY: u32 = 0x02;
    /// Triple sampling.
    pub const TRIPLE_SAMPLING: u32 = 0x04;
    /// One-shot mode.
    pub const ONE_SHOT: u32 = 0x08;
    /// Bus-error reporting.
    pub const BERR_REPORTING: u32 = 0x10;
    /// CAN FD mode.
    pub const FD: u32 = 0x20;
    /// Ignore missing CAN ACKs.
    pub const PRESUME_ACK: u32 = 0x40;
    /// CAN FD in non-ISO mode.
    pub const FD_NON_ISO: u32 = 0x80;
    /// Classic CAN DLC option (kernel 5.11+).
    pub const CC_LEN8_DLC: u32 = 0x100;
}

/// Which control-mode options were touched, and which of those are on.
///
/// `mask` records every option given on the command line; `flags` holds
/// the ones switched on. A record is "set" once any option was touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CtrlMode {
    /// Options switched on.
    pub flags: u32,
    /// Options explicitly given, on or off.
    pub mask: u32,
}

impl CtrlMode {
    /// Size of the wire form: `flags` then `mask`.
    pub const WIRE_LEN: usize = 8;

    /// Switch `bit` on or off and mark it as touched.
    pub fn set(&mut self, bit: u32, on: bool) {
        if on {
            self.flags |= bit;
        } else {
            self.flags &= !bit;
        }
        self.mask |= bit;
    }

    /// Whether any option was touched.
    pub fn is_set(&self) -> bool {
        self.mask != 0
    }

    /// Serialize in host byte order.
    pub fn to_bytes(&self) -> [u8; Self::WIRE_LEN] {
        let mut out = [0u8; Self::WIRE_LEN];
        out[..4].copy_from_slice(&self.flags.to_ne_bytes());
        out[4..].copy_from_slice(&self.mask.to_ne_bytes());
        out
    }

    /// Parse the wire form. Returns `None` unless `data` is exactly 8 bytes.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() != Self::WIRE_LEN {
            return None;
        }
        Some(Self {
            flags: u32::from_ne_bytes([data[0], data[1], data[2], data[3]]),
            mask: u32::from_ne_bytes([data[4], data[5], data[6], data[7]]),
        })
    }
}

// ── Interpreter output ──────────────────────────────────────────────────

/// CAN-specific settings gathered from the options loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanOptions {
    /// Nominal (arbitration phase) bit timing.
    pub bittiming: BitTiming,
    /// CAN FD data phase bit timing.
    pub data_bittiming: BitTiming,
    /// Control-mode toggles.
    pub ctrlmode: CtrlMode,
    /// Manual bus-off restart requested.
    pub restart: bool,
    /// Automatic restart delay in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_ms: Option<u32>,
    /// Termination resistance in ohms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<u16>,
}

/// Requested administrative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminState {
    /// `up`
    Up,
    /// `down`
    Down,
}

/// Link type selected with `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
#[non_exhaustive]
pub enum LinkKind {
    /// A CAN interface and its settings.
    Can(CanOptions),
}

impl LinkKind {
    /// The `IFLA_INFO_KIND` string for this type.
    pub fn name(&self) -> &'static str {
        match self {
            LinkKind::Can(_) => "can",
        }
    }
}

/// A fully interpreted `ip link set` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkCommand {
    /// Interface name, if one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Administrative state change; the last `up`/`down` wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AdminState>,
    /// Link type and its settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<LinkKind>,
}

impl LinkCommand {
    /// CAN settings, if `type can` was given.
    pub fn can(&self) -> Option<&CanOptions> {
        match &self.kind {
            Some(LinkKind::Can(opts)) => Some(opts),
            None => None,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Configure a link.
    Set(LinkCommand),
    /// Show usage.
    Help,
}
