//! `ip link set` interpreter.
//!
//! Walks a [`TokenStream`] in three phases:
//!
//! 1. the `ip link set` signature,
//! 2. the link options loop (`up`, `down`, `type`, `help`, `[dev] NAME`),
//! 3. once `type can` is seen, the CAN options loop over everything left.
//!
//! Every keyword may be abbreviated (see [`keyword`](super::keyword)); the
//! first keyword in table order wins. Errors abort the pass immediately.

use super::decode::{decode_float, decode_u16, decode_u32};
use super::keyword;
use super::model::{
    AdminState, BitTiming, CanOptions, Invocation, LinkCommand, LinkKind, ctrlmode,
};
use super::tokens::{Token, TokenStream};
use crate::error::{CommandError, InvalidReason};
use crate::wire::compose::link_kind;
use crate::wire::consts::IFNAMSIZ;

/// Capability flags that change which options are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Accept `cc-len8-dlc` (needs kernel 5.11 or newer).
    pub cc_len8_dlc: bool,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self { cc_len8_dlc: true }
    }
}

const SIGNATURE: [&str; 3] = ["ip", "link", "set"];

const LINK_KEYWORDS: &[&str] = &["up", "down", "type", "help", "dev"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Nominal,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Bitrate,
    Tq,
    PropSeg,
    PhaseSeg1,
    PhaseSeg2,
    Sjw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CanOption {
    Timing(Phase, Field),
    SamplePoint(Phase),
    Toggle(u32),
    Restart,
    RestartMs,
    Termination,
}

/// CAN options in match priority order.
const CAN_OPTIONS: &[(&str, CanOption)] = &[
    ("bitrate", CanOption::Timing(Phase::Nominal, Field::Bitrate)),
    ("sample-point", CanOption::SamplePoint(Phase::Nominal)),
    ("tq", CanOption::Timing(Phase::Nominal, Field::Tq)),
    ("prop-seg", CanOption::Timing(Phase::Nominal, Field::PropSeg)),
    ("phase-seg1", CanOption::Timing(Phase::Nominal, Field::PhaseSeg1)),
    ("phase-seg2", CanOption::Timing(Phase::Nominal, Field::PhaseSeg2)),
    ("sjw", CanOption::Timing(Phase::Nominal, Field::Sjw)),
    ("dbitrate", CanOption::Timing(Phase::Data, Field::Bitrate)),
    ("dsample-point", CanOption::SamplePoint(Phase::Data)),
    ("dtq", CanOption::Timing(Phase::Data, Field::Tq)),
    ("dprop-seg", CanOption::Timing(Phase::Data, Field::PropSeg)),
    ("dphase-seg1", CanOption::Timing(Phase::Data, Field::PhaseSeg1)),
    ("dphase-seg2", CanOption::Timing(Phase::Data, Field::PhaseSeg2)),
    ("dsjw", CanOption::Timing(Phase::Data, Field::Sjw)),
    ("loopback", CanOption::Toggle(ctrlmode::LOOPBACK)),
    ("listen-only", CanOption::Toggle(ctrlmode::LISTENONLY)),
    ("triple-sampling", CanOption::Toggle(ctrlmode::TRIPLE_SAMPLING)),
    ("one-shot", CanOption::Toggle(ctrlmode::ONE_SHOT)),
    ("berr-reporting", CanOption::Toggle(ctrlmode::BERR_REPORTING)),
    ("fd", CanOption::Toggle(ctrlmode::FD)),
    ("fd-non-iso", CanOption::Toggle(ctrlmode::FD_NON_ISO)),
    ("presume-ack", CanOption::Toggle(ctrlmode::PRESUME_ACK)),
    ("cc-len8-dlc", CanOption::Toggle(ctrlmode::CC_LEN8_DLC)),
    ("restart", CanOption::Restart),
    ("restart-ms", CanOption::RestartMs),
    ("termination", CanOption::Termination),
];

/// Interpret a full `ip link set ...` command line.
///
/// On success the stream is exhausted. `help` anywhere in the link options
/// short-circuits to [`Invocation::Help`].
pub fn interpret(
    tokens: &mut TokenStream,
    options: &InterpreterOptions,
) -> Result<Invocation, CommandError> {
    expect_signature(tokens)?;
    if tokens.is_exhausted() {
        return Err(CommandError::IncompleteCommand {
            index: tokens.position(),
            expected: "device or link option",
        });
    }

    let mut cmd = LinkCommand::default();
    while !tokens.is_exhausted() {
        let tok = tokens.advance("link option")?;
        match keyword::first_match(LINK_KEYWORDS, tok.as_str()) {
            Some("up") => cmd.state = Some(AdminState::Up),
            Some("down") => cmd.state = Some(AdminState::Down),
            Some("type") => {
                let value = tokens.advance("link type")?;
                let mut kind = link_kind(&value)?;
                match &mut kind {
                    LinkKind::Can(opts) => interpret_can(tokens, opts, options)?,
                }
                cmd.kind = Some(kind);
                break;
            }
            Some("help") => return Ok(Invocation::Help),
            Some("dev") => {
                let name = tokens.advance("device name")?;
                set_device(&mut cmd, name)?;
            }
            _ => set_device(&mut cmd, tok)?,
        }
    }

    tracing::debug!(
        device = cmd.device.as_deref().unwrap_or("-"),
        state = ?cmd.state,
        kind = cmd.kind.as_ref().map(LinkKind::name).unwrap_or("-"),
        "interpreted link command"
    );
    Ok(Invocation::Set(cmd))
}

fn expect_signature(tokens: &mut TokenStream) -> Result<(), CommandError> {
    for word in SIGNATURE {
        let tok = tokens.advance("\"ip link set\"")?;
        if !keyword::matches(word, tok.as_str()) {
            return Err(CommandError::IncompleteCommand {
                index: tok.index,
                expected: "\"ip link set\"",
            });
        }
    }
    Ok(())
}

fn set_device(cmd: &mut LinkCommand, name: Token) -> Result<(), CommandError> {
    if cmd.device.is_some() {
        return Err(CommandError::DuplicateArgument {
            key: "dev",
            token: name,
        });
    }
    let max = IFNAMSIZ - 1;
    if name.text.len() > max {
        let len = name.text.len();
        return Err(invalid("dev", &name, InvalidReason::NameTooLong { len, max }));
    }
    cmd.device = Some(name.text);
    Ok(())
}

/// Run the CAN options loop until the stream is exhausted.
fn interpret_can(
    tokens: &mut TokenStream,
    can: &mut CanOptions,
    options: &InterpreterOptions,
) -> Result<(), CommandError> {
    while !tokens.is_exhausted() {
        let tok = tokens.advance("CAN option")?;
        let Some(&(name, option)) = CAN_OPTIONS.iter().find(|(name, option)| {
            enabled(*option, options) && keyword::matches(name, tok.as_str())
        }) else {
            return Err(CommandError::UnknownOption { token: tok });
        };
        tracing::trace!(option = name, token = %tok, "matched CAN option");

        match option {
            CanOption::Timing(phase, field) => {
                let value = tokens.advance(name)?;
                let v = decode_u32(value.as_str(), 0)
                    .map_err(|e| invalid(name, &value, e.into()))?;
                *timing_field(timing(can, phase), field) = v;
            }
            CanOption::SamplePoint(phase) => {
                let value = tokens.advance(name)?;
                timing(can, phase).sample_point = sample_point(name, &value)?;
            }
            CanOption::Toggle(bit) => {
                let value = tokens.advance(name)?;
                let on = match value.as_str() {
                    "on" => true,
                    "off" => false,
                    _ => return Err(invalid(name, &value, InvalidReason::NotOnOff)),
                };
                can.ctrlmode.set(bit, on);
            }
            CanOption::Restart => can.restart = true,
            CanOption::RestartMs => {
                let value = tokens.advance(name)?;
                let ms = decode_u32(value.as_str(), 0)
                    .map_err(|e| invalid(name, &value, e.into()))?;
                can.restart_ms = Some(ms);
            }
            CanOption::Termination => {
                let value = tokens.advance(name)?;
                let ohms = decode_u16(value.as_str(), 0)
                    .map_err(|e| invalid(name, &value, e.into()))?;
                can.termination = Some(ohms);
            }
        }
    }
    Ok(())
}

fn enabled(option: CanOption, options: &InterpreterOptions) -> bool {
    match option {
        CanOption::Toggle(ctrlmode::CC_LEN8_DLC) => options.cc_len8_dlc,
        _ => true,
    }
}

fn timing(can: &mut CanOptions, phase: Phase) -> &mut BitTiming {
    match phase {
        Phase::Nominal => &mut can.bittiming,
        Phase::Data => &mut can.data_bittiming,
    }
}

fn timing_field(bt: &mut BitTiming, field: Field) -> &mut u32 {
    match field {
        Field::Bitrate => &mut bt.bitrate,
        Field::Tq => &mut bt.tq,
        Field::PropSeg => &mut bt.prop_seg,
        Field::PhaseSeg1 => &mut bt.phase_seg1,
        Field::PhaseSeg2 => &mut bt.phase_seg2,
        Field::Sjw => &mut bt.sjw,
    }
}

/// Decode a sample point given as a fraction and scale it to tenths of a
/// percent. The scaled value must land in `0..=999`, so values that round
/// up to 1000 are rejected along with anything outside `[0.0, 1.0)`.
fn sample_point(option: &'static str, value: &Token) -> Result<u32, CommandError> {
    let v = decode_float(value.as_str()).map_err(|e| invalid(option, value, e.into()))?;
    let scaled = (v * 1000.0).round();
    if !(0.0..1.0).contains(&v) || scaled > 999.0 {
        return Err(invalid(option, value, InvalidReason::SamplePointRange { value: v }));
    }
    Ok(scaled as u32)
}

fn invalid(option: &'static str, token: &Token, reason: InvalidReason) -> CommandError {
    CommandError::InvalidValue {
        option,
        token: token.clone(),
        reason,
    }
}
