//! Turns a [`LinkCommand`] into an `RTM_NEWLINK` request.
//!
//! ```text
//! IFLA_IFNAME            "can0"
//! IFLA_LINKINFO          (nest)
//! ├── IFLA_INFO_KIND     "can"
//! └── IFLA_INFO_DATA     (nest)
//!     ├── IFLA_CAN_BITTIMING        iff nominal timing set
//!     ├── IFLA_CAN_DATA_BITTIMING   iff data timing set
//!     ├── IFLA_CAN_CTRLMODE         iff any toggle given
//!     ├── IFLA_CAN_RESTART   = 1    iff requested
//!     ├── IFLA_CAN_RESTART_MS       iff given
//!     └── IFLA_CAN_TERMINATION      iff given
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use crate::command::keyword;
use crate::command::model::{AdminState, CanOptions, LinkCommand, LinkKind};
use crate::command::tokens::Token;
use crate::error::{CommandError, Error};
use crate::wire::attr::AttrBuilder;
use crate::wire::consts::{
    IFF_UP, IFINFOMSG_LEN, IFLA_CAN_BITTIMING, IFLA_CAN_CTRLMODE, IFLA_CAN_DATA_BITTIMING,
    IFLA_CAN_RESTART, IFLA_CAN_RESTART_MS, IFLA_CAN_TERMINATION, IFLA_IFNAME, IFLA_INFO_DATA,
    IFLA_INFO_KIND, IFLA_LINKINFO, MAX_MESSAGE_LEN, NLMSG_HDRLEN,
};
use crate::wire::message::{IfInfoMsg, Message, unspec_ifinfo};

/// Resolve the value of `type`. Only `can` (or an abbreviation) is known.
pub fn link_kind(token: &Token) -> Result<LinkKind, CommandError> {
    if keyword::matches("can", token.as_str()) {
        Ok(LinkKind::Can(CanOptions::default()))
    } else {
        Err(CommandError::UnknownType {
            token: token.clone(),
        })
    }
}

/// A sequence number derived from the wall clock (seconds, truncated).
pub fn sequence_from_clock() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Build the request for `cmd` with sequence number `seq`.
///
/// Fails only on an attribute builder invariant violation, which means a
/// defect here rather than bad input.
pub fn compose(cmd: &LinkCommand, seq: u32) -> Result<Message, Error> {
    let mut attrs = AttrBuilder::with_limit(MAX_MESSAGE_LEN - NLMSG_HDRLEN - IFINFOMSG_LEN);

    if let Some(device) = &cmd.device {
        attrs.put_str(IFLA_IFNAME, device)?;
    }

    if let Some(kind) = &cmd.kind {
        let linkinfo = attrs.open_nest(IFLA_LINKINFO)?;
        attrs.put_str(IFLA_INFO_KIND, kind.name())?;
        let data = attrs.open_nest(IFLA_INFO_DATA)?;
        match kind {
            LinkKind::Can(opts) => put_can(&mut attrs, opts)?,
        }
        attrs.close_nest(data)?;
        attrs.close_nest(linkinfo)?;
    }

    let message = Message::new_link(seq, ifinfo_for(cmd.state), attrs.finish()?);
    tracing::debug!(seq, len = message.len(), "composed RTM_NEWLINK request");
    Ok(message)
}

fn ifinfo_for(state: Option<AdminState>) -> IfInfoMsg {
    let mut ifinfo = unspec_ifinfo();
    match state {
        Some(AdminState::Up) => {
            ifinfo.change |= IFF_UP;
            ifinfo.flags |= IFF_UP;
        }
        Some(AdminState::Down) => {
            ifinfo.change |= IFF_UP;
            ifinfo.flags &= !IFF_UP;
        }
        None => {}
    }
    ifinfo
}

fn put_can(attrs: &mut AttrBuilder, opts: &CanOptions) -> Result<(), Error> {
    if opts.bittiming.is_set() {
        attrs.put(IFLA_CAN_BITTIMING, &opts.bittiming.to_bytes())?;
    }
    if opts.data_bittiming.is_set() {
        attrs.put(IFLA_CAN_DATA_BITTIMING, &opts.data_bittiming.to_bytes())?;
    }
    if opts.ctrlmode.is_set() {
        attrs.put(IFLA_CAN_CTRLMODE, &opts.ctrlmode.to_bytes())?;
    }
    if opts.restart {
        attrs.put_u32(IFLA_CAN_RESTART, 1)?;
    }
    if let Some(ms) = opts.restart_ms {
        attrs.put_u32(IFLA_CAN_RESTART_MS, ms)?;
    }
    if let Some(ohms) = opts.termination {
        attrs.put_u16(IFLA_CAN_TERMINATION, ohms)?;
    }
    Ok(())
}
