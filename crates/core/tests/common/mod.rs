//! Shared test helpers for `canlink_core` integration tests.

#![allow(unreachable_pub)]

use canlink_core::{
    Attr, AttrIter, CanOptions, Error, Invocation, InterpreterOptions, LinkCommand, Message,
    TokenStream, compose, interpret,
};

/// Split a command line on whitespace into a token stream.
pub fn tokens(line: &str) -> TokenStream {
    TokenStream::new(line.split_whitespace())
}

/// Interpret `line` with default options and expect a `Set` invocation.
pub fn link_command(line: &str) -> LinkCommand {
    let mut ts = tokens(line);
    match interpret(&mut ts, &InterpreterOptions::default()) {
        Ok(Invocation::Set(cmd)) => cmd,
        other => panic!("expected a link command for {line:?}, got {other:?}"),
    }
}

/// CAN options of `line`, which must contain `type can`.
#[allow(dead_code)]
pub fn can_options(line: &str) -> CanOptions {
    link_command(line)
        .can()
        .cloned()
        .unwrap_or_else(|| panic!("no CAN options in {line:?}"))
}

/// Interpret and compose `line` in one go.
pub fn compose_line(line: &str, seq: u32) -> Result<Message, Error> {
    let mut ts = tokens(line);
    match interpret(&mut ts, &InterpreterOptions::default())? {
        Invocation::Set(cmd) => compose(&cmd, seq),
        Invocation::Help => panic!("unexpected help for {line:?}"),
    }
}

/// Follow a path of attribute types from the top level.
#[allow(dead_code)]
pub fn find_path<'a>(attrs: &'a [u8], path: &[u16]) -> Option<Attr<'a>> {
    let (first, rest) = path.split_first()?;
    let mut attr = AttrIter::new(attrs).find_kind(*first)?;
    for kind in rest {
        attr = attr.children().find_kind(*kind)?;
    }
    Some(attr)
}
