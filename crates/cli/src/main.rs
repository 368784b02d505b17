mod render;

use std::io;
use std::process;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use canlink_core::{
    Invocation, InterpreterOptions, LinkCommand, Message, TokenStream, compose, describe,
    interpret, sequence_from_clock,
};
use canlink_diagnostics::{self as diag, Diagnostic, codes};
use canlink_netlink::{Transport, TransportConfig, TransportError};
use tracing_subscriber::filter::LevelFilter;

use crate::render::{Format, print_json, report};

// ── Exit codes ──────────────────────────────────────────────────────────

/// Bad command line, kernel rejection, or `help`.
const EXIT_COMMAND: i32 = 1;
/// The request could not be delivered or acknowledged.
const EXIT_TRANSPORT: i32 = 2;
/// Attribute builder invariant violation (`EX_SOFTWARE`).
const EXIT_INTERNAL: i32 = 70;

const USAGE: &str = "\
Usage: canlink [OPTIONS] ip link set DEVICE [ up | down ] type can
	[ bitrate BITRATE [ sample-point SAMPLE-POINT ] ] |
	[ tq TQ prop-seg PROP-SEG phase-seg1 PHASE-SEG1
	  phase-seg2 PHASE-SEG2 [ sjw SJW ] ]

	[ dbitrate BITRATE [ dsample-point SAMPLE-POINT ] ] |
	[ dtq TQ dprop-seg PROP-SEG dphase-seg1 PHASE-SEG1
	  dphase-seg2 PHASE-SEG2 [ dsjw SJW ] ]

	[ loopback { on | off } ]
	[ listen-only { on | off } ]
	[ triple-sampling { on | off } ]
	[ one-shot { on | off } ]
	[ berr-reporting { on | off } ]
	[ fd { on | off } ]
	[ fd-non-iso { on | off } ]
	[ presume-ack { on | off } ]
	[ cc-len8-dlc { on | off } ]

	[ restart-ms TIME-MS ]
	[ restart ]

	[ termination { 0..65535 } ]

	Where: BITRATE      := { 1..1000000 }
	       SAMPLE-POINT := { 0.000..0.999 }
	       TQ           := { NUMBER }
	       PROP-SEG     := { 1..8 }
	       PHASE-SEG1   := { 1..8 }
	       PHASE-SEG2   := { 1..8 }
	       SJW          := { 1..4 }
	       RESTART-MS   := { 0 | NUMBER }
";

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "canlink",
    version,
    about = "Configure a CAN interface over rtnetlink from an `ip link set` command line"
)]
struct Cli {
    /// Compose the request and print it instead of sending it.
    #[arg(long)]
    dry_run: bool,

    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// How long to wait for the kernel acknowledgement, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Log level for diagnostics on stderr.
    #[arg(
        long,
        default_value = "warn",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,

    /// Reject `cc-len8-dlc` as an unknown option.
    #[arg(long)]
    no_cc_len8_dlc: bool,

    /// Hex-dump every datagram sent and received at trace level.
    #[arg(long)]
    trace_io: bool,

    /// Explain a diagnostic code (e.g. CAN1003) and exit.
    #[arg(long, value_name = "CODE", conflicts_with = "args")]
    explain: Option<String>,

    /// The command: `ip link set ...`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    if let Some(id) = &cli.explain {
        return cmd_explain(id, format);
    }

    let code = run(&cli, format)?;
    if code != 0 {
        process::exit(code);
    }
    Ok(())
}

fn init_logging(level: &str) {
    let level = match level {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::WARN,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

/// Interpret, compose, then print or send. Returns the exit code.
fn run(cli: &Cli, format: Format) -> Result<i32> {
    let mut tokens = TokenStream::new(&cli.args);
    let line = tokens.command_line();
    let options = InterpreterOptions {
        cc_len8_dlc: !cli.no_cc_len8_dlc,
    };

    let command = match interpret(&mut tokens, &options) {
        Ok(Invocation::Set(command)) => command,
        Ok(Invocation::Help) => {
            eprint!("{USAGE}");
            return Ok(EXIT_COMMAND);
        }
        Err(e) => {
            report(&line, &e.to_diagnostic(&tokens), EXIT_COMMAND, format)?;
            if e.is_usage() {
                eprint!("{USAGE}");
            }
            return Ok(EXIT_COMMAND);
        }
    };

    let message = match compose(&command, sequence_from_clock()) {
        Ok(message) => message,
        Err(e) => {
            let code = if e.is_internal() {
                EXIT_INTERNAL
            } else {
                EXIT_COMMAND
            };
            report(&line, &e.to_diagnostic(&tokens), code, format)?;
            return Ok(code);
        }
    };

    tracing::debug!(seq = message.seq(), len = message.len(), dry_run = cli.dry_run, "composed");

    if cli.dry_run {
        print_dry_run(&line, &command, &message, format)?;
        return Ok(0);
    }

    let config = TransportConfig::default()
        .with_read_timeout(Duration::from_millis(cli.timeout_ms))
        .with_trace_io(cli.trace_io);
    let outcome = open_transport(config).and_then(|mut transport| transport.request(&message));

    match outcome {
        Ok(()) => {
            match format {
                Format::Json => print_json(&serde_json::json!({
                    "ok": true,
                    "command": line,
                    "seq": message.seq(),
                }))?,
                Format::Pretty => eprintln!("{}: configured", device_label(&command)),
            }
            Ok(0)
        }
        Err(e) => {
            let code = if e.is_kernel_rejection() {
                EXIT_COMMAND
            } else {
                EXIT_TRANSPORT
            };
            report(&line, &transport_diagnostic(&e), code, format)?;
            Ok(code)
        }
    }
}

fn print_dry_run(
    line: &str,
    command: &LinkCommand,
    message: &Message,
    format: Format,
) -> Result<()> {
    let dump = describe(message);
    match format {
        Format::Json => print_json(&serde_json::json!({
            "ok": true,
            "dry_run": true,
            "command": line,
            "request": command,
            "message": dump,
        })),
        Format::Pretty => {
            print!("{}", dump.to_text());
            Ok(())
        }
    }
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(&serde_json::json!({
            "id": id,
            "explanation": diag::explain(id),
        })),
        Format::Pretty => {
            use ariadne::Fmt;
            match diag::explain(id) {
                Some(text) => println!("{}: {}", id.fg(ariadne::Color::Cyan), text),
                None => println!("{id}: (no explanation available)"),
            }
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
fn open_transport(config: TransportConfig) -> Result<Box<dyn Transport>, TransportError> {
    Ok(Box::new(canlink_netlink::NetlinkSocket::open(config)?))
}

#[cfg(not(target_os = "linux"))]
fn open_transport(_config: TransportConfig) -> Result<Box<dyn Transport>, TransportError> {
    Err(TransportError::Open(io::Error::new(
        io::ErrorKind::Unsupported,
        "rtnetlink is only available on Linux",
    )))
}

fn transport_diagnostic(err: &TransportError) -> Diagnostic {
    match err {
        TransportError::Kernel(k) => {
            let mut ctx = std::collections::BTreeMap::new();
            ctx.insert("errno".to_string(), k.errno.to_string());
            Diagnostic::error(codes::KERNEL_REJECTED, k.to_string(), None).with_context(ctx)
        }
        other => Diagnostic::error(codes::TRANSPORT_FAILED, error_chain(other), None),
    }
}

fn device_label(command: &LinkCommand) -> &str {
    command.device.as_deref().unwrap_or("link")
}

/// `err` followed by its sources, joined with `: `.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if !text.ends_with(&msg) {
            text.push_str(": ");
            text.push_str(&msg);
        }
        source = cause.source();
    }
    text
}
