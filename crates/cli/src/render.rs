//! Diagnostic and result rendering.
//!
//! Pretty output goes through ariadne, with the joined command line as the
//! annotated source. JSON output is a single object on stdout so scripts can
//! read one document per invocation.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use canlink_diagnostics::{Diagnostic, Severity};

/// Name shown for the command line in annotated reports.
pub(crate) const SOURCE_NAME: &str = "<command>";

// ── Output format ───────────────────────────────────────────────────────

/// Output format for results and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, else pretty for a terminal and JSON for pipes.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: &Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: &Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        _ => Color::Yellow,
    }
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Render `diag` to stderr against the command line `source`.
///
/// Diagnostics without a span (transport and internal failures) are printed
/// as a standalone `error[CODE]: message` line.
pub(crate) fn render_pretty(source: &str, diag: &Diagnostic) {
    let Some(span) = &diag.span else {
        render_standalone(diag);
        return;
    };

    // Clamp so a zero-width span past the last token still renders.
    let start = span.start.min(source.len());
    let end = span.end.min(source.len()).max(start);

    let mut builder = Report::build(report_kind(&diag.severity), (SOURCE_NAME, start..end))
        .with_code(diag.id.as_ref())
        .with_message(&diag.message)
        .with_config(Config::default().with_compact(false))
        .with_label(
            Label::new((SOURCE_NAME, start..end))
                .with_message(label_message(diag))
                .with_color(severity_color(&diag.severity)),
        );

    if let Some(explanation) = diag.explain() {
        builder = builder.with_help(explanation);
    }

    let mut cache = (SOURCE_NAME, Source::from(source));
    builder.finish().eprint(&mut cache).ok();
}

fn render_standalone(diag: &Diagnostic) {
    let kind = match diag.severity {
        Severity::Error => "error",
        _ => "warning",
    };
    eprintln!(
        "{}: {}",
        format!("{kind}[{}]", diag.id).fg(severity_color(&diag.severity)),
        diag.message
    );
    if let Some(note) = context_note(diag) {
        eprintln!("  = note: {note}");
    }
    if let Some(explanation) = diag.explain() {
        eprintln!("  = help: {explanation}");
    }
}

/// Label text for the offending token.
///
/// The report header already carries the message, so the label prefers the
/// structured context (e.g. `option=bitrate, reason=..., token=abc`).
fn label_message(diag: &Diagnostic) -> String {
    context_note(diag).unwrap_or_else(|| diag.message.clone())
}

fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref().filter(|c| !c.is_empty())?;
    Some(
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

// ── JSON rendering ──────────────────────────────────────────────────────

/// Print `value` as pretty JSON to stdout.
pub(crate) fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The JSON envelope for a failed invocation.
pub(crate) fn error_envelope(
    command: &str,
    diag: &Diagnostic,
    exit_code: i32,
) -> serde_json::Value {
    serde_json::json!({
        "ok": false,
        "command": command,
        "exit_code": exit_code,
        "diagnostics": [diag],
    })
}

// ── Entry point ─────────────────────────────────────────────────────────

/// Report a failure in the given format.
///
/// - `Pretty` → annotated report on stderr.
/// - `Json`   → error envelope on stdout.
pub(crate) fn report(
    source: &str,
    diag: &Diagnostic,
    exit_code: i32,
    format: Format,
) -> anyhow::Result<()> {
    match format {
        Format::Pretty => {
            render_pretty(source, diag);
            Ok(())
        }
        Format::Json => print_json(&error_envelope(source, diag, exit_code)),
    }
}
