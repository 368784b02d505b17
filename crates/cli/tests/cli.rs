//! Drive the `canlink` binary end to end without touching the kernel.

use std::process::{Command, Output};

use assert_cmd::cargo;

fn canlink_cmd() -> Command {
    Command::new(cargo::cargo_bin!("canlink"))
}

fn run(args: &[&str]) -> Output {
    canlink_cmd().args(args).output().expect("run canlink")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("valid json on stdout")
}

fn named<'a>(nodes: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    nodes
        .as_array()
        .and_then(|a| a.iter().find(|n| n["name"] == name))
        .unwrap_or_else(|| panic!("no attribute {name} in {nodes}"))
}

// ── Dry run ─────────────────────────────────────────────────────────────

#[test]
fn dry_run_json_describes_request() {
    let output = run(&[
        "--dry-run", "--output", "json", "ip", "link", "set", "dev", "can0", "up", "type", "can",
        "bitrate", "500000", "restart",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["request"]["device"], "can0");

    let message = &json["message"];
    assert_eq!(message["header"]["kind"], 16);
    assert_eq!(message["header"]["flags"], 5);
    assert_eq!(message["header"]["len"], 100);
    assert_eq!(message["ifinfo"]["flags"], 1);
    assert_eq!(message["ifinfo"]["change"], 1);
    assert_eq!(message["hex"].as_str().map(str::len), Some(200));

    let attrs = &message["attributes"];
    assert_eq!(named(attrs, "IFLA_IFNAME")["value"]["value"], "can0");
    let linkinfo = &named(attrs, "IFLA_LINKINFO")["value"]["value"];
    assert_eq!(named(linkinfo, "IFLA_INFO_KIND")["value"]["value"], "can");
    let data = &named(linkinfo, "IFLA_INFO_DATA")["value"]["value"];
    let timing = &named(data, "IFLA_CAN_BITTIMING")["value"]["value"];
    assert_eq!(timing["bitrate"], 500_000);
    assert_eq!(named(data, "IFLA_CAN_RESTART")["value"]["value"], 1);
}

#[test]
fn dry_run_pretty_prints_tree_and_hex() {
    let output = run(&[
        "--dry-run", "--output", "pretty", "ip", "link", "set", "can0", "type", "can", "loopback",
        "on",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("IFLA_CAN_CTRLMODE"), "stdout: {stdout}");
    assert!(stdout.contains("IFLA_IFNAME"), "stdout: {stdout}");
}

#[test]
fn dry_run_without_type_has_no_linkinfo() {
    let output = run(&["--dry-run", "--output", "json", "ip", "link", "set", "can0", "down"]);
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    let attrs = json["message"]["attributes"].as_array().expect("attributes");
    assert_eq!(attrs.len(), 1);
    assert_eq!(json["message"]["ifinfo"]["flags"], 0);
    assert_eq!(json["message"]["ifinfo"]["change"], 1);
}

// ── Command errors ──────────────────────────────────────────────────────

#[test]
fn invalid_value_reports_token_and_exits_1() {
    let output = run(&[
        "--output", "json", "ip", "link", "set", "can0", "type", "can", "bitrate", "fast",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["exit_code"], 1);
    let diag = &json["diagnostics"][0];
    assert_eq!(diag["id"], "CAN1003");
    assert_eq!(diag["context"]["token"], "fast");
    assert_eq!(diag["context"]["option"], "bitrate");
    // "ip link set can0 type can bitrate " is 34 bytes.
    assert_eq!(diag["span"]["start"], 34);
    assert_eq!(diag["span"]["end"], 38);
}

#[test]
fn unknown_type_is_a_usage_error() {
    let output = run(&["--output", "json", "ip", "link", "set", "can0", "type", "vcan"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["diagnostics"][0]["id"], "CAN1005");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: canlink"), "stderr: {stderr}");
}

#[test]
fn duplicate_device_is_rejected() {
    let output = run(&["--output", "json", "ip", "link", "set", "can0", "can1"]);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["diagnostics"][0]["id"], "CAN1002");
    assert_eq!(json["diagnostics"][0]["context"]["token"], "can1");
}

#[test]
fn overlong_device_name_is_a_command_error() {
    let long = "x".repeat(9000);
    let output = run(&["--dry-run", "--output", "json", "ip", "link", "set", &long, "up"]);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    let diag = &json["diagnostics"][0];
    assert_eq!(diag["id"], "CAN1003");
    assert_eq!(diag["context"]["option"], "dev");
    assert_eq!(diag["span"]["start"], 12);
}

#[test]
fn huge_number_reports_field_width() {
    let output = run(&[
        "--output", "json", "ip", "link", "set", "can0", "type", "can", "restart-ms",
        "99999999999999999999",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let reason = stdout_json(&output)["diagnostics"][0]["context"]["reason"].clone();
    assert_eq!(reason, "value exceeds 4294967295");
}

#[test]
fn missing_signature_is_incomplete() {
    let output = run(&["--output", "json", "ip", "link"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["diagnostics"][0]["id"], "CAN1001");

    let output = run(&["--output", "json"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["diagnostics"][0]["id"], "CAN1001");
}

#[test]
fn pretty_errors_go_to_stderr() {
    let output = run(&[
        "--output", "pretty", "ip", "link", "set", "can0", "type", "can", "loopback", "yes",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CAN1003"), "stderr: {stderr}");
    assert!(stderr.contains("<command>"), "stderr: {stderr}");
}

// ── Help and capability flags ───────────────────────────────────────────

#[test]
fn help_keyword_prints_usage_and_exits_1() {
    let output = run(&["--dry-run", "ip", "link", "set", "can0", "help"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: canlink"), "stderr: {stderr}");
    assert!(stderr.contains("restart-ms"), "stderr: {stderr}");
}

#[test]
fn cc_len8_dlc_follows_capability_flag() {
    let line = [
        "--dry-run", "--output", "json", "ip", "link", "set", "can0", "type", "can",
        "cc-len8-dlc", "on",
    ];
    let output = run(&line);
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    let linkinfo = &named(&json["message"]["attributes"], "IFLA_LINKINFO")["value"]["value"];
    let data = &named(linkinfo, "IFLA_INFO_DATA")["value"]["value"];
    let ctrl = &named(data, "IFLA_CAN_CTRLMODE")["value"]["value"];
    assert_eq!(ctrl["flags"], 0x100);
    assert_eq!(ctrl["mask"], 0x100);

    let output = canlink_cmd()
        .arg("--no-cc-len8-dlc")
        .args(line)
        .output()
        .expect("run canlink");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["diagnostics"][0]["id"], "CAN1004");
}

#[test]
fn bad_log_level_is_rejected_by_clap() {
    let output = run(&["--log-level", "loud", "--dry-run", "ip", "link", "set", "can0"]);
    assert_eq!(output.status.code(), Some(2));
}

// ── Explain ─────────────────────────────────────────────────────────────

#[test]
fn explain_known_code() {
    let output = run(&["--output", "json", "--explain", "CAN3002"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["id"], "CAN3002");
    assert!(json["explanation"].is_string());
}

#[test]
fn explain_unknown_code_is_null() {
    let output = run(&["--output", "json", "--explain", "CAN9999"]);
    assert!(output.status.success());
    assert!(stdout_json(&output)["explanation"].is_null());
}
