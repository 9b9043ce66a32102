//! CLI exit-status tests
//!
//! Runs the built binary on argument paths that return before any audio
//! device is touched, so these pass on hosts without an output device.

use std::process::Command;

fn echoscope() -> Command {
    Command::new(env!("CARGO_BIN_EXE_echoscope"))
}

#[test]
fn test_help_exits_zero() {
    let out = echoscope().arg("--help").output().expect("binary runs");
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("Usage: echoscope"));
}

#[test]
fn test_version_exits_zero() {
    let out = echoscope().arg("--version").output().expect("binary runs");
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.starts_with("echoscope"));
}

#[test]
fn test_unknown_argument_exits_nonzero() {
    let out = echoscope().arg("--bogus").output().expect("binary runs");
    assert!(!out.status.success(), "unknown argument must fail the process");
}

#[test]
fn test_invalid_sample_rate_exits_nonzero() {
    let out = echoscope()
        .args(["--sample-rate", "fast"])
        .output()
        .expect("binary runs");
    assert!(!out.status.success());
}

#[test]
fn test_missing_flag_value_exits_nonzero() {
    let out = echoscope().arg("--device").output().expect("binary runs");
    assert!(!out.status.success());
}
