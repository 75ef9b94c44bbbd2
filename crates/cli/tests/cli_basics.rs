// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI surface tests that do not require a running daemon
//!
//! Argument validation happens before any socket connection, so these
//! exercise the parsers and the daemon-not-running paths only.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn hearth() -> Command {
    Command::cargo_bin("hearth").unwrap()
}

#[test]
fn help_lists_the_surface() {
    hearth()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("security"))
        .stdout(predicate::str::contains("schedule"))
        .stdout(predicate::str::contains("device"))
        .stdout(predicate::str::contains("daemon"));
}

#[test]
fn version_flag_works() {
    hearth()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hearth"));
}

#[test]
fn completions_emit_a_script() {
    hearth()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hearth"));
}

#[test]
fn push_rejects_malformed_readings() {
    hearth()
        .args(["push", "some-token", "Temperature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("name=value"));
}

#[test]
fn schedule_add_rejects_bad_time() {
    hearth()
        .args(["schedule", "add", "wake", "--at", "sometime", "light.on"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HH:MM"));
}

#[test]
fn schedule_add_rejects_malformed_command() {
    hearth()
        .args(["schedule", "add", "wake", "--at", "07:00", "noaction"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<system>.<action>"));
}

#[test]
fn device_add_sensor_rejects_unknown_kind() {
    hearth()
        .args(["device", "add-sensor", "porch", "--kind", "carrier-pigeon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kind"));
}

#[test]
fn daemon_stop_without_daemon_reports_not_running() {
    let temp = tempdir().unwrap();

    hearth()
        .args(["daemon", "stop"])
        .arg("--data-dir")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Daemon not running"));
}
