// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version output.

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("init")
        .stdout_has("up")
        .stdout_has("down")
        .stdout_has("service")
        .stdout_has("config");
}

#[test]
fn service_help_lists_status_and_run() {
    cli().args(&["service", "--help"]).passes().stdout_has("status").stdout_has("run");
}

#[test]
fn up_help_mentions_conf_upgrade() {
    cli().args(&["up", "--help"]).passes().stdout_has("--conf-upgrade");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn no_args_is_a_usage_error() {
    cli().exits(2).stderr_has("Usage:");
}
