// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config upgrade specs

use crate::prelude::*;

#[test]
fn fresh_config_is_up_to_date() {
    let node = Node::local();
    cli()
        .args(&["config", "upgrade", "--node-root", node.root_arg()])
        .passes()
        .stdout_has("config is up to date")
        .stdout_lacks("Applied changes:");
    assert!(!node.backup().exists());
}

#[test]
fn stale_config_blocks_up() {
    let node = Node::local();
    node.make_stale();
    cli()
        .args(&["up", "--node-root", node.root_arg()])
        .exits(2)
        .stderr_has("--conf-upgrade")
        .stderr_has("stack[elasticsearch].protocol");
    assert!(!node.backup().exists());
}

#[test]
fn dry_run_lists_without_writing() {
    let node = Node::local();
    node.make_stale();
    cli()
        .args(&["config", "upgrade", "--dry-run", "--node-root", node.root_arg()])
        .passes()
        .stdout_has("Pending changes:")
        .stdout_has("+ stack[elasticsearch].protocol: \"http\"");
    assert!(!node.backup().exists());
}

#[test]
fn upgrade_patches_and_keeps_backup() {
    let node = Node::local();
    node.make_stale();
    cli()
        .args(&["config", "upgrade", "--node-root", node.root_arg()])
        .passes()
        .stdout_has("Applied changes:")
        .stdout_has("backup:");
    assert!(node.backup().is_file());

    cli()
        .args(&["config", "upgrade", "--node-root", node.root_arg(), "-o", "json"])
        .passes()
        .stdout_has("\"changes\": []");
}

#[test]
fn upgrade_refuses_to_overwrite_backup() {
    let node = Node::local();
    node.make_stale();
    std::fs::write(node.backup(), "{}").unwrap();
    cli()
        .args(&["config", "upgrade", "--node-root", node.root_arg()])
        .exits(3)
        .stderr_has("already exists");
}
