// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nodestack service` specs that fail before touching a container.

use crate::prelude::*;

#[test]
fn unknown_service_fails() {
    let node = Node::local();
    cli()
        .args(&["service", "run", "nosuch", "status", "--node-root", node.root_arg()])
        .exits(1)
        .stderr_has("no such service");
}

#[test]
fn unknown_method_fails() {
    let node = Node::local();
    cli()
        .args(&["service", "run", "kibana", "frobnicate", "--node-root", node.root_arg()])
        .exits(1)
        .stderr_has("error (unknown-method)")
        .stderr_has("unknown method frobnicate");
}

#[test]
fn missing_node_directory_names_the_config() {
    let tmp = tempfile::tempdir().unwrap();
    cli()
        .args(&["service", "status", "leap"])
        .pwd(tmp.path())
        .exits(1)
        .stderr_has("nodestack.json");
    assert!(!tmp.path().join("logs").exists());
}
