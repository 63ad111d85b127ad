// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nodestack init` specs

use crate::prelude::*;

#[test]
fn init_local_writes_node_directory() {
    let node = Node::local();

    assert!(node.config().is_file());
    assert!(node.root.join("services/leap/templates/config.ini").is_file());
    assert!(node.root.join("logs").is_dir());
    let text = std::fs::read_to_string(node.config()).unwrap();
    assert!(text.contains("\"name\": \"leap\""), "{text}");
}

#[test]
fn init_reports_paths_as_json() {
    let tmp = tempfile::tempdir().unwrap();
    cli()
        .args(&["init", "telos-local", "--target-dir", "mynode", "-o", "json"])
        .pwd(tmp.path())
        .passes()
        .stdout_has("\"node_root\": \"mynode\"")
        .stdout_has("nodestack.json");
    assert!(tmp.path().join("mynode/nodestack.json").is_file());
}

#[test]
fn init_refuses_existing_directory() {
    let node = Node::local();
    cli()
        .args(&["init", "telos-local"])
        .pwd(&node.parent)
        .fails()
        .stderr_has("already exists");
}

#[test]
fn init_rejects_unknown_chain() {
    let tmp = tempfile::tempdir().unwrap();
    cli()
        .args(&["init", "telos-devnet"])
        .pwd(tmp.path())
        .exits(1)
        .stderr_has("telos-devnet");
    assert!(!tmp.path().join("telos-devnet").exists());
}
