// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::StaticSnapshotIndex;
use ns_core::StackSpec;
use tempfile::tempdir;

fn init(chain: &str, root: &Path) -> Result<PathBuf, InitError> {
    let templates = TemplateSet::builtin().unwrap();
    init_node_dir(
        chain,
        DEFAULT_CONFIG_NAME,
        &root.join(chain),
        &templates,
        &StaticSnapshotIndex::new(),
    )
}

#[test]
fn local_node_directory_layout() {
    let tmp = tempdir().unwrap();
    let config = init("telos-local", tmp.path()).unwrap();
    let node = tmp.path().join("telos-local");

    assert_eq!(config, node.join("nodestack.json"));
    assert!(node.join("services/leap/templates/config.ini").is_file());
    assert!(node.join("services/leap/templates/local.config.ini").is_file());
    assert!(node.join("services/leap/genesis/local.json").is_file());
    assert!(node.join("services/translator/templates/config.json").is_file());
    assert!(node.join("services/redis/templates/redis.conf").is_file());
    assert!(node.join("leap_data").is_dir());
    assert!(node.join("elasticsearch_data").is_dir());
    assert!(node.join("logs").is_dir());
    assert!(!node.join("services/redis/redis.conf").exists());
}

#[test]
fn written_config_matches_resolution() {
    let tmp = tempdir().unwrap();
    let config = init("telos-testnet", tmp.path()).unwrap();

    let text = std::fs::read_to_string(&config).unwrap();
    let stack = StackSpec::from_json(&text).unwrap();
    similar_asserts::assert_eq!(text, stack.to_json_pretty().unwrap());

    let leap = stack.service("leap").unwrap();
    assert_eq!(
        leap.downloads().unwrap()[0].rename,
        "snapshot-telos-testnet-snapshot-evm-deploy.bin"
    );
}

#[test]
fn existing_directory_is_rejected() {
    let tmp = tempdir().unwrap();
    std::fs::create_dir(tmp.path().join("telos-mainnet")).unwrap();
    assert!(matches!(init("telos-mainnet", tmp.path()), Err(InitError::AlreadyExists(_))));
}

#[test]
fn unknown_chain_is_rejected() {
    let tmp = tempdir().unwrap();
    assert!(matches!(init("telos-devnet", tmp.path()), Err(InitError::UnknownChain(_))));
    assert!(!tmp.path().join("telos-devnet").exists());
}
