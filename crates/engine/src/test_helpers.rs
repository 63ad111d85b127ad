// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::lifecycle::{RuntimeDeps, StackEnv};
use ns_adapters::{FakeProbe, FakeRuntime};
use ns_core::{ServiceSpec, StackSpec};
use ns_template::{init_node_dir, StaticSnapshotIndex, TemplateSet, DEFAULT_CONFIG_NAME};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub(crate) const LOCAL_CHAIN_ID: &str =
    "c4c5fcc7b6e5e7484eb6b609e755050ebba977c4c291a63aab42d94c0fb8c2cf";

pub(crate) const NODE_API: &str = "http://127.0.0.1:8888/v1/chain/get_info";

/// A freshly initialized local node directory with fake collaborators.
pub(crate) struct TestContext {
    _dir: TempDir,
    pub node_root: PathBuf,
    pub stack: StackSpec,
    pub runtime: FakeRuntime,
    pub probe: FakeProbe,
    pub deps: RuntimeDeps,
    pub cancel: CancellationToken,
    pub ready: Vec<String>,
}

impl TestContext {
    pub(crate) fn local() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let node_root = dir.path().join("node");
        let config = init_node_dir(
            "telos-local",
            DEFAULT_CONFIG_NAME,
            &node_root,
            &TemplateSet::builtin().unwrap(),
            &StaticSnapshotIndex::new(),
        )
        .unwrap();
        let stack = StackSpec::from_json(&std::fs::read_to_string(config).unwrap()).unwrap();

        let runtime = FakeRuntime::new();
        let probe = FakeProbe::new();
        let deps =
            RuntimeDeps { runtime: Arc::new(runtime.clone()), probe: Arc::new(probe.clone()) };
        Self {
            _dir: dir,
            node_root,
            stack,
            runtime,
            probe,
            deps,
            cancel: CancellationToken::new(),
            ready: Vec::new(),
        }
    }

    pub(crate) fn env(&self) -> StackEnv<'_> {
        StackEnv {
            stack: &self.stack,
            node_root: &self.node_root,
            deps: &self.deps,
            cancel: &self.cancel,
            ready: &self.ready,
        }
    }

    pub(crate) fn spec(&self, key: &str) -> ServiceSpec {
        self.stack.service(key).unwrap().clone()
    }

    pub(crate) fn spec_mut(&mut self, key: &str) -> &mut ServiceSpec {
        self.stack.service_mut(key).unwrap()
    }

    pub(crate) fn mark_ready(&mut self, names: &[&str]) {
        self.ready.extend(names.iter().map(|n| n.to_string()));
    }

    pub(crate) fn service_file(&self, service: &str, file: &str) -> String {
        let dir = self.spec(service).service_dir();
        std::fs::read_to_string(self.node_root.join(dir).join(file)).unwrap()
    }

    /// Leave a block log behind so the chain node sees a relaunch.
    pub(crate) fn persist_block_log(&self) {
        let blocks = self.node_root.join("leap_data").join("blocks");
        std::fs::create_dir_all(&blocks).unwrap();
        std::fs::write(blocks.join("blocks.log"), b"").unwrap();
    }

    /// Script the node API to report `head` on the local chain.
    pub(crate) fn node_info(&self, head: u64) {
        self.probe.respond(NODE_API, &get_info(LOCAL_CHAIN_ID, head));
    }
}

pub(crate) fn get_info(chain_id: &str, head: u64) -> String {
    serde_json::json!({
        "server_version": "d1a9b0b8",
        "chain_id": chain_id,
        "head_block_num": head,
        "last_irreversible_block_num": head.saturating_sub(1),
    })
    .to_string()
}
