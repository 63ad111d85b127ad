// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fluent helpers for driving the binary.

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn cli() -> CliBuilder {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_nodestack"));
    cmd.env("NO_COLOR", "1").env_remove("COLOR").env_remove("NODESTACK_LOG");
    CliBuilder { cmd }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn pwd(mut self, dir: &Path) -> Self {
        self.cmd.current_dir(dir);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        RunAssert(self.cmd.assert().success())
    }

    pub fn fails(mut self) -> RunAssert {
        RunAssert(self.cmd.assert().failure())
    }

    pub fn exits(mut self, code: i32) -> RunAssert {
        RunAssert(self.cmd.assert().code(code))
    }
}

pub struct RunAssert(Assert);

impl RunAssert {
    pub fn stdout_has(self, text: &str) -> Self {
        Self(self.0.stdout(predicate::str::contains(text)))
    }

    pub fn stdout_lacks(self, text: &str) -> Self {
        Self(self.0.stdout(predicate::str::contains(text).not()))
    }

    pub fn stderr_has(self, text: &str) -> Self {
        Self(self.0.stderr(predicate::str::contains(text)))
    }
}

/// A scratch directory holding one initialized local node.
pub struct Node {
    _tmp: TempDir,
    pub parent: PathBuf,
    pub root: PathBuf,
}

impl Node {
    pub fn local() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let parent = tmp.path().to_path_buf();
        cli().args(&["init", "telos-local"]).pwd(&parent).passes();
        let root = parent.join("telos-local");
        Self { _tmp: tmp, parent, root }
    }

    pub fn root_arg(&self) -> &str {
        self.root.to_str().unwrap()
    }

    pub fn config(&self) -> PathBuf {
        self.root.join("nodestack.json")
    }

    pub fn backup(&self) -> PathBuf {
        self.root.join("nodestack.json.backup")
    }

    /// Drop a field the current template carries, as an older release would have.
    pub fn make_stale(&self) {
        let text = std::fs::read_to_string(self.config()).unwrap();
        let mut live: serde_json::Value = serde_json::from_str(&text).unwrap();
        let stack = live["stack"].as_array_mut().unwrap();
        let elastic = stack.iter_mut().find(|s| s["name"] == "elasticsearch").unwrap();
        elastic.as_object_mut().unwrap().remove("protocol");
        std::fs::write(self.config(), serde_json::to_string_pretty(&live).unwrap()).unwrap();
    }
}
