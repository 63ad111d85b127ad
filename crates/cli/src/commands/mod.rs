// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod config;
pub mod down;
pub mod init;
pub mod service;
pub mod up;

use crate::node::NodeDir;
use anyhow::Result;
use ns_engine::StackOrchestrator;

/// Orchestrator over the node directory's persisted stack.
pub(crate) fn orchestrator(node: &NodeDir) -> Result<StackOrchestrator> {
    let stack = node.load()?;
    let deps = node.deps(&stack);
    Ok(StackOrchestrator::new(stack, node.root(), deps)?)
}
