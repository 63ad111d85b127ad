// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nodestack up` - bring the stack up in dependency order

use super::orchestrator;
use crate::node::NodeDir;
use crate::output::{format_or_json, status_lines, OutputFormat};
use anyhow::Result;
use clap::Args;
use serde_json::json;

#[derive(Args)]
pub struct UpArgs {
    /// Patch a stale config from its template before starting (keeps a backup)
    #[arg(long)]
    pub conf_upgrade: bool,
}

pub async fn handle(args: UpArgs, node: &NodeDir, format: OutputFormat) -> Result<()> {
    let _lock = node.lock()?;
    node.ensure_current(args.conf_upgrade)?;

    let mut stack = orchestrator(node)?;
    let cancel = stack.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, abandoning bring-up");
            cancel.cancel();
        }
    });

    let result = stack.up().await;
    interrupt.abort();
    result?;

    let statuses = stack.status().await;
    format_or_json(format, &json!(statuses), || {
        println!("Stack {} is up", node.root().display());
        for line in status_lines(&statuses) {
            println!("  {line}");
        }
    })
}
