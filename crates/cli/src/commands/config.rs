// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nodestack config` - persisted stack config maintenance

use crate::color;
use crate::node::NodeDir;
use crate::output::{format_or_json, OutputFormat};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Add keys the current template has and the config lacks (keeps a backup)
    Upgrade {
        /// Only list the changes
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn handle(command: ConfigCommand, node: &NodeDir, format: OutputFormat) -> Result<()> {
    match command {
        ConfigCommand::Upgrade { dry_run } => upgrade(dry_run, node, format),
    }
}

fn upgrade(dry_run: bool, node: &NodeDir, format: OutputFormat) -> Result<()> {
    let _lock = node.lock()?;
    let plan = node.upgrade_plan()?;
    if !plan.is_empty() && !dry_run {
        node.apply_upgrade(&plan)?;
    }

    let obj = json!({
        "changes": plan.diffs,
        "applied": !plan.is_empty() && !dry_run,
        "backup": (!plan.is_empty() && !dry_run).then(|| node.backup_path()),
    });
    format_or_json(format, &obj, || {
        if plan.is_empty() {
            println!("config is up to date");
            return;
        }
        let heading = if dry_run { "Pending changes:" } else { "Applied changes:" };
        println!("{}", color::header(heading));
        for diff in &plan.diffs {
            println!("  {diff}");
        }
        if !dry_run {
            println!("{}", color::context(&format!("backup: {}", node.backup_path().display())));
        }
    })
}
