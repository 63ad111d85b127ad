// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nodestack init` - create a node directory from a chain template

use crate::output::{format_or_json, OutputFormat};
use anyhow::Result;
use clap::Args;
use ns_adapters::HttpSnapshotIndex;
use ns_template::{init_node_dir, InitError, TemplateSet};
use serde_json::json;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Chain to generate for (telos-local, telos-testnet or telos-mainnet)
    pub chain_name: String,

    /// Directory to create (default: ./<chain-name>)
    #[arg(long)]
    pub target_dir: Option<PathBuf>,
}

pub async fn handle(args: InitArgs, config_name: &str, format: OutputFormat) -> Result<()> {
    let target = args.target_dir.unwrap_or_else(|| PathBuf::from(&args.chain_name));
    let chain = args.chain_name;
    let config_name = config_name.to_string();

    // Snapshot lookups block on HTTP.
    let dir = target.clone();
    let config = tokio::task::spawn_blocking(move || -> Result<PathBuf, InitError> {
        let templates = TemplateSet::builtin()?;
        init_node_dir(&chain, &config_name, &dir, &templates, &HttpSnapshotIndex::from_env())
    })
    .await??;

    let obj = json!({ "node_root": target, "config": config });
    format_or_json(format, &obj, || {
        println!("Initialized node directory {}", target.display());
        println!("  config: {}", config.display());
    })
}
