// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nodestack service` - query or drive one service

use super::orchestrator;
use crate::color;
use crate::node::NodeDir;
use crate::output::{format_or_json, value_text, OutputFormat};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

#[derive(Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommand,
}

#[derive(Subcommand)]
pub enum ServiceCommand {
    /// Report whether a service is healthy
    Status {
        /// Service name or alias
        alias: String,
    },
    /// Invoke a role method on a service
    Run {
        /// Service name or alias
        alias: String,
        /// Method name, e.g. `block_num` or `status`
        method: String,
        /// Method arguments
        args: Vec<String>,
    },
}

pub async fn handle(command: ServiceCommand, node: &NodeDir, format: OutputFormat) -> Result<()> {
    match command {
        ServiceCommand::Status { alias } => status(&alias, node, format).await,
        ServiceCommand::Run { alias, method, args } => {
            run(&alias, &method, &args, node, format).await
        }
    }
}

async fn status(alias: &str, node: &NodeDir, format: OutputFormat) -> Result<()> {
    let stack = orchestrator(node)?;
    let health = stack.service_status(alias).await?;
    format_or_json(format, &json!({ "service": alias, "status": health }), || {
        println!("{}", color::health(health));
    })
}

async fn run(
    alias: &str,
    method: &str,
    args: &[String],
    node: &NodeDir,
    format: OutputFormat,
) -> Result<()> {
    let _lock = node.lock()?;
    let stack = orchestrator(node)?;
    let value = stack.run(alias, method, args).await?;
    format_or_json(format, &value, || {
        if !value.is_null() {
            println!("{}", value_text(&value));
        }
    })
}
