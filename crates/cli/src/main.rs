// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! `nodestack`: bring a blockchain node stack up, inspect it and tear it down.

mod color;
mod commands;
mod env;
mod exit_error;
mod logging;
mod node;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, down, init, service, up};
use node::NodeDir;
use ns_template::DEFAULT_CONFIG_NAME;
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nodestack", version, about = "Blockchain node stack orchestrator")]
#[command(styles = color::styles())]
struct Cli {
    /// Node directory created by `nodestack init`
    #[arg(long, global = true, default_value = ".")]
    node_root: PathBuf,

    /// Stack config file name inside the node directory
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_NAME)]
    config: String,

    /// Log level (overridden by NODESTACK_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(short = 'o', long = "output", global = true, value_enum, default_value_t)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a node directory from a chain template
    Init(init::InitArgs),
    /// Bring the stack up in dependency order
    Up(up::UpArgs),
    /// Stop the stack in reverse dependency order
    Down(down::DownArgs),
    /// Query or drive a single service
    Service(service::ServiceArgs),
    /// Manage the persisted stack config
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // File logging only once the node directory has been initialized.
    let log_dir = match cli.command {
        Command::Init(_) => None,
        _ if !cli.node_root.join(&cli.config).is_file() => None,
        _ => Some(cli.node_root.join(node::LOG_DIR)),
    };
    let guard = match logging::init(&cli.log_level, log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(exit_error::codes::FAILURE);
        }
    };

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            match e.downcast_ref::<ns_engine::StackError>() {
                Some(stack_err) => eprintln!("error ({}): {e:#}", stack_err.kind()),
                None => eprintln!("error: {e:#}"),
            }
            exit_error::exit_code(&e)
        }
    };
    // Flush the log file before exiting.
    drop(guard);
    if code != 0 {
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let node = NodeDir::new(&cli.node_root, &cli.config);
    let format = cli.output;
    match cli.command {
        Command::Init(args) => init::handle(args, &cli.config, format).await,
        Command::Up(args) => up::handle(args, &node, format).await,
        Command::Down(args) => down::handle(args, &node, format).await,
        Command::Service(args) => service::handle(args.command, &node, format).await,
        Command::Config(args) => config::handle(args.command, &node, format),
    }
}
