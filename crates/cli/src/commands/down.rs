// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nodestack down` - stop the stack in reverse dependency order

use super::orchestrator;
use crate::exit_error::{codes, ExitError};
use crate::node::NodeDir;
use crate::output::{down_report_json, format_or_json, OutputFormat};
use anyhow::Result;
use clap::Args;
use ns_engine::StackError;
use std::time::Duration;

/// How long an interrupted `up` gets to abandon its bring-up.
const INTERRUPT_WAIT: Duration = Duration::from_secs(60);

#[derive(Args)]
pub struct DownArgs {
    /// Tear down even when services report unhealthy
    #[arg(long)]
    pub force: bool,
}

pub async fn handle(args: DownArgs, node: &NodeDir, format: OutputFormat) -> Result<()> {
    // An `up` still bringing services up holds the lock; interrupt it.
    let _lock = node.lock_interrupting(INTERRUPT_WAIT).await?;
    let mut stack = orchestrator(node)?;

    let report = match stack.down(args.force).await {
        Ok(report) => report,
        Err(StackError::Unhealthy(names)) => {
            return Err(ExitError::new(
                codes::UNHEALTHY,
                format!(
                    "unhealthy services: {}; rerun with --force to stop anyway",
                    names.join(", ")
                ),
            )
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    format_or_json(format, &down_report_json(&report), || {
        for name in &report.stopped {
            println!("Stopped {name}");
        }
        for name in &report.failed {
            eprintln!("Failed to stop {name}");
        }
    })?;

    if !report.failed.is_empty() {
        return Err(ExitError::new(
            codes::FAILURE,
            format!("failed to stop: {}", report.failed.join(", ")),
        )
        .into());
    }
    Ok(())
}
