// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber setup for one CLI run.
//!
//! Events go to stderr and, once a node directory exists, to
//! `<node-root>/logs/nodestack.log` through a non-blocking writer. The
//! returned guard flushes the file on drop, so `main` holds it for the run.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE: &str = "nodestack.log";

/// Filter from `NODESTACK_LOG` when set, else from `--log-level`.
pub fn filter(level: &str) -> Result<EnvFilter> {
    let directives = crate::env::log_filter().unwrap_or_else(|| level.to_string());
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log filter {:?}", directives))
}

pub fn init(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter(level)?)
        .with(stderr)
        .with(file)
        .try_init()
        .context("installing log subscriber")?;
    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
