// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

/// Docker CLI binary (default `docker`).
pub fn docker_bin() -> String {
    std::env::var("NODESTACK_DOCKER_BIN")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "docker".to_string())
}

/// Base URL of the snapshot index, serving `<network>.json`.
pub fn snapshot_index_url() -> String {
    std::env::var("NODESTACK_SNAPSHOT_INDEX")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "https://snapshots.telos.net/index".to_string())
}

/// Attempts made while waiting for the chain node API (default 60).
pub fn api_retries() -> u32 {
    std::env::var("NODESTACK_API_RETRIES").ok().and_then(|s| s.parse::<u32>().ok()).unwrap_or(60)
}

/// Interval between chain node API attempts (default 1s).
pub fn api_retry_interval() -> Duration {
    std::env::var("NODESTACK_API_RETRY_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(1))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
