// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.

/// Log filter directives overriding `--log-level`.
pub fn log_filter() -> Option<String> {
    std::env::var("NODESTACK_LOG").ok().filter(|s| !s.is_empty())
}
