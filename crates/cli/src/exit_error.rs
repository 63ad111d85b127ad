// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

pub mod codes {
    pub const FAILURE: i32 = 1;
    /// The persisted config lags its template and `--conf-upgrade` was not given.
    pub const UPGRADE_REQUIRED: i32 = 2;
    /// An upgrade would overwrite an earlier backup.
    pub const BACKUP_EXISTS: i32 = 3;
    /// `down` found unhealthy services and `--force` was not given.
    pub const UNHEALTHY: i32 = 4;
}

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// Exit code for an error returned by a command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ExitError>().map(|e| e.code).unwrap_or(codes::FAILURE)
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
