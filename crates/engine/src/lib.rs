// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ns-engine: bring-up of a node stack
//!
//! - [`watcher`] tails a log stream for readiness phrases
//! - [`lifecycle`] drives one service through configure, prepare, start and stop
//! - [`roles`] supplies the per-role behaviour tables
//! - [`orchestrator`] sequences services in dependency order

mod error;
pub mod lifecycle;
mod order;
pub mod orchestrator;
pub mod roles;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::StackError;
pub use lifecycle::{HookCtx, RuntimeDeps, ServiceLifecycle, StackEnv};
pub use order::start_order;
pub use orchestrator::{DownReport, StackOrchestrator, TraceEvent};
pub use roles::{hooks_for, Readiness, RoleHooks};
pub use watcher::{
    watch, FatalPhrase, PhraseHandler, TimeoutCause, Verdict, WatchOptions, WatchOutcome,
    WatchReport,
};
