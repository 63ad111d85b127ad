// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ns-adapters: I/O boundaries of the node stack
//!
//! - [`runtime`] creates, signals and tails service instances
//! - [`probe`] performs HTTP and RESP health checks
//! - [`chain`] queries the chain node API
//! - [`snapshot_index`] lists published chain snapshots

pub mod chain;
pub mod env;
pub mod probe;
pub mod runtime;
pub mod snapshot_index;

pub use chain::{ChainClient, ChainInfo};
pub use probe::{NetProbe, Probe, ProbeError};
pub use runtime::{
    DockerRuntime, ExecOutput, InstanceConfig, LogOptions, LogStart, LogStream,
    MountBinding, ProcessRuntime, RuntimeError,
};
pub use snapshot_index::HttpSnapshotIndex;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use probe::{FakeProbe, ProbeCall};
#[cfg(any(test, feature = "test-support"))]
pub use runtime::{FakeRuntime, RuntimeCall};
