// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ns-core: data model shared by every nodestack crate

pub mod macros;

pub mod environment;
pub mod role;
pub mod signal;
pub mod snapshot;
pub mod stack;
pub mod state;

pub use environment::{Environment, UnknownEnvironment};
pub use role::{
    CacheConfig, ChainNodeConfig, DashboardConfig, GatewayConfig, IndexPattern, IndexerConfig,
    IniConfig, PerfConfig, SearchConfig, ServiceRole, Subst,
};
pub use signal::StopSignal;
pub use snapshot::SnapshotSpec;
pub use stack::{
    Download, Mount, ServiceSpec, SpecError, StackSpec, StartupLogsKwargs, SymLink,
    DOWNLOADS_FIELD,
};
pub use state::{ChainNodeState, HealthStatus, LaunchConflict, ServiceState};
