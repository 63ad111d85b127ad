// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ns-template: stack generation from layered templates
//!
//! - [`resolve`] merges the base template with an environment overlay
//! - [`snapshot`] turns abstract snapshot references into download jobs
//! - [`render`] interpolates `${var}` placeholders in service config files
//! - [`upgrade`] plans additive upgrades of a persisted stack config
//! - [`init`] lays out a fresh node directory

pub mod builtin;
pub mod init;
pub mod merge;
pub mod render;
pub mod resolve;
pub mod snapshot;
pub mod upgrade;

pub use init::{init_node_dir, InitError, DEFAULT_CONFIG_NAME};
pub use merge::deep_merge;
pub use render::{flatten, interpolate, scalar_string};
pub use resolve::{TemplateError, TemplateSet};
pub use snapshot::{
    closest_snapshot, resolve_snapshot, snapshot_file, SnapshotEntry, SnapshotError, SnapshotIndex,
};
pub use upgrade::{environment_of, plan_upgrade, UpgradePlan};

#[cfg(any(test, feature = "test-support"))]
pub use snapshot::StaticSnapshotIndex;
