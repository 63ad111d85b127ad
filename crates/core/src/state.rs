// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime state of services during one bring-up cycle.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of one service instance.
///
/// `Configuring → Preparing → Starting → {Ready | Unhealthy} → Stopping → Stopped`.
/// Any state may move to `Stopping` so a partially started stack can be torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Configuring,
    Preparing,
    Starting,
    Ready,
    Unhealthy,
    Stopping,
    Stopped,
}

crate::simple_display! {
    ServiceState {
        Configuring => "configuring",
        Preparing => "preparing",
        Starting => "starting",
        Ready => "ready",
        Unhealthy => "unhealthy",
        Stopping => "stopping",
        Stopped => "stopped",
    }
}

impl ServiceState {
    pub fn can_transition_to(&self, next: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, next),
            (Configuring, Preparing)
                | (Preparing, Starting)
                | (Starting, Ready)
                | (Configuring | Preparing | Starting, Unhealthy)
                | (Configuring | Preparing | Starting | Ready | Unhealthy, Stopping)
                | (Stopping, Stopped)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceState::Unhealthy | ServiceState::Stopped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

crate::simple_display! {
    HealthStatus {
        Healthy => "healthy",
        Unhealthy => "unhealthy",
    }
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl From<bool> for HealthStatus {
    fn from(ok: bool) -> Self {
        if ok {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

/// A fresh-launch marker was observed on a node that already had persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fresh launch observed but persisted chain state exists")]
pub struct LaunchConflict;

/// Chain-node specific state.
///
/// `is_relaunch` is fixed at construction (configure time). `is_fresh_launch`
/// can only become true when `is_relaunch` is false, so both are never set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainNodeState {
    is_relaunch: bool,
    is_fresh_launch: bool,
    chain_id: Option<String>,
    head_block: Option<u64>,
}

impl ChainNodeState {
    pub fn new(is_relaunch: bool) -> Self {
        Self { is_relaunch, ..Default::default() }
    }

    pub fn is_relaunch(&self) -> bool {
        self.is_relaunch
    }

    pub fn is_fresh_launch(&self) -> bool {
        self.is_fresh_launch
    }

    pub fn chain_id(&self) -> Option<&str> {
        self.chain_id.as_deref()
    }

    pub fn head_block(&self) -> Option<u64> {
        self.head_block
    }

    /// Record that the node reported it initialized a brand new chain.
    pub fn observe_fresh_launch(&mut self) -> Result<(), LaunchConflict> {
        if self.is_relaunch {
            return Err(LaunchConflict);
        }
        self.is_fresh_launch = true;
        Ok(())
    }

    pub fn observe_info(&mut self, chain_id: impl Into<String>, head_block: u64) {
        self.chain_id = Some(chain_id.into());
        self.head_block = Some(head_block);
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
