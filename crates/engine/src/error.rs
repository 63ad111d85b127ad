// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bring-up error taxonomy

use crate::watcher::TimeoutCause;
use ns_adapters::{ProbeError, RuntimeError};
use ns_template::SnapshotError;
use thiserror::Error;

/// Errors raised while configuring, starting, probing or stopping a stack.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("{service}: config resolution failed: {message}")]
    ConfigResolution { service: String, message: String },

    #[error("{service}: snapshot resolution failed: {source}")]
    SnapshotResolution { service: String, source: SnapshotError },

    /// No readiness signal within budget. The process may be slow or stuck.
    #[error("{service}: no readiness signal ({cause})")]
    ReadinessTimeout { service: String, cause: TimeoutCause },

    /// Observed behaviour contradicts the configuration. Never retried.
    #[error("{service}: misconfigured: {message}")]
    ServiceMisconfigured { service: String, message: String },

    #[error("{service}: dependency order: {message}")]
    DependencyOrder { service: String, message: String },

    #[error("{service}: runtime failure: {source}")]
    Runtime { service: String, source: RuntimeError },

    #[error("{service}: probe failed: {source}")]
    Probe { service: String, source: ProbeError },

    #[error("{service}: bring-up cancelled")]
    Cancelled { service: String },

    #[error("unhealthy services: {}", .0.join(", "))]
    Unhealthy(Vec<String>),

    #[error("{service}: unknown method {method}")]
    UnknownMethod { service: String, method: String },
}

impl StackError {
    pub fn config(service: impl Into<String>, message: impl Into<String>) -> Self {
        StackError::ConfigResolution { service: service.into(), message: message.into() }
    }

    pub fn misconfigured(service: impl Into<String>, message: impl Into<String>) -> Self {
        StackError::ServiceMisconfigured { service: service.into(), message: message.into() }
    }

    pub fn runtime(service: impl Into<String>) -> impl FnOnce(RuntimeError) -> Self {
        let service = service.into();
        move |source| StackError::Runtime { service, source }
    }

    pub fn probe(service: impl Into<String>) -> impl FnOnce(ProbeError) -> Self {
        let service = service.into();
        move |source| StackError::Probe { service, source }
    }

    /// Stable identifier of the error family, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            StackError::ConfigResolution { .. } => "config-resolution",
            StackError::SnapshotResolution { .. } => "snapshot-resolution",
            StackError::ReadinessTimeout { .. } => "readiness-timeout",
            StackError::ServiceMisconfigured { .. } => "service-misconfigured",
            StackError::DependencyOrder { .. } => "dependency-order",
            StackError::Runtime { .. } => "runtime",
            StackError::Probe { .. } => "probe",
            StackError::Cancelled { .. } => "cancelled",
            StackError::Unhealthy(_) => "unhealthy",
            StackError::UnknownMethod { .. } => "unknown-method",
        }
    }

    /// Service the error is attributed to. `Unhealthy` spans several.
    pub fn service(&self) -> Option<&str> {
        match self {
            StackError::ConfigResolution { service, .. }
            | StackError::SnapshotResolution { service, .. }
            | StackError::ReadinessTimeout { service, .. }
            | StackError::ServiceMisconfigured { service, .. }
            | StackError::DependencyOrder { service, .. }
            | StackError::Runtime { service, .. }
            | StackError::Probe { service, .. }
            | StackError::Cancelled { service }
            | StackError::UnknownMethod { service, .. } => Some(service),
            StackError::Unhealthy(_) => None,
        }
    }

    /// Errors that signal operator action rather than a slow or interrupted start.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            StackError::ServiceMisconfigured { .. }
                | StackError::ConfigResolution { .. }
                | StackError::SnapshotResolution { .. }
                | StackError::DependencyOrder { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_misconfiguration_are_distinct() {
        let timeout = StackError::ReadinessTimeout {
            service: "leap".into(),
            cause: TimeoutCause::Deadline,
        };
        let fatal = StackError::misconfigured("leap", "node is producing blocks");

        assert_eq!(timeout.kind(), "readiness-timeout");
        assert_eq!(fatal.kind(), "service-misconfigured");
        assert!(!timeout.is_misconfiguration());
        assert!(fatal.is_misconfiguration());
        assert_eq!(timeout.service(), Some("leap"));
    }

    #[test]
    fn unhealthy_lists_services() {
        let err = StackError::Unhealthy(vec!["redis".into(), "kibana".into()]);
        assert_eq!(err.to_string(), "unhealthy services: redis, kibana");
        assert_eq!(err.service(), None);
    }
}
