// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stack orchestrator.
//!
//! Brings services up one at a time in dependency order: a service is
//! configured only once everything it requires is ready, because its config
//! consumes their endpoints. The first failure aborts the bring-up and
//! leaves already-started services running for inspection.

use crate::error::StackError;
use crate::lifecycle::{RuntimeDeps, ServiceLifecycle, StackEnv};
use crate::order::start_order;
use indexmap::IndexMap;
use ns_core::{HealthStatus, ServiceState, StackSpec};
use serde_json::Value;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// One step of the bring-up, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub service: String,
    pub state: ServiceState,
}

/// Result of a teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownReport {
    /// Services stopped, in teardown order.
    pub stopped: Vec<String>,
    /// Services that reported unhealthy before teardown.
    pub unhealthy: Vec<String>,
    /// Services whose stop failed. Teardown continues past them.
    pub failed: Vec<String>,
}

struct Shared {
    stack: StackSpec,
    node_root: PathBuf,
    deps: RuntimeDeps,
    cancel: CancellationToken,
}

impl Shared {
    fn env<'a>(&'a self, ready: &'a [String]) -> StackEnv<'a> {
        StackEnv {
            stack: &self.stack,
            node_root: &self.node_root,
            deps: &self.deps,
            cancel: &self.cancel,
            ready,
        }
    }
}

pub struct StackOrchestrator {
    shared: Shared,
    /// Lifecycles in start order.
    services: Vec<ServiceLifecycle>,
    ready: Vec<String>,
    trace: Vec<TraceEvent>,
}

impl StackOrchestrator {
    /// Fails with `DependencyOrder` if `requires` is not a DAG.
    pub fn new(
        stack: StackSpec,
        node_root: impl Into<PathBuf>,
        deps: RuntimeDeps,
    ) -> Result<Self, StackError> {
        let order = start_order(&stack)?;
        let services =
            order.into_iter().map(|i| ServiceLifecycle::new(stack.stack[i].clone())).collect();
        Ok(Self {
            shared: Shared {
                stack,
                node_root: node_root.into(),
                deps,
                cancel: CancellationToken::new(),
            },
            services,
            ready: Vec::new(),
            trace: Vec::new(),
        })
    }

    pub fn stack(&self) -> &StackSpec {
        &self.shared.stack
    }

    /// Services in start order.
    pub fn services(&self) -> &[ServiceLifecycle] {
        &self.services
    }

    pub fn service(&self, key: &str) -> Option<&ServiceLifecycle> {
        self.services.iter().find(|s| s.spec().answers_to(key))
    }

    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    /// Token that interrupts an in-flight bring-up when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    pub fn interrupt(&self) {
        self.shared.cancel.cancel();
    }

    fn record(&mut self, service: &str, state: ServiceState) {
        self.trace.push(TraceEvent { service: service.to_string(), state });
    }

    /// Configure, prepare and start every service in dependency order.
    pub async fn up(&mut self) -> Result<(), StackError> {
        let names: Vec<String> = self.services.iter().map(|s| s.name().to_string()).collect();
        tracing::info!(order = %names.join(" -> "), "bringing stack up");

        for (index, name) in names.iter().enumerate() {
            if self.shared.cancel.is_cancelled() {
                return Err(StackError::Cancelled { service: name.clone() });
            }
            self.record(name, ServiceState::Configuring);
            if let Err(e) = self.bring_up(index).await {
                tracing::error!(service = %name, kind = e.kind(), error = %e, "bring-up aborted");
                self.record(name, ServiceState::Unhealthy);
                return Err(e);
            }
            self.ready.push(name.clone());
            self.record(name, ServiceState::Ready);
        }
        tracing::info!(services = names.len(), "stack ready");
        Ok(())
    }

    async fn bring_up(&mut self, index: usize) -> Result<(), StackError> {
        let env = self.shared.env(&self.ready);
        let lifecycle = &mut self.services[index];
        lifecycle.configure(env)?;
        lifecycle.prepare(env)?;
        let name = lifecycle.name().to_string();
        self.trace.push(TraceEvent { service: name, state: ServiceState::Starting });
        self.services[index].start(env).await
    }

    /// Health of every service, in start order.
    pub async fn status(&self) -> IndexMap<String, HealthStatus> {
        let env = self.shared.env(&self.ready);
        let mut statuses = IndexMap::new();
        for lifecycle in &self.services {
            statuses.insert(lifecycle.name().to_string(), lifecycle.status(env).await);
        }
        statuses
    }

    /// Stop every service in reverse start order.
    ///
    /// Unless `force` is set, refuses with `Unhealthy` and stops nothing if
    /// any service reports unhealthy.
    pub async fn down(&mut self, force: bool) -> Result<DownReport, StackError> {
        let unhealthy: Vec<String> = self
            .status()
            .await
            .into_iter()
            .filter(|(_, status)| !status.is_healthy())
            .map(|(name, _)| name)
            .collect();
        if !unhealthy.is_empty() {
            if !force {
                return Err(StackError::Unhealthy(unhealthy));
            }
            tracing::warn!(
                unhealthy = %unhealthy.join(", "),
                "forcing teardown of unhealthy stack"
            );
        }

        let mut report = DownReport { unhealthy, ..Default::default() };
        let env = self.shared.env(&self.ready);
        for lifecycle in self.services.iter_mut().rev() {
            let name = lifecycle.name().to_string();
            match lifecycle.stop(env).await {
                Ok(()) => report.stopped.push(name),
                Err(e) => {
                    tracing::error!(service = %name, error = %e, "stop failed");
                    report.failed.push(name);
                }
            }
        }
        Ok(report)
    }

    fn lookup(&self, key: &str) -> Result<&ServiceLifecycle, StackError> {
        self.service(key)
            .ok_or_else(|| StackError::config(key, "no such service in the stack"))
    }

    pub async fn service_status(&self, key: &str) -> Result<HealthStatus, StackError> {
        let lifecycle = self.lookup(key)?;
        Ok(lifecycle.status(self.shared.env(&self.ready)).await)
    }

    /// Invoke a role method on one service.
    pub async fn run(&self, key: &str, method: &str, args: &[String]) -> Result<Value, StackError> {
        let lifecycle = self.lookup(key)?;
        lifecycle.run(self.shared.env(&self.ready), method, args).await
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
