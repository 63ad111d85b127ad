// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role behaviour tables.
//!
//! Every service runs through the same [`ServiceLifecycle`](crate::ServiceLifecycle);
//! what differs per role (config variables, command tweaks, phrase handlers,
//! health probe, extra methods) is supplied by a [`RoleHooks`] implementation.
//! Default methods give the generic behaviour, so a role only overrides what
//! it actually changes.

mod cache;
mod chain_node;
mod dashboard;
mod gateway;
mod generic;
mod indexer;
mod search;

pub use chain_node::{ChainNodeHooks, FRESH_START_PHRASES, SHUTDOWN_PHRASE};

use crate::error::StackError;
use crate::lifecycle::{await_phrase, stop_with_signals, HookCtx};
use crate::watcher::PhraseHandler;
use async_trait::async_trait;
use indexmap::IndexMap;
use ns_adapters::{InstanceConfig, LogStream};
use ns_core::{ChainNodeState, HealthStatus, ServiceRole};
use ns_template::flatten;
use serde::Serialize;
use serde_json::Value;

/// How `start` decides the instance is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Watch the log stream for the phrase handlers.
    Logs,
    /// Poll `status` until healthy or the startup timeout elapses.
    Probe,
    /// The role drives readiness itself through [`RoleHooks::start`].
    Custom,
}

#[async_trait]
pub trait RoleHooks: Send + Sync {
    /// Variables available to `${var}` placeholders in the service's templates.
    fn config_vars(&self, ctx: &HookCtx<'_>) -> Result<IndexMap<String, String>, StackError> {
        spec_vars(ctx)
    }

    /// Templates the role renders itself; the lifecycle skips them.
    fn own_templates(&self) -> &'static [&'static str] {
        &[]
    }

    /// Runs after the generic template rendering.
    fn configure(
        &self,
        _ctx: &HookCtx<'_>,
        _vars: &IndexMap<String, String>,
    ) -> Result<(), StackError> {
        Ok(())
    }

    fn prepare(&self, _ctx: &HookCtx<'_>, _config: &mut InstanceConfig) -> Result<(), StackError> {
        Ok(())
    }

    /// Role phrase handlers. The service's `startup_phrase` is appended after these.
    fn phrase_handlers(&self, _ctx: &HookCtx<'_>) -> Result<Vec<PhraseHandler>, StackError> {
        Ok(Vec::new())
    }

    fn readiness(&self, _ctx: &HookCtx<'_>, handlers: &[PhraseHandler]) -> Readiness {
        if handlers.is_empty() {
            Readiness::Probe
        } else {
            Readiness::Logs
        }
    }

    /// Custom readiness. Only called when [`RoleHooks::readiness`] says so.
    async fn start(
        &self,
        ctx: &HookCtx<'_>,
        logs: &mut LogStream,
        handlers: &[PhraseHandler],
    ) -> Result<(), StackError> {
        await_phrase(ctx, logs, handlers, ctx.spec.startup_kwargs().into()).await.map(|_| ())
    }

    /// Runs once readiness is confirmed, before the service is marked ready.
    async fn on_ready(&self, _ctx: &HookCtx<'_>) -> Result<(), StackError> {
        Ok(())
    }

    async fn stop(&self, ctx: &HookCtx<'_>) -> Result<(), StackError> {
        stop_with_signals(ctx).await
    }

    async fn status(&self, ctx: &HookCtx<'_>) -> HealthStatus {
        is_running(ctx).await
    }

    /// Extra methods reachable through `service run`. `status` is handled by the lifecycle.
    async fn run(
        &self,
        ctx: &HookCtx<'_>,
        method: &str,
        _args: &[String],
    ) -> Result<Value, StackError> {
        Err(StackError::UnknownMethod {
            service: ctx.name().to_string(),
            method: method.to_string(),
        })
    }

    fn chain_state(&self) -> Option<ChainNodeState> {
        None
    }
}

pub fn hooks_for(role: ServiceRole) -> Box<dyn RoleHooks> {
    match role {
        ServiceRole::ChainNode => Box::new(ChainNodeHooks::default()),
        ServiceRole::Indexer => Box::new(indexer::IndexerHooks),
        ServiceRole::Gateway => Box::new(gateway::GatewayHooks),
        ServiceRole::Search => Box::new(search::SearchHooks),
        ServiceRole::Dashboard => Box::new(dashboard::DashboardHooks),
        ServiceRole::Cache => Box::new(cache::CacheHooks),
        ServiceRole::Generic => Box::new(generic::GenericHooks),
    }
}

/// Every field of the service, flattened under its name (`translator_ports_broadcast`).
pub(crate) fn spec_vars(ctx: &HookCtx<'_>) -> Result<IndexMap<String, String>, StackError> {
    prefixed_vars(ctx, ctx.name(), ctx.spec)
}

/// `value` flattened under `prefix`.
pub(crate) fn prefixed_vars<T: Serialize>(
    ctx: &HookCtx<'_>,
    prefix: &str,
    value: &T,
) -> Result<IndexMap<String, String>, StackError> {
    let value = serde_json::to_value(value)
        .map_err(|e| StackError::config(ctx.name(), format!("serialize {}: {}", prefix, e)))?;
    Ok(flatten(prefix, &value))
}

/// Service fields overlaid with its typed role config, so defaults are visible to templates.
pub(crate) fn role_vars<T: Serialize>(
    ctx: &HookCtx<'_>,
    config: &T,
) -> Result<IndexMap<String, String>, StackError> {
    let mut vars = spec_vars(ctx)?;
    vars.extend(prefixed_vars(ctx, ctx.name(), config)?);
    Ok(vars)
}

pub(crate) async fn is_running(ctx: &HookCtx<'_>) -> HealthStatus {
    match ctx.runtime().is_running(ctx.name()).await {
        Ok(running) => running.into(),
        Err(e) => {
            tracing::warn!(service = %ctx.name(), error = %e, "liveness query failed");
            HealthStatus::Unhealthy
        }
    }
}

/// Healthy when a GET on `url` answers with a success status.
pub(crate) async fn http_ok(ctx: &HookCtx<'_>, url: &str) -> HealthStatus {
    match ctx.probe().get(url).await {
        Ok(_) => HealthStatus::Healthy,
        Err(e) => {
            tracing::debug!(service = %ctx.name(), %url, error = %e, "health probe failed");
            HealthStatus::Unhealthy
        }
    }
}

#[cfg(test)]
#[path = "roles_tests.rs"]
mod tests;
