// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Indexer role.
//!
//! The indexer reads blocks from the chain node's HTTP and state-history
//! endpoints and writes them into the search index, so both must be ready
//! before it is configured.

use super::search::node_url;
use super::{role_vars, RoleHooks};
use crate::error::StackError;
use crate::lifecycle::HookCtx;
use crate::watcher::{watch, PhraseHandler, WatchOptions};
use async_trait::async_trait;
use indexmap::IndexMap;
use ns_adapters::LogOptions;
use ns_core::{ChainNodeConfig, HealthStatus, IndexerConfig, ServiceSpec};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Logged once the indexer has caught up with the chain head.
pub const DRAINED_PHRASE: &str = "drained";

const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

pub struct IndexerHooks;

/// Endpoints a chain node exposes to other instances.
pub(crate) struct NodeEndpoints {
    pub http: String,
    pub remote: String,
    pub history: String,
    pub chain_id: String,
}

pub(crate) fn node_endpoints(
    ctx: &HookCtx<'_>,
    node: &ServiceSpec,
) -> Result<NodeEndpoints, StackError> {
    let config: ChainNodeConfig =
        node.role_config().map_err(|e| crate::lifecycle::spec_error(ctx.name(), e))?;
    let host = ctx.internal_host(node);
    let http = format!("http://{}:{}", host, ctx.port(node, "api")?);
    let remote =
        config.chain_type.remote_endpoint().map(str::to_string).unwrap_or_else(|| http.clone());
    Ok(NodeEndpoints {
        history: format!("ws://{}:{}", host, ctx.port(node, "history")?),
        http,
        remote,
        chain_id: config.chain_id,
    })
}

#[async_trait]
impl RoleHooks for IndexerHooks {
    fn config_vars(&self, ctx: &HookCtx<'_>) -> Result<IndexMap<String, String>, StackError> {
        let config: IndexerConfig = ctx.role_config()?;
        let mut vars = role_vars(ctx, &config)?;

        let node = node_endpoints(ctx, ctx.ready_peer("leap")?)?;
        vars.insert("nodeos_http_endpoint".into(), node.http);
        vars.insert("nodeos_remote_endpoint".into(), node.remote);
        vars.insert("nodeos_ws_endpoint".into(), node.history);

        let search = ctx.ready_peer("elastic")?;
        vars.insert("elastic_endpoint".into(), node_url(ctx, search, &ctx.internal_host(search))?);
        Ok(vars)
    }

    /// Healthy when a fresh tail shows the indexer draining within a few seconds.
    async fn status(&self, ctx: &HookCtx<'_>) -> HealthStatus {
        let logs = ctx.runtime().logs(ctx.name(), LogOptions::from_latest(true)).await;
        let mut logs = match logs {
            Ok(logs) => logs,
            Err(e) => {
                tracing::debug!(service = %ctx.name(), error = %e, "cannot tail logs");
                return HealthStatus::Unhealthy;
            }
        };
        let handlers = [PhraseHandler::ready(DRAINED_PHRASE)];
        let options = WatchOptions::new(STATUS_TIMEOUT);
        match watch(&mut logs, &handlers, options, &CancellationToken::new()).await {
            Ok(report) => report.matched().into(),
            Err(_) => HealthStatus::Unhealthy,
        }
    }
}
