// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! API gateway role.

use super::indexer::node_endpoints;
use super::search::node_url;
use super::{role_vars, RoleHooks};
use crate::error::StackError;
use crate::lifecycle::HookCtx;
use async_trait::async_trait;
use indexmap::IndexMap;
use ns_core::{GatewayConfig, HealthStatus, IndexerConfig};

pub struct GatewayHooks;

#[async_trait]
impl RoleHooks for GatewayHooks {
    fn config_vars(&self, ctx: &HookCtx<'_>) -> Result<IndexMap<String, String>, StackError> {
        let config: GatewayConfig = ctx.role_config()?;
        let mut vars = role_vars(ctx, &config)?;

        let indexer = ctx.ready_peer("translator")?;
        let indexer_config: IndexerConfig =
            indexer.role_config().map_err(|e| crate::lifecycle::spec_error(ctx.name(), e))?;
        let indexer_host = ctx.internal_host(indexer);
        let broadcast = ctx.port(indexer, "broadcast")?;
        vars.insert("translator_chain_id".into(), indexer_config.chain_id.to_string());
        vars.insert("translator_block_delta".into(), indexer_config.block_delta.to_string());
        vars.insert("translator_ws_host".into(), indexer_host.clone());
        vars.insert("translator_ports_broadcast".into(), broadcast.to_string());
        vars.insert("rpc_ws_uri".into(), format!("ws://{}:{}/evm", indexer_host, broadcast));

        // Nodes are reached for reads and writes through the same endpoint unless overridden.
        let node = node_endpoints(ctx, ctx.peer("leap")?)?;
        vars.insert(
            "rpc_nodeos_read".into(),
            config.nodeos_read.unwrap_or_else(|| node.http.clone()),
        );
        vars.insert("rpc_nodeos_write".into(), config.nodeos_write.unwrap_or(node.http));
        vars.insert("nodeos_chain_id".into(), node.chain_id);

        let cache = ctx.ready_peer("redis")?;
        vars.insert("redis_host".into(), ctx.internal_host(cache));
        vars.insert("redis_port".into(), ctx.port(cache, "bind")?.to_string());

        let search = ctx.peer("elastic")?;
        vars.insert("elastic_node".into(), node_url(ctx, search, &ctx.internal_host(search))?);
        vars.insert("elastic_prefix".into(), indexer_config.chain_name);
        Ok(vars)
    }

    async fn status(&self, _ctx: &HookCtx<'_>) -> HealthStatus {
        HealthStatus::Healthy
    }
}
