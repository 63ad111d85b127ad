// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Search index role.

use super::{http_ok, role_vars, RoleHooks};
use crate::error::StackError;
use crate::lifecycle::HookCtx;
use async_trait::async_trait;
use indexmap::IndexMap;
use ns_core::{HealthStatus, SearchConfig, ServiceSpec};

pub struct SearchHooks;

/// `<protocol>://<host>:<http port>` of a search service.
pub(crate) fn node_url(
    ctx: &HookCtx<'_>,
    search: &ServiceSpec,
    host: &str,
) -> Result<String, StackError> {
    let config: SearchConfig =
        search.role_config().map_err(|e| crate::lifecycle::spec_error(ctx.name(), e))?;
    Ok(format!("{}://{}:{}", config.protocol, host, ctx.port(search, "http")?))
}

#[async_trait]
impl RoleHooks for SearchHooks {
    fn config_vars(&self, ctx: &HookCtx<'_>) -> Result<IndexMap<String, String>, StackError> {
        let config: SearchConfig = ctx.role_config()?;
        role_vars(ctx, &config)
    }

    async fn status(&self, ctx: &HookCtx<'_>) -> HealthStatus {
        let host = ctx.runtime().probe_host(ctx.name());
        match node_url(ctx, ctx.spec, &host) {
            Ok(url) => http_ok(ctx, &format!("{}/_cluster/health", url)).await,
            Err(_) => HealthStatus::Unhealthy,
        }
    }
}
