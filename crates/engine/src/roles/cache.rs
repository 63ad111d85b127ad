// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache role.

use super::{role_vars, RoleHooks};
use crate::error::StackError;
use crate::lifecycle::HookCtx;
use async_trait::async_trait;
use indexmap::IndexMap;
use ns_core::{CacheConfig, HealthStatus};

pub struct CacheHooks;

#[async_trait]
impl RoleHooks for CacheHooks {
    fn config_vars(&self, ctx: &HookCtx<'_>) -> Result<IndexMap<String, String>, StackError> {
        let config: CacheConfig = ctx.role_config()?;
        role_vars(ctx, &config)
    }

    /// Healthy when the instance answers as a replication master.
    async fn status(&self, ctx: &HookCtx<'_>) -> HealthStatus {
        let Ok(port) = ctx.port(ctx.spec, "bind") else {
            return HealthStatus::Unhealthy;
        };
        let addr = format!("{}:{}", ctx.runtime().probe_host(ctx.name()), port);
        match ctx.probe().redis_master(&addr).await {
            Ok(master) => master.into(),
            Err(e) => {
                tracing::debug!(service = %ctx.name(), %addr, error = %e, "redis probe failed");
                HealthStatus::Unhealthy
            }
        }
    }
}
