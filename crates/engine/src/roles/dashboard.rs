// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard role.
//!
//! Once up, the dashboard gets the configured index patterns registered
//! through its HTTP API. The API accepts requests a while after the process
//! logs anything useful, so registration retries until the startup budget runs out.

use super::search::node_url;
use super::{http_ok, role_vars, RoleHooks};
use crate::error::StackError;
use crate::lifecycle::{pause, HookCtx};
use crate::watcher::TimeoutCause;
use async_trait::async_trait;
use indexmap::IndexMap;
use ns_adapters::InstanceConfig;
use ns_core::{DashboardConfig, HealthStatus, IndexPattern};
use serde_json::json;
use std::time::Duration;

const REGISTER_RETRY: Duration = Duration::from_secs(3);
const INDEX_PATTERN_API: &str = "/api/index_patterns/index_pattern";

pub struct DashboardHooks;

pub(crate) fn index_pattern_body(pattern: &IndexPattern) -> String {
    let mut index_pattern = json!({ "title": pattern.title });
    if let Some(field) = &pattern.time_field_name {
        index_pattern["timeFieldName"] = json!(field);
    }
    json!({ "index_pattern": index_pattern }).to_string()
}

impl DashboardHooks {
    async fn register(&self, ctx: &HookCtx<'_>, pattern: &IndexPattern) -> Result<(), StackError> {
        let url = ctx.probe_url("server", INDEX_PATTERN_API)?;
        let headers = [("kbn-xsrf".to_string(), "true".to_string())];
        let body = index_pattern_body(pattern);
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(ctx.spec.startup_kwargs().timeout);

        tracing::info!(service = %ctx.name(), title = %pattern.title, "registering index pattern");
        loop {
            match ctx.probe().post_json(&url, &headers, &body).await {
                Ok(_) => {
                    tracing::info!(service = %ctx.name(), title = %pattern.title, "registered");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        service = %ctx.name(),
                        error = %e,
                        "dashboard not ready, retrying"
                    );
                }
            }
            if tokio::time::Instant::now() + REGISTER_RETRY > deadline {
                return Err(StackError::ReadinessTimeout {
                    service: ctx.name().to_string(),
                    cause: TimeoutCause::Deadline,
                });
            }
            pause(ctx, REGISTER_RETRY).await?;
        }
    }
}

#[async_trait]
impl RoleHooks for DashboardHooks {
    fn config_vars(&self, ctx: &HookCtx<'_>) -> Result<IndexMap<String, String>, StackError> {
        let config: DashboardConfig = ctx.role_config()?;
        let mut vars = role_vars(ctx, &config)?;
        let search = ctx.ready_peer("elastic")?;
        vars.insert("elastic_endpoint".into(), node_url(ctx, search, &ctx.internal_host(search))?);
        Ok(vars)
    }

    fn prepare(
        &self,
        ctx: &HookCtx<'_>,
        invocation: &mut InstanceConfig,
    ) -> Result<(), StackError> {
        let search = ctx.peer("elastic")?;
        let hosts = node_url(ctx, search, &ctx.internal_host(search))?;
        invocation.env.insert("ELASTICSEARCH_HOSTS".to_string(), hosts);
        Ok(())
    }

    async fn on_ready(&self, ctx: &HookCtx<'_>) -> Result<(), StackError> {
        let config: DashboardConfig = ctx.role_config()?;
        for pattern in &config.patterns {
            self.register(ctx, pattern).await?;
        }
        Ok(())
    }

    async fn status(&self, ctx: &HookCtx<'_>) -> HealthStatus {
        match ctx.probe_url("server", "/api/status") {
            Ok(url) => http_ok(ctx, &url).await,
            Err(_) => HealthStatus::Unhealthy,
        }
    }
}
