// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-service lifecycle.
//!
//! `ServiceLifecycle` drives one service through configure, prepare, start,
//! stop and status. Everything role-specific comes from its [`RoleHooks`];
//! the lifecycle itself only knows about templates, instances, log streams
//! and the readiness watcher.

use crate::error::StackError;
use crate::roles::{hooks_for, Readiness, RoleHooks};
use crate::watcher::{watch, PhraseHandler, TimeoutCause, WatchOptions, WatchOutcome};
use indexmap::IndexMap;
use ns_adapters::{
    InstanceConfig, LogOptions, LogStream, MountBinding, Probe, ProcessRuntime, RuntimeError,
};
use ns_core::{
    ChainNodeState, HealthStatus, ServiceRole, ServiceSpec, ServiceState, SpecError, StackSpec,
};
use ns_template::interpolate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Budget for each signal of a stop sequence before escalating.
pub const STOP_GRACE: Duration = Duration::from_secs(10);

/// Interval between readiness probes for services without a startup phrase.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// External collaborators of the lifecycle.
#[derive(Clone)]
pub struct RuntimeDeps {
    pub runtime: Arc<dyn ProcessRuntime>,
    pub probe: Arc<dyn Probe>,
}

/// Everything a lifecycle step may read about the surrounding stack.
#[derive(Clone, Copy)]
pub struct StackEnv<'a> {
    pub stack: &'a StackSpec,
    pub node_root: &'a Path,
    pub deps: &'a RuntimeDeps,
    pub cancel: &'a CancellationToken,
    /// Names of services that reached `Ready`, in order.
    pub ready: &'a [String],
}

/// View of one service inside its stack, handed to role hooks.
#[derive(Clone, Copy)]
pub struct HookCtx<'a> {
    pub spec: &'a ServiceSpec,
    pub env: StackEnv<'a>,
}

impl<'a> HookCtx<'a> {
    pub fn name(&self) -> &'a str {
        &self.spec.name
    }

    pub fn runtime(&self) -> &'a dyn ProcessRuntime {
        self.env.deps.runtime.as_ref()
    }

    pub fn probe(&self) -> &'a dyn Probe {
        self.env.deps.probe.as_ref()
    }

    pub fn probe_handle(&self) -> Arc<dyn Probe> {
        Arc::clone(&self.env.deps.probe)
    }

    pub fn cancel(&self) -> &'a CancellationToken {
        self.env.cancel
    }

    /// Working directory of the service on the host.
    pub fn service_dir(&self) -> PathBuf {
        self.env.node_root.join(self.spec.service_dir())
    }

    pub fn mount_source(&self, mount: &str) -> Result<PathBuf, StackError> {
        self.spec
            .mount(mount)
            .map(|m| self.env.node_root.join(&m.source))
            .ok_or_else(|| StackError::config(self.name(), format!("missing {:?} mount", mount)))
    }

    pub fn mount_target(&self, mount: &str) -> Result<&'a str, StackError> {
        self.spec
            .mount(mount)
            .map(|m| m.target.as_str())
            .ok_or_else(|| StackError::config(self.name(), format!("missing {:?} mount", mount)))
    }

    pub fn role_config<T: DeserializeOwned>(&self) -> Result<T, StackError> {
        self.spec.role_config().map_err(|e| spec_error(self.name(), e))
    }

    pub fn port(&self, spec: &ServiceSpec, port: &str) -> Result<u16, StackError> {
        spec.ports.get(port).copied().ok_or_else(|| {
            StackError::config(self.name(), format!("{} has no {:?} port", spec.name, port))
        })
    }

    /// Another service of the stack, by name or alias.
    pub fn peer(&self, key: &str) -> Result<&'a ServiceSpec, StackError> {
        self.env
            .stack
            .service(key)
            .ok_or_else(|| StackError::config(self.name(), format!("stack has no {} service", key)))
    }

    /// A peer whose runtime endpoints are consumed. It must already be ready.
    pub fn ready_peer(&self, key: &str) -> Result<&'a ServiceSpec, StackError> {
        let peer = self.peer(key)?;
        if !self.env.ready.iter().any(|r| r == &peer.name) {
            return Err(StackError::DependencyOrder {
                service: self.name().to_string(),
                message: format!("{} is not ready", peer.name),
            });
        }
        Ok(peer)
    }

    /// Host other instances use to reach `spec`.
    pub fn internal_host(&self, spec: &ServiceSpec) -> String {
        self.runtime().internal_host(&spec.name)
    }

    /// `http://<probe host>:<port><path>` for this service.
    pub fn probe_url(&self, port: &str, path: &str) -> Result<String, StackError> {
        let port = self.port(self.spec, port)?;
        Ok(format!("http://{}:{}{}", self.runtime().probe_host(self.name()), port, path))
    }

    /// Error mapper that owns the service name, so it outlives this context.
    pub fn runtime_error(&self) -> impl FnOnce(RuntimeError) -> StackError {
        let service = self.name().to_string();
        move |source| StackError::Runtime { service, source }
    }
}

pub(crate) fn spec_error(service: &str, err: SpecError) -> StackError {
    StackError::config(service, err.to_string())
}

/// One service's state machine for a single bring-up cycle.
pub struct ServiceLifecycle {
    spec: ServiceSpec,
    role: ServiceRole,
    hooks: Box<dyn RoleHooks>,
    state: ServiceState,
    invocation: Option<InstanceConfig>,
}

impl ServiceLifecycle {
    pub fn new(spec: ServiceSpec) -> Self {
        let role = ServiceRole::of(&spec);
        Self {
            hooks: hooks_for(role),
            spec,
            role,
            state: ServiceState::Configuring,
            invocation: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    pub fn role(&self) -> ServiceRole {
        self.role
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn invocation(&self) -> Option<&InstanceConfig> {
        self.invocation.as_ref()
    }

    /// Chain-node state, for chain-node services that have been configured.
    pub fn chain_state(&self) -> Option<ChainNodeState> {
        self.hooks.chain_state()
    }

    fn ctx<'a>(&'a self, env: StackEnv<'a>) -> HookCtx<'a> {
        HookCtx { spec: &self.spec, env }
    }

    fn enter(&mut self, next: ServiceState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                service = %self.spec.name,
                from = %self.state,
                to = %next,
                "unexpected transition"
            );
        }
        tracing::info!(service = %self.spec.name, state = %next, "service state");
        self.state = next;
    }

    fn fail(&mut self, err: StackError) -> StackError {
        tracing::error!(
            service = %self.spec.name,
            kind = err.kind(),
            error = %err,
            "service failed"
        );
        self.enter(ServiceState::Unhealthy);
        err
    }

    /// Render the service's config templates and run role-specific configuration.
    ///
    /// Files under `services/<dir>/templates/` are interpolated into
    /// `services/<dir>/`. Re-running with identical inputs rewrites identical files.
    pub fn configure(&mut self, env: StackEnv<'_>) -> Result<(), StackError> {
        let result = {
            let ctx = self.ctx(env);
            configure_service(self.hooks.as_ref(), &ctx)
        };
        result.map_err(|e| self.fail(e))
    }

    /// Compute the instance invocation.
    pub fn prepare(&mut self, env: StackEnv<'_>) -> Result<&InstanceConfig, StackError> {
        self.enter(ServiceState::Preparing);
        let result = {
            let ctx = self.ctx(env);
            base_invocation(&ctx).and_then(|mut config| {
                self.hooks.prepare(&ctx, &mut config)?;
                Ok(config)
            })
        };
        match result {
            Ok(config) => {
                tracing::info!(
                    service = %self.spec.name,
                    image = %config.image,
                    command = %config.command.join(" "),
                    "prepared"
                );
                Ok(self.invocation.insert(config))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Start the instance and block until it is ready or failed.
    pub async fn start(&mut self, env: StackEnv<'_>) -> Result<(), StackError> {
        let Some(invocation) = self.invocation.clone() else {
            return Err(self.fail(StackError::config(&self.spec.name, "start before prepare")));
        };
        self.enter(ServiceState::Starting);
        let result = {
            let ctx = self.ctx(env);
            start_service(self.hooks.as_ref(), &ctx, invocation).await
        };
        match result {
            Ok(()) => {
                self.enter(ServiceState::Ready);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Stop the instance and remove it.
    pub async fn stop(&mut self, env: StackEnv<'_>) -> Result<(), StackError> {
        self.enter(ServiceState::Stopping);
        let result = {
            let ctx = self.ctx(env);
            self.hooks.stop(&ctx).await
        };
        result?;
        self.enter(ServiceState::Stopped);
        Ok(())
    }

    pub async fn status(&self, env: StackEnv<'_>) -> HealthStatus {
        self.hooks.status(&self.ctx(env)).await
    }

    /// Invoke a role method by name.
    pub async fn run(
        &self,
        env: StackEnv<'_>,
        method: &str,
        args: &[String],
    ) -> Result<Value, StackError> {
        let ctx = self.ctx(env);
        if method == "status" {
            return Ok(Value::from(self.hooks.status(&ctx).await.to_string()));
        }
        self.hooks.run(&ctx, method, args).await
    }
}

fn configure_service(hooks: &dyn RoleHooks, ctx: &HookCtx<'_>) -> Result<(), StackError> {
    let vars = hooks.config_vars(ctx)?;
    let service_dir = ctx.service_dir();
    let rendered = render_templates(ctx.name(), &service_dir, &vars, hooks.own_templates())?;
    tracing::info!(service = %ctx.name(), files = rendered, "configured");
    hooks.configure(ctx, &vars)
}

/// Interpolate every file of `<dir>/templates/` into `<dir>/`, skipping `skip`.
/// Returns the number of files written.
pub(crate) fn render_templates(
    service: &str,
    service_dir: &Path,
    vars: &IndexMap<String, String>,
    skip: &[&str],
) -> Result<usize, StackError> {
    let templates = service_dir.join("templates");
    if !templates.is_dir() {
        return Ok(0);
    }
    let io = |path: &Path, e: std::io::Error| {
        StackError::config(service, format!("{}: {}", path.display(), e))
    };

    let mut files: Vec<PathBuf> = std::fs::read_dir(&templates)
        .map_err(|e| io(&templates, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let mut written = 0;
    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if skip.contains(&name) {
            continue;
        }
        let template = std::fs::read_to_string(&path).map_err(|e| io(&path, e))?;
        let target = service_dir.join(name);
        std::fs::write(&target, interpolate(&template, vars)).map_err(|e| io(&target, e))?;
        written += 1;
    }
    Ok(written)
}

/// Instance config derived from the service spec alone.
fn base_invocation(ctx: &HookCtx<'_>) -> Result<InstanceConfig, StackError> {
    let spec = ctx.spec;
    let image = spec
        .docker_image
        .clone()
        .or_else(|| spec.tag.clone())
        .ok_or_else(|| StackError::config(&spec.name, "neither docker_image nor tag is set"))?;

    let mounts = spec
        .mounts
        .iter()
        .map(|m| MountBinding {
            source: ctx.env.node_root.join(&m.source),
            target: m.target.clone(),
        })
        .collect();

    let mut config = InstanceConfig::new(&spec.name, image)
        .env(spec.env.clone())
        .mounts(mounts)
        .ports(spec.ports.values().copied().collect());
    config.entrypoint = spec.entrypoint.clone();
    config.network = ctx.env.stack.network.clone();
    config.user = spec.user.clone();
    config.group = spec.group.clone();
    Ok(config)
}

async fn start_service(
    hooks: &dyn RoleHooks,
    ctx: &HookCtx<'_>,
    invocation: InstanceConfig,
) -> Result<(), StackError> {
    let runtime = ctx.runtime();
    let downloads = ctx.spec.downloads().map_err(|e| spec_error(ctx.name(), e))?;
    if !downloads.is_empty() {
        runtime.fetch(&downloads, &ctx.service_dir()).await.map_err(ctx.runtime_error())?;
    }

    runtime.start(invocation).await.map_err(ctx.runtime_error())?;
    let kwargs = ctx.spec.startup_kwargs();
    let mut logs = runtime
        .logs(ctx.name(), LogOptions::from_latest(kwargs.from_latest))
        .await
        .map_err(ctx.runtime_error())?;

    let mut handlers = hooks.phrase_handlers(ctx)?;
    if let Some(phrase) = &ctx.spec.startup_phrase {
        handlers.push(PhraseHandler::ready(phrase.clone()));
    }

    match hooks.readiness(ctx, &handlers) {
        Readiness::Logs => {
            await_phrase(ctx, &mut logs, &handlers, kwargs.into()).await?;
        }
        Readiness::Probe => await_probe(hooks, ctx, Duration::from_secs(kwargs.timeout)).await?,
        Readiness::Custom => hooks.start(ctx, &mut logs, &handlers).await?,
    }
    hooks.on_ready(ctx).await
}

/// Watch for the handlers' phrases and translate the outcome into bring-up terms.
pub(crate) async fn await_phrase(
    ctx: &HookCtx<'_>,
    logs: &mut LogStream,
    handlers: &[PhraseHandler],
    options: WatchOptions,
) -> Result<crate::watcher::WatchReport, StackError> {
    let report = watch(logs, handlers, options, ctx.cancel())
        .await
        .map_err(|fatal| StackError::misconfigured(ctx.name(), fatal.to_string()))?;
    match &report.outcome {
        WatchOutcome::Matched { phrase, .. } => {
            tracing::info!(
                service = %ctx.name(),
                %phrase,
                lines = report.lines,
                "readiness phrase"
            );
            Ok(report)
        }
        WatchOutcome::Timeout(cause) => {
            Err(StackError::ReadinessTimeout { service: ctx.name().to_string(), cause: *cause })
        }
        WatchOutcome::Cancelled => Err(StackError::Cancelled { service: ctx.name().to_string() }),
    }
}

async fn await_probe(
    hooks: &dyn RoleHooks,
    ctx: &HookCtx<'_>,
    budget: Duration,
) -> Result<(), StackError> {
    let deadline = tokio::time::Instant::now() + budget;
    loop {
        if hooks.status(ctx).await.is_healthy() {
            tracing::info!(service = %ctx.name(), "readiness probe passed");
            return Ok(());
        }
        if tokio::time::Instant::now() + PROBE_INTERVAL > deadline {
            return Err(StackError::ReadinessTimeout {
                service: ctx.name().to_string(),
                cause: TimeoutCause::Deadline,
            });
        }
        pause(ctx, PROBE_INTERVAL).await?;
    }
}

/// Sleep unless the bring-up is cancelled first.
pub(crate) async fn pause(ctx: &HookCtx<'_>, duration: Duration) -> Result<(), StackError> {
    tokio::select! {
        _ = ctx.cancel().cancelled() => {
            Err(StackError::Cancelled { service: ctx.name().to_string() })
        }
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Send each signal of the stop sequence until the instance exits, then remove it.
pub(crate) async fn stop_with_signals(ctx: &HookCtx<'_>) -> Result<(), StackError> {
    let runtime = ctx.runtime();
    let name = ctx.name();
    if runtime.is_running(name).await.map_err(ctx.runtime_error())? {
        for signal in ctx.spec.stop_signals() {
            tracing::info!(service = %name, %signal, "stopping");
            runtime.signal(name, signal).await.map_err(ctx.runtime_error())?;
            if runtime.wait_exit(name, STOP_GRACE).await.map_err(ctx.runtime_error())? {
                break;
            }
            if signal.is_final() {
                tracing::warn!(service = %name, "instance survived final signal");
            }
        }
    }
    runtime.remove(name).await.map_err(ctx.runtime_error())
}

/// `${var}` interpolation of every argument.
pub(crate) fn interpolate_args(args: &[String], vars: &IndexMap<String, String>) -> Vec<String> {
    args.iter().map(|a| interpolate(a, vars)).collect()
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
