// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chain node role.
//!
//! The node decides at configure time whether it is relaunching against a
//! persisted block log. That decision selects the launch arguments
//! (snapshot or genesis on a first launch, neither on a relaunch) and turns
//! the fresh-start phrases into contradictions. A fresh local producer is
//! bootstrapped once, then start waits for the node API and for the head
//! block the indexer will begin at.

use super::{prefixed_vars, role_vars, RoleHooks};
use crate::error::StackError;
use crate::lifecycle::{await_phrase, interpolate_args, pause, stop_with_signals, HookCtx};
use crate::watcher::{watch, PhraseHandler, TimeoutCause, Verdict, WatchOptions};
use async_trait::async_trait;
use indexmap::IndexMap;
use ns_adapters::{env, ChainClient, ChainInfo, InstanceConfig, LogOptions, LogStream, RuntimeError};
use ns_core::{
    ChainNodeConfig, ChainNodeState, Environment, HealthStatus, IndexerConfig, ServiceRole, Subst,
};
use ns_template::snapshot_file;
use parking_lot::Mutex;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Phrases the node logs when it initializes a brand new chain.
pub const FRESH_START_PHRASES: [&str; 2] =
    ["Done storing initial state on startup", "No existing chain state or fork database"];

pub const SHUTDOWN_PHRASE: &str = "nodeos successfully exiting";

const PRODUCED_BLOCK: &str = "Produced block";
const RECEIVED_BLOCK: &str = "Received block";
const DIRTY_DATABASE: &str = "database dirty flag";
const ADDRESS_IN_USE: &str = "Address already in use";

const STATE_HISTORY_PLUGIN: &str = "eosio::state_history_plugin";
const NO_SPACE_SHUTDOWN: &str = "--resource-monitor-not-shutdown-on-threshold-exceeded";

/// Development key of the local producer.
const DEFAULT_SIG_PROVIDER: &str = "EOS5GnobZ231eekYUJHGTcmy2qve1K23r5jSFQbMfwWTtPB7mFZ1L=KEY:5Jr65kdYmn33C3UabzhmWDm2PuqbRfPuDStts3ZFNSBLM7TqaiL";

/// Persisted block log whose presence marks a relaunch, relative to the data mount.
const BLOCK_LOG: &str = "blocks/blocks.log";

const WORKDIR_MOUNT: &str = "~";
const DATA_MOUNT: &str = "data";

const HEAD_POLL_INTERVAL: Duration = Duration::from_secs(1);
const SHUTDOWN_LINES: usize = 15;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Default)]
pub struct ChainNodeHooks {
    state: Mutex<Option<ChainNodeState>>,
}

impl ChainNodeHooks {
    fn config(ctx: &HookCtx<'_>) -> Result<ChainNodeConfig, StackError> {
        ctx.role_config()
    }

    /// Node state, computing the relaunch flag from disk on first use.
    fn node_state(&self, ctx: &HookCtx<'_>) -> Result<ChainNodeState, StackError> {
        if let Some(state) = self.state.lock().clone() {
            return Ok(state);
        }
        let is_relaunch = ctx.mount_source(DATA_MOUNT)?.join(BLOCK_LOG).is_file();
        let state = ChainNodeState::new(is_relaunch);
        *self.state.lock() = Some(state.clone());
        Ok(state)
    }

    fn client(ctx: &HookCtx<'_>) -> ChainClient {
        ChainClient::new(ctx.probe_handle())
    }

    async fn get_info(&self, ctx: &HookCtx<'_>) -> Result<ChainInfo, StackError> {
        let endpoint = ctx.probe_url("api", "")?;
        Self::client(ctx).get_info(&endpoint).await.map_err(StackError::probe(ctx.name()))
    }

    /// Poll the node API until it answers, then check it serves the configured chain.
    async fn await_api(
        &self,
        ctx: &HookCtx<'_>,
        config: &ChainNodeConfig,
    ) -> Result<ChainInfo, StackError> {
        let retries = env::api_retries();
        let interval = env::api_retry_interval();
        for attempt in 1..=retries {
            match self.get_info(ctx).await {
                Ok(info) if info.chain_id == config.chain_id => return Ok(info),
                Ok(info) => {
                    return Err(StackError::misconfigured(
                        ctx.name(),
                        format!(
                            "node reports chain id {} but config expects {}",
                            info.chain_id, config.chain_id
                        ),
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        service = %ctx.name(),
                        attempt,
                        retries,
                        error = %e,
                        "node api not up yet"
                    );
                }
            }
            pause(ctx, interval).await?;
        }
        Err(StackError::ReadinessTimeout {
            service: ctx.name().to_string(),
            cause: TimeoutCause::Deadline,
        })
    }

    /// Block until the head block reaches `target`.
    async fn await_head(
        &self,
        ctx: &HookCtx<'_>,
        target: u64,
        budget: Duration,
    ) -> Result<u64, StackError> {
        let deadline = tokio::time::Instant::now() + budget;
        loop {
            match self.get_info(ctx).await {
                Ok(info) if info.head_block_num >= target => return Ok(info.head_block_num),
                Ok(info) => {
                    tracing::debug!(
                        service = %ctx.name(),
                        head = info.head_block_num,
                        target,
                        "waiting for head block"
                    );
                }
                Err(e) => {
                    tracing::warn!(service = %ctx.name(), error = %e, "head block query failed")
                }
            }
            if tokio::time::Instant::now() + HEAD_POLL_INTERVAL > deadline {
                return Err(StackError::ReadinessTimeout {
                    service: ctx.name().to_string(),
                    cause: TimeoutCause::Deadline,
                });
            }
            pause(ctx, HEAD_POLL_INTERVAL).await?;
        }
    }

    /// Run the bootstrap command list inside the instance; the first failure aborts.
    async fn bootstrap(
        &self,
        ctx: &HookCtx<'_>,
        config: &ChainNodeConfig,
    ) -> Result<(), StackError> {
        let vars = bootstrap_vars(ctx, config)?;
        for command in &config.bootstrap {
            let command = interpolate_args(command, &vars);
            tracing::info!(service = %ctx.name(), command = %command.join(" "), "bootstrap");
            let output =
                ctx.runtime().exec(ctx.name(), &command).await.map_err(ctx.runtime_error())?;
            if !output.success() {
                let failure = RuntimeError::CommandFailed(format!(
                    "{} exited with {}: {}",
                    command.join(" "),
                    output.code,
                    output.output.trim()
                ));
                return Err(StackError::runtime(ctx.name())(failure));
            }
        }
        Ok(())
    }

    /// Ask nodeos to exit and wait for its goodbye. Returns whether it was seen.
    async fn graceful_shutdown(&self, ctx: &HookCtx<'_>) -> Result<bool, StackError> {
        let runtime = ctx.runtime();
        if !runtime.is_running(ctx.name()).await.map_err(ctx.runtime_error())? {
            return Ok(false);
        }
        let mut logs = runtime
            .logs(ctx.name(), LogOptions::new_lines())
            .await
            .map_err(ctx.runtime_error())?;
        let pkill = ["pkill".to_string(), "-f".to_string(), "nodeos".to_string()];
        let output = runtime.exec(ctx.name(), &pkill).await.map_err(ctx.runtime_error())?;
        if !output.success() {
            tracing::warn!(service = %ctx.name(), code = output.code, "pkill failed");
            return Ok(false);
        }

        let handlers = [PhraseHandler::ready(SHUTDOWN_PHRASE)];
        let options = WatchOptions::new(SHUTDOWN_TIMEOUT).max_lines(SHUTDOWN_LINES);
        // Teardown runs after a cancelled bring-up, so it gets its own token.
        let report = watch(&mut logs, &handlers, options, &CancellationToken::new())
            .await
            .map_err(|fatal| StackError::misconfigured(ctx.name(), fatal.to_string()))?;
        Ok(report.matched())
    }
}

#[async_trait]
impl RoleHooks for ChainNodeHooks {
    fn config_vars(&self, ctx: &HookCtx<'_>) -> Result<IndexMap<String, String>, StackError> {
        let config = Self::config(ctx)?;
        let mut vars = role_vars(ctx, &config)?;
        vars.extend(prefixed_vars(ctx, "", &config.ini)?);
        vars.insert("http_addr".into(), format!("0.0.0.0:{}", ctx.port(ctx.spec, "api")?));
        vars.insert("p2p_addr".into(), format!("0.0.0.0:{}", ctx.port(ctx.spec, "p2p")?));
        vars.insert(
            "history_endpoint".into(),
            format!("0.0.0.0:{}", ctx.port(ctx.spec, "history")?),
        );
        if let Some(provider) = sig_provider(&config) {
            vars.insert("sig_provider".into(), provider);
        }
        Ok(vars)
    }

    fn own_templates(&self) -> &'static [&'static str] {
        &["config.ini", "local.config.ini"]
    }

    fn configure(
        &self,
        ctx: &HookCtx<'_>,
        vars: &IndexMap<String, String>,
    ) -> Result<(), StackError> {
        let config = Self::config(ctx)?;
        let is_relaunch = ctx.mount_source(DATA_MOUNT)?.join(BLOCK_LOG).is_file();
        *self.state.lock() = Some(ChainNodeState::new(is_relaunch));
        tracing::info!(
            service = %ctx.name(),
            is_relaunch,
            chain_type = %config.chain_type,
            "chain node state"
        );

        let service_dir = ctx.service_dir();
        let read = |name: &str| {
            let path = service_dir.join("templates").join(name);
            std::fs::read_to_string(&path)
                .map_err(|e| StackError::config(ctx.name(), format!("{}: {}", path.display(), e)))
        };
        let base = read("config.ini")?;
        let local = match config.chain_type {
            Environment::Local => Some(read("local.config.ini")?),
            _ => None,
        };

        let wd = ctx.mount_target(WORKDIR_MOUNT)?;
        let ini = render_config_ini(&config, &base, local.as_deref(), vars, wd);
        let target = service_dir.join("config.ini");
        std::fs::write(&target, ini)
            .map_err(|e| StackError::config(ctx.name(), format!("{}: {}", target.display(), e)))
    }

    fn prepare(
        &self,
        ctx: &HookCtx<'_>,
        invocation: &mut InstanceConfig,
    ) -> Result<(), StackError> {
        let config = Self::config(ctx)?;
        let state = self.node_state(ctx)?;
        let snapshot = snapshot_file(ctx.spec).map_err(|source| StackError::SnapshotResolution {
            service: ctx.name().to_string(),
            source,
        })?;
        let wd = ctx.mount_target(WORKDIR_MOUNT)?;
        invocation.command = nodeos_command(&config, state.is_relaunch(), snapshot.as_deref(), wd);
        Ok(())
    }

    fn phrase_handlers(&self, ctx: &HookCtx<'_>) -> Result<Vec<PhraseHandler>, StackError> {
        let config = Self::config(ctx)?;
        let state = self.node_state(ctx)?;
        Ok(phrase_handlers(config.produce, state.is_relaunch()))
    }

    fn readiness(&self, _ctx: &HookCtx<'_>, _handlers: &[PhraseHandler]) -> super::Readiness {
        super::Readiness::Custom
    }

    async fn start(
        &self,
        ctx: &HookCtx<'_>,
        logs: &mut LogStream,
        handlers: &[PhraseHandler],
    ) -> Result<(), StackError> {
        let config = Self::config(ctx)?;
        let mut state = self.node_state(ctx)?;
        let kwargs = ctx.spec.startup_kwargs();

        // A resyncing follower replays before it receives anything.
        let watched = config.produce || !config.requests_resync();
        if watched {
            let report = await_phrase(ctx, logs, handlers, kwargs.into()).await?;
            if FRESH_START_PHRASES.iter().any(|p| report.saw(p)) {
                state
                    .observe_fresh_launch()
                    .map_err(|e| StackError::misconfigured(ctx.name(), e.to_string()))?;
            }
        }
        *self.state.lock() = Some(state.clone());
        tracing::info!(
            service = %ctx.name(),
            is_relaunch = state.is_relaunch(),
            is_fresh_launch = state.is_fresh_launch(),
            "chain node started"
        );

        if !config.initialize {
            // Without a phrase match the node API is the only readiness signal.
            if !watched {
                let info = self.await_api(ctx, &config).await?;
                state.observe_info(info.chain_id, info.head_block_num);
                *self.state.lock() = Some(state);
            }
            return Ok(());
        }
        if state.is_fresh_launch() && config.produce {
            self.bootstrap(ctx, &config).await?;
        }

        let info = self.await_api(ctx, &config).await?;
        state.observe_info(info.chain_id.clone(), info.head_block_num);
        *self.state.lock() = Some(state.clone());

        if let Some(target) = indexer_genesis_block(ctx)? {
            let head =
                self.await_head(ctx, target, Duration::from_secs(kwargs.timeout)).await?;
            state.observe_info(info.chain_id, head);
            *self.state.lock() = Some(state);
            tracing::info!(service = %ctx.name(), head, target, "head block reached indexer start");
        }
        Ok(())
    }

    async fn stop(&self, ctx: &HookCtx<'_>) -> Result<(), StackError> {
        if self.graceful_shutdown(ctx).await? {
            tracing::info!(service = %ctx.name(), "nodeos exited");
        } else {
            tracing::warn!(service = %ctx.name(), "no shutdown phrase, escalating signals");
        }
        stop_with_signals(ctx).await
    }

    async fn status(&self, ctx: &HookCtx<'_>) -> HealthStatus {
        let Ok(config) = Self::config(ctx) else {
            return HealthStatus::Unhealthy;
        };
        match self.get_info(ctx).await {
            Ok(info) => (info.chain_id == config.chain_id).into(),
            Err(e) => {
                tracing::debug!(service = %ctx.name(), error = %e, "status probe failed");
                HealthStatus::Unhealthy
            }
        }
    }

    async fn run(
        &self,
        ctx: &HookCtx<'_>,
        method: &str,
        args: &[String],
    ) -> Result<Value, StackError> {
        match method {
            "block_num" => Ok(Value::from(self.get_info(ctx).await?.head_block_num)),
            "remote_block_num" => {
                let config = Self::config(ctx)?;
                let Some(endpoint) = config.chain_type.remote_endpoint() else {
                    return Err(StackError::misconfigured(
                        ctx.name(),
                        "no remote head block on a local chain",
                    ));
                };
                let info = Self::client(ctx)
                    .get_info(endpoint)
                    .await
                    .map_err(StackError::probe(ctx.name()))?;
                Ok(Value::from(info.head_block_num))
            }
            "measure_speed" => {
                let secs = args
                    .first()
                    .and_then(|s| s.parse::<u64>().ok())
                    .filter(|s| *s > 0)
                    .ok_or_else(|| {
                        StackError::config(
                            ctx.name(),
                            "measure_speed takes a positive number of seconds",
                        )
                    })?;
                let start = self.get_info(ctx).await?.head_block_num;
                tracing::info!(service = %ctx.name(), secs, start, "measuring sync speed");
                pause(ctx, Duration::from_secs(secs)).await?;
                let end = self.get_info(ctx).await?.head_block_num;
                let speed = end.saturating_sub(start) as f64 / secs as f64;
                tracing::info!(service = %ctx.name(), end, speed, "sync speed");
                Ok(Value::from(speed))
            }
            _ => Err(StackError::UnknownMethod {
                service: ctx.name().to_string(),
                method: method.to_string(),
            }),
        }
    }

    fn chain_state(&self) -> Option<ChainNodeState> {
        self.state.lock().clone()
    }
}

fn sig_provider(config: &ChainNodeConfig) -> Option<String> {
    match &config.ini.sig_provider {
        Some(provider) => Some(provider.clone()),
        None if config.produce => Some(DEFAULT_SIG_PROVIDER.to_string()),
        None => None,
    }
}

fn bootstrap_vars(
    ctx: &HookCtx<'_>,
    config: &ChainNodeConfig,
) -> Result<IndexMap<String, String>, StackError> {
    let provider = sig_provider(config)
        .ok_or_else(|| StackError::config(ctx.name(), "producer has no signature provider"))?;
    let (public, private) = provider.split_once("=KEY:").ok_or_else(|| {
        StackError::config(ctx.name(), "signature provider is not of the form <pub>=KEY:<priv>")
    })?;
    let wd = ctx.mount_target(WORKDIR_MOUNT)?;

    let mut vars = IndexMap::new();
    vars.insert("producer_pub".to_string(), public.to_string());
    vars.insert("producer_key".to_string(), private.to_string());
    vars.insert("api_url".to_string(), format!("http://127.0.0.1:{}", ctx.port(ctx.spec, "api")?));
    vars.insert("nodeos_wd".to_string(), wd.to_string());
    vars.insert("contracts_dir".to_string(), format!("{}/contracts", wd));
    vars.insert("evm_contract".to_string(), config.evm_contract.clone());
    Ok(vars)
}

/// One block before the indexer's start block, if the stack has an indexer.
fn indexer_genesis_block(ctx: &HookCtx<'_>) -> Result<Option<u64>, StackError> {
    let indexer = ctx.env.stack.stack.iter().find(|s| ServiceRole::of(s) == ServiceRole::Indexer);
    let Some(indexer) = indexer else {
        return Ok(None);
    };
    let config: IndexerConfig =
        indexer.role_config().map_err(|e| crate::lifecycle::spec_error(ctx.name(), e))?;
    Ok(Some(config.start_block.saturating_sub(1)))
}

/// Handlers in registration order. Fatal states come first.
pub(crate) fn phrase_handlers(produce: bool, is_relaunch: bool) -> Vec<PhraseHandler> {
    let mut handlers = vec![
        PhraseHandler::fatal(DIRTY_DATABASE, "state database is dirty and needs manual repair"),
        PhraseHandler::fatal(ADDRESS_IN_USE, "a configured port is already in use on this host"),
    ];
    for phrase in FRESH_START_PHRASES {
        handlers.push(PhraseHandler::new(phrase, move |_| {
            if is_relaunch {
                Err("fresh launch phrase on a node with persisted chain state".to_string())
            } else {
                Ok(Verdict::Continue)
            }
        }));
    }
    handlers.push(PhraseHandler::new(PRODUCED_BLOCK, move |_| {
        if produce {
            Ok(Verdict::Ready)
        } else {
            Err("node is producing blocks but is not configured to produce".to_string())
        }
    }));
    handlers.push(PhraseHandler::new(RECEIVED_BLOCK, move |_| {
        if produce {
            Err("node is receiving blocks but is configured to produce".to_string())
        } else {
            Ok(Verdict::Ready)
        }
    }));
    handlers
}

/// Node command line.
///
/// A first launch, or a relaunch asking for a resync, starts from the
/// snapshot when there is one and from genesis otherwise.
pub(crate) fn nodeos_command(
    config: &ChainNodeConfig,
    is_relaunch: bool,
    snapshot: Option<&str>,
    wd: &str,
) -> Vec<String> {
    let mut cmd = vec![config.nodeos_bin.clone()];
    if config.ini.plugins.iter().any(|p| p == STATE_HISTORY_PLUGIN) {
        cmd.push("--disable-replay-opts".to_string());
    }
    if !is_relaunch || config.requests_resync() {
        if let Some(snapshot) = snapshot {
            cmd.push(format!("--snapshot={}/{}", wd, snapshot));
        } else if let Some(genesis) = &config.genesis {
            cmd.push(format!("--genesis-json={}/genesis/{}.json", wd, genesis));
        }
    }
    if !config.space_monitor {
        cmd.push(NO_SPACE_SHUTDOWN.to_string());
    }
    if config.produce {
        cmd.extend(["-p".to_string(), "eosio".to_string()]);
    }
    cmd.extend(config.nodeos_params.iter().cloned());
    cmd
}

/// `config.ini` text: rendered base, the local producer section, then plugin,
/// substitution and peer lines.
pub(crate) fn render_config_ini(
    config: &ChainNodeConfig,
    base: &str,
    local: Option<&str>,
    vars: &IndexMap<String, String>,
    wd: &str,
) -> String {
    let mut ini = ns_template::interpolate(base, vars);
    ini.push('\n');
    if let Some(local) = local {
        ini.push_str(&ns_template::interpolate(local, vars));
        ini.push('\n');
    }

    for plugin in &config.ini.plugins {
        ini.push_str(&format!("plugin = {}\n", plugin));
    }

    if let Some(subst) = &config.ini.subst {
        ini.push_str("plugin = eosio::subst_plugin\n\n");
        match subst {
            Subst::Manifest(manifest) => ini.push_str(&format!("subst-manifest = {}\n", manifest)),
            Subst::ByName(entries) => {
                for (account, path) in entries {
                    let path = if Path::new(path).is_absolute() {
                        path.clone()
                    } else {
                        format!("{}/{}", wd.trim_end_matches('/'), path)
                    };
                    ini.push_str(&format!("subst-by-name = {}:{}\n", account, path));
                }
            }
        }
    }
    ini.push('\n');

    for peer in &config.ini.peers {
        ini.push_str(&format!("p2p-peer-address = {}\n", peer));
    }
    ini
}

#[cfg(test)]
#[path = "chain_node_tests.rs"]
mod tests;
