// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An initialized node directory: its stack config, lock and runtime wiring.

use crate::exit_error::{codes, ExitError};
use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use ns_adapters::{DockerRuntime, NetProbe};
use ns_core::StackSpec;
use ns_engine::RuntimeDeps;
use ns_template::{environment_of, plan_upgrade, TemplateSet, UpgradePlan};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const LOCK_FILE: &str = "nodestack.pid";
pub const LOG_DIR: &str = "logs";

/// How often a waiting command retries the node lock.
const LOCK_POLL: Duration = Duration::from_millis(200);

/// Container name prefix when the config names no stack.
const DEFAULT_PREFIX: &str = "nodestack";

pub struct NodeDir {
    root: PathBuf,
    config_name: String,
}

impl NodeDir {
    pub fn new(root: impl Into<PathBuf>, config_name: impl Into<String>) -> Self {
        Self { root: root.into(), config_name: config_name.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(&self.config_name)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.root.join(format!("{}.backup", self.config_name))
    }

    fn read_config(&self) -> Result<String> {
        let path = self.config_path();
        std::fs::read_to_string(&path)
            .with_context(|| format!("reading stack config {}", path.display()))
    }

    pub fn load(&self) -> Result<StackSpec> {
        let text = self.read_config()?;
        StackSpec::from_json(&text)
            .with_context(|| format!("parsing stack config {}", self.config_path().display()))
    }

    /// Hold the node lock for as long as the returned file lives.
    pub fn lock(&self) -> Result<File> {
        let path = self.root.join(LOCK_FILE);
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        file.try_lock_exclusive()
            .with_context(|| format!("another nodestack command holds {}", path.display()))?;
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        Ok(file)
    }

    /// PID recorded by the command that last took the lock.
    pub fn holder_pid(&self) -> Option<i32> {
        let text = std::fs::read_to_string(self.root.join(LOCK_FILE)).ok()?;
        text.trim().parse().ok().filter(|pid| *pid > 0)
    }

    /// Take the lock, interrupting whichever command holds it and waiting up
    /// to `wait` for that command to unwind and release it.
    pub async fn lock_interrupting(&self, wait: Duration) -> Result<File> {
        let err = match self.lock() {
            Ok(file) => return Ok(file),
            Err(e) => e,
        };
        let Some(pid) = self.holder_pid().filter(|pid| *pid != std::process::id() as i32) else {
            return Err(err);
        };

        tracing::info!(pid, "interrupting running nodestack command");
        match kill(Pid::from_raw(pid), Signal::SIGINT) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => return Err(err.context(format!("interrupting pid {pid}: {e}"))),
        }

        let deadline = tokio::time::Instant::now() + wait;
        loop {
            tokio::time::sleep(LOCK_POLL).await;
            match self.lock() {
                Ok(file) => return Ok(file),
                Err(e) if tokio::time::Instant::now() >= deadline => {
                    return Err(e.context(format!("pid {pid} did not release the lock in time")));
                }
                Err(_) => {}
            }
        }
    }

    /// Diff of the persisted config against the canonical template for its environment.
    pub fn upgrade_plan(&self) -> Result<UpgradePlan> {
        let stack = self.load()?;
        let env = environment_of(&stack).ok_or_else(|| {
            anyhow!(
                "cannot tell which environment {} was generated for",
                self.config_path().display()
            )
        })?;
        let canonical = TemplateSet::builtin()?.resolve_env(env)?.to_value()?;
        let live: Value = serde_json::from_str(&self.read_config()?)?;
        Ok(plan_upgrade(&canonical, &live))
    }

    /// Back up the persisted config and write the patched one.
    pub fn apply_upgrade(&self, plan: &UpgradePlan) -> Result<()> {
        let backup = self.backup_path();
        if backup.exists() {
            return Err(ExitError::new(
                codes::BACKUP_EXISTS,
                format!("{} already exists; move it away before upgrading again", backup.display()),
            )
            .into());
        }
        let config = self.config_path();
        std::fs::copy(&config, &backup)
            .with_context(|| format!("backing up {} to {}", config.display(), backup.display()))?;
        let patched = StackSpec::from_value(plan.patched.clone())?.to_json_pretty()?;
        std::fs::write(&config, patched).with_context(|| format!("writing {}", config.display()))?;
        tracing::info!(
            config = %config.display(),
            backup = %backup.display(),
            changes = plan.diffs.len(),
            "config upgraded"
        );
        Ok(())
    }

    /// Refuse a stale config unless `upgrade` is set, in which case patch it first.
    pub fn ensure_current(&self, upgrade: bool) -> Result<()> {
        let plan = self.upgrade_plan()?;
        if plan.is_empty() {
            return Ok(());
        }
        if !upgrade {
            return Err(ExitError::new(
                codes::UPGRADE_REQUIRED,
                format!(
                    "config upgrade required, rerun with --conf-upgrade:\n{}",
                    plan.diffs.join("\n")
                ),
            )
            .into());
        }
        self.apply_upgrade(&plan)
    }

    pub fn deps(&self, stack: &StackSpec) -> RuntimeDeps {
        let prefix = stack.name.clone().unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        RuntimeDeps {
            runtime: Arc::new(DockerRuntime::new(prefix, stack.network.clone())),
            probe: Arc::new(NetProbe::new()),
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
