// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process runtime boundary
//!
//! The `ProcessRuntime` trait is everything the lifecycle needs from the
//! layer that actually runs services: create/start an instance, signal and
//! remove it, tail its output, run commands inside it, and fetch external
//! downloads before start. Instances are addressed by service name.

mod docker;
mod download;

pub use docker::DockerRuntime;
pub use download::fetch_downloads;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRuntime, RuntimeCall};

use async_trait::async_trait;
use indexmap::IndexMap;
use ns_core::{Download, StopSignal};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from process runtime operations
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("instance not found: {0}")]
    NotFound(String),
    #[error("start failed: {0}")]
    StartFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Host path bound into an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountBinding {
    pub source: PathBuf,
    pub target: String,
}

/// Everything needed to create and start one service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceConfig {
    pub service: String,
    pub image: String,
    pub entrypoint: Option<Vec<String>>,
    pub command: Vec<String>,
    pub env: IndexMap<String, String>,
    pub mounts: Vec<MountBinding>,
    pub ports: Vec<u16>,
    pub network: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
}

impl InstanceConfig {
    pub fn new(service: impl Into<String>, image: impl Into<String>) -> Self {
        Self { service: service.into(), image: image.into(), ..Default::default() }
    }

    ns_core::setters! {
        set {
            command: Vec<String>,
            env: IndexMap<String, String>,
            mounts: Vec<MountBinding>,
            ports: Vec<u16>,
        }
        option {
            entrypoint: Vec<String>,
            network: String,
            user: String,
            group: String,
        }
    }
}

/// Where a log stream begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStart {
    Beginning,
    /// The latest start of the instance, skipping earlier runs.
    LastStart,
    /// The current end of the log: only lines written from now on.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub start: LogStart,
}

impl LogOptions {
    pub fn from_latest(from_latest: bool) -> Self {
        let start = if from_latest { LogStart::LastStart } else { LogStart::Beginning };
        Self { start }
    }

    /// Follow only lines written after the stream opens.
    pub fn new_lines() -> Self {
        Self { start: LogStart::End }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub code: i32,
    pub output: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// A live, possibly unbounded sequence of log lines.
///
/// Ends when the producer goes away (instance exited or log follower died).
pub struct LogStream {
    rx: mpsc::Receiver<String>,
    _follower: Option<tokio::process::Child>,
}

impl LogStream {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx, _follower: None }
    }

    pub(crate) fn with_follower(rx: mpsc::Receiver<String>, child: tokio::process::Child) -> Self {
        Self { rx, _follower: Some(child) }
    }

    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl std::fmt::Debug for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStream").finish_non_exhaustive()
    }
}

/// Adapter for the layer that runs service instances
#[async_trait]
pub trait ProcessRuntime: Send + Sync + 'static {
    /// Retrieve external downloads into `dest` before start. Existing files are kept.
    async fn fetch(&self, downloads: &[Download], dest: &Path) -> Result<(), RuntimeError>;

    /// Create and start an instance.
    async fn start(&self, config: InstanceConfig) -> Result<(), RuntimeError>;

    async fn signal(&self, service: &str, signal: StopSignal) -> Result<(), RuntimeError>;

    /// Run a command inside a running instance.
    async fn exec(&self, service: &str, command: &[String]) -> Result<ExecOutput, RuntimeError>;

    async fn logs(&self, service: &str, options: LogOptions) -> Result<LogStream, RuntimeError>;

    async fn is_running(&self, service: &str) -> Result<bool, RuntimeError>;

    /// Wait up to `timeout` for the instance to exit. Returns whether it did.
    async fn wait_exit(&self, service: &str, timeout: Duration) -> Result<bool, RuntimeError>;

    /// Remove the instance. Removing an absent instance is not an error.
    async fn remove(&self, service: &str) -> Result<(), RuntimeError>;

    /// Host other instances use to reach this one.
    fn internal_host(&self, service: &str) -> String;

    /// Host this process uses to reach the instance's published ports.
    fn probe_host(&self, service: &str) -> String;
}
