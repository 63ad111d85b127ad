// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory process runtime for tests.
//!
//! Log output is scripted per service: every call to `logs` takes the next
//! scripted batch. Streams stay open after their batch unless the script says
//! otherwise, and `emit` pushes further lines to every open stream.

use super::{ExecOutput, InstanceConfig, LogOptions, LogStream, ProcessRuntime, RuntimeError};
use async_trait::async_trait;
use ns_core::{Download, StopSignal};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Recorded runtime call
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    Fetch { downloads: Vec<Download>, dest: PathBuf },
    Start(InstanceConfig),
    Signal { service: String, signal: StopSignal },
    Exec { service: String, command: Vec<String> },
    Logs { service: String, options: LogOptions },
    Remove { service: String },
}

impl RuntimeCall {
    /// Service the call was addressed to, if any.
    pub fn service(&self) -> Option<&str> {
        match self {
            RuntimeCall::Fetch { .. } => None,
            RuntimeCall::Start(config) => Some(&config.service),
            RuntimeCall::Signal { service, .. }
            | RuntimeCall::Exec { service, .. }
            | RuntimeCall::Logs { service, .. }
            | RuntimeCall::Remove { service } => Some(service),
        }
    }
}

struct LogScript {
    lines: Vec<String>,
    close: bool,
}

#[derive(Default)]
struct FakeRuntimeState {
    calls: Vec<RuntimeCall>,
    log_scripts: HashMap<String, VecDeque<LogScript>>,
    senders: HashMap<String, Vec<mpsc::Sender<String>>>,
    exec_results: HashMap<String, VecDeque<ExecOutput>>,
    running: HashSet<String>,
    /// Signals an instance survives before exiting.
    resist: HashMap<String, usize>,
    failing: HashSet<String>,
}

/// Fake process runtime for testing
#[derive(Clone, Default)]
pub struct FakeRuntime {
    inner: Arc<Mutex<FakeRuntimeState>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue log lines for the next `logs` call on `service`. The stream stays open.
    pub fn script_logs(&self, service: &str, lines: &[&str]) {
        self.push_script(service, lines, false);
    }

    /// Queue log lines for the next `logs` call, then end the stream.
    pub fn script_logs_then_close(&self, service: &str, lines: &[&str]) {
        self.push_script(service, lines, true);
    }

    fn push_script(&self, service: &str, lines: &[&str], close: bool) {
        let script = LogScript { lines: lines.iter().map(|l| l.to_string()).collect(), close };
        self.inner.lock().log_scripts.entry(service.to_string()).or_default().push_back(script);
    }

    /// Send a line to every open log stream of `service`.
    pub async fn emit(&self, service: &str, line: &str) {
        let senders = self.inner.lock().senders.get(service).cloned().unwrap_or_default();
        for tx in senders {
            let _ = tx.send(line.to_string()).await;
        }
    }

    pub fn script_exec(&self, service: &str, code: i32, output: &str) {
        self.inner
            .lock()
            .exec_results
            .entry(service.to_string())
            .or_default()
            .push_back(ExecOutput { code, output: output.to_string() });
    }

    /// Make `service` ignore its first `signals` stop signals.
    pub fn resist_signals(&self, service: &str, signals: usize) {
        self.inner.lock().resist.insert(service.to_string(), signals);
    }

    pub fn fail_start(&self, service: &str) {
        self.inner.lock().failing.insert(service.to_string());
    }

    pub fn set_running(&self, service: &str, running: bool) {
        let mut inner = self.inner.lock();
        if running {
            inner.running.insert(service.to_string());
        } else {
            inner.running.remove(service);
        }
    }

    pub fn running(&self, service: &str) -> bool {
        self.inner.lock().running.contains(service)
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.inner.lock().calls.clone()
    }

    /// Services in the order they were started.
    pub fn started(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RuntimeCall::Start(config) => Some(config.service),
                _ => None,
            })
            .collect()
    }

    /// Services in the order they were removed.
    pub fn removed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RuntimeCall::Remove { service } => Some(service),
                _ => None,
            })
            .collect()
    }

    pub fn signals(&self, service: &str) -> Vec<StopSignal> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RuntimeCall::Signal { service: s, signal } if s == service => Some(signal),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ProcessRuntime for FakeRuntime {
    async fn fetch(&self, downloads: &[Download], dest: &Path) -> Result<(), RuntimeError> {
        self.inner
            .lock()
            .calls
            .push(RuntimeCall::Fetch { downloads: downloads.to_vec(), dest: dest.to_path_buf() });
        Ok(())
    }

    async fn start(&self, config: InstanceConfig) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        let service = config.service.clone();
        inner.calls.push(RuntimeCall::Start(config));
        if inner.failing.contains(&service) {
            return Err(RuntimeError::StartFailed(format!("{} refused to start", service)));
        }
        inner.running.insert(service);
        Ok(())
    }

    async fn signal(&self, service: &str, signal: StopSignal) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RuntimeCall::Signal { service: service.to_string(), signal });
        let resisting = inner.resist.get(service).copied().unwrap_or(0);
        if resisting > 0 && !signal.is_final() {
            inner.resist.insert(service.to_string(), resisting - 1);
        } else {
            inner.running.remove(service);
        }
        Ok(())
    }

    async fn exec(&self, service: &str, command: &[String]) -> Result<ExecOutput, RuntimeError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push(RuntimeCall::Exec { service: service.to_string(), command: command.to_vec() });
        let scripted = inner.exec_results.get_mut(service).and_then(|q| q.pop_front());
        Ok(scripted.unwrap_or(ExecOutput { code: 0, output: String::new() }))
    }

    async fn logs(&self, service: &str, options: LogOptions) -> Result<LogStream, RuntimeError> {
        let script = {
            let mut inner = self.inner.lock();
            inner.calls.push(RuntimeCall::Logs { service: service.to_string(), options });
            inner.log_scripts.get_mut(service).and_then(|q| q.pop_front())
        };
        let script = script.unwrap_or(LogScript { lines: Vec::new(), close: false });

        let (tx, rx) = mpsc::channel(script.lines.len().max(16));
        for line in script.lines {
            let _ = tx.try_send(line);
        }
        if !script.close {
            self.inner.lock().senders.entry(service.to_string()).or_default().push(tx);
        }
        Ok(LogStream::new(rx))
    }

    async fn is_running(&self, service: &str) -> Result<bool, RuntimeError> {
        Ok(self.running(service))
    }

    async fn wait_exit(&self, service: &str, _timeout: Duration) -> Result<bool, RuntimeError> {
        Ok(!self.running(service))
    }

    async fn remove(&self, service: &str) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RuntimeCall::Remove { service: service.to_string() });
        inner.running.remove(service);
        inner.senders.remove(service);
        Ok(())
    }

    fn internal_host(&self, service: &str) -> String {
        service.to_string()
    }

    fn probe_host(&self, _service: &str) -> String {
        "127.0.0.1".to_string()
    }
}
