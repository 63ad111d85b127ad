// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker process runtime, driven through the docker CLI.
//!
//! Each service runs as container `<prefix>-<service>` on a shared user
//! network, so services reach each other by container name. Ports are
//! published on the host under the same number for health probes.

use super::{
    fetch_downloads, ExecOutput, InstanceConfig, LogOptions, LogStart, LogStream, ProcessRuntime,
    RuntimeError,
};
use async_trait::async_trait;
use ns_core::{Download, StopSignal};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const LOG_BUFFER: usize = 1024;

#[derive(Clone)]
pub struct DockerRuntime {
    bin: String,
    prefix: String,
    network: String,
    /// Unix start time of containers started by this process, for `--since`.
    started: Arc<Mutex<HashMap<String, u64>>>,
}

impl DockerRuntime {
    pub fn new(prefix: impl Into<String>, network: Option<String>) -> Self {
        let prefix = prefix.into();
        let network = network.unwrap_or_else(|| format!("{}-net", prefix));
        Self { bin: crate::env::docker_bin(), prefix, network, started: Arc::default() }
    }

    pub fn container_name(&self, service: &str) -> String {
        format!("{}-{}", self.prefix, service)
    }

    /// Arguments of `docker run` for an instance.
    pub fn run_args(&self, config: &InstanceConfig) -> Vec<String> {
        let mut args: Vec<String> =
            vec!["run".into(), "-d".into(), "--name".into(), self.container_name(&config.service)];
        let network = config.network.as_deref().unwrap_or(&self.network);
        args.extend(["--network".into(), network.to_string()]);
        for (key, value) in &config.env {
            args.extend(["-e".into(), format!("{}={}", key, value)]);
        }
        for mount in &config.mounts {
            args.extend(["-v".into(), format!("{}:{}", mount.source.display(), mount.target)]);
        }
        for port in &config.ports {
            args.extend(["-p".into(), format!("{}:{}", port, port)]);
        }
        match (&config.user, &config.group) {
            (Some(user), Some(group)) => {
                args.extend(["--user".into(), format!("{}:{}", user, group)])
            }
            (Some(user), None) => args.extend(["--user".into(), user.clone()]),
            _ => {}
        }
        let mut trailing = Vec::new();
        if let Some((program, rest)) = config.entrypoint.as_deref().and_then(|e| e.split_first()) {
            args.extend(["--entrypoint".into(), program.clone()]);
            trailing.extend(rest.iter().cloned());
        }
        args.push(config.image.clone());
        args.extend(trailing);
        args.extend(config.command.iter().cloned());
        args
    }

    pub fn logs_args(&self, service: &str, options: LogOptions) -> Vec<String> {
        let mut args = vec!["logs".to_string(), "--follow".to_string()];
        match options.start {
            LogStart::Beginning => {}
            LogStart::LastStart => match self.started.lock().get(service) {
                Some(since) => args.extend(["--since".into(), since.to_string()]),
                None => args.extend(["--tail".into(), "0".into()]),
            },
            LogStart::End => args.extend(["--tail".into(), "0".into()]),
        }
        args.push(self.container_name(service));
        args
    }

    async fn run_docker(&self, args: &[&str]) -> Result<String, String> {
        let output = tokio::process::Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("failed to exec {}: {}", self.bin, e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!("docker {} failed: {}", args.first().unwrap_or(&""), stderr.trim()))
        }
    }

    async fn ensure_network(&self, network: &str) -> Result<(), RuntimeError> {
        if self.run_docker(&["network", "inspect", network]).await.is_ok() {
            return Ok(());
        }
        match self.run_docker(&["network", "create", network]).await {
            Ok(_) => Ok(()),
            Err(e) if e.contains("already exists") => Ok(()),
            Err(e) => Err(RuntimeError::StartFailed(e)),
        }
    }
}

#[async_trait]
impl ProcessRuntime for DockerRuntime {
    async fn fetch(&self, downloads: &[Download], dest: &Path) -> Result<(), RuntimeError> {
        fetch_downloads(downloads, dest).await
    }

    async fn start(&self, config: InstanceConfig) -> Result<(), RuntimeError> {
        let name = self.container_name(&config.service);
        let _ = self.run_docker(&["rm", "-f", &name]).await;
        self.ensure_network(config.network.as_deref().unwrap_or(&self.network)).await?;

        let since = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        let args = self.run_args(&config);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let id = self.run_docker(&arg_refs).await.map_err(RuntimeError::StartFailed)?;
        self.started.lock().insert(config.service.clone(), since);
        tracing::info!(service = %config.service, container = %name, %id, "container started");
        Ok(())
    }

    async fn signal(&self, service: &str, signal: StopSignal) -> Result<(), RuntimeError> {
        let name = self.container_name(service);
        let signal = signal.to_string();
        self.run_docker(&["kill", "--signal", &signal, &name])
            .await
            .map(|_| ())
            .map_err(RuntimeError::CommandFailed)
    }

    async fn exec(&self, service: &str, command: &[String]) -> Result<ExecOutput, RuntimeError> {
        let output = tokio::process::Command::new(&self.bin)
            .arg("exec")
            .arg(self.container_name(service))
            .args(command)
            .output()
            .await?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(ExecOutput { code: output.status.code().unwrap_or(-1), output: text })
    }

    async fn logs(&self, service: &str, options: LogOptions) -> Result<LogStream, RuntimeError> {
        let mut child = tokio::process::Command::new(&self.bin)
            .args(self.logs_args(service, options))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (tx, rx) = mpsc::channel(LOG_BUFFER);
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx);
        }
        Ok(LogStream::with_follower(rx, child))
    }

    async fn is_running(&self, service: &str) -> Result<bool, RuntimeError> {
        let name = self.container_name(service);
        match self.run_docker(&["inspect", "-f", "{{.State.Running}}", &name]).await {
            Ok(state) => Ok(state == "true"),
            Err(e) if e.contains("No such") => Ok(false),
            Err(e) => Err(RuntimeError::CommandFailed(e)),
        }
    }

    async fn wait_exit(&self, service: &str, timeout: Duration) -> Result<bool, RuntimeError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if !self.is_running(service).await? {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    async fn remove(&self, service: &str) -> Result<(), RuntimeError> {
        let name = self.container_name(service);
        match self.run_docker(&["rm", "-f", &name]).await {
            Ok(_) => Ok(()),
            Err(e) if e.contains("No such") => Ok(()),
            Err(e) => Err(RuntimeError::CommandFailed(e)),
        }
    }

    fn internal_host(&self, service: &str) -> String {
        self.container_name(service)
    }

    fn probe_host(&self, _service: &str) -> String {
        "127.0.0.1".to_string()
    }
}

fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
