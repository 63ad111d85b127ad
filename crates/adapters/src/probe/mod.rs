// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network health probes
//!
//! Plain `http://` targets are spoken to directly over TCP with
//! Content-Length framing; `https://` targets go through ureq. Redis is
//! checked with a short RESP conversation.

mod http;
mod resp;

pub use http::{parse_http_url, HttpTarget};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProbe, ProbeCall};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Budget for a single probe: connect, write and read.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for the redis conversation.
pub const REDIS_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Adapter for health and API probes
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// GET `url` and return the body. Status codes of 400 and above are errors.
    async fn get(&self, url: &str) -> Result<String, ProbeError>;

    /// POST a JSON body with extra headers and return the response body.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &str,
    ) -> Result<String, ProbeError>;

    /// Whether the redis server at `addr` answers PING and reports itself as master.
    async fn redis_master(&self, addr: &str) -> Result<bool, ProbeError>;
}

/// Probe over real sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetProbe;

impl NetProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for NetProbe {
    async fn get(&self, url: &str) -> Result<String, ProbeError> {
        if url.starts_with("https://") {
            return https_request(url.to_string(), None).await;
        }
        let target = parse_http_url(url)?;
        let request = format!("GET {} HTTP/1.1\r\nHost: {}\r\n\r\n", target.path, target.host);
        http::timed_request(&target.addr(), &request).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &str,
    ) -> Result<String, ProbeError> {
        if url.starts_with("https://") {
            return https_request(url.to_string(), Some((headers.to_vec(), body.to_string()))).await;
        }
        let target = parse_http_url(url)?;
        let extra: String = headers.iter().map(|(k, v)| format!("{}: {}\r\n", k, v)).collect();
        let request = format!(
            "POST {} HTTP/1.1\r\nHost: {}\r\n{}Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            target.path,
            target.host,
            extra,
            body.len(),
            body
        );
        http::timed_request(&target.addr(), &request).await
    }

    async fn redis_master(&self, addr: &str) -> Result<bool, ProbeError> {
        resp::check_master(addr).await
    }
}

async fn https_request(
    url: String,
    post: Option<(Vec<(String, String)>, String)>,
) -> Result<String, ProbeError> {
    let task = tokio::task::spawn_blocking(move || {
        let agent = ureq::Agent::new_with_defaults();
        let response = match post {
            None => agent.get(&url).call(),
            Some((headers, body)) => {
                let mut request = agent.post(&url).content_type("application/json");
                for (key, value) in &headers {
                    request = request.header(key.as_str(), value.as_str());
                }
                request.send(body.as_str())
            }
        };
        match response {
            Ok(response) => response
                .into_body()
                .read_to_string()
                .map_err(|e| ProbeError::Protocol(e.to_string())),
            Err(ureq::Error::StatusCode(code)) => {
                Err(ProbeError::Status { code, body: String::new() })
            }
            Err(e) => Err(ProbeError::Connect(e.to_string())),
        }
    });
    tokio::time::timeout(PROBE_TIMEOUT, task)
        .await
        .map_err(|_| ProbeError::Timeout)?
        .map_err(|e| ProbeError::Protocol(format!("probe task failed: {}", e)))?
}
