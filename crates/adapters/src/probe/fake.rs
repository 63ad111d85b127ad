// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Probe, ProbeError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Recorded probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeCall {
    Get { url: String },
    Post { url: String, headers: Vec<(String, String)>, body: String },
    Redis { addr: String },
}

#[derive(Default)]
struct FakeProbeState {
    calls: Vec<ProbeCall>,
    responses: HashMap<String, VecDeque<Result<String, ProbeError>>>,
    redis: HashMap<String, bool>,
}

/// Fake probe for testing.
///
/// Responses are scripted per URL and consumed in order; the last one
/// repeats. Unscripted URLs fail to connect.
#[derive(Clone, Default)]
pub struct FakeProbe {
    inner: Arc<Mutex<FakeProbeState>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, body: &str) {
        self.push(url, Ok(body.to_string()));
    }

    pub fn fail(&self, url: &str, error: ProbeError) {
        self.push(url, Err(error));
    }

    fn push(&self, url: &str, response: Result<String, ProbeError>) {
        self.inner.lock().responses.entry(url.to_string()).or_default().push_back(response);
    }

    /// Drop every scripted response for `url`.
    pub fn clear(&self, url: &str) {
        self.inner.lock().responses.remove(url);
    }

    pub fn set_redis(&self, addr: &str, master: bool) {
        self.inner.lock().redis.insert(addr.to_string(), master);
    }

    /// Get all recorded probes
    pub fn calls(&self) -> Vec<ProbeCall> {
        self.inner.lock().calls.clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| match c {
                ProbeCall::Get { url: u } | ProbeCall::Post { url: u, .. } => u == url,
                ProbeCall::Redis { addr } => addr == url,
            })
            .count()
    }

    fn next(&self, url: &str) -> Result<String, ProbeError> {
        let mut inner = self.inner.lock();
        match inner.responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => {
                queue.pop_front().unwrap_or_else(|| Err(ProbeError::Connect(url.to_string())))
            }
            Some(queue) => {
                queue.front().cloned().unwrap_or_else(|| Err(ProbeError::Connect(url.to_string())))
            }
            None => Err(ProbeError::Connect(format!("no response scripted for {}", url))),
        }
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn get(&self, url: &str) -> Result<String, ProbeError> {
        self.inner.lock().calls.push(ProbeCall::Get { url: url.to_string() });
        self.next(url)
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &str,
    ) -> Result<String, ProbeError> {
        self.inner.lock().calls.push(ProbeCall::Post {
            url: url.to_string(),
            headers: headers.to_vec(),
            body: body.to_string(),
        });
        self.next(url)
    }

    async fn redis_master(&self, addr: &str) -> Result<bool, ProbeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProbeCall::Redis { addr: addr.to_string() });
        inner
            .redis
            .get(addr)
            .copied()
            .ok_or_else(|| ProbeError::Connect(format!("no redis scripted at {}", addr)))
    }
}
