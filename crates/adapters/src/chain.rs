// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chain node API client.

use crate::probe::{Probe, ProbeError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Subset of `/v1/chain/get_info` the stack relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    pub head_block_num: u64,
    #[serde(default)]
    pub last_irreversible_block_num: u64,
    #[serde(default)]
    pub server_version_string: Option<String>,
}

#[derive(Clone)]
pub struct ChainClient {
    probe: Arc<dyn Probe>,
}

impl ChainClient {
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        Self { probe }
    }

    pub async fn get_info(&self, endpoint: &str) -> Result<ChainInfo, ProbeError> {
        let url = format!("{}/v1/chain/get_info", endpoint.trim_end_matches('/'));
        let body = self.probe.get(&url).await?;
        serde_json::from_str(&body).map_err(|e| ProbeError::Protocol(format!("get_info: {}", e)))
    }
}
