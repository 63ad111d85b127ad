// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Published snapshot listing served over HTTP.
//!
//! The index serves one JSON array per network at `<base>/<network>.json`,
//! each entry `{"block_num": .., "url": ..}`.

use ns_template::{SnapshotEntry, SnapshotError, SnapshotIndex};

#[derive(Debug, Clone)]
pub struct HttpSnapshotIndex {
    base_url: String,
}

impl HttpSnapshotIndex {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn from_env() -> Self {
        Self::new(crate::env::snapshot_index_url())
    }

    pub fn network_url(&self, network: &str) -> String {
        format!("{}/{}.json", self.base_url.trim_end_matches('/'), network)
    }
}

impl SnapshotIndex for HttpSnapshotIndex {
    /// Blocking; call from a blocking context.
    fn list(&self, network: &str) -> Result<Vec<SnapshotEntry>, SnapshotError> {
        let url = self.network_url(network);
        tracing::debug!(%url, "listing snapshots");
        let agent = ureq::Agent::new_with_defaults();
        let response =
            agent.get(&url).call().map_err(|e| SnapshotError::Index(format!("{}: {}", url, e)))?;
        response
            .into_body()
            .read_json::<Vec<SnapshotEntry>>()
            .map_err(|e| SnapshotError::Index(format!("{}: {}", url, e)))
    }
}
