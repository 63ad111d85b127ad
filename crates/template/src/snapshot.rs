// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot reference resolution for the chain-node service.
//!
//! Resolution rewrites nothing the operator wrote; it only registers download
//! jobs so the process runtime can fetch the snapshot before start, and
//! verifies that exactly one snapshot file can be derived afterwards.

use ns_core::{
    Download, Environment, ServiceRole, ServiceSpec, SnapshotSpec, SpecError, StackSpec,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("stack has no chain-node service")]
    MissingChainNode,
    #[error("chain-node service {0} has no chain_type")]
    MissingChainType(String),
    #[error("unsupported snapshot resource: {0}")]
    Unsupported(String),
    #[error("ambiguous snapshot, candidates: {0:?}")]
    Ambiguous(Vec<String>),
    #[error("no {network} snapshot at or before block {block}")]
    NotFound { network: String, block: u64 },
    #[error("no snapshot download registered, downloads: {0:?}")]
    NoCandidate(Vec<String>),
    #[error("snapshot index unavailable: {0}")]
    Index(String),
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// One published snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub block_num: u64,
    pub url: String,
}

/// Source of published snapshots per network.
pub trait SnapshotIndex: Send + Sync {
    fn list(&self, network: &str) -> Result<Vec<SnapshotEntry>, SnapshotError>;
}

/// Closest published snapshot at or before `block`.
pub fn closest_snapshot(
    index: &dyn SnapshotIndex,
    network: &str,
    block: u64,
) -> Result<SnapshotEntry, SnapshotError> {
    index
        .list(network)?
        .into_iter()
        .filter(|entry| entry.block_num <= block)
        .max_by_key(|entry| entry.block_num)
        .ok_or_else(|| SnapshotError::NotFound { network: network.to_string(), block })
}

/// Resolve the snapshot of the stack's chain-node service in place.
///
/// No-op when no snapshot is configured.
pub fn resolve_snapshot(
    stack: &mut StackSpec,
    index: &dyn SnapshotIndex,
) -> Result<(), SnapshotError> {
    let node = stack
        .stack
        .iter_mut()
        .find(|s| ServiceRole::of(s) == ServiceRole::ChainNode)
        .ok_or(SnapshotError::MissingChainNode)?;

    let Some(snapshot) = node.snapshot()? else {
        return Ok(());
    };
    let network: Environment = node
        .extra_field("chain_type")?
        .ok_or_else(|| SnapshotError::MissingChainType(node.name.clone()))?;

    match &snapshot {
        SnapshotSpec::BlockNumber(block) => {
            tracing::info!(%network, block, "finding closest snapshot");
            let entry = closest_snapshot(index, network.as_str(), *block)?;
            let rename = format!("snapshot-{}-{}.bin", network, entry.block_num);
            node.add_download(Download { url: entry.url, rename })?;
        }
        SnapshotSpec::Resource(resource) => match snapshot.scheme().as_deref() {
            Some("http") | Some("https") => {
                node.add_download(Download {
                    url: resource.clone(),
                    rename: url_snapshot_id(resource),
                })?;
            }
            None => {}
            Some(_) => return Err(SnapshotError::Unsupported(resource.clone())),
        },
    }

    let file = snapshot_file(node)?;
    tracing::info!(service = %node.name, ?file, "snapshot resolved");
    Ok(())
}

/// `snapshot-` + the URL's file name up to its first dot + `.bin`.
fn url_snapshot_id(url: &str) -> String {
    let path = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = file.split('.').next().unwrap_or(file);
    format!("snapshot-{}.bin", stem)
}

/// Snapshot file the chain node will load, relative to its config directory.
///
/// Downloaded snapshots are found among the registered downloads whose
/// target name contains `snap` and ends in `.bin`; exactly one must match.
/// Local paths are returned untouched.
pub fn snapshot_file(node: &ServiceSpec) -> Result<Option<String>, SnapshotError> {
    let Some(snapshot) = node.snapshot()? else {
        return Ok(None);
    };
    if let SnapshotSpec::Resource(path) = &snapshot {
        match snapshot.scheme().as_deref() {
            None => return Ok(Some(path.clone())),
            Some("http") | Some("https") => {}
            Some(_) => return Err(SnapshotError::Unsupported(path.clone())),
        }
    }

    let names: Vec<String> = node.downloads()?.into_iter().map(|d| d.rename).collect();
    let matches: Vec<&String> =
        names.iter().filter(|n| n.contains("snap") && n.ends_with(".bin")).collect();
    match matches.as_slice() {
        [single] => Ok(Some((*single).clone())),
        [] => Err(SnapshotError::NoCandidate(names.clone())),
        _ => Err(SnapshotError::Ambiguous(matches.into_iter().cloned().collect())),
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{SnapshotEntry, SnapshotError, SnapshotIndex};
    use std::collections::HashMap;

    /// In-memory snapshot index.
    #[derive(Debug, Clone, Default)]
    pub struct StaticSnapshotIndex {
        entries: HashMap<String, Vec<SnapshotEntry>>,
    }

    impl StaticSnapshotIndex {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, network: &str, block_num: u64, url: &str) -> Self {
            self.entries
                .entry(network.to_string())
                .or_default()
                .push(SnapshotEntry { block_num, url: url.to_string() });
            self
        }
    }

    impl SnapshotIndex for StaticSnapshotIndex {
        fn list(&self, network: &str) -> Result<Vec<SnapshotEntry>, SnapshotError> {
            Ok(self.entries.get(network).cloned().unwrap_or_default())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::StaticSnapshotIndex;

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
