// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Abstract chain-state snapshot references.

use serde::{Deserialize, Serialize};

/// The `snapshot` field of a chain-node service.
///
/// An absent or `null` field means no snapshot; wrap in `Option` at use sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotSpec {
    /// Resolve to the closest published snapshot at or before this block.
    BlockNumber(u64),
    /// An `http(s)://` URL to fetch, or a path relative to the node's data directory.
    Resource(String),
}

impl SnapshotSpec {
    /// Scheme of a `Resource`, lowercased. `None` for block numbers and bare paths.
    pub fn scheme(&self) -> Option<String> {
        match self {
            SnapshotSpec::BlockNumber(_) => None,
            SnapshotSpec::Resource(r) => {
                r.split_once("://").map(|(scheme, _)| scheme.to_ascii_lowercase())
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.scheme().as_deref(), Some("http") | Some("https"))
    }
}
