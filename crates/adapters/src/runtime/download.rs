// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::RuntimeError;
use ns_core::Download;
use std::path::{Path, PathBuf};

/// Fetch each download into `dest/<rename>`, skipping targets that already exist.
///
/// Bodies are streamed to a `.part` file first so an interrupted fetch is
/// retried on the next start.
pub async fn fetch_downloads(downloads: &[Download], dest: &Path) -> Result<(), RuntimeError> {
    for download in downloads {
        let target = dest.join(&download.rename);
        if target.exists() {
            tracing::debug!(file = %target.display(), "download already present");
            continue;
        }
        tracing::info!(url = %download.url, file = %target.display(), "fetching");
        let url = download.url.clone();
        let path = target.clone();
        tokio::task::spawn_blocking(move || fetch_one(&url, &path))
            .await
            .map_err(|e| RuntimeError::DownloadFailed(format!("fetch task failed: {}", e)))??;
    }
    Ok(())
}

fn fetch_one(url: &str, target: &Path) -> Result<(), RuntimeError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let partial = part_path(target);
    let agent = ureq::Agent::new_with_defaults();
    let response = agent
        .get(url)
        .call()
        .map_err(|e| RuntimeError::DownloadFailed(format!("{}: {}", url, e)))?;
    let mut reader = response.into_body().into_reader();
    let mut file = std::fs::File::create(&partial)?;
    std::io::copy(&mut reader, &mut file)?;
    std::fs::rename(&partial, target)?;
    Ok(())
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_file_sits_next_to_target() {
        let path = part_path(Path::new("/node/services/leap/snapshot-a.bin"));
        assert_eq!(path, PathBuf::from("/node/services/leap/snapshot-a.bin.part"));
    }

    #[tokio::test]
    async fn existing_targets_are_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("snap.bin"), b"cached").unwrap();
        let downloads = vec![Download {
            url: "http://127.0.0.1:1/unreachable".into(),
            rename: "snap.bin".into(),
        }];
        fetch_downloads(&downloads, dir.path()).await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("snap.bin")).unwrap(), b"cached");
    }
}
