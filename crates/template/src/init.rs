// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fresh node directory generation.

use crate::builtin;
use crate::resolve::{TemplateError, TemplateSet};
use crate::snapshot::{resolve_snapshot, SnapshotError, SnapshotIndex};
use ns_core::{Environment, SpecError, UnknownEnvironment};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "nodestack.json";

#[derive(Debug, Error)]
pub enum InitError {
    #[error("no template for chain {0}")]
    UnknownChain(#[from] UnknownEnvironment),
    #[error("target directory already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Spec(#[from] SpecError),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> InitError + '_ {
    move |source| InitError::Io { path: path.to_path_buf(), source }
}

/// Lay out a node directory for `chain_name` under `target_dir`.
///
/// The environment is inferred from the chain name. Writes each service's
/// shipped files, creates bind-mount sources, resolves the snapshot and
/// writes the stack config as `config_name`. Returns the config path.
pub fn init_node_dir(
    chain_name: &str,
    config_name: &str,
    target_dir: &Path,
    templates: &TemplateSet,
    index: &dyn SnapshotIndex,
) -> Result<PathBuf, InitError> {
    let env = Environment::from_chain_name(chain_name)?;
    if target_dir.exists() {
        return Err(InitError::AlreadyExists(target_dir.to_path_buf()));
    }

    let mut stack = templates.resolve_env(env)?;
    resolve_snapshot(&mut stack, index)?;

    std::fs::create_dir_all(target_dir).map_err(io_err(target_dir))?;
    for service in &stack.stack {
        let service_dir = target_dir.join(service.service_dir());
        std::fs::create_dir_all(&service_dir).map_err(io_err(&service_dir))?;

        let dir_name = service.service_path.as_deref().unwrap_or(&service.name);
        for file in builtin::service_files(dir_name) {
            let path = service_dir.join(file.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(io_err(parent))?;
            }
            std::fs::write(&path, file.contents).map_err(io_err(&path))?;
        }

        // Directory mounts need their source to exist; file mounts are
        // produced by configure.
        for mount in &service.mounts {
            if Path::new(&mount.target).extension().is_none() {
                let source = target_dir.join(&mount.source);
                std::fs::create_dir_all(&source).map_err(io_err(&source))?;
            }
        }
    }
    std::fs::create_dir_all(target_dir.join("logs")).map_err(io_err(target_dir))?;

    let config_path = target_dir.join(config_name);
    std::fs::write(&config_path, stack.to_json_pretty()?).map_err(io_err(&config_path))?;
    tracing::info!(
        chain = chain_name,
        %env,
        path = %config_path.display(),
        "node directory initialized"
    );
    Ok(config_path)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
