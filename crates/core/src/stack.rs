// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete stack specification.
//!
//! Field order of [`StackSpec`] and [`ServiceSpec`] is the canonical order of
//! the generated artifact: serde emits struct fields in declaration order and
//! the flattened `extra` map last, in insertion order.

use crate::signal::StopSignal;
use crate::snapshot::SnapshotSpec;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Extra field holding pending downloads (`[{url, rename}]`) for the process runtime.
pub const DOWNLOADS_FIELD: &str = "www_files";

/// Errors from inspecting or converting a stack specification.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("duplicate service name: {0}")]
    DuplicateService(String),
    #[error("invalid stack specification: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("invalid field {field} on service {service}: {message}")]
    InvalidField { service: String, field: String, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Service roles exposed outside the stack.
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Value>,
    #[serde(default)]
    pub stack: Vec<ServiceSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub ports: IndexMap<String, u16>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sym_links: Vec<SymLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_logs_kwargs: Option<StartupLogsKwargs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequence: Vec<StopSignal>,
    /// Role-specific and unrecognized fields, in their original order.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Named volume binding. `source` is relative to the node root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub name: String,
    pub source: String,
    pub target: String,
    #[serde(default = "default_mount_type")]
    pub mtype: String,
}

fn default_mount_type() -> String {
    "bind".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymLink {
    pub source: String,
    pub target: String,
}

/// How the startup log stream is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupLogsKwargs {
    /// Lines to scan before giving up; 0 scans until the timeout.
    #[serde(default)]
    pub lines: usize,
    /// Tail from the current end of the log instead of its beginning.
    #[serde(default = "default_from_latest")]
    pub from_latest: bool,
    /// Wall-clock budget in seconds.
    #[serde(default = "default_startup_timeout")]
    pub timeout: u64,
}

fn default_from_latest() -> bool {
    true
}

fn default_startup_timeout() -> u64 {
    60
}

impl Default for StartupLogsKwargs {
    fn default() -> Self {
        Self { lines: 0, from_latest: default_from_latest(), timeout: default_startup_timeout() }
    }
}

/// Fetch job for the process runtime: download `url` and store it as `rename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub url: String,
    pub rename: String,
}

impl StackSpec {
    /// Build from an arbitrary JSON value, normalizing field order.
    pub fn from_value(value: Value) -> Result<Self, SpecError> {
        let spec: StackSpec = serde_json::from_value(value)?;
        spec.check_unique_names()?;
        Ok(spec)
    }

    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn to_value(&self) -> Result<Value, SpecError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Canonical artifact text: pretty JSON with four-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, SpecError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn check_unique_names(&self) -> Result<(), SpecError> {
        let mut seen = HashSet::new();
        for service in &self.stack {
            if !seen.insert(service.name.as_str()) {
                return Err(SpecError::DuplicateService(service.name.clone()));
            }
        }
        Ok(())
    }

    /// Look a service up by name first, then by alias.
    pub fn service(&self, key: &str) -> Option<&ServiceSpec> {
        self.position(key).map(|i| &self.stack[i])
    }

    pub fn service_mut(&mut self, key: &str) -> Option<&mut ServiceSpec> {
        self.position(key).map(move |i| &mut self.stack[i])
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.stack
            .iter()
            .position(|s| s.name == key)
            .or_else(|| self.stack.iter().position(|s| s.aliases.iter().any(|a| a == key)))
    }
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.aliases.iter().any(|a| a == key)
    }

    /// Directory (relative to the node root) holding this service's files.
    pub fn service_dir(&self) -> String {
        format!("services/{}", self.service_path.as_deref().unwrap_or(&self.name))
    }

    pub fn mount(&self, name: &str) -> Option<&Mount> {
        self.mounts.iter().find(|m| m.name == name)
    }

    pub fn startup_kwargs(&self) -> StartupLogsKwargs {
        self.startup_logs_kwargs.unwrap_or_default()
    }

    pub fn stop_signals(&self) -> Vec<StopSignal> {
        if self.stop_sequence.is_empty() {
            StopSignal::default_sequence()
        } else {
            self.stop_sequence.clone()
        }
    }

    /// Deserialize the role-specific view of this service from its extra fields.
    pub fn role_config<T: DeserializeOwned>(&self) -> Result<T, SpecError> {
        let object = Value::Object(self.extra.clone().into_iter().collect());
        serde_json::from_value(object).map_err(|e| SpecError::InvalidField {
            service: self.name.clone(),
            field: "<role config>".to_string(),
            message: e.to_string(),
        })
    }

    pub fn extra_field<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, SpecError> {
        match self.extra.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v.clone()).map(Some).map_err(|e| {
                SpecError::InvalidField {
                    service: self.name.clone(),
                    field: field.to_string(),
                    message: e.to_string(),
                }
            }),
        }
    }

    pub fn snapshot(&self) -> Result<Option<SnapshotSpec>, SpecError> {
        self.extra_field("snapshot")
    }

    pub fn set_snapshot(&mut self, snapshot: SnapshotSpec) {
        let value = match snapshot {
            SnapshotSpec::BlockNumber(n) => Value::from(n),
            SnapshotSpec::Resource(r) => Value::from(r),
        };
        self.extra.insert("snapshot".to_string(), value);
    }

    pub fn downloads(&self) -> Result<Vec<Download>, SpecError> {
        Ok(self.extra_field(DOWNLOADS_FIELD)?.unwrap_or_default())
    }

    /// Register a fetch job. Identical jobs are recorded once.
    pub fn add_download(&mut self, download: Download) -> Result<(), SpecError> {
        let mut downloads = self.downloads()?;
        if !downloads.contains(&download) {
            downloads.push(download);
        }
        let value = serde_json::to_value(downloads)?;
        self.extra.insert(DOWNLOADS_FIELD.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
#[path = "stack_tests.rs"]
mod tests;
