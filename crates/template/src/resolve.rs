// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Base + overlay template resolution.

use crate::builtin;
use crate::merge::deep_merge;
use indexmap::IndexMap;
use ns_core::{Environment, SpecError, StackSpec};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),
    #[error("malformed template {template}: {message}")]
    Malformed { template: String, message: String },
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// A base template plus the environment overlays registered against it.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    base: Value,
    overlays: IndexMap<String, Value>,
}

impl TemplateSet {
    pub fn new(base: Value) -> Self {
        Self { base, overlays: IndexMap::new() }
    }

    /// The templates shipped with nodestack: local, testnet and mainnet.
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut set = Self::new(parse("base", builtin::BASE)?);
        for env in Environment::ALL {
            set = set.with_environment(env.as_str(), parse(env.as_str(), builtin::overlay(env))?);
        }
        Ok(set)
    }

    pub fn with_environment(mut self, name: impl Into<String>, overlay: Value) -> Self {
        self.overlays.insert(name.into(), overlay);
        self
    }

    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.overlays.keys().map(String::as_str)
    }

    pub fn resolve_env(&self, env: Environment) -> Result<StackSpec, TemplateError> {
        self.resolve(env.as_str())
    }

    /// Merge the named overlay onto the base template.
    ///
    /// Top-level overlay fields replace base fields. Services are matched by
    /// name and deep merged; overlay-only services are appended.
    pub fn resolve(&self, environment: &str) -> Result<StackSpec, TemplateError> {
        let overlay = self
            .overlays
            .get(environment)
            .ok_or_else(|| TemplateError::UnknownEnvironment(environment.to_string()))?;

        let mut result = as_object(&self.base, "base")?.clone();
        let overlay = as_object(overlay, environment)?;

        for (key, value) in overlay {
            if key != "stack" {
                result.insert(key.clone(), value.clone());
            }
        }

        let mut pending: IndexMap<String, Value> = IndexMap::new();
        for service in service_list(overlay, environment)? {
            pending.insert(service_name(service, environment)?.to_string(), service.clone());
        }

        let mut merged = Vec::new();
        for service in service_list(&result, "base")? {
            let name = service_name(service, "base")?.to_string();
            let mut service = service.clone();
            if let Some(layer) = pending.shift_remove(&name) {
                deep_merge(&mut service, layer);
            }
            merged.push(service);
        }
        merged.extend(pending.into_values());
        result.insert("stack".to_string(), Value::Array(merged));

        tracing::debug!(environment, "resolved stack template");
        Ok(StackSpec::from_value(Value::Object(result))?)
    }
}

fn parse(name: &str, text: &str) -> Result<Value, TemplateError> {
    serde_json::from_str(text).map_err(|e| TemplateError::Malformed {
        template: name.to_string(),
        message: e.to_string(),
    })
}

fn as_object<'a>(
    value: &'a Value,
    template: &str,
) -> Result<&'a Map<String, Value>, TemplateError> {
    value.as_object().ok_or_else(|| TemplateError::Malformed {
        template: template.to_string(),
        message: "expected a JSON object".to_string(),
    })
}

fn service_list<'a>(
    object: &'a Map<String, Value>,
    template: &str,
) -> Result<&'a [Value], TemplateError> {
    match object.get("stack") {
        None => Ok(&[]),
        Some(Value::Array(list)) => Ok(list),
        Some(_) => Err(TemplateError::Malformed {
            template: template.to_string(),
            message: "`stack` must be an array".to_string(),
        }),
    }
}

fn service_name<'a>(service: &'a Value, template: &str) -> Result<&'a str, TemplateError> {
    service.get("name").and_then(Value::as_str).ok_or_else(|| TemplateError::Malformed {
        template: template.to_string(),
        message: "service entry without a `name`".to_string(),
    })
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
