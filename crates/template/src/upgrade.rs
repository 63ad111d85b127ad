// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Additive upgrade of a persisted stack config against its canonical template.
//!
//! Keys present in the template but missing from the live config are added,
//! recursing into objects. Live values are never overwritten and arrays are
//! never touched, except the top-level service list, whose entries are
//! matched by name (template services missing from the live config are
//! appended).

use ns_core::{Environment, ServiceRole, StackSpec};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct UpgradePlan {
    pub patched: Value,
    /// One line per added key, `+ <path>: <value>`.
    pub diffs: Vec<String>,
}

impl UpgradePlan {
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }
}

/// Environment a persisted config was generated for: the chain node's
/// `chain_type`, falling back to the stack name.
pub fn environment_of(stack: &StackSpec) -> Option<Environment> {
    let from_node = stack
        .stack
        .iter()
        .find(|s| ServiceRole::of(s) == ServiceRole::ChainNode)
        .and_then(|s| s.extra_field::<Environment>("chain_type").ok().flatten());
    from_node.or_else(|| stack.name.as_deref().and_then(|n| Environment::from_chain_name(n).ok()))
}

pub fn plan_upgrade(canonical: &Value, live: &Value) -> UpgradePlan {
    let mut patched = live.clone();
    let mut diffs = Vec::new();
    if let (Some(template), Some(target)) = (canonical.as_object(), patched.as_object_mut()) {
        patch_stack(template, target, &mut diffs);
    }
    UpgradePlan { patched, diffs }
}

fn patch_stack(
    template: &Map<String, Value>,
    live: &mut Map<String, Value>,
    diffs: &mut Vec<String>,
) {
    for (key, value) in template {
        if key != "stack" {
            patch_field(key, value, live, key, diffs);
            continue;
        }
        let Some(services) = value.as_array() else { continue };
        let live_services = live.entry("stack").or_insert_with(|| Value::Array(Vec::new()));
        let Some(live_services) = live_services.as_array_mut() else { continue };

        for service in services {
            let Some(name) = service.get("name").and_then(Value::as_str) else { continue };
            let existing = live_services
                .iter_mut()
                .find(|s| s.get("name").and_then(Value::as_str) == Some(name));
            match existing {
                Some(Value::Object(live_service)) => {
                    if let Some(template_service) = service.as_object() {
                        let path = format!("stack[{name}]");
                        patch_object(template_service, live_service, &path, diffs);
                    }
                }
                Some(_) => {}
                None => {
                    diffs.push(format!("+ stack[{name}]: {service}"));
                    live_services.push(service.clone());
                }
            }
        }
    }
}

fn patch_object(
    template: &Map<String, Value>,
    live: &mut Map<String, Value>,
    path: &str,
    diffs: &mut Vec<String>,
) {
    for (key, value) in template {
        let child = format!("{path}.{key}");
        patch_field(key, value, live, &child, diffs);
    }
}

fn patch_field(
    key: &str,
    value: &Value,
    live: &mut Map<String, Value>,
    path: &str,
    diffs: &mut Vec<String>,
) {
    match live.get_mut(key) {
        None => {
            diffs.push(format!("+ {path}: {value}"));
            live.insert(key.to_string(), value.clone());
        }
        Some(Value::Object(live_inner)) => {
            if let Value::Object(template_inner) = value {
                patch_object(template_inner, live_inner, path, diffs);
            }
        }
        Some(_) => {}
    }
}

#[cfg(test)]
#[path = "upgrade_tests.rs"]
mod tests;
