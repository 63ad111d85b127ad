// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config file rendering via `${var}` interpolation

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Regex pattern for ${variable_name}
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
pub static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_.]*)\}").expect("constant regex pattern is valid")
});

/// Interpolate `${name}` placeholders with values from the vars map.
///
/// Unknown variables are left as-is.
pub fn interpolate(template: &str, vars: &IndexMap<String, String>) -> String {
    VAR_PATTERN
        .replace_all(template, |caps: &regex::Captures| match vars.get(&caps[1]) {
            Some(val) => val.clone(),
            None => caps[0].to_string(),
        })
        .to_string()
}

/// Text form of a JSON value as it appears in config files.
///
/// Strings are unquoted, booleans lowercase, null empty, and compound values
/// compact JSON.
pub fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Flatten a JSON object into `prefix_key` variables, recursing into nested
/// objects (`prefix_outer_inner`). Arrays are kept as compact JSON.
pub fn flatten(prefix: &str, value: &Value) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    flatten_into(prefix, value, &mut out);
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut IndexMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let name = if prefix.is_empty() { key.clone() } else { format!("{prefix}_{key}") };
                flatten_into(&name, inner, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), scalar_string(other));
        }
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
