// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recursive JSON merge used to layer an overlay onto a base template.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
///
/// - object + object: merged key by key, recursing into shared keys; keys
///   new to `base` are appended in overlay order
/// - array + array: concatenated base-then-overlay, without de-duplication
/// - anything else: the overlay value replaces the base value
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base_list), Value::Array(overlay_list)) => {
            base_list.extend(overlay_list);
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
