// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use serde_json::json;

#[yare::parameterized(
    scalar_overrides   = { json!({"a": 1}),            json!({"a": 2}),             json!({"a": 2}) },
    new_key_appended   = { json!({"a": 1}),            json!({"b": 2}),             json!({"a": 1, "b": 2}) },
    nested_objects     = { json!({"p": {"x": 1}}),     json!({"p": {"y": 2}}),      json!({"p": {"x": 1, "y": 2}}) },
    arrays_concatenate = { json!({"l": [1, 2]}),       json!({"l": [2, 3]}),        json!({"l": [1, 2, 2, 3]}) },
    type_change_wins   = { json!({"s": {"x": 1}}),     json!({"s": "url"}),         json!({"s": "url"}) },
    null_overrides     = { json!({"s": 5}),            json!({"s": null}),          json!({"s": null}) },
)]
fn merge_rules(base: Value, overlay: Value, expected: Value) {
    let mut merged = base;
    deep_merge(&mut merged, overlay);
    assert_eq!(merged, expected);
}

#[test]
fn peers_are_additive() {
    let mut base = json!({"name": "leap", "ini": {"peers": ["p1"]}});
    deep_merge(&mut base, json!({"name": "leap", "ini": {"peers": ["p2"]}}));
    assert_eq!(base["ini"]["peers"], json!(["p1", "p2"]));
}

#[test]
fn key_order_keeps_base_first() {
    let mut base = json!({"b": 1, "a": 1});
    deep_merge(&mut base, json!({"c": 1, "a": 2}));
    let keys: Vec<_> = base.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["b", "a", "c"]);
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            proptest::collection::btree_map("[a-d]", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn merge_is_deterministic(base in tree(), overlay in tree()) {
        let mut first = base.clone();
        deep_merge(&mut first, overlay.clone());
        let mut second = base;
        deep_merge(&mut second, overlay);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn array_merge_preserves_both_sides(
        base in proptest::collection::vec(leaf(), 0..5),
        overlay in proptest::collection::vec(leaf(), 0..5),
    ) {
        let mut merged = Value::from(base.clone());
        deep_merge(&mut merged, Value::from(overlay.clone()));
        let mut expected = base;
        expected.extend(overlay);
        prop_assert_eq!(merged, Value::from(expected));
    }
}
