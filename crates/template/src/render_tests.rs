// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[yare::parameterized(
    simple       = { "port ${p2p_addr}",          &[("p2p_addr", "0.0.0.0:9876")], "port 0.0.0.0:9876" },
    multiple     = { "${a}:${b}/${a}",            &[("a", "h"), ("b", "1")],       "h:1/h" },
    unknown      = { "key = ${unknown}",          &[],                              "key = ${unknown}" },
    no_vars      = { "plain text",                &[],                              "plain text" },
    empty_braces = { "${}",                       &[],                              "${}" },
    dotted       = { "${eosio.evm}",              &[("eosio.evm", "x")],            "x" },
)]
fn interpolate_cases(template: &str, pairs: &[(&str, &str)], expected: &str) {
    assert_eq!(interpolate(template, &vars(pairs)), expected);
}

#[yare::parameterized(
    string  = { json!("abc"),     "abc" },
    boolean = { json!(true),      "true" },
    number  = { json!(65536),     "65536" },
    null    = { json!(null),      "" },
    list    = { json!(["a", 1]),  r#"["a",1]"# },
)]
fn scalar_strings(value: Value, expected: &str) {
    assert_eq!(scalar_string(&value), expected);
}

#[test]
fn flatten_nested_objects() {
    let flat = flatten(
        "translator",
        &json!({
            "chain_id": 41,
            "perf": { "stall_counter": 5, "reader_workers": 4 },
            "irreversible_only": false
        }),
    );
    assert_eq!(
        flat,
        vars(&[
            ("translator_chain_id", "41"),
            ("translator_perf_stall_counter", "5"),
            ("translator_perf_reader_workers", "4"),
            ("translator_irreversible_only", "false"),
        ])
    );
}

#[test]
fn flatten_without_prefix() {
    let flat = flatten("", &json!({ "agent_name": "node", "vm_oc_enable": true }));
    assert_eq!(flat, vars(&[("agent_name", "node"), ("vm_oc_enable", "true")]));
}

#[test]
fn renders_builtin_leap_config() {
    let template = crate::builtin::service_files("leap")
        .find(|f| f.path == "templates/config.ini")
        .unwrap()
        .contents;
    let rendered = interpolate(
        template,
        &vars(&[("http_addr", "0.0.0.0:8888"), ("wasm_runtime", "eos-vm-jit")]),
    );
    assert!(rendered.contains("http-server-address = 0.0.0.0:8888"));
    assert!(rendered.contains("wasm-runtime = eos-vm-jit"));
}
