// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn spec_from(value: serde_json::Value) -> ServiceSpec {
    serde_json::from_value(value).unwrap()
}

#[yare::parameterized(
    leap          = { "leap",          &[],              ServiceRole::ChainNode },
    nodeos_alias  = { "node",          &["nodeos"],      ServiceRole::ChainNode },
    translator    = { "translator",    &[],              ServiceRole::Indexer },
    indexer_alias = { "evm-indexer",   &["indexer"],     ServiceRole::Indexer },
    rpc           = { "rpc",           &[],              ServiceRole::Gateway },
    elasticsearch = { "elasticsearch", &["elastic"],     ServiceRole::Search },
    kibana        = { "kibana",        &[],              ServiceRole::Dashboard },
    redis         = { "redis",         &[],              ServiceRole::Cache },
    unknown       = { "grafana",       &["metrics"],     ServiceRole::Generic },
)]
fn detects_role_from_name_or_alias(name: &str, aliases: &[&str], expected: ServiceRole) {
    let mut spec = ServiceSpec::new(name);
    spec.aliases = aliases.iter().map(|a| a.to_string()).collect();
    assert_eq!(ServiceRole::of(&spec), expected);
}

#[test]
fn chain_node_defaults() {
    let spec = spec_from(json!({
        "name": "leap",
        "chain_id": "c4c5",
        "chain_type": "local",
        "ini": { "plugins": ["eosio::http_plugin"], "peers": [] }
    }));
    let config: ChainNodeConfig = spec.role_config().unwrap();

    assert_eq!(config.chain_type, Environment::Local);
    assert_eq!(config.nodeos_bin, "nodeos");
    assert_eq!(config.evm_contract, "eosio.evm/receiptless");
    assert!(config.space_monitor);
    assert!(config.initialize);
    assert!(!config.produce);
    assert!(config.snapshot.is_none());
    assert_eq!(config.ini.wasm_runtime, "eos-vm-jit");
    assert_eq!(config.ini.chain_state_size, 65536);
    assert!(config.ini.subst.is_none());
    assert_eq!(config.bootstrap.len(), 5);
    assert_eq!(config.bootstrap[0][0], "cleos");
}

#[test]
fn chain_node_resync_flag() {
    let spec = spec_from(json!({
        "name": "leap",
        "chain_id": "x",
        "chain_type": "testnet",
        "nodeos_params": ["--replay-blockchain"],
        "ini": {}
    }));
    let config: ChainNodeConfig = spec.role_config().unwrap();
    assert!(config.requests_resync());
}

#[test]
fn subst_accepts_manifest_or_table() {
    let manifest: Subst = serde_json::from_value(json!("http://evmwasms/subst.json")).unwrap();
    assert_eq!(manifest, Subst::Manifest("http://evmwasms/subst.json".into()));

    let table: Subst = serde_json::from_value(json!({ "eosio.evm": "contracts/a.wasm" })).unwrap();
    match table {
        Subst::ByName(map) => assert_eq!(map["eosio.evm"], "contracts/a.wasm"),
        other => panic!("expected table, got {:?}", other),
    }
}

#[test]
fn chain_node_requires_identity() {
    let spec = spec_from(json!({ "name": "leap", "ini": {} }));
    let err = spec.role_config::<ChainNodeConfig>().unwrap_err();
    assert!(err.to_string().contains("leap"), "{}", err);
}

#[test]
fn indexer_defaults() {
    let spec = spec_from(json!({
        "name": "translator",
        "chain_name": "telos-testnet",
        "chain_id": 41,
        "start_block": 136393814,
        "block_delta": 57
    }));
    let config: IndexerConfig = spec.role_config().unwrap();
    assert_eq!(config.end_block, -1);
    assert_eq!(config.perf, PerfConfig::default());
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.reader_log_level, "warning");
    assert_eq!(config.ws_host, "127.0.0.1");
}

#[test]
fn gateway_defaults() {
    let config: GatewayConfig = spec_from(json!({ "name": "rpc" })).role_config().unwrap();
    assert_eq!(config.signer_account, "rpc.evm");
    assert_eq!(config.signer_permission, "rpc");
    assert_eq!(config.contracts.get("main").map(String::as_str), Some("eosio.evm"));
    assert_eq!(config.index_version, "v1.5");
    assert!(config.nodeos_read.is_none());
}

#[test]
fn search_dashboard_cache_defaults() {
    let search: SearchConfig = spec_from(json!({ "name": "elasticsearch" })).role_config().unwrap();
    assert_eq!(search.protocol, "http");
    assert_eq!(search.cluster_name, "es-cluster");

    let dash: DashboardConfig = spec_from(json!({
        "name": "kibana",
        "patterns": [{ "title": "telos-*", "time_field_name": "@timestamp" }, { "title": "raw" }]
    }))
    .role_config()
    .unwrap();
    assert_eq!(dash.host, "127.0.0.1");
    assert_eq!(dash.patterns.len(), 2);
    assert_eq!(dash.patterns[1].time_field_name, None);

    let cache: CacheConfig = spec_from(json!({ "name": "redis" })).role_config().unwrap();
    assert_eq!(cache.host, "127.0.0.1");
}
