// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::dashboard::{index_pattern_body, DashboardHooks};
use super::*;
use crate::test_helpers::TestContext;
use crate::ServiceLifecycle;
use ns_adapters::ProbeCall;
use ns_core::{IndexPattern, ServiceSpec};
use serde_json::json;

#[test]
fn role_is_detected_per_service() {
    let ctx = TestContext::local();
    let roles: Vec<(String, ServiceRole)> = ctx
        .stack
        .stack
        .iter()
        .map(|s| (s.name.clone(), ServiceLifecycle::new(s.clone()).role()))
        .collect();
    for (name, role) in roles {
        let expected = match name.as_str() {
            "leap" => ServiceRole::ChainNode,
            "translator" => ServiceRole::Indexer,
            "rpc" => ServiceRole::Gateway,
            "elasticsearch" => ServiceRole::Search,
            "kibana" => ServiceRole::Dashboard,
            "redis" => ServiceRole::Cache,
            _ => ServiceRole::Generic,
        };
        assert_eq!(role, expected, "{name}");
    }
}

#[test]
fn default_readiness_follows_handlers() {
    let ctx = TestContext::local();
    let spec = ctx.spec("redis");
    let hook = HookCtx { spec: &spec, env: ctx.env() };
    let hooks = hooks_for(ServiceRole::Generic);

    assert_eq!(hooks.readiness(&hook, &[]), Readiness::Probe);
    assert_eq!(hooks.readiness(&hook, &[PhraseHandler::ready("up")]), Readiness::Logs);
    assert_eq!(hooks_for(ServiceRole::ChainNode).readiness(&hook, &[]), Readiness::Custom);
    assert!(hooks.chain_state().is_none());
}

#[test]
fn index_pattern_body_omits_missing_time_field() {
    let plain = IndexPattern { title: "telos-local-action-*".into(), time_field_name: None };
    let timed = IndexPattern {
        title: "telos-local-delta-*".into(),
        time_field_name: Some("@timestamp".into()),
    };

    let plain: Value = serde_json::from_str(&index_pattern_body(&plain)).unwrap();
    assert_eq!(plain, json!({ "index_pattern": { "title": "telos-local-action-*" } }));

    let timed: Value = serde_json::from_str(&index_pattern_body(&timed)).unwrap();
    assert_eq!(
        timed,
        json!({
            "index_pattern": { "title": "telos-local-delta-*", "timeFieldName": "@timestamp" }
        })
    );
}

#[test]
fn indexer_config_waits_for_its_peers() {
    let mut ctx = TestContext::local();
    let mut translator = ServiceLifecycle::new(ctx.spec("translator"));

    let err = translator.configure(ctx.env()).unwrap_err();
    assert_eq!(err.kind(), "dependency-order");

    ctx.mark_ready(&["leap"]);
    let err = translator.configure(ctx.env()).unwrap_err();
    assert!(err.to_string().contains("elastic"), "{err}");
}

#[test]
fn indexer_config_points_at_node_and_search() {
    let mut ctx = TestContext::local();
    ctx.mark_ready(&["leap", "elasticsearch"]);
    let mut translator = ServiceLifecycle::new(ctx.spec("translator"));

    translator.configure(ctx.env()).unwrap();

    let text = ctx.service_file("translator", "config.json");
    assert!(!text.contains("${"), "unrendered placeholder in:\n{text}");
    let config: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(config["chainName"], "telos-local");
    assert_eq!(config["chainId"], 41);
    assert_eq!(config["startBlock"], 2);
    assert_eq!(config["endpoint"], "http://leap:8888");
    assert_eq!(config["remoteEndpoint"], "http://leap:8888");
    assert_eq!(config["wsEndpoint"], "ws://leap:29999");
    assert_eq!(config["elastic"]["node"], "http://elasticsearch:9200");
    assert_eq!(config["broadcast"]["wsPort"], 7300);
}

#[test]
fn gateway_config_uses_indexer_broadcast() {
    let mut ctx = TestContext::local();
    ctx.mark_ready(&["leap", "elasticsearch", "translator", "redis"]);
    let mut rpc = ServiceLifecycle::new(ctx.spec("rpc"));

    rpc.configure(ctx.env()).unwrap();

    let text = ctx.service_file("rpc", "config.json");
    assert!(!text.contains("${"), "unrendered placeholder in:\n{text}");
    let config: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(config["chainId"], 41);
    assert_eq!(config["indexer_websocket_host"], "translator");
    assert_eq!(config["indexer_websocket_port"], 7300);
    assert_eq!(config["indexer_websocket_uri"], "ws://translator:7300/evm");
    assert_eq!(config["nodeos_read"], "http://leap:8888");
    assert_eq!(config["nodeos_write"], "http://leap:8888");
    assert_eq!(config["redisHost"], "redis");
    assert_eq!(config["redisPort"], 6379);
    assert_eq!(config["elasticIndexPrefix"], "telos-local");
    assert_eq!(
        config["nodeosChainId"],
        "c4c5fcc7b6e5e7484eb6b609e755050ebba977c4c291a63aab42d94c0fb8c2cf"
    );
}

#[test]
fn gateway_node_endpoints_can_be_overridden() {
    let mut ctx = TestContext::local();
    ctx.mark_ready(&["leap", "elasticsearch", "translator", "redis"]);
    ctx.spec_mut("rpc").extra.insert("nodeos_read".into(), json!("https://mainnet.telos.net"));
    let mut rpc = ServiceLifecycle::new(ctx.spec("rpc"));

    rpc.configure(ctx.env()).unwrap();

    let config: Value = serde_json::from_str(&ctx.service_file("rpc", "config.json")).unwrap();
    assert_eq!(config["nodeos_read"], "https://mainnet.telos.net");
    assert_eq!(config["nodeos_write"], "http://leap:8888");
}

#[tokio::test]
async fn search_status_queries_cluster_health() {
    let ctx = TestContext::local();
    let search = ServiceLifecycle::new(ctx.spec("elasticsearch"));
    let url = "http://127.0.0.1:9200/_cluster/health";

    assert_eq!(search.status(ctx.env()).await, HealthStatus::Unhealthy);
    ctx.probe.respond(url, r#"{"status":"green"}"#);
    assert_eq!(search.status(ctx.env()).await, HealthStatus::Healthy);
    assert_eq!(ctx.probe.count(url), 2);
}

#[tokio::test]
async fn cache_status_requires_master_role() {
    let ctx = TestContext::local();
    let redis = ServiceLifecycle::new(ctx.spec("redis"));

    assert_eq!(redis.status(ctx.env()).await, HealthStatus::Unhealthy);
    ctx.probe.set_redis("127.0.0.1:6379", false);
    assert_eq!(redis.status(ctx.env()).await, HealthStatus::Unhealthy);
    ctx.probe.set_redis("127.0.0.1:6379", true);
    assert_eq!(redis.status(ctx.env()).await, HealthStatus::Healthy);
}

#[tokio::test]
async fn gateway_reports_healthy() {
    let ctx = TestContext::local();
    let rpc = ServiceLifecycle::new(ctx.spec("rpc"));
    assert_eq!(rpc.status(ctx.env()).await, HealthStatus::Healthy);
}

#[tokio::test]
async fn indexer_status_watches_for_drain() {
    let ctx = TestContext::local();
    let translator = ServiceLifecycle::new(ctx.spec("translator"));
    ctx.runtime.script_logs("translator", &["block 120 pushed", "drained 12 blocks"]);

    assert_eq!(translator.status(ctx.env()).await, HealthStatus::Healthy);
}

#[tokio::test(start_paused = true)]
async fn stalled_indexer_is_unhealthy() {
    let ctx = TestContext::local();
    let translator = ServiceLifecycle::new(ctx.spec("translator"));
    ctx.runtime.script_logs("translator", &["block 120 pushed"]);

    assert_eq!(translator.status(ctx.env()).await, HealthStatus::Unhealthy);
}

#[test]
fn dashboard_points_at_search_node() {
    let ctx = TestContext::local();
    let mut kibana = ServiceLifecycle::new(ctx.spec("kibana"));

    let invocation = kibana.prepare(ctx.env()).unwrap();
    assert_eq!(
        invocation.env.get("ELASTICSEARCH_HOSTS").map(String::as_str),
        Some("http://elasticsearch:9200")
    );
}

fn with_patterns(ctx: &mut TestContext) -> ServiceSpec {
    ctx.spec_mut("kibana").extra.insert(
        "patterns".into(),
        json!([{ "title": "telos-local-action-*", "time_field_name": "@timestamp" }]),
    );
    ctx.spec("kibana")
}

#[tokio::test]
async fn dashboard_registers_index_patterns() {
    let mut ctx = TestContext::local();
    let spec = with_patterns(&mut ctx);
    let url = "http://127.0.0.1:5601/api/index_patterns/index_pattern";
    ctx.probe.respond(url, "{}");

    let hook = HookCtx { spec: &spec, env: ctx.env() };
    DashboardHooks.on_ready(&hook).await.unwrap();

    let posts: Vec<ProbeCall> = ctx
        .probe
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ProbeCall::Post { .. }))
        .collect();
    assert_eq!(
        posts,
        vec![ProbeCall::Post {
            url: url.to_string(),
            headers: vec![("kbn-xsrf".to_string(), "true".to_string())],
            body: index_pattern_body(&IndexPattern {
                title: "telos-local-action-*".into(),
                time_field_name: Some("@timestamp".into()),
            }),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn dashboard_registration_gives_up_after_startup_budget() {
    let mut ctx = TestContext::local();
    let spec = with_patterns(&mut ctx);

    let hook = HookCtx { spec: &spec, env: ctx.env() };
    let err = DashboardHooks.on_ready(&hook).await.unwrap_err();
    assert_eq!(err.kind(), "readiness-timeout");
}

#[tokio::test]
async fn cancelled_registration_stops_retrying() {
    let mut ctx = TestContext::local();
    let spec = with_patterns(&mut ctx);
    ctx.cancel.cancel();

    let hook = HookCtx { spec: &spec, env: ctx.env() };
    let err = DashboardHooks.on_ready(&hook).await.unwrap_err();
    assert_eq!(err.kind(), "cancelled");
}
