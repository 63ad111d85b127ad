// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::TestContext;
use ns_adapters::RuntimeCall;
use ns_core::{Download, StartupLogsKwargs, StopSignal};

/// A role-less service appended to the local stack.
fn worker(ctx: &mut TestContext, phrase: Option<&str>) -> ServiceSpec {
    let mut spec = ServiceSpec::new("worker");
    spec.docker_image = Some("busybox:1.36".into());
    spec.startup_phrase = phrase.map(str::to_string);
    spec.startup_logs_kwargs = Some(StartupLogsKwargs { lines: 0, from_latest: true, timeout: 5 });
    ctx.stack.stack.push(spec.clone());
    spec
}

#[test]
fn configure_renders_templates_idempotently() {
    let ctx = TestContext::local();
    let mut redis = ServiceLifecycle::new(ctx.spec("redis"));

    redis.configure(ctx.env()).unwrap();
    let first = ctx.service_file("redis", "redis.conf");
    assert!(first.starts_with("bind 127.0.0.1\nport 6379\n"));

    redis.configure(ctx.env()).unwrap();
    assert_eq!(ctx.service_file("redis", "redis.conf"), first);
    assert_eq!(redis.state(), ServiceState::Configuring);
}

#[test]
fn configure_without_templates_is_a_no_op() {
    let mut ctx = TestContext::local();
    let spec = worker(&mut ctx, None);
    let mut lifecycle = ServiceLifecycle::new(spec);
    lifecycle.configure(ctx.env()).unwrap();
}

#[test]
fn render_skips_role_owned_templates() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("templates")).unwrap();
    std::fs::write(dir.path().join("templates/a.conf"), "a=${x}").unwrap();
    std::fs::write(dir.path().join("templates/b.conf"), "b=${x}").unwrap();
    let vars = IndexMap::from([("x".to_string(), "1".to_string())]);

    let written = render_templates("svc", dir.path(), &vars, &["b.conf"]).unwrap();
    assert_eq!(written, 1);
    assert_eq!(std::fs::read_to_string(dir.path().join("a.conf")).unwrap(), "a=1");
    assert!(!dir.path().join("b.conf").exists());
}

#[test]
fn prepare_builds_invocation_from_spec() {
    let ctx = TestContext::local();
    let mut redis = ServiceLifecycle::new(ctx.spec("redis"));

    let invocation = redis.prepare(ctx.env()).unwrap().clone();
    assert_eq!(invocation.service, "redis");
    assert_eq!(invocation.image, "redis:7.2");
    assert_eq!(
        invocation.entrypoint,
        Some(vec!["redis-server".to_string(), "/usr/local/etc/redis/redis.conf".to_string()])
    );
    assert_eq!(invocation.ports, vec![6379]);
    assert_eq!(
        invocation.mounts,
        vec![MountBinding {
            source: ctx.node_root.join("services/redis/redis.conf"),
            target: "/usr/local/etc/redis/redis.conf".into(),
        }]
    );
    assert_eq!(redis.state(), ServiceState::Preparing);
}

#[test]
fn prepare_without_image_fails() {
    let mut ctx = TestContext::local();
    let mut spec = worker(&mut ctx, None);
    spec.docker_image = None;
    let mut lifecycle = ServiceLifecycle::new(spec);

    let err = lifecycle.prepare(ctx.env()).unwrap_err();
    assert_eq!(err.kind(), "config-resolution");
    assert_eq!(lifecycle.state(), ServiceState::Unhealthy);
}

#[tokio::test]
async fn start_before_prepare_fails() {
    let mut ctx = TestContext::local();
    let spec = worker(&mut ctx, Some("listening"));
    let mut lifecycle = ServiceLifecycle::new(spec);

    let err = lifecycle.start(ctx.env()).await.unwrap_err();
    assert_eq!(err.kind(), "config-resolution");
    assert!(ctx.runtime.started().is_empty());
}

#[tokio::test]
async fn startup_phrase_makes_service_ready() {
    let mut ctx = TestContext::local();
    let spec = worker(&mut ctx, Some("listening on"));
    ctx.runtime.script_logs("worker", &["booting", "listening on :80"]);
    let mut lifecycle = ServiceLifecycle::new(spec);

    lifecycle.configure(ctx.env()).unwrap();
    lifecycle.prepare(ctx.env()).unwrap();
    lifecycle.start(ctx.env()).await.unwrap();

    assert_eq!(lifecycle.state(), ServiceState::Ready);
    assert_eq!(ctx.runtime.started(), vec!["worker"]);
    assert!(ctx.runtime.calls().contains(&RuntimeCall::Logs {
        service: "worker".into(),
        options: LogOptions::from_latest(true),
    }));
}

#[tokio::test(start_paused = true)]
async fn silent_service_times_out() {
    let mut ctx = TestContext::local();
    let spec = worker(&mut ctx, Some("listening on"));
    let mut lifecycle = ServiceLifecycle::new(spec);

    lifecycle.prepare(ctx.env()).unwrap();
    let err = lifecycle.start(ctx.env()).await.unwrap_err();

    assert!(matches!(
        err,
        StackError::ReadinessTimeout { cause: TimeoutCause::Deadline, .. }
    ));
    assert_eq!(lifecycle.state(), ServiceState::Unhealthy);
}

#[tokio::test]
async fn start_failure_is_a_runtime_error() {
    let mut ctx = TestContext::local();
    let spec = worker(&mut ctx, Some("listening on"));
    ctx.runtime.fail_start("worker");
    let mut lifecycle = ServiceLifecycle::new(spec);

    lifecycle.prepare(ctx.env()).unwrap();
    let err = lifecycle.start(ctx.env()).await.unwrap_err();
    assert_eq!(err.kind(), "runtime");
}

#[tokio::test]
async fn downloads_are_fetched_before_start() {
    let mut ctx = TestContext::local();
    let mut spec = worker(&mut ctx, Some("ready"));
    let download = Download { url: "https://example.com/a.bin".into(), rename: "a.bin".into() };
    spec.add_download(download.clone()).unwrap();
    ctx.runtime.script_logs("worker", &["ready"]);
    let mut lifecycle = ServiceLifecycle::new(spec);

    lifecycle.prepare(ctx.env()).unwrap();
    lifecycle.start(ctx.env()).await.unwrap();

    let calls = ctx.runtime.calls();
    assert_eq!(
        calls[0],
        RuntimeCall::Fetch {
            downloads: vec![download],
            dest: ctx.node_root.join("services/worker"),
        }
    );
    assert!(matches!(calls[1], RuntimeCall::Start(_)));
}

#[tokio::test]
async fn probe_readiness_without_phrase() {
    let ctx = TestContext::local();
    ctx.probe.set_redis("127.0.0.1:6379", true);
    let mut redis = ServiceLifecycle::new(ctx.spec("redis"));

    redis.prepare(ctx.env()).unwrap();
    redis.start(ctx.env()).await.unwrap();
    assert_eq!(redis.state(), ServiceState::Ready);
}

#[tokio::test]
async fn stop_escalates_through_signals() {
    let mut ctx = TestContext::local();
    let spec = worker(&mut ctx, Some("ready"));
    ctx.runtime.script_logs("worker", &["ready"]);
    ctx.runtime.resist_signals("worker", 1);
    let mut lifecycle = ServiceLifecycle::new(spec);
    lifecycle.prepare(ctx.env()).unwrap();
    lifecycle.start(ctx.env()).await.unwrap();

    lifecycle.stop(ctx.env()).await.unwrap();

    assert_eq!(ctx.runtime.signals("worker"), vec![StopSignal::Terminate, StopSignal::Kill]);
    assert_eq!(ctx.runtime.removed(), vec!["worker"]);
    assert_eq!(lifecycle.state(), ServiceState::Stopped);
}

#[tokio::test]
async fn graceful_exit_stops_escalation() {
    let mut ctx = TestContext::local();
    let mut spec = worker(&mut ctx, None);
    spec.stop_sequence = vec![StopSignal::Interrupt, StopSignal::Terminate, StopSignal::Kill];
    ctx.runtime.set_running("worker", true);
    let mut lifecycle = ServiceLifecycle::new(spec);

    lifecycle.stop(ctx.env()).await.unwrap();
    assert_eq!(ctx.runtime.signals("worker"), vec![StopSignal::Interrupt]);
}

#[tokio::test]
async fn run_dispatches_status_and_rejects_unknown() {
    let mut ctx = TestContext::local();
    let spec = worker(&mut ctx, None);
    ctx.runtime.set_running("worker", true);
    let lifecycle = ServiceLifecycle::new(spec);

    let status = lifecycle.run(ctx.env(), "status", &[]).await.unwrap();
    assert_eq!(status, Value::from("healthy"));

    let err = lifecycle.run(ctx.env(), "block_num", &[]).await.unwrap_err();
    assert_eq!(err.kind(), "unknown-method");
}

#[test]
fn runtime_error_mapper_outlives_its_context() {
    let ctx = TestContext::local();
    let map = {
        let spec = ctx.spec("leap");
        let hook = HookCtx { spec: &spec, env: ctx.env() };
        hook.runtime_error()
    };
    let err = map(RuntimeError::NotFound("telos-local-leap".into()));
    assert_eq!(err.kind(), "runtime");
    assert!(matches!(err, StackError::Runtime { ref service, .. } if service == "leap"));
}

#[test]
fn hook_context_resolves_peers() {
    let mut ctx = TestContext::local();
    let spec = ctx.spec("translator");
    let hook = HookCtx { spec: &spec, env: ctx.env() };

    assert_eq!(hook.peer("nodeos").unwrap().name, "leap");
    let err = hook.ready_peer("leap").unwrap_err();
    assert_eq!(err.kind(), "dependency-order");

    ctx.mark_ready(&["leap"]);
    let hook = HookCtx { spec: &spec, env: ctx.env() };
    assert_eq!(hook.ready_peer("leap").unwrap().name, "leap");
    assert_eq!(hook.internal_host(hook.ready_peer("leap").unwrap()), "leap");
    assert_eq!(hook.probe_url("broadcast", "/x").unwrap(), "http://127.0.0.1:7300/x");
}
