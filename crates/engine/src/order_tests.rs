// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ns_core::ServiceSpec;
use proptest::prelude::*;
use yare::parameterized;

fn stack(services: &[(&str, &[&str])]) -> StackSpec {
    StackSpec {
        stack: services
            .iter()
            .map(|(name, requires)| {
                let mut spec = ServiceSpec::new(*name);
                spec.requires = requires.iter().map(|r| r.to_string()).collect();
                spec
            })
            .collect(),
        ..Default::default()
    }
}

fn names(stack: &StackSpec, order: &[usize]) -> Vec<String> {
    order.iter().map(|&i| stack.stack[i].name.clone()).collect()
}

#[parameterized(
    independent_keeps_declaration = { &[("a", &[]), ("b", &[]), ("c", &[])], &["a", "b", "c"] },
    dependency_moves_later = { &[("a", &["b"]), ("b", &[])], &["b", "a"] },
    tie_break_by_declaration = {
        &[("rpc", &["db"]), ("web", &[]), ("db", &[])],
        &["web", "db", "rpc"]
    },
    diamond = {
        &[("top", &["l", "r"]), ("l", &["base"]), ("r", &["base"]), ("base", &[])],
        &["base", "l", "r", "top"]
    },
)]
fn orders(services: &[(&str, &[&str])], expected: &[&str]) {
    let stack = stack(services);
    let order = start_order(&stack).unwrap();
    assert_eq!(names(&stack, &order), expected);
}

#[test]
fn base_stack_order() {
    let stack = stack(&[
        ("elasticsearch", &[]),
        ("kibana", &["elasticsearch"]),
        ("redis", &[]),
        ("leap", &[]),
        ("translator", &["elasticsearch", "leap"]),
        ("rpc", &["translator", "redis"]),
    ]);
    let order = start_order(&stack).unwrap();
    assert_eq!(
        names(&stack, &order),
        ["elasticsearch", "kibana", "redis", "leap", "translator", "rpc"]
    );
}

#[test]
fn requires_may_use_aliases() {
    let mut stack = stack(&[("translator", &["nodeos"]), ("leap", &[])]);
    stack.stack[1].aliases = vec!["nodeos".into()];
    let order = start_order(&stack).unwrap();
    assert_eq!(names(&stack, &order), ["leap", "translator"]);
}

#[test]
fn unknown_requirement_is_rejected() {
    let err = start_order(&stack(&[("rpc", &["ghost"])])).unwrap_err();
    assert_eq!(err.kind(), "dependency-order");
    assert_eq!(err.service(), Some("rpc"));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn cycle_is_rejected() {
    let err = start_order(&stack(&[("a", &["c"]), ("b", &["a"]), ("c", &["b"]), ("d", &[])]))
        .unwrap_err();
    assert_eq!(err.kind(), "dependency-order");
    assert!(err.to_string().contains("a, b, c"));
}

#[test]
fn self_requirement_is_rejected() {
    let err = start_order(&stack(&[("a", &["a"])])).unwrap_err();
    assert_eq!(err.service(), Some("a"));
}

proptest! {
    /// Edges only point backwards in declaration order, so the graph is a DAG.
    #[test]
    fn every_service_follows_its_requirements(
        edges in proptest::collection::vec((0usize..8, 0usize..8), 0..20),
    ) {
        let mut stack = stack(&[
            ("s0", &[]),
            ("s1", &[]),
            ("s2", &[]),
            ("s3", &[]),
            ("s4", &[]),
            ("s5", &[]),
            ("s6", &[]),
            ("s7", &[]),
        ]);
        for (a, b) in edges {
            if a > b {
                let dep = format!("s{}", b);
                stack.stack[a].requires.push(dep);
            }
        }
        let order = start_order(&stack).unwrap();
        prop_assert_eq!(order.len(), 8);
        let position = |i: usize| order.iter().position(|&o| o == i).unwrap();
        for (index, service) in stack.stack.iter().enumerate() {
            for required in &service.requires {
                let dep = stack.position(required).unwrap();
                prop_assert!(position(dep) < position(index));
            }
        }
    }
}
