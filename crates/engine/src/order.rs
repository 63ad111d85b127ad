// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start order from the `requires` relation.

use crate::error::StackError;
use ns_core::StackSpec;

/// Indices of `stack.stack` in an order where every service follows the
/// services it requires. Among services that are free to start, the one
/// declared first goes first.
///
/// `requires` entries may name a service or one of its aliases. Unknown
/// entries and cycles are reported before anything starts.
pub fn start_order(stack: &StackSpec) -> Result<Vec<usize>, StackError> {
    let count = stack.stack.len();
    let mut in_degree = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

    for (index, service) in stack.stack.iter().enumerate() {
        for required in &service.requires {
            let Some(dep) = stack.position(required) else {
                return Err(StackError::DependencyOrder {
                    service: service.name.clone(),
                    message: format!("requires unknown service {}", required),
                });
            };
            if dep == index {
                return Err(StackError::DependencyOrder {
                    service: service.name.clone(),
                    message: "requires itself".to_string(),
                });
            }
            if !dependents[dep].contains(&index) {
                dependents[dep].push(index);
                in_degree[index] += 1;
            }
        }
    }

    let mut order = Vec::with_capacity(count);
    let mut placed = vec![false; count];
    while order.len() < count {
        let Some(next) = (0..count).find(|&i| !placed[i] && in_degree[i] == 0) else {
            let stuck: Vec<&str> = (0..count)
                .filter(|&i| !placed[i])
                .map(|i| stack.stack[i].name.as_str())
                .collect();
            return Err(StackError::DependencyOrder {
                service: stuck.first().copied().unwrap_or_default().to_string(),
                message: format!("dependency cycle among {}", stuck.join(", ")),
            });
        };
        placed[next] = true;
        order.push(next);
        for &dependent in &dependents[next] {
            in_degree[dependent] -= 1;
        }
    }
    Ok(order)
}

#[cfg(test)]
#[path = "order_tests.rs"]
mod tests;
