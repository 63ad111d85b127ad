// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use indexmap::IndexMap;
use ns_core::HealthStatus;
use ns_engine::DownReport;
use serde_json::{json, Value};

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `obj` as pretty JSON, or run `text` for the human format.
pub fn format_or_json(
    format: OutputFormat,
    obj: &Value,
    text: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => text(),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(obj)?),
    }
    Ok(())
}

/// One `name  status` line per service, names padded to a common width.
pub fn status_lines(statuses: &IndexMap<String, HealthStatus>) -> Vec<String> {
    let width = statuses.keys().map(String::len).max().unwrap_or(0);
    statuses
        .iter()
        .map(|(name, status)| format!("{:<width$}  {}", name, crate::color::health(*status)))
        .collect()
}

/// Method results print bare when they are strings.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn down_report_json(report: &DownReport) -> Value {
    json!({
        "stopped": report.stopped,
        "unhealthy": report.unhealthy,
        "failed": report.failed,
    })
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
