// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Templates compiled into the binary.

use ns_core::Environment;

pub const BASE: &str = include_str!("../templates/base.json");

pub fn overlay(env: Environment) -> &'static str {
    match env {
        Environment::Local => include_str!("../templates/local.json"),
        Environment::Testnet => include_str!("../templates/testnet.json"),
        Environment::Mainnet => include_str!("../templates/mainnet.json"),
    }
}

/// A file shipped into a service's working directory by `init`.
#[derive(Debug, Clone, Copy)]
pub struct ServiceFile {
    /// Service directory name under `services/`.
    pub service: &'static str,
    /// Path relative to the service directory.
    pub path: &'static str,
    pub contents: &'static str,
}

/// Config templates live under `templates/` and are rendered by the lifecycle
/// on configure; other files are copied verbatim.
pub const SERVICE_FILES: &[ServiceFile] = &[
    ServiceFile {
        service: "leap",
        path: "templates/config.ini",
        contents: include_str!("../templates/services/leap/config.ini"),
    },
    ServiceFile {
        service: "leap",
        path: "templates/local.config.ini",
        contents: include_str!("../templates/services/leap/local.config.ini"),
    },
    ServiceFile {
        service: "leap",
        path: "genesis/local.json",
        contents: include_str!("../templates/services/leap/genesis/local.json"),
    },
    ServiceFile {
        service: "translator",
        path: "templates/config.json",
        contents: include_str!("../templates/services/translator/config.json"),
    },
    ServiceFile {
        service: "rpc",
        path: "templates/config.json",
        contents: include_str!("../templates/services/rpc/config.json"),
    },
    ServiceFile {
        service: "elasticsearch",
        path: "templates/elasticsearch.yml",
        contents: include_str!("../templates/services/elasticsearch/elasticsearch.yml"),
    },
    ServiceFile {
        service: "kibana",
        path: "templates/kibana.yml",
        contents: include_str!("../templates/services/kibana/kibana.yml"),
    },
    ServiceFile {
        service: "redis",
        path: "templates/redis.conf",
        contents: include_str!("../templates/services/redis/redis.conf"),
    },
];

pub fn service_files(service: &str) -> impl Iterator<Item = &'static ServiceFile> + '_ {
    SERVICE_FILES.iter().filter(move |f| f.service == service)
}
