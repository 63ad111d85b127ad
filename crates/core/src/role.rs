// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service roles and their typed configuration views.
//!
//! Each view is deserialized from a service's extra fields
//! (see [`ServiceSpec::role_config`]); unknown keys are ignored and missing
//! keys fall back to the defaults of the reference deployment.

use crate::environment::Environment;
use crate::snapshot::SnapshotSpec;
use crate::stack::ServiceSpec;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Behaviour family a service belongs to, detected from its name or aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    ChainNode,
    Indexer,
    Gateway,
    Search,
    Dashboard,
    Cache,
    Generic,
}

crate::simple_display! {
    ServiceRole {
        ChainNode => "chain-node",
        Indexer => "indexer",
        Gateway => "gateway",
        Search => "search",
        Dashboard => "dashboard",
        Cache => "cache",
        Generic => "generic",
    }
}

impl ServiceRole {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "leap" | "nodeos" => Some(ServiceRole::ChainNode),
            "translator" | "indexer" => Some(ServiceRole::Indexer),
            "rpc" => Some(ServiceRole::Gateway),
            "elasticsearch" | "elastic" => Some(ServiceRole::Search),
            "kibana" => Some(ServiceRole::Dashboard),
            "redis" => Some(ServiceRole::Cache),
            _ => None,
        }
    }

    pub fn of(spec: &ServiceSpec) -> Self {
        std::iter::once(&spec.name)
            .chain(spec.aliases.iter())
            .find_map(|key| Self::from_key(key))
            .unwrap_or(ServiceRole::Generic)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainNodeConfig {
    pub chain_id: String,
    pub chain_type: Environment,
    #[serde(default = "defaults::nodeos_bin")]
    pub nodeos_bin: String,
    #[serde(default)]
    pub snapshot: Option<SnapshotSpec>,
    #[serde(default)]
    pub genesis: Option<String>,
    #[serde(default)]
    pub produce: bool,
    #[serde(default = "defaults::yes")]
    pub space_monitor: bool,
    /// Run bootstrap and wait for the node API during start.
    #[serde(default = "defaults::yes")]
    pub initialize: bool,
    /// Contract directory deployed to `eosio.evm`, relative to `contracts/`.
    #[serde(rename = "eosio.evm", default = "defaults::evm_contract")]
    pub evm_contract: String,
    #[serde(default)]
    pub nodeos_params: Vec<String>,
    /// Commands run inside the node after a fresh local launch, `${var}`-interpolated.
    #[serde(default = "defaults::bootstrap")]
    pub bootstrap: Vec<Vec<String>>,
    pub ini: IniConfig,
}

impl ChainNodeConfig {
    /// A full resync re-applies the snapshot or genesis on a relaunch.
    pub fn requests_resync(&self) -> bool {
        self.nodeos_params.iter().any(|p| p == "--replay-blockchain")
    }
}

/// Substitution source for the node's `subst_plugin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subst {
    Manifest(String),
    ByName(IndexMap<String, String>),
}

/// `config.ini` table of the chain node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IniConfig {
    #[serde(default)]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(default)]
    pub subst: Option<Subst>,

    #[serde(default = "defaults::agent_name")]
    pub agent_name: String,
    #[serde(default = "defaults::wasm_runtime")]
    pub wasm_runtime: String,
    #[serde(default = "defaults::four")]
    pub vm_oc_compile_threads: u32,
    #[serde(default = "defaults::yes")]
    pub vm_oc_enable: bool,

    #[serde(default = "defaults::chain_state_size")]
    pub chain_state_size: u64,
    #[serde(default = "defaults::yes")]
    pub account_queries: bool,
    #[serde(default = "defaults::abi_serializer_max_time")]
    pub abi_serializer_max_time: u64,

    #[serde(default = "defaults::allow_origin")]
    pub allow_origin: String,
    #[serde(default = "defaults::yes")]
    pub http_verbose_error: bool,
    #[serde(default = "defaults::yes")]
    pub contracts_console: bool,
    #[serde(default)]
    pub http_validate_host: bool,
    #[serde(default = "defaults::one")]
    pub p2p_max_nodes: u32,

    #[serde(default = "defaults::yes")]
    pub trace_history: bool,
    #[serde(default = "defaults::yes")]
    pub chain_history: bool,
    #[serde(default = "defaults::yes")]
    pub history_debug_mode: bool,
    #[serde(default = "defaults::history_dir")]
    pub history_dir: String,

    #[serde(default = "defaults::sync_fetch_span")]
    pub sync_fetch_span: u32,

    #[serde(default = "defaults::max_clients")]
    pub max_clients: u32,
    #[serde(default = "defaults::cleanup_period")]
    pub cleanup_period: u32,
    #[serde(default = "defaults::allowed_connection")]
    pub allowed_connection: String,
    #[serde(default = "defaults::http_max_response_time")]
    pub http_max_response_time: u64,
    #[serde(default = "defaults::http_max_body_size")]
    pub http_max_body_size: u64,

    #[serde(default = "defaults::yes")]
    pub enable_stale_production: bool,

    #[serde(default)]
    pub sig_provider: Option<String>,

    #[serde(default = "defaults::yes")]
    pub disable_subjective_billing: bool,
    #[serde(default = "defaults::max_transaction_time")]
    pub max_transaction_time: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub chain_name: String,
    pub chain_id: u64,
    pub start_block: u64,
    pub block_delta: u64,
    #[serde(default)]
    pub prev_hash: String,
    #[serde(default)]
    pub validate_hash: String,
    #[serde(default = "defaults::end_block")]
    pub end_block: i64,
    #[serde(default)]
    pub irreversible_only: bool,
    #[serde(default)]
    pub perf: PerfConfig,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default = "defaults::reader_log_level")]
    pub reader_log_level: String,
    #[serde(default = "defaults::loopback")]
    pub ws_host: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfConfig {
    #[serde(default = "defaults::stall_counter")]
    pub stall_counter: u32,
    #[serde(default = "defaults::four")]
    pub reader_workers: u32,
    #[serde(default = "defaults::four")]
    pub evm_workers: u32,
    #[serde(default = "defaults::one")]
    pub elastic_dump_size: u32,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self { stall_counter: 5, reader_workers: 4, evm_workers: 4, elastic_dump_size: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "defaults::any_host")]
    pub host: String,
    #[serde(default = "defaults::any_host")]
    pub ws_host: String,
    #[serde(default)]
    pub nodeos_write: Option<String>,
    #[serde(default)]
    pub nodeos_read: Option<String>,
    #[serde(default = "defaults::signer_account")]
    pub signer_account: String,
    #[serde(default = "defaults::signer_permission")]
    pub signer_permission: String,
    #[serde(default = "defaults::signer_key")]
    pub signer_key: String,
    #[serde(default = "defaults::contracts")]
    pub contracts: IndexMap<String, String>,
    #[serde(default = "defaults::index_version")]
    pub index_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "defaults::protocol")]
    pub protocol: String,
    #[serde(default = "defaults::cluster_name")]
    pub cluster_name: String,
    #[serde(default = "defaults::node_name")]
    pub node_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPattern {
    pub title: String,
    #[serde(default)]
    pub time_field_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "defaults::loopback")]
    pub host: String,
    #[serde(default)]
    pub patterns: Vec<IndexPattern>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "defaults::loopback")]
    pub host: String,
}

mod defaults {
    use indexmap::IndexMap;

    pub fn yes() -> bool {
        true
    }
    pub fn one() -> u32 {
        1
    }
    pub fn four() -> u32 {
        4
    }
    pub fn nodeos_bin() -> String {
        "nodeos".into()
    }
    pub fn evm_contract() -> String {
        "eosio.evm/receiptless".into()
    }
    pub fn bootstrap() -> Vec<Vec<String>> {
        let steps = [
            "cleos wallet create --to-console",
            "cleos wallet import --private-key ${producer_key}",
            "cleos -u ${api_url} create account eosio eosio.evm ${producer_pub}",
            "cleos -u ${api_url} set contract eosio ${contracts_dir}/eosio.system",
            "cleos -u ${api_url} set contract eosio.evm ${contracts_dir}/${evm_contract}",
        ];
        steps.iter().map(|step| step.split_whitespace().map(str::to_string).collect()).collect()
    }
    pub fn agent_name() -> String {
        "Telos EVM Controller node".into()
    }
    pub fn wasm_runtime() -> String {
        "eos-vm-jit".into()
    }
    pub fn chain_state_size() -> u64 {
        65536
    }
    pub fn abi_serializer_max_time() -> u64 {
        2_000_000
    }
    pub fn allow_origin() -> String {
        "*".into()
    }
    pub fn history_dir() -> String {
        "state-history".into()
    }
    pub fn sync_fetch_span() -> u32 {
        1600
    }
    pub fn max_clients() -> u32 {
        250
    }
    pub fn cleanup_period() -> u32 {
        30
    }
    pub fn allowed_connection() -> String {
        "any".into()
    }
    pub fn http_max_response_time() -> u64 {
        100_000
    }
    pub fn http_max_body_size() -> u64 {
        100_000_000
    }
    pub fn max_transaction_time() -> u32 {
        500
    }
    pub fn end_block() -> i64 {
        -1
    }
    pub fn stall_counter() -> u32 {
        5
    }
    pub fn log_level() -> String {
        "debug".into()
    }
    pub fn reader_log_level() -> String {
        "warning".into()
    }
    pub fn loopback() -> String {
        "127.0.0.1".into()
    }
    pub fn any_host() -> String {
        "0.0.0.0".into()
    }
    pub fn signer_account() -> String {
        "rpc.evm".into()
    }
    pub fn signer_permission() -> String {
        "rpc".into()
    }
    pub fn signer_key() -> String {
        "5Jr65kdYmn33C3UabzhmWDm2PuqbRfPuDStts3ZFNSBLM7TqaiL".into()
    }
    pub fn contracts() -> IndexMap<String, String> {
        IndexMap::from([("main".to_string(), "eosio.evm".to_string())])
    }
    pub fn index_version() -> String {
        "v1.5".into()
    }
    pub fn protocol() -> String {
        "http".into()
    }
    pub fn cluster_name() -> String {
        "es-cluster".into()
    }
    pub fn node_name() -> String {
        "es-example".into()
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
