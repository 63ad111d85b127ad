// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment environments a stack can be generated for.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Network a node stack targets. Doubles as the chain node's `chain_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Testnet,
    Mainnet,
}

crate::simple_display! {
    Environment {
        Local => "local",
        Testnet => "testnet",
        Mainnet => "mainnet",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown environment: {0}")]
pub struct UnknownEnvironment(pub String);

impl Environment {
    pub const ALL: [Environment; 3] =
        [Environment::Local, Environment::Testnet, Environment::Mainnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Testnet => "testnet",
            Environment::Mainnet => "mainnet",
        }
    }

    /// Infer the environment from a free-form chain name such as
    /// `telos-testnet-node`. The first of local/testnet/mainnet found wins.
    pub fn from_chain_name(chain_name: &str) -> Result<Self, UnknownEnvironment> {
        Self::ALL
            .into_iter()
            .find(|env| chain_name.contains(env.as_str()))
            .ok_or_else(|| UnknownEnvironment(chain_name.to_string()))
    }

    /// Public API of the network, if it has one.
    pub fn remote_endpoint(&self) -> Option<&'static str> {
        match self {
            Environment::Local => None,
            Environment::Testnet => Some("https://testnet.telos.net"),
            Environment::Mainnet => Some("https://mainnet.telos.net"),
        }
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| UnknownEnvironment(s.to_string()))
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
