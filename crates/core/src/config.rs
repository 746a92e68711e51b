// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node configuration

use crate::error::SdsError;
use crate::id::NodeId;
use serde::{Deserialize, Serialize};

/// Everything a node needs to join a broker and run its tables.
///
/// Constructed directly or deserialized from TOML by host tooling; every
/// knob except `node_id` and `broker_host` has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node_id: String,
    pub broker_host: String,
    pub broker_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connect_timeout_ms: u64,
    /// Connect retries after the first failed attempt.
    pub connect_retries: u32,
    /// Delay before the first retry; doubles per failure.
    pub retry_base_delay_ms: u64,
    /// Extra time an offline device keeps its slot before eviction.
    /// Zero disables timer-based eviction.
    pub eviction_grace_ms: u64,
    /// Publish only changed fields each cycle.
    pub delta_sync: bool,
    /// Float comparisons within this tolerance count as unchanged.
    pub float_tolerance: f32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: String::new(),
            broker_host: String::new(),
            broker_port: 1883,
            username: None,
            password: None,
            connect_timeout_ms: 5000,
            connect_retries: 3,
            retry_base_delay_ms: 500,
            eviction_grace_ms: 0,
            delta_sync: false,
            float_tolerance: 0.001,
        }
    }
}

impl NodeConfig {
    pub fn new(node_id: impl Into<String>, broker_host: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            broker_host: broker_host.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document into a config.
    pub fn from_toml_str(text: &str) -> Result<Self, SdsError> {
        toml::from_str(text).map_err(|e| SdsError::InvalidConfig(e.to_string()))
    }

    /// Check the config before any transport activity.
    pub fn validate(&self) -> Result<(), SdsError> {
        NodeId::parse(&self.node_id)?;
        if self.broker_host.is_empty() {
            return Err(SdsError::InvalidConfig("broker_host is empty".into()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(SdsError::InvalidConfig("connect_timeout_ms is zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
