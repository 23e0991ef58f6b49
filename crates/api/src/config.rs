//! Process configuration: environment/file driven.
//!
//! The config file path comes from the `CONFIG_PATH` environment variable;
//! without one, every field falls back to its local-development default.

use std::collections::HashMap;

use anyhow::Context;
use serde::Deserialize;

use sigil_rpc::ClientConfig;

fn default_environment() -> String {
    "local".to_string()
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_token_ttl_secs() -> u64 {
    3_600
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub http: HttpConfig,

    /// Token lifetime, seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-downstream client configuration, keyed by service name.
    #[serde(default)]
    pub clients: HashMap<String, ClientConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            http: HttpConfig::default(),
            token_ttl_secs: default_token_ttl_secs(),
            storage: StorageConfig::default(),
            clients: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

/// Credential store backend selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "driver", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Volatile in-memory store (dev/tests only).
    #[default]
    Memory,
    /// Embedded file store.
    Sqlite { path: String },
    /// Relational store; schema managed by external migration tooling.
    Postgres { url: String },
}

/// Load configuration from `CONFIG_PATH`, or defaults when unset.
pub fn load() -> anyhow::Result<AppConfig> {
    match std::env::var("CONFIG_PATH") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {path}"))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config file {path}"))
        }
        Err(_) => Ok(AppConfig::default()),
    }
}
