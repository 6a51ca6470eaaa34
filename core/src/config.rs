//! Session configuration.
//!
//! Defaults match the hosted todo API the client was written against. Values
//! can come from JSON (`from_json_str`) or from `TODO_SYNC_*` environment
//! variables layered over the defaults (`from_env`).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::OwnerId;

pub const DEFAULT_OWNER_ID: OwnerId = 1414;
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_NOTICE_TTL_MS: u64 = 3_000;

pub const ENV_OWNER_ID: &str = "TODO_SYNC_OWNER_ID";
pub const ENV_BASE_URL: &str = "TODO_SYNC_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "TODO_SYNC_TIMEOUT_MS";
pub const ENV_NOTICE_TTL_MS: &str = "TODO_SYNC_NOTICE_TTL_MS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub owner_id: OwnerId,
    pub base_url: String,
    /// Per-request timeout. `0` waits forever.
    pub request_timeout_ms: u64,
    pub notice_ttl_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            owner_id: DEFAULT_OWNER_ID,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            notice_ttl_ms: DEFAULT_NOTICE_TTL_MS,
        }
    }
}

impl SyncConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from defaults overridden by whatever `lookup` returns.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_OWNER_ID) {
            config.owner_id = parse_number(ENV_OWNER_ID, value)?;
        }
        if let Some(value) = lookup(ENV_BASE_URL) {
            config.base_url = value;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            config.request_timeout_ms = parse_number(ENV_TIMEOUT_MS, value)?;
        }
        if let Some(value) = lookup(ENV_NOTICE_TTL_MS) {
            config.notice_ttl_ms = parse_number(ENV_NOTICE_TTL_MS, value)?;
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

fn parse_number<N: std::str::FromStr>(key: &'static str, value: String) -> Result<N, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
