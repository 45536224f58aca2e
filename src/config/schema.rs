//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sync
//! client. All types derive Serde traits for deserialization from config
//! files.

use serde::{Deserialize, Serialize};

/// Root configuration for the sync client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Admin server connection settings.
    pub admin: AdminConfig,

    /// Long-poll settings.
    pub poll: PollConfig,

    /// Backoff policy for transport failures.
    pub backoff: BackoffConfig,
}

/// Admin server connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Base URL of the admin server (e.g., "http://127.0.0.1:9095").
    pub url: String,

    /// HTTP connection timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Total per-request timeout in milliseconds, covering response headers
    /// and body. Bounds fetch calls against a stalling server; the listener
    /// overrides it per request with the long-poll window.
    pub request_timeout_ms: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9095".to_string(),
            connect_timeout_ms: 3_000,
            request_timeout_ms: 10_000,
        }
    }
}

/// Long-poll settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// How long the server may hold a listener call open, in seconds.
    pub timeout_secs: u64,

    /// Fixed delay before the next poll after a protocol error, in
    /// milliseconds. Protocol errors indicate a server-side contract
    /// violation and are not retried aggressively.
    pub protocol_retry_delay_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 90,
            protocol_retry_delay_ms: 5_000,
        }
    }
}

/// Backoff policy for transport failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry, in milliseconds.
    pub base_ms: u64,

    /// Ceiling on the retry delay, in milliseconds.
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 500,
            max_ms: 30_000,
        }
    }
}
