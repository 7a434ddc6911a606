//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! The guardian key is not part of the schema; only the name of the
//! environment variable holding it is.

use serde::{Deserialize, Serialize};

use crate::blockchain::signer::DEFAULT_KEY_ENV_VAR;

/// Root configuration for the guardian service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardianConfig {
    /// Ledger endpoint settings.
    pub chain: ChainConfig,

    /// Guardian credential source.
    pub signer: SignerConfig,

    /// Escalation limits for relay submissions.
    pub retries: RetryConfig,

    /// Off-chain user record store.
    pub store: StoreConfig,

    /// Bulk migration settings.
    pub batch: BatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Read-only failover endpoints.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 42220 for Celo mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// Deadline for a single RPC call in seconds.
    pub rpc_timeout_secs: u64,

    /// Deadline for a submitted transaction to be mined, in seconds.
    pub receipt_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
            receipt_timeout_secs: 120,
        }
    }
}

/// Guardian credential configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Environment variable holding the hex-encoded guardian key.
    pub private_key_env: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            private_key_env: DEFAULT_KEY_ENV_VAR.to_string(),
        }
    }
}

/// Retry configuration for relay submissions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Gas-doubling attempts per submission.
    pub gas_attempts: u32,

    /// Whole-submission restarts.
    pub outer_attempts: u32,

    /// Fixed delay between restarts in milliseconds.
    pub outer_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            gas_attempts: 5,
            outer_attempts: 5,
            outer_delay_ms: 100,
        }
    }
}

/// User record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file backing the store. In-memory only when unset.
    pub path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: Some("users.json".to_string()),
        }
    }
}

/// Bulk migration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum concurrent record writes.
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 20 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
