//! Static platform configuration and the relayer's runtime configuration.
//!
//! Fixed contract addresses and the chain id are platform constants, not
//! user-configurable — they are baked in the same way the teacher bakes
//! `SLASH_CONTRACT` as a well-known address (see `hooks.rs` upstream).

use std::path::{Path, PathBuf};

use alloy_primitives::{address, Address};
use clap::ValueEnum;
use serde::Deserialize;

use crate::error::ConfigError;

/// Slash indicator system contract: accepts finality-violation evidence.
pub const SLASH_INDICATOR: Address = address!("0000000000000000000000000000000000001001");
/// Validator set system contract (read-only reference, unused by the core
/// detection/submission path but part of the fixed address family).
pub const VALIDATOR_SET: Address = address!("0000000000000000000000000000000000001000");
/// Token hub system contract (read-only reference).
pub const TOKEN_HUB: Address = address!("0000000000000000000000000000000000001004");
/// Relayer hub system contract: gates which accounts may submit evidence.
pub const RELAYER_HUB: Address = address!("0000000000000000000000000000000000001006");

/// Fixed chain id for the target network.
pub const CHAIN_ID: u64 = 714;

/// Relayer registration bond, in base units (100 native-coin).
pub const RELAYER_BOND_WEI: u128 = 100 * 10u128.pow(18);

/// Receipt poll cadence: ~100ms per attempt, 180 attempts (~18s ceiling).
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_RECEIPT_POLL_ATTEMPTS: u32 = 180;

/// Per-validator retention window: heights `h` and `h - 256` cannot coexist.
pub const RETENTION_WINDOW: u64 = 256;

/// Upstream endpoint selector, matching the spec's `--client` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    BscTestnet,
    Bsc,
    GethWs,
    GethIpc,
}

impl Default for ClientKind {
    fn default() -> Self {
        Self::GethWs
    }
}

impl ClientKind {
    /// Default endpoint for each client kind, overridable via `endpoint`.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::BscTestnet => "wss://bsc-testnet-rpc.publicnode.com",
            Self::Bsc => "wss://bsc-rpc.publicnode.com",
            Self::GethWs => "ws://127.0.0.1:8546",
            Self::GethIpc => "/tmp/geth.ipc",
        }
    }
}

/// Relayer runtime configuration: a TOML file overridden field-by-field by
/// CLI flags, mirroring the teacher's `BscNodeArgs`/`BscCli` split between a
/// flattened config struct and thin top-level flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientKind,
    pub endpoint: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Hex-encoded ECDSA private key for the relayer account. Prefer the
    /// `RELAYER_PRIVATE_KEY` environment variable over committing this to
    /// the config file.
    pub signer_key: Option<String>,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_poll_interval")]
    pub receipt_poll_interval_ms: u64,
    #[serde(default = "default_poll_attempts")]
    pub receipt_poll_attempts: u32,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_chain_id() -> u64 {
    CHAIN_ID
}
fn default_poll_interval() -> u64 {
    DEFAULT_RECEIPT_POLL_INTERVAL_MS
}
fn default_poll_attempts() -> u32 {
    DEFAULT_RECEIPT_POLL_ATTEMPTS
}

impl Config {
    /// Load from a TOML file. Missing file or unparseable content is fatal
    /// at startup, per the spec's configuration error-handling policy.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// Resolve the signer key, preferring the environment variable.
    pub fn resolve_signer_key(&self) -> Result<String, ConfigError> {
        std::env::var("RELAYER_PRIVATE_KEY")
            .ok()
            .or_else(|| self.signer_key.clone())
            .ok_or(ConfigError::MissingKey("signer_key"))
    }

    /// Resolve the endpoint, falling back to the client kind's default.
    pub fn resolve_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.client.default_endpoint().to_string())
    }
}
