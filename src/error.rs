//! Error taxonomy. Each component owns a narrow `thiserror` enum; `main`
//! collapses everything into `eyre::Result` at the process boundary.

use alloy_primitives::Address;
use thiserror::Error;

use crate::types::VoteAddress;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required configuration key: {0}")]
    MissingKey(&'static str),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read data directory {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed vote record file {file}: {source}")]
    MalformedFile {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to (re)write vote record file {file}: {source}")]
    Write {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("evidence for validator {validator:?} was rejected on-chain (status = 0)")]
    Reverted { validator: VoteAddress },
    #[error(
        "evidence submission for validator {validator:?} was not confirmed within the poll deadline"
    )]
    DeadlineExceeded { validator: VoteAddress },
    #[error("transport error while submitting evidence: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("relayer registration transaction was rejected on-chain (status = 0)")]
    Reverted,
    #[error("relayer registration was not confirmed within the poll deadline")]
    DeadlineExceeded,
    #[error("transport error while registering as relayer for {address}: {source}")]
    Transport { address: Address, source: String },
}

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error(
        "finalized height regressed: last seen {last_seen}, received {received} from upstream node"
    )]
    HeightRegression { last_seen: u64, received: u64 },
}
