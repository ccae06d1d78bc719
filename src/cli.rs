//! Command-line surface: a thin `clap` layer over [`crate::config::Config`],
//! mirroring the teacher's split between flattened config and a handful of
//! top-level flags that override it.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ClientKind;

#[derive(Debug, Parser)]
#[command(
    name = "finality-slash-relayer",
    author,
    version,
    about = "Detects BLS fast-finality vote violations and relays slashing evidence"
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "relayer.toml")]
    pub config: PathBuf,

    /// Upstream client to subscribe to; overrides the config file's value.
    #[arg(long, value_enum)]
    pub client: Option<ClientKind>,

    /// Upstream endpoint (ws:// or ipc path); overrides the config file's
    /// value and the selected client's default.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Directory holding per-validator vote record files; overrides the
    /// config file's value.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    /// Apply the flags that were actually passed on top of a loaded config.
    pub fn apply(&self, mut config: crate::config::Config) -> crate::config::Config {
        if let Some(client) = self.client {
            config.client = client;
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        config
    }
}
