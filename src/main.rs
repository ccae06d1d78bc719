use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use finality_slash_relayer::chain::alloy_client::AlloyChainClient;
use finality_slash_relayer::cli::Cli;
use finality_slash_relayer::config::Config;
use finality_slash_relayer::registration::ensure_registered;
use finality_slash_relayer::store::VoteRecordStore;
use finality_slash_relayer::submitter::EvidenceSubmitter;
use finality_slash_relayer::subscription;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "relayer exited with a fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let config = cli.apply(config);

    let endpoint = config.resolve_endpoint();
    let signer_key = config.resolve_signer_key()?;

    info!(client = ?config.client, %endpoint, "connecting to upstream node");
    let chain = Arc::new(AlloyChainClient::connect(config.client, &endpoint, &signer_key).await?);

    let poll_interval = Duration::from_millis(config.receipt_poll_interval_ms);
    let poll_attempts = config.receipt_poll_attempts;

    ensure_registered(&chain, poll_interval, poll_attempts).await?;

    let store = VoteRecordStore::load(&config.data_dir).await?;
    let submitter = EvidenceSubmitter::new(chain.clone(), store.clone(), poll_interval, poll_attempts);

    subscription::run(chain, store, submitter).await?;

    info!("relayer shut down cleanly");
    Ok(())
}
