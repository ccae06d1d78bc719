//! The subscription driver: a single cooperative loop multiplexing the
//! incoming-vote stream and the shutdown signal. The optional
//! finalized-header liveness watcher runs as its own independent task (spec
//! §4.5/§5) and signals the driver over a oneshot channel the moment it
//! observes a regression, rather than sharing the same `select!` arm as vote
//! processing — a detected conflict blocks that arm synchronously for up to
//! 18s (§4.5), and a watcher sharing it would stall for that whole window.
//! Graceful shutdown flushes the store to disk.

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::chain::{ChainClient, FinalizedHeaderStream};
use crate::detector::{self, Outcome};
use crate::error::{SubmitError, WatcherError};
use crate::store::VoteRecordStore;
use crate::submitter::EvidenceSubmitter;
use crate::types::VoteEnvelope;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Watcher(#[from] WatcherError),
    #[error("vote subscription ended unexpectedly")]
    VoteSubscriptionEnded,
}

/// Run the driver until shutdown (clean exit) or a fatal condition (error).
/// Either way, the store is flushed to disk before returning.
pub async fn run<C: ChainClient + 'static>(
    chain: Arc<C>,
    store: Arc<VoteRecordStore>,
    submitter: EvidenceSubmitter<C>,
) -> Result<(), DriverError> {
    let mut votes = chain.subscribe_votes().await.map_err(|e| {
        error!(error = %e, "failed to subscribe to new votes");
        DriverError::VoteSubscriptionEnded
    })?;

    let mut header_regression = spawn_header_watcher(chain.as_ref()).await;

    info!("subscribed to vote pool");

    let result = loop {
        tokio::select! {
            biased;

            _ = shutdown_signal() => {
                info!("shutdown signal received");
                break Ok(());
            }

            maybe_vote = votes.next() => {
                match maybe_vote {
                    Some(vote) => {
                        if let Err(e) = process_vote(&vote, &store, &submitter).await {
                            break Err(e.into());
                        }
                    }
                    None => {
                        warn!("vote subscription ended; treating as fatal");
                        break Err(DriverError::VoteSubscriptionEnded);
                    }
                }
            }

            err = next_header_regression(&mut header_regression) => {
                break Err(err.into());
            }
        }
    };

    if let Err(e) = store.snapshot_to_dir() {
        error!(error = %e, "failed to flush vote record store at shutdown");
    }

    result
}

/// Spawn the finalized-header liveness watcher as an independent task. It
/// runs for the lifetime of the driver, asserting that finalized heights are
/// non-decreasing, and reports a regression (the sole fatal condition it can
/// raise) through the returned oneshot receiver. `None` if the upstream
/// doesn't support the subscription at all — the driver simply runs without
/// this liveness check in that case.
async fn spawn_header_watcher<C: ChainClient>(chain: &C) -> Option<oneshot::Receiver<WatcherError>> {
    let headers = match chain.subscribe_finalized_headers().await {
        Ok(headers) => headers,
        Err(e) => {
            warn!(error = %e, "finalized-header subscription unavailable; liveness watcher disabled");
            return None;
        }
    };

    let (tx, rx) = oneshot::channel();
    tokio::spawn(watch_finalized_headers(headers, tx));
    Some(rx)
}

/// Independent task body: consume the finalized-header stream, asserting
/// monotonicity. Sends at most once, and only on regression; the stream
/// ending on its own is not a fatal condition for this watcher.
async fn watch_finalized_headers(mut headers: FinalizedHeaderStream, tx: oneshot::Sender<WatcherError>) {
    let mut last_finalized: Option<u64> = None;
    while let Some(height) = headers.next().await {
        if let Some(last) = last_finalized {
            if height < last {
                let _ = tx.send(WatcherError::HeightRegression { last_seen: last, received: height });
                return;
            }
        }
        last_finalized = Some(height);
    }
}

/// Await the watcher's regression signal, if a watcher is running. Once the
/// channel closes without ever sending (the watcher task ended normally),
/// this disables the arm for the rest of the driver's lifetime rather than
/// re-firing forever.
async fn next_header_regression(rx: &mut Option<oneshot::Receiver<WatcherError>>) -> WatcherError {
    loop {
        match rx {
            Some(receiver) => match receiver.await {
                Ok(err) => return err,
                Err(_) => *rx = None,
            },
            None => std::future::pending().await,
        }
    }
}

async fn process_vote<C: ChainClient>(
    vote: &VoteEnvelope,
    store: &VoteRecordStore,
    submitter: &EvidenceSubmitter<C>,
) -> Result<(), SubmitError> {
    match detector::check_vote(vote, store) {
        Outcome::Inserted => debug!(validator = ?vote.vote_address, target = vote.data.target_number, "vote recorded"),
        Outcome::DuplicateRedelivery => debug!(validator = ?vote.vote_address, "duplicate vote redelivery ignored"),
        Outcome::Malformed => {}
        Outcome::Conflict { counterpart_height } => {
            let Some(counterpart) = store.get(&vote.vote_address, counterpart_height) else {
                // The counterpart must exist: the detector just read it.
                // Treat its disappearance as an internal invariant break
                // rather than panicking the driver.
                error!(validator = ?vote.vote_address, counterpart_height, "conflict reported but counterpart vanished");
                return Ok(());
            };
            warn!(
                validator = ?vote.vote_address,
                new_target = vote.data.target_number,
                counterpart_height,
                "finality violation detected"
            );
            submitter.submit(vote, &counterpart).await?;
        }
    }
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    tokio::select! {
        _ = term.recv() => {}
        _ = int.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
