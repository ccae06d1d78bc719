//! The chain-client facade: the narrow capability set the core consumes
//! (subscribe, submit, poll for receipts, read contract state), kept
//! deliberately thin so tests can substitute an in-memory fake instead of a
//! live node. Per the spec's design notes, this crate models one facade
//! that natively exposes a "subscribe new votes" stream rather than
//! reaching into transport internals for a custom subscription method.

pub mod alloy_client;
pub mod contracts;
pub mod fake;

use std::pin::Pin;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use futures::Stream;

use crate::chain::contracts::FinalityEvidence;
use crate::types::VoteEnvelope;

pub type VoteStream = Pin<Box<dyn Stream<Item = VoteEnvelope> + Send>>;
pub type FinalizedHeaderStream = Pin<Box<dyn Stream<Item = u64> + Send>>;

/// Whether a confirmed transaction's receipt reports success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub success: bool,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Push stream of newly gossiped votes from the upstream node's vote pool.
    async fn subscribe_votes(&self) -> eyre::Result<VoteStream>;

    /// Push stream of newly finalized header numbers (liveness observer only).
    async fn subscribe_finalized_headers(&self) -> eyre::Result<FinalizedHeaderStream>;

    /// Build, sign and broadcast a `submitFinalityViolationEvidence` call.
    /// Returns the broadcast transaction hash.
    async fn submit_evidence(&self, evidence: FinalityEvidence) -> eyre::Result<TxHash>;

    /// Build, sign and broadcast a `register()` call with the fixed bond.
    async fn submit_registration(&self, bond: U256) -> eyre::Result<TxHash>;

    /// Read-only `isRelayer(address)` call against the relayer hub.
    async fn is_relayer(&self, address: Address) -> eyre::Result<bool>;

    /// Poll for a transaction receipt; `None` means "not yet mined".
    async fn get_receipt(&self, tx: TxHash) -> eyre::Result<Option<Receipt>>;

    /// The configured relayer account address.
    fn account(&self) -> Address;
}
