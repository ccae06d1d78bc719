//! In-memory `ChainClient` fake for tests, substituting for a live node per
//! the spec's design notes ("define a narrow facade... so tests can
//! substitute an in-memory fake").

use std::pin::Pin;
use std::sync::Mutex;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use futures::stream;

use crate::chain::contracts::FinalityEvidence;
use crate::chain::{ChainClient, FinalizedHeaderStream, Receipt, VoteStream};
use crate::types::VoteEnvelope;

/// Scripted outcome for `get_receipt` polling.
enum ReceiptScript {
    /// Succeeds after this many `None` polls.
    SucceedAfter(u32),
    /// Always reverts (status = 0) as soon as a receipt is returned.
    AlwaysRevert,
    /// Never returns a receipt.
    NeverConfirm,
}

pub struct FakeChainClient {
    account: Address,
    script: ReceiptScript,
    polls_seen: Mutex<u32>,
    evidence_calls: Mutex<Vec<FinalityEvidence>>,
    registration_calls: Mutex<u32>,
    is_relayer: Mutex<bool>,
}

impl FakeChainClient {
    pub fn succeeding_after(polls: u32) -> Self {
        Self {
            account: Address::repeat_byte(0xEE),
            script: ReceiptScript::SucceedAfter(polls),
            polls_seen: Mutex::new(0),
            evidence_calls: Mutex::new(Vec::new()),
            registration_calls: Mutex::new(0),
            is_relayer: Mutex::new(false),
        }
    }

    pub fn reverting() -> Self {
        Self {
            account: Address::repeat_byte(0xEE),
            script: ReceiptScript::AlwaysRevert,
            polls_seen: Mutex::new(0),
            evidence_calls: Mutex::new(Vec::new()),
            registration_calls: Mutex::new(0),
            is_relayer: Mutex::new(false),
        }
    }

    pub fn never_confirming() -> Self {
        Self {
            account: Address::repeat_byte(0xEE),
            script: ReceiptScript::NeverConfirm,
            polls_seen: Mutex::new(0),
            evidence_calls: Mutex::new(Vec::new()),
            registration_calls: Mutex::new(0),
            is_relayer: Mutex::new(false),
        }
    }

    pub fn already_registered(mut self) -> Self {
        *self.is_relayer.get_mut().unwrap() = true;
        self
    }

    pub fn evidence_calls(&self) -> Vec<FinalityEvidence> {
        self.evidence_calls.lock().unwrap().clone()
    }

    pub fn registration_calls(&self) -> u32 {
        *self.registration_calls.lock().unwrap()
    }

    pub fn receipt_polls(&self) -> u32 {
        *self.polls_seen.lock().unwrap()
    }
}

#[async_trait]
impl ChainClient for FakeChainClient {
    async fn subscribe_votes(&self) -> eyre::Result<VoteStream> {
        Ok(Box::pin(stream::empty()) as Pin<Box<_>>)
    }

    async fn subscribe_finalized_headers(&self) -> eyre::Result<FinalizedHeaderStream> {
        Ok(Box::pin(stream::empty()) as Pin<Box<_>>)
    }

    async fn submit_evidence(&self, evidence: FinalityEvidence) -> eyre::Result<TxHash> {
        self.evidence_calls.lock().unwrap().push(evidence);
        Ok(TxHash::repeat_byte(0x01))
    }

    async fn submit_registration(&self, _bond: U256) -> eyre::Result<TxHash> {
        *self.registration_calls.lock().unwrap() += 1;
        Ok(TxHash::repeat_byte(0x02))
    }

    async fn is_relayer(&self, _address: Address) -> eyre::Result<bool> {
        Ok(*self.is_relayer.lock().unwrap())
    }

    async fn get_receipt(&self, _tx: TxHash) -> eyre::Result<Option<Receipt>> {
        let mut polls = self.polls_seen.lock().unwrap();
        *polls += 1;
        match &self.script {
            ReceiptScript::SucceedAfter(n) => {
                if *polls > *n {
                    Ok(Some(Receipt { success: true }))
                } else {
                    Ok(None)
                }
            }
            ReceiptScript::AlwaysRevert => Ok(Some(Receipt { success: false })),
            ReceiptScript::NeverConfirm => Ok(None),
        }
    }

    fn account(&self) -> Address {
        self.account
    }
}
