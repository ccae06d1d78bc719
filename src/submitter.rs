//! Evidence submission: sign, broadcast, and confirm with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::chain::ChainClient;
use crate::error::SubmitError;
use crate::evidence::build_evidence;
use crate::store::VoteRecordStore;
use crate::types::VoteEnvelope;

pub struct EvidenceSubmitter<C: ChainClient> {
    chain: Arc<C>,
    store: Arc<VoteRecordStore>,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl<C: ChainClient> EvidenceSubmitter<C> {
    pub fn new(
        chain: Arc<C>,
        store: Arc<VoteRecordStore>,
        poll_interval: Duration,
        poll_attempts: u32,
    ) -> Self {
        Self { chain, store, poll_interval, poll_attempts }
    }

    /// Submit the conflicting pair as slashing evidence. `new` is the
    /// envelope that triggered detection, `stored` is its counterpart
    /// already in the record store. On success, the validator's entire
    /// in-memory record is dropped (it will not vote again).
    ///
    /// Any non-success outcome is fatal for the process — per the spec's
    /// propagation policy, a conflict that cannot be slashed is an
    /// operational issue the operator must see, not something to retry
    /// past the 18s polling window.
    pub async fn submit(&self, new: &VoteEnvelope, stored: &VoteEnvelope) -> Result<(), SubmitError> {
        let validator = new.vote_address;
        let evidence = build_evidence(new, stored);

        let tx_hash = self
            .chain
            .submit_evidence(evidence)
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        for attempt in 0..self.poll_attempts {
            tokio::time::sleep(self.poll_interval).await;
            match self.chain.get_receipt(tx_hash).await {
                Ok(Some(receipt)) if receipt.success => {
                    info!(?validator, %tx_hash, attempt, "finality violation evidence confirmed");
                    self.store.forget(&validator);
                    return Ok(());
                }
                Ok(Some(_)) => {
                    error!(?validator, %tx_hash, "evidence submission reverted on-chain");
                    return Err(SubmitError::Reverted { validator });
                }
                Ok(None) => continue,
                Err(e) => {
                    return Err(SubmitError::Transport(e.to_string()));
                }
            }
        }

        error!(?validator, %tx_hash, "evidence submission unconfirmed within deadline");
        Err(SubmitError::DeadlineExceeded { validator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::fake::FakeChainClient;
    use alloy_primitives::B256;
    use crate::types::{VoteAddress, VoteData, VoteSignature};

    fn envelope(addr: VoteAddress, source: u64, target: u64) -> VoteEnvelope {
        VoteEnvelope {
            vote_address: addr,
            signature: VoteSignature::repeat_byte(0xAA),
            data: VoteData {
                source_number: source,
                source_hash: B256::repeat_byte(1),
                target_number: target,
                target_hash: B256::repeat_byte(2),
            },
        }
    }

    #[tokio::test]
    async fn scenario_f_successful_submission_reports_ordered_pair() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VoteRecordStore::load(tmp.path()).await.unwrap();
        let chain = Arc::new(FakeChainClient::succeeding_after(1));

        let submitter =
            EvidenceSubmitter::new(chain.clone(), store, Duration::from_millis(1), 5);

        let k = VoteAddress::repeat_byte(0x42);
        let new = envelope(k, 1, 10);
        let stored = envelope(k, 2, 10);

        submitter.submit(&new, &stored).await.unwrap();

        let calls = chain.evidence_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].voteAddr.as_ref(), k.as_slice());
        assert_eq!(calls[0].voteA.srcNum, alloy_primitives::U256::from(1u64));
        assert_eq!(calls[0].voteB.srcNum, alloy_primitives::U256::from(2u64));
    }

    #[tokio::test]
    async fn reverted_receipt_is_fatal_and_not_retried() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VoteRecordStore::load(tmp.path()).await.unwrap();
        let chain = Arc::new(FakeChainClient::reverting());

        let submitter = EvidenceSubmitter::new(chain.clone(), store, Duration::from_millis(1), 5);
        let k = VoteAddress::repeat_byte(0x43);
        let result = submitter.submit(&envelope(k, 1, 10), &envelope(k, 2, 10)).await;
        assert!(matches!(result, Err(SubmitError::Reverted { .. })));
        assert_eq!(chain.receipt_polls(), 1);
    }

    #[tokio::test]
    async fn never_confirmed_exceeds_deadline() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VoteRecordStore::load(tmp.path()).await.unwrap();
        let chain = Arc::new(FakeChainClient::never_confirming());

        let submitter = EvidenceSubmitter::new(chain.clone(), store, Duration::from_millis(1), 3);
        let k = VoteAddress::repeat_byte(0x44);
        let result = submitter.submit(&envelope(k, 1, 10), &envelope(k, 2, 10)).await;
        assert!(matches!(result, Err(SubmitError::DeadlineExceeded { .. })));
        assert_eq!(chain.receipt_polls(), 3);
    }
}
