//! Translating a detected conflict pair into the on-chain evidence shape.

use alloy_primitives::{Bytes, U256};

use crate::chain::contracts::{FinalityEvidence, VoteData as AbiVoteData};
use crate::types::VoteEnvelope;

fn widen(envelope: &VoteEnvelope) -> AbiVoteData {
    AbiVoteData {
        srcNum: U256::from(envelope.data.source_number),
        srcHash: envelope.data.source_hash,
        tarNum: U256::from(envelope.data.target_number),
        tarHash: envelope.data.target_hash,
        sig: Bytes::copy_from_slice(envelope.signature.as_slice()),
    }
}

/// Build the evidence payload. `new` is the just-arrived envelope that
/// triggered detection; `stored` is its counterpart already in the store.
/// Order matters: `vote_a` is always the newly arrived envelope.
pub fn build_evidence(new: &VoteEnvelope, stored: &VoteEnvelope) -> FinalityEvidence {
    debug_assert_eq!(new.vote_address, stored.vote_address);
    FinalityEvidence {
        voteA: widen(new),
        voteB: widen(stored),
        voteAddr: Bytes::copy_from_slice(new.vote_address.as_slice()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use crate::types::{VoteAddress, VoteData, VoteSignature};

    fn envelope(source: u64, target: u64) -> VoteEnvelope {
        VoteEnvelope {
            vote_address: VoteAddress::repeat_byte(0x09),
            signature: VoteSignature::repeat_byte(0x0A),
            data: VoteData {
                source_number: source,
                source_hash: B256::repeat_byte(1),
                target_number: target,
                target_hash: B256::repeat_byte(2),
            },
        }
    }

    #[test]
    fn orders_new_as_vote_a_and_stored_as_vote_b() {
        let new = envelope(1, 10);
        let stored = envelope(2, 10);
        let evidence = build_evidence(&new, &stored);

        assert_eq!(evidence.voteA.srcNum, U256::from(1u64));
        assert_eq!(evidence.voteB.srcNum, U256::from(2u64));
        assert_eq!(evidence.voteAddr.as_ref(), new.vote_address.as_slice());
    }
}
