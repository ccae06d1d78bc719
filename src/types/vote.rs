//! Finality vote wire types.
//!
//! Mirrors the BLS-signed fast-finality vote envelope gossiped by the
//! upstream chain node's vote pool.

use alloy_primitives::{keccak256, BlockNumber, FixedBytes, B256};
use alloy_rlp::{Decodable, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

/// 48-byte BLS public key identifying a validator.
pub type VoteAddress = FixedBytes<48>;

/// 96-byte BLS signature.
pub type VoteSignature = FixedBytes<96>;

/// One voting range a validator attests to for fast finality: "finalize
/// `target` given that `source` is already justified".
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default, RlpEncodable, RlpDecodable, Serialize, Deserialize,
)]
pub struct VoteData {
    pub source_number: BlockNumber,
    pub source_hash: B256,
    pub target_number: BlockNumber,
    pub target_hash: B256,
}

impl VoteData {
    /// Keccak-256 hash of the RLP-encoded vote data; this is what the BLS
    /// signature in the enclosing envelope is computed over.
    pub fn hash(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }
}

/// A single signed vote from one validator, as delivered by the upstream
/// node's new-vote subscription.
#[derive(Clone, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable, Serialize, Deserialize)]
pub struct VoteEnvelope {
    pub vote_address: VoteAddress,
    pub signature: VoteSignature,
    pub data: VoteData,
}

impl VoteEnvelope {
    pub fn hash(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }

    pub fn decode_rlp(bytes: &[u8]) -> alloy_rlp::Result<Self> {
        Self::decode(&mut &*bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(source: u64, target: u64) -> VoteEnvelope {
        VoteEnvelope {
            vote_address: VoteAddress::repeat_byte(0xAB),
            signature: VoteSignature::repeat_byte(0xCD),
            data: VoteData {
                source_number: source,
                source_hash: B256::repeat_byte(1),
                target_number: target,
                target_hash: B256::repeat_byte(2),
            },
        }
    }

    #[test]
    fn equal_envelopes_compare_equal() {
        assert_eq!(envelope(1, 10), envelope(1, 10));
    }

    #[test]
    fn differing_source_makes_envelopes_distinct() {
        assert_ne!(envelope(1, 10), envelope(2, 10));
    }

    #[test]
    fn rlp_round_trips() {
        let e = envelope(5, 20);
        let encoded = alloy_rlp::encode(&e);
        let decoded = VoteEnvelope::decode_rlp(&encoded).unwrap();
        assert_eq!(e, decoded);
    }
}
