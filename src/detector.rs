//! The two-rule conflict predicate, `check_vote`.
//!
//! The detector never fails: its only outcomes are "inserted" and
//! "conflict, here is the counterpart height". A malformed envelope
//! (`source_number >= target_number`) is logged and dropped before either
//! rule runs.

use tracing::warn;

use crate::store::VoteRecordStore;
use crate::types::VoteEnvelope;

/// Outcome of evaluating an incoming envelope against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No conflict; the envelope was inserted into the store.
    Inserted,
    /// A conflict was found; the counterpart is stored at this height.
    Conflict { counterpart_height: u64 },
    /// The envelope's source/target were malformed (`source >= target`);
    /// it was logged and dropped without being evaluated or inserted.
    Malformed,
    /// The envelope is byte-for-byte identical to the one already stored
    /// at the same target — an idempotent redelivery, not a conflict.
    DuplicateRedelivery,
}

/// Evaluate `envelope` against `store` for validator `envelope.vote_address`.
///
/// Rule 1 (double-vote): a differing envelope already stored at the same
/// target height. Rule 2 (span containment): scanning descending from
/// `target - 1` down to `source + 2`, a stored envelope whose own source is
/// strictly greater than the incoming source — its `(source, target)`
/// interval is surrounded by the incoming vote's interval. The nearest
/// counterpart (by height) is reported first since the scan is early-exit.
///
/// This never fails: `store.insert` cannot fail either (see its doc comment)
/// so there is no error path to propagate.
pub fn check_vote(envelope: &VoteEnvelope, store: &VoteRecordStore) -> Outcome {
    let validator = envelope.vote_address;
    let source = envelope.data.source_number;
    let target = envelope.data.target_number;

    if source >= target {
        warn!(?validator, source, target, "malformed vote: source >= target, dropping");
        return Outcome::Malformed;
    }

    // Rule 1 — double vote.
    if let Some(stored) = store.get(&validator, target) {
        if stored == *envelope {
            return Outcome::DuplicateRedelivery;
        }
        return Outcome::Conflict { counterpart_height: target };
    }

    // Rule 2 — span containment. Half-open range: `source + 1` is not
    // scanned. Guard the subtraction since `target` may be as small as
    // `source + 1` would allow (target > source is already established).
    let mut height = target - 1;
    while height > source + 1 {
        if let Some(stored) = store.get(&validator, height) {
            if stored.data.source_number > source {
                return Outcome::Conflict { counterpart_height: height };
            }
        }
        height -= 1;
    }

    store.insert(validator, target, envelope.clone());
    Outcome::Inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use crate::types::{VoteAddress, VoteData, VoteSignature};

    fn envelope(addr: VoteAddress, source: u64, target: u64) -> VoteEnvelope {
        VoteEnvelope {
            vote_address: addr,
            signature: VoteSignature::repeat_byte(0xAA),
            data: VoteData {
                source_number: source,
                source_hash: B256::repeat_byte(source as u8),
                target_number: target,
                target_hash: B256::repeat_byte(target as u8),
            },
        }
    }

    async fn fresh_store() -> std::sync::Arc<VoteRecordStore> {
        let tmp = tempfile::tempdir().unwrap();
        // Leak the tempdir so its lifetime covers the test; acceptable in
        // tests, avoided in production code.
        let path = tmp.path().to_path_buf();
        std::mem::forget(tmp);
        VoteRecordStore::load(path).await.unwrap()
    }

    #[tokio::test]
    async fn scenario_a_double_vote() {
        let store = fresh_store().await;
        let k = VoteAddress::repeat_byte(0x01);
        store.insert(k, 10, envelope(k, 2, 10));

        let incoming = envelope(k, 1, 10);
        let outcome = check_vote(&incoming, &store);
        assert_eq!(outcome, Outcome::Conflict { counterpart_height: 10 });
    }

    #[tokio::test]
    async fn scenario_b_surround_outer_arrives_second() {
        let store = fresh_store().await;
        let k = VoteAddress::repeat_byte(0x02);
        store.insert(k, 9, envelope(k, 2, 9));

        let incoming = envelope(k, 1, 10);
        let outcome = check_vote(&incoming, &store);
        assert_eq!(outcome, Outcome::Conflict { counterpart_height: 9 });
    }

    #[tokio::test]
    async fn scenario_c_no_conflict() {
        let store = fresh_store().await;
        let k = VoteAddress::repeat_byte(0x03);

        let incoming = envelope(k, 1, 10);
        let outcome = check_vote(&incoming, &store);
        assert_eq!(outcome, Outcome::Inserted);
        assert_eq!(store.get(&k, 10), Some(incoming));
    }

    #[tokio::test]
    async fn surround_inner_then_outer_is_detected_on_outer_arrival() {
        let store = fresh_store().await;
        let k = VoteAddress::repeat_byte(0x04);
        // inner vote (source=5, target=8) arrives first, no conflict
        let inner = envelope(k, 5, 8);
        assert_eq!(check_vote(&inner, &store), Outcome::Inserted);

        // outer vote (source=1, target=10) strictly contains it
        let outer = envelope(k, 1, 10);
        let outcome = check_vote(&outer, &store);
        assert_eq!(outcome, Outcome::Conflict { counterpart_height: 8 });
    }

    #[tokio::test]
    async fn empty_span_range_when_target_equals_source_plus_two() {
        let store = fresh_store().await;
        let k = VoteAddress::repeat_byte(0x05);
        // target = source + 2 => rule 2's loop body never runs.
        let incoming = envelope(k, 1, 3);
        assert_eq!(check_vote(&incoming, &store), Outcome::Inserted);
    }

    #[tokio::test]
    async fn malformed_source_ge_target_is_dropped() {
        let store = fresh_store().await;
        let k = VoteAddress::repeat_byte(0x06);
        let bad = envelope(k, 10, 10);
        assert_eq!(check_vote(&bad, &store), Outcome::Malformed);
        assert!(store.get(&k, 10).is_none());
    }

    #[tokio::test]
    async fn identical_redelivery_is_idempotent() {
        let store = fresh_store().await;
        let k = VoteAddress::repeat_byte(0x07);
        let v = envelope(k, 1, 10);
        assert_eq!(check_vote(&v, &store), Outcome::Inserted);
        assert_eq!(check_vote(&v, &store), Outcome::DuplicateRedelivery);
    }
}
