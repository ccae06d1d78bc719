pub mod vote;

pub use vote::{VoteAddress, VoteData, VoteEnvelope, VoteSignature};
