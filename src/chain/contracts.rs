//! Solidity ABI bindings for the two system contracts the core invokes,
//! generated with `alloy_sol_types::sol!` — the same macro-driven binding
//! style used for contract interaction in the `alloy` ecosystem (see the
//! x402 facilitator's `USDC`/`Validator6492` bindings in the reference
//! pack), rather than hand-rolled ABI encoding.

use alloy_sol_types::sol;

sol! {
    /// One voting range, heights widened to `uint256` to match the
    /// on-chain ABI (the in-process representation keeps them as `u64`).
    #[derive(Debug, Clone)]
    struct VoteData {
        uint256 srcNum;
        bytes32 srcHash;
        uint256 tarNum;
        bytes32 tarHash;
        bytes sig;
    }

    /// A conflicting pair plus the offending validator's raw BLS key.
    #[derive(Debug, Clone)]
    struct FinalityEvidence {
        VoteData voteA;
        VoteData voteB;
        bytes voteAddr;
    }

    #[sol(rpc)]
    interface ISlashIndicator {
        function submitFinalityViolationEvidence(FinalityEvidence calldata _evidence) external;
    }

    #[sol(rpc)]
    interface IRelayerHub {
        function isRelayer(address addr) external view returns (bool);
        function register() external payable;
    }
}
