//! One-shot relayer registration: idempotent bond-and-register gate that
//! must succeed before the subscription driver starts.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use tracing::{error, info};

use crate::chain::ChainClient;
use crate::config::RELAYER_BOND_WEI;
use crate::error::RegistrationError;

/// Ensure the configured account is registered as a relayer, registering
/// (with the fixed bond) if it is not already. Any non-success outcome
/// terminates the process.
pub async fn ensure_registered<C: ChainClient>(
    chain: &Arc<C>,
    poll_interval: Duration,
    poll_attempts: u32,
) -> Result<(), RegistrationError> {
    let account = chain.account();

    let already = chain
        .is_relayer(account)
        .await
        .map_err(|e| RegistrationError::Transport { address: account, source: e.to_string() })?;
    if already {
        info!(%account, "already registered as relayer");
        return Ok(());
    }

    info!(%account, "registering as relayer");
    let bond = U256::from(RELAYER_BOND_WEI);
    let tx_hash = chain
        .submit_registration(bond)
        .await
        .map_err(|e| RegistrationError::Transport { address: account, source: e.to_string() })?;

    for _ in 0..poll_attempts {
        tokio::time::sleep(poll_interval).await;
        match chain.get_receipt(tx_hash).await {
            Ok(Some(receipt)) if receipt.success => {
                info!(%account, %tx_hash, "relayer registration confirmed");
                return Ok(());
            }
            Ok(Some(_)) => {
                error!(%account, %tx_hash, "relayer registration reverted on-chain");
                return Err(RegistrationError::Reverted);
            }
            Ok(None) => continue,
            Err(e) => {
                return Err(RegistrationError::Transport {
                    address: account,
                    source: e.to_string(),
                })
            }
        }
    }

    error!(%account, %tx_hash, "relayer registration unconfirmed within deadline");
    Err(RegistrationError::DeadlineExceeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::fake::FakeChainClient;

    #[tokio::test]
    async fn skips_registration_when_already_relayer() {
        let chain = Arc::new(FakeChainClient::succeeding_after(0).already_registered());
        ensure_registered(&chain, Duration::from_millis(1), 3).await.unwrap();
        assert_eq!(chain.registration_calls(), 0);
    }

    #[tokio::test]
    async fn registers_when_not_yet_relayer() {
        let chain = Arc::new(FakeChainClient::succeeding_after(0));
        ensure_registered(&chain, Duration::from_millis(1), 3).await.unwrap();
        assert_eq!(chain.registration_calls(), 1);
    }

    #[tokio::test]
    async fn reverted_registration_is_fatal() {
        let chain = Arc::new(FakeChainClient::reverting());
        let result = ensure_registered(&chain, Duration::from_millis(1), 3).await;
        assert!(matches!(result, Err(RegistrationError::Reverted)));
    }
}
