//! Transaction signing and submission with gas-price escalation.
//!
//! Each liquidation is one logical transaction: the nonce is fixed at the
//! first attempt and the escalation clock starts then. While the transaction
//! sits unmined, the sender rebroadcasts it at whatever price the configured
//! [`GasPricer`] returns for the elapsed time, until it lands, reverts, or
//! the overall deadline passes.

use crate::gas::GasPricer;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, Context, Result};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a submission ultimately failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("transaction unmined after {0:?}")]
    DeadlineExceeded(Duration),
}

/// What a rejected rebroadcast means, judged from the chain's account nonce.
///
/// The node rejects a rebroadcast either because the transaction is already
/// in its pool ("already known") or because one of the earlier attempts was
/// mined in the gap after the receipt wait timed out ("nonce too low"). The
/// account nonce tells the two apart: if it moved past the pinned nonce, the
/// transaction landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RebroadcastOutcome {
    Mined,
    StillPending,
}

fn judge_rejected_rebroadcast(pinned_nonce: u64, chain_nonce: u64) -> RebroadcastOutcome {
    if chain_nonce > pinned_nonce {
        RebroadcastOutcome::Mined
    } else {
        RebroadcastOutcome::StillPending
    }
}

/// Signs and sends keeper transactions over a single account.
///
/// The account is read-only shared state: submissions never mutate anything
/// here beyond the per-call escalation clock, which lives on the stack.
pub struct TransactionSender {
    rpc_url: String,
    wallet: EthereumWallet,
    /// Address transactions are sent from.
    pub address: Address,
    chain_id: u64,
    pricer: Box<dyn GasPricer>,
    /// How long to wait for a receipt before rebroadcasting.
    rebroadcast_interval: Duration,
    /// Give up on a transaction entirely after this long.
    deadline: Duration,
}

impl TransactionSender {
    /// Create a sender from a hex-encoded private key.
    pub fn new(
        private_key: &str,
        rpc_url: impl Into<String>,
        chain_id: u64,
        pricer: Box<dyn GasPricer>,
        rebroadcast_interval: Duration,
        deadline: Duration,
    ) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .context("invalid private key")?;
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        Ok(Self {
            rpc_url: rpc_url.into(),
            wallet,
            address,
            chain_id,
            pricer,
            rebroadcast_interval,
            deadline,
        })
    }

    /// Name of the configured gas strategy, for logging.
    pub fn gas_strategy(&self) -> &'static str {
        self.pricer.name()
    }

    /// Submit `calldata` to `to` and block until the transaction is mined.
    ///
    /// The nonce is pinned before the first broadcast; every rebroadcast
    /// reuses it at the escalated price, so at most one of the attempts can
    /// land. Returns the mined transaction hash.
    pub async fn submit(&self, to: Address, calldata: Bytes, gas_limit: u64) -> Result<B256> {
        let provider = ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .on_http(self.rpc_url.parse()?);

        let nonce = provider.get_transaction_count(self.address).await?;
        let started = Instant::now();
        let mut attempt = 0u32;
        let mut last_tx_hash: Option<B256> = None;

        debug!(
            to = %to,
            nonce,
            calldata = %hex::encode(&calldata),
            gas_strategy = self.pricer.name(),
            "Submitting transaction"
        );

        loop {
            let elapsed = started.elapsed();
            if attempt > 0 && elapsed >= self.deadline {
                return Err(SubmitError::DeadlineExceeded(elapsed).into());
            }

            let gas_price = self.pricer.price_at(elapsed);
            attempt += 1;

            let tx = TransactionRequest::default()
                .with_from(self.address)
                .with_to(to)
                .with_input(calldata.clone())
                .with_nonce(nonce)
                .with_gas_limit(gas_limit)
                .with_gas_price(gas_price)
                .with_chain_id(self.chain_id);

            let pending = match provider.send_transaction(tx).await {
                Ok(pending) => pending,
                // A rebroadcast can race the previous attempt being mined in
                // the gap after the receipt wait timed out
                Err(e) if attempt > 1 => {
                    warn!(nonce, error = %e, "Rebroadcast rejected, checking earlier attempts");

                    if let Some(prior) = last_tx_hash {
                        if let Ok(Some(receipt)) = provider.get_transaction_receipt(prior).await {
                            if receipt.status() {
                                info!(
                                    tx_hash = %prior,
                                    block = receipt.block_number.unwrap_or(0),
                                    "Earlier attempt was mined"
                                );
                                return Ok(prior);
                            }
                            return Err(SubmitError::Reverted(prior).into());
                        }
                    }

                    let chain_nonce = provider.get_transaction_count(self.address).await?;
                    match judge_rejected_rebroadcast(nonce, chain_nonce) {
                        RebroadcastOutcome::Mined => {
                            // Receipt not visible yet on this endpoint, but
                            // the nonce has moved past ours, so it landed
                            if let Some(prior) = last_tx_hash {
                                info!(tx_hash = %prior, nonce, "Nonce advanced, earlier attempt landed");
                                return Ok(prior);
                            }
                            return Err(anyhow!("nonce {} consumed by an unknown transaction", nonce));
                        }
                        RebroadcastOutcome::StillPending => {
                            tokio::time::sleep(self.rebroadcast_interval).await;
                            continue;
                        }
                    }
                }
                Err(e) => return Err(e).context("transaction broadcast failed"),
            };
            let tx_hash = *pending.tx_hash();
            last_tx_hash = Some(tx_hash);

            info!(
                tx_hash = %tx_hash,
                nonce,
                attempt,
                gas_price_gwei = gas_price / 1_000_000_000,
                "Transaction broadcast, waiting for confirmation"
            );

            match tokio::time::timeout(self.rebroadcast_interval, pending.get_receipt()).await {
                Ok(Ok(receipt)) => {
                    if receipt.status() {
                        info!(
                            tx_hash = %tx_hash,
                            block = receipt.block_number.unwrap_or(0),
                            gas_used = receipt.gas_used,
                            "Transaction confirmed"
                        );
                        return Ok(tx_hash);
                    }
                    return Err(SubmitError::Reverted(tx_hash).into());
                }
                Ok(Err(e)) => {
                    return Err(anyhow!(e)).context("receipt wait failed");
                }
                Err(_) => {
                    warn!(
                        tx_hash = %tx_hash,
                        nonce,
                        waited_secs = self.rebroadcast_interval.as_secs(),
                        "Transaction still pending, rebroadcasting at escalated price"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_rebroadcast_with_advanced_nonce_means_mined() {
        // Earlier attempt landed between the receipt timeout and the resend
        assert_eq!(
            judge_rejected_rebroadcast(41, 42),
            RebroadcastOutcome::Mined
        );
        assert_eq!(
            judge_rejected_rebroadcast(41, 50),
            RebroadcastOutcome::Mined
        );
    }

    #[test]
    fn test_rejected_rebroadcast_with_same_nonce_keeps_waiting() {
        // "already known": the pool still holds one of our attempts
        assert_eq!(
            judge_rejected_rebroadcast(41, 41),
            RebroadcastOutcome::StillPending
        );
        // A lagging endpoint can even report an older nonce
        assert_eq!(
            judge_rejected_rebroadcast(41, 40),
            RebroadcastOutcome::StillPending
        );
    }
}
