//! Release transaction submission.
use crate::types::{ContractBatch, IDropperFactory};
use alloy::{
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, PendingTransactionError, WatchTxError},
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;
use tracing::debug;

/// Errors returned when submitting a release transaction.
///
/// None of these are retried here; the orchestrator leaves the cursor
/// unadvanced so the next scheduled run re-attempts the same window.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The transaction could not be built or was rejected on broadcast.
    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),
    /// Waiting for the transaction failed.
    #[error(transparent)]
    Confirmation(#[from] PendingTransactionError),
    /// The transaction was not mined within the confirmation timeout.
    #[error("timed out waiting for confirmation of {tx_hash}")]
    ConfirmationTimeout {
        /// Hash of the abandoned transaction.
        tx_hash: TxHash,
    },
    /// The transaction was mined but its receipt carries a failure status.
    #[error("release transaction {tx_hash} reverted")]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: TxHash,
    },
}

/// A confirmed release transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Hash of the mined transaction.
    pub tx_hash: TxHash,
}

/// Write API against a chain's release entry point.
#[async_trait]
pub trait SubmitterApi: Debug + Send + Sync {
    /// Submits one release transaction covering all supplied batches and
    /// blocks until it is confirmed.
    ///
    /// The batch list must be non-empty.
    async fn submit_release(&self, batches: &[ContractBatch]) -> Result<SubmitReceipt, SubmitError>;
}

/// A [`SubmitterApi`] implementation targeting a dropper factory contract.
#[derive(Debug, Clone)]
pub struct ReleaseSubmitter {
    provider: DynProvider,
    factory: Address,
    confirmation_timeout: Duration,
}

impl ReleaseSubmitter {
    /// Creates a new [`ReleaseSubmitter`] for the given factory.
    pub fn new(provider: DynProvider, factory: Address, confirmation_timeout: Duration) -> Self {
        Self { provider, factory, confirmation_timeout }
    }
}

#[async_trait]
impl SubmitterApi for ReleaseSubmitter {
    async fn submit_release(&self, batches: &[ContractBatch]) -> Result<SubmitReceipt, SubmitError> {
        let (droppers, froms, indexes) = split_batches(batches);

        let factory = IDropperFactory::new(self.factory, self.provider.clone());
        let pending = factory.releaseAirdrops(droppers, froms, indexes).send().await?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, "broadcast release transaction");

        let receipt =
            match pending.with_timeout(Some(self.confirmation_timeout)).get_receipt().await {
                Ok(receipt) => receipt,
                Err(PendingTransactionError::TxWatcher(WatchTxError::Timeout)) => {
                    return Err(SubmitError::ConfirmationTimeout { tx_hash });
                }
                Err(err) => return Err(err.into()),
            };

        // any status other than success means the batch was not paid out
        if !receipt.status() {
            return Err(SubmitError::Reverted { tx_hash });
        }

        Ok(SubmitReceipt { tx_hash })
    }
}

/// Splits batches into the parallel arrays the release entry point consumes.
fn split_batches(
    batches: &[ContractBatch],
) -> (Vec<Address>, Vec<Vec<Address>>, Vec<Vec<U256>>) {
    let mut droppers = Vec::with_capacity(batches.len());
    let mut froms = Vec::with_capacity(batches.len());
    let mut indexes = Vec::with_capacity(batches.len());

    for batch in batches {
        droppers.push(batch.contract());
        froms.push(batch.claimants().to_vec());
        indexes.push(batch.indexes().to_vec());
    }

    (droppers, froms, indexes)
}
