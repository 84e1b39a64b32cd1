//! Releaser error types.
use crate::{subgraph::SubgraphError, submit::SubmitError};
use alloy::primitives::ChainId;
use thiserror::Error;

/// The overarching error type for a chain's release run.
#[derive(Debug, Error)]
pub enum ReleaserError {
    /// The chain is not present in the registry.
    #[error("unsupported chain {0}")]
    UnsupportedChain(ChainId),
    /// The subgraph could not be reached or returned a malformed response.
    #[error(transparent)]
    Subgraph(#[from] SubgraphError),
    /// A release transaction was rejected, reverted or timed out.
    #[error(transparent)]
    Submit(#[from] SubmitError),
    /// An internal error occurred.
    #[error(transparent)]
    InternalError(#[from] eyre::Error),
}
