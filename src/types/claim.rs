//! Claim entities mirrored from the dropper subgraph.
use alloy::primitives::{Address, U256};

/// On-chain status of a claim, as encoded by the subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    /// The claim is scheduled and has not been released yet.
    Pending,
    /// The claim has been paid out by a release transaction.
    Released,
}

impl ClaimStatus {
    /// The string encoding used in subgraph `where` filters.
    pub const fn as_filter(&self) -> &'static str {
        match self {
            Self::Pending => "0",
            Self::Released => "1",
        }
    }
}

/// A single pending claim as reported by the subgraph.
///
/// The claim belongs to exactly one dropper contract; the index is its
/// position within that contract's internal claim list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    /// Address the allocation was scheduled for.
    pub claimant: Address,
    /// Index of the claim within the owning contract.
    pub index: U256,
}

/// Eligible claims of a single dropper contract within one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractClaims {
    /// Address of the dropper contract.
    pub address: Address,
    /// Claims in subgraph order. May be empty for contracts with no
    /// eligible claims in the window.
    pub claims: Vec<ClaimRecord>,
}

/// One window of the subgraph result set for a chain, grouped by contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimPage {
    /// Contracts present in the window, in subgraph order.
    pub contracts: Vec<ContractClaims>,
}

/// All eligible claims of one dropper contract, flattened into the parallel
/// arrays the release entry point consumes.
///
/// `claimants[i]` and `indexes[i]` always describe the same claim, and both
/// arrays are non-empty. [`ContractBatch::new`] is the only constructor, so
/// the invariant holds for every value of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractBatch {
    contract: Address,
    claimants: Vec<Address>,
    indexes: Vec<U256>,
}

impl ContractBatch {
    /// Builds a batch from a contract's claims, preserving their order.
    ///
    /// Returns `None` when there are no claims: a batch with an empty
    /// claimant list must never reach submission.
    pub fn new(contract: Address, claims: &[ClaimRecord]) -> Option<Self> {
        if claims.is_empty() {
            return None;
        }
        Some(Self {
            contract,
            claimants: claims.iter().map(|claim| claim.claimant).collect(),
            indexes: claims.iter().map(|claim| claim.index).collect(),
        })
    }

    /// The dropper contract this batch targets.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Claimant addresses, parallel to [`Self::indexes`].
    pub fn claimants(&self) -> &[Address] {
        &self.claimants
    }

    /// Claim indexes, parallel to [`Self::claimants`].
    pub fn indexes(&self) -> &[U256] {
        &self.indexes
    }

    /// Number of claims in the batch. Always at least one.
    pub fn len(&self) -> usize {
        self.claimants.len()
    }
}
