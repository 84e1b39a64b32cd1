//! Turns a fetched page into per-contract release batches.
use crate::types::{ClaimPage, ContractBatch};

/// The batches derived from one page, plus the page's eligible-claim total.
///
/// A zero total means the page contained no work and terminates the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedPage {
    /// One batch per contract with at least one eligible claim, in page
    /// order.
    pub batches: Vec<ContractBatch>,
    /// Eligible claims across all batches.
    pub total_claims: usize,
}

/// Aggregates a page into per-contract batches, dropping contracts with no
/// eligible claims.
///
/// Pure and deterministic: the same page always yields the same batches,
/// with the within-contract claim order preserved.
pub fn aggregate(page: &ClaimPage) -> AggregatedPage {
    let batches: Vec<_> = page
        .contracts
        .iter()
        .filter_map(|contract| ContractBatch::new(contract.address, &contract.claims))
        .collect();
    let total_claims = batches.iter().map(ContractBatch::len).sum();

    AggregatedPage { batches, total_claims }
}
