//! The per-chain release run.
//!
//! One run walks the chain's pending claims page by page: fetch a window
//! from the subgraph, aggregate it into per-contract batches, submit one
//! release transaction for the page, and decide whether to continue. The
//! run is bounded; an external scheduler re-invokes it on its own cadence.
use crate::{
    aggregate::{AggregatedPage, aggregate},
    metrics::ReleaserMetrics,
    subgraph::{IndexerApi, SubgraphError},
    submit::{SubmitError, SubmitterApi},
    types::{ClaimPage, ContractBatch},
};
use alloy::primitives::{Address, ChainId};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Terminal outcome of a chain's release run.
#[derive(Debug)]
pub enum RunOutcome {
    /// A page with no eligible claims was reached; all prior pages were
    /// released. The normal way a run ends.
    CompletedEmpty,
    /// A release transaction failed; the run stopped without advancing past
    /// the failed window.
    CompletedFailure(SubmitError),
    /// The subgraph could not be queried; the run stopped before touching
    /// the chain.
    IndexerError(SubgraphError),
}

impl RunOutcome {
    /// Whether the run drained all eligible work.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::CompletedEmpty)
    }
}

/// What a finished run did, and where it stopped.
#[derive(Debug)]
pub struct RunReport {
    /// How the run terminated.
    pub outcome: RunOutcome,
    /// Cumulative offset consumed. Advanced by the page size per released
    /// page and never rewound, so a failed window is re-attempted by the
    /// next scheduled run.
    pub cursor: u64,
    /// Pages whose release transaction confirmed.
    pub pages_released: usize,
    /// Claims covered by those transactions.
    pub claims_released: usize,
}

/// States of the run loop.
///
/// Every page moves `Fetching -> Aggregating -> Submitting` and back to
/// `Fetching`; pages without eligible claims skip submission and stop the
/// run. `Stopped` is reachable from every state, so the loop always
/// terminates.
enum RunState {
    Fetching,
    Aggregating(ClaimPage),
    Submitting(AggregatedPage),
    Stopped(RunOutcome),
}

/// Drives release runs for a single chain.
///
/// The orchestrator owns no cross-chain state; instances for different
/// chains can run concurrently without coordination.
pub struct Orchestrator<I, S> {
    chain_id: ChainId,
    /// Dropper contracts known to be deployed on the chain. Advisory:
    /// unknown contracts showing up in query results are flagged, not
    /// filtered.
    known_droppers: Vec<Address>,
    indexer: I,
    submitter: S,
    page_size: u64,
    metrics: ReleaserMetrics,
}

impl<I, S> Orchestrator<I, S>
where
    I: IndexerApi,
    S: SubmitterApi,
{
    /// Creates a new [`Orchestrator`] for one chain.
    pub fn new(
        chain_id: ChainId,
        known_droppers: Vec<Address>,
        indexer: I,
        submitter: S,
        page_size: u64,
    ) -> Self {
        debug_assert!(page_size > 0);
        Self {
            chain_id,
            known_droppers,
            indexer,
            submitter,
            page_size,
            metrics: ReleaserMetrics::default(),
        }
    }

    /// Performs one bounded run with the cutoff captured now.
    pub async fn run(&self) -> RunReport {
        self.run_at(Utc::now().timestamp() as u64).await
    }

    /// Performs one bounded run against a fixed release-time cutoff.
    ///
    /// The run ends at the first page whose eligible-claim total is zero; it
    /// does not scan further windows for eligible claims beyond that page.
    pub async fn run_at(&self, cutoff: u64) -> RunReport {
        info!(chain = %self.chain_id, cutoff, "starting release run");

        let mut cursor = 0u64;
        let mut pages_released = 0usize;
        let mut claims_released = 0usize;
        let mut state = RunState::Fetching;

        let outcome = loop {
            state = match state {
                RunState::Fetching => {
                    debug!(chain = %self.chain_id, cursor, "fetching pending claims");
                    match self.indexer.fetch_pending_claims(self.page_size, cursor, cutoff).await {
                        Ok(page) => {
                            self.metrics.pages_fetched.increment(1);
                            RunState::Aggregating(page)
                        }
                        Err(err) => {
                            self.metrics.indexer_errors.increment(1);
                            error!(chain = %self.chain_id, %err, "subgraph query failed");
                            RunState::Stopped(RunOutcome::IndexerError(err))
                        }
                    }
                }
                RunState::Aggregating(page) => {
                    let aggregated = aggregate(&page);
                    self.flag_unknown_contracts(&aggregated.batches);
                    if aggregated.total_claims == 0 {
                        info!(chain = %self.chain_id, cursor, "no claims to release");
                        RunState::Stopped(RunOutcome::CompletedEmpty)
                    } else {
                        RunState::Submitting(aggregated)
                    }
                }
                RunState::Submitting(aggregated) => {
                    info!(
                        chain = %self.chain_id,
                        contracts = aggregated.batches.len(),
                        claims = aggregated.total_claims,
                        "submitting release transaction"
                    );

                    let started_at = Instant::now();
                    match self.submitter.submit_release(&aggregated.batches).await {
                        Ok(receipt) => {
                            self.metrics
                                .release_time
                                .record(started_at.elapsed().as_millis() as f64);
                            self.metrics.claims_released.increment(aggregated.total_claims as u64);
                            info!(
                                chain = %self.chain_id,
                                tx_hash = %receipt.tx_hash,
                                claims = aggregated.total_claims,
                                "release confirmed"
                            );

                            pages_released += 1;
                            claims_released += aggregated.total_claims;
                            // the window is paid out, move on to the next one
                            cursor += self.page_size;
                            RunState::Fetching
                        }
                        Err(err) => {
                            self.metrics.submissions_failed.increment(1);
                            error!(chain = %self.chain_id, cursor, %err, "release failed");
                            RunState::Stopped(RunOutcome::CompletedFailure(err))
                        }
                    }
                }
                RunState::Stopped(outcome) => break outcome,
            };
        };

        RunReport { outcome, cursor, pages_released, claims_released }
    }

    fn flag_unknown_contracts(&self, batches: &[ContractBatch]) {
        if self.known_droppers.is_empty() {
            return;
        }
        for batch in batches {
            if !self.known_droppers.contains(&batch.contract()) {
                warn!(
                    chain = %self.chain_id,
                    contract = %batch.contract(),
                    "contract not in configured dropper set"
                );
            }
        }
    }
}

impl<I, S> std::fmt::Debug for Orchestrator<I, S>
where
    I: std::fmt::Debug,
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("chain_id", &self.chain_id)
            .field("indexer", &self.indexer)
            .field("submitter", &self.submitter)
            .field("page_size", &self.page_size)
            .finish()
    }
}
