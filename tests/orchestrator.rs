//! Release-run tests driving the orchestrator against an in-memory claim
//! store that stands in for the chain and the subgraph mirroring it.

use alloy::primitives::{Address, B256, U256, address};
use async_trait::async_trait;
use releaser::{
    orchestrator::{Orchestrator, RunOutcome},
    subgraph::{IndexerApi, SubgraphError},
    submit::{SubmitError, SubmitReceipt, SubmitterApi},
    types::{ClaimPage, ClaimRecord, ContractBatch, ContractClaims},
};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

const CHAIN_ID: u64 = 250;
const CONTRACT_A: Address = address!("00000000000000000000000000000000000000aa");
const CONTRACT_B: Address = address!("00000000000000000000000000000000000000bb");
const CUTOFF: u64 = 1_700_000_000;

/// One scheduled allocation.
#[derive(Debug, Clone)]
struct StoredClaim {
    contract: Address,
    claimant: Address,
    index: u64,
    release_time: u64,
    released: bool,
}

/// Shared claim store. Successful submissions flip claims to released, which
/// the indexer side observes on the next fetch.
#[derive(Debug, Default)]
struct ClaimStore {
    claims: Mutex<Vec<StoredClaim>>,
}

impl ClaimStore {
    fn insert(&self, contract: Address, claimant: Address, index: u64, release_time: u64) {
        self.claims.lock().unwrap().push(StoredClaim {
            contract,
            claimant,
            index,
            release_time,
            released: false,
        });
    }

    /// Builds the page a subgraph would return: pending claims at or before
    /// the cutoff, windowed per contract by `first`/`skip` over a stable
    /// insertion order.
    fn page(&self, first: u64, skip: u64, cutoff: u64) -> ClaimPage {
        let claims = self.claims.lock().unwrap();

        let mut contracts: Vec<Address> = Vec::new();
        for claim in claims.iter() {
            if !contracts.contains(&claim.contract) {
                contracts.push(claim.contract);
            }
        }

        let contracts = contracts
            .into_iter()
            .map(|contract| ContractClaims {
                address: contract,
                claims: claims
                    .iter()
                    .filter(|claim| {
                        claim.contract == contract
                            && !claim.released
                            && claim.release_time <= cutoff
                    })
                    .skip(skip as usize)
                    .take(first as usize)
                    .map(|claim| ClaimRecord {
                        claimant: claim.claimant,
                        index: U256::from(claim.index),
                    })
                    .collect(),
            })
            .collect();

        ClaimPage { contracts }
    }

    /// The on-chain pending -> released transition a confirmed release
    /// transaction causes.
    fn mark_released(&self, batches: &[ContractBatch]) {
        let mut claims = self.claims.lock().unwrap();
        for batch in batches {
            for index in batch.indexes() {
                for claim in claims.iter_mut() {
                    if claim.contract == batch.contract() && U256::from(claim.index) == *index {
                        claim.released = true;
                    }
                }
            }
        }
    }

    fn pending_count(&self) -> usize {
        self.claims.lock().unwrap().iter().filter(|claim| !claim.released).count()
    }
}

#[derive(Debug, Clone)]
struct FakeIndexer {
    store: Arc<ClaimStore>,
    fetches: Arc<AtomicUsize>,
    unavailable: bool,
}

impl FakeIndexer {
    fn new(store: Arc<ClaimStore>) -> Self {
        Self { store, fetches: Arc::new(AtomicUsize::new(0)), unavailable: false }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexerApi for FakeIndexer {
    async fn fetch_pending_claims(
        &self,
        page_size: u64,
        offset: u64,
        cutoff: u64,
    ) -> Result<ClaimPage, SubgraphError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(SubgraphError::MissingData);
        }
        Ok(self.store.page(page_size, offset, cutoff))
    }
}

#[derive(Debug, Clone, Copy)]
enum ScriptedOutcome {
    Confirm,
    Revert,
}

#[derive(Debug, Clone)]
struct FakeSubmitter {
    store: Arc<ClaimStore>,
    submissions: Arc<Mutex<Vec<Vec<ContractBatch>>>>,
    /// Outcomes popped per submission; an empty script confirms.
    script: Arc<Mutex<VecDeque<ScriptedOutcome>>>,
}

impl FakeSubmitter {
    fn new(store: Arc<ClaimStore>) -> Self {
        Self {
            store,
            submissions: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    fn with_script(self, outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        *self.script.lock().unwrap() = outcomes.into_iter().collect();
        self
    }

    fn submissions(&self) -> Vec<Vec<ContractBatch>> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmitterApi for FakeSubmitter {
    async fn submit_release(&self, batches: &[ContractBatch]) -> Result<SubmitReceipt, SubmitError> {
        assert!(!batches.is_empty(), "submitter must never see an empty batch list");
        for batch in batches {
            assert_eq!(batch.claimants().len(), batch.indexes().len());
            assert!(batch.len() > 0);
        }
        self.submissions.lock().unwrap().push(batches.to_vec());

        let outcome =
            self.script.lock().unwrap().pop_front().unwrap_or(ScriptedOutcome::Confirm);
        match outcome {
            ScriptedOutcome::Confirm => {
                self.store.mark_released(batches);
                Ok(SubmitReceipt { tx_hash: B256::ZERO })
            }
            ScriptedOutcome::Revert => Err(SubmitError::Reverted { tx_hash: B256::ZERO }),
        }
    }
}

struct Harness {
    store: Arc<ClaimStore>,
    indexer: FakeIndexer,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(ClaimStore::default());
        let indexer = FakeIndexer::new(store.clone());
        Self { store, indexer }
    }

    fn submitter(&self) -> FakeSubmitter {
        FakeSubmitter::new(self.store.clone())
    }

    fn orchestrator(
        &self,
        submitter: FakeSubmitter,
        page_size: u64,
    ) -> Orchestrator<FakeIndexer, FakeSubmitter> {
        Orchestrator::new(CHAIN_ID, vec![], self.indexer.clone(), submitter, page_size)
    }
}

fn claimant(byte: u8) -> Address {
    Address::with_last_byte(byte)
}

#[tokio::test]
async fn empty_run_stops_immediately() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(harness.submitter(), 100);

    let report = orchestrator.run_at(CUTOFF).await;

    assert!(matches!(report.outcome, RunOutcome::CompletedEmpty));
    assert_eq!(report.cursor, 0);
    assert_eq!(report.pages_released, 0);
    assert_eq!(report.claims_released, 0);
    assert_eq!(harness.indexer.fetch_count(), 1);
}

#[tokio::test]
async fn releases_single_page_then_drains() {
    let harness = Harness::new();
    for (byte, index) in [(1u8, 0u64), (2, 1), (3, 2)] {
        harness.store.insert(CONTRACT_A, claimant(byte), index, CUTOFF - 10);
    }

    let submitter = harness.submitter();
    let orchestrator = harness.orchestrator(submitter, 100);
    let report = orchestrator.run_at(CUTOFF).await;

    assert!(matches!(report.outcome, RunOutcome::CompletedEmpty));
    assert_eq!(report.cursor, 100);
    assert_eq!(report.pages_released, 1);
    assert_eq!(report.claims_released, 3);
    // one page with work, one empty page to terminate
    assert_eq!(harness.indexer.fetch_count(), 2);
    assert_eq!(harness.store.pending_count(), 0);
}

#[tokio::test]
async fn batches_reach_the_submitter_in_page_order() {
    let harness = Harness::new();
    harness.store.insert(CONTRACT_A, claimant(1), 0, CUTOFF - 10);
    harness.store.insert(CONTRACT_A, claimant(2), 1, CUTOFF - 10);
    harness.store.insert(CONTRACT_B, claimant(3), 0, CUTOFF - 10);

    let submitter = harness.submitter();
    let probe = submitter.clone();
    let orchestrator = harness.orchestrator(submitter, 100);
    let report = orchestrator.run_at(CUTOFF).await;
    assert!(matches!(report.outcome, RunOutcome::CompletedEmpty));

    // both contracts covered by a single release transaction
    let submissions = probe.submissions();
    assert_eq!(submissions.len(), 1);
    let batches = &submissions[0];
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].contract(), CONTRACT_A);
    assert_eq!(batches[0].claimants(), &[claimant(1), claimant(2)]);
    assert_eq!(batches[0].indexes(), &[U256::ZERO, U256::from(1)]);
    assert_eq!(batches[1].contract(), CONTRACT_B);
    assert_eq!(batches[1].claimants(), &[claimant(3)]);
}

#[tokio::test]
async fn failed_submission_keeps_cursor_and_claims() {
    let harness = Harness::new();
    for (byte, index) in [(1u8, 0u64), (2, 1), (3, 2)] {
        harness.store.insert(CONTRACT_A, claimant(byte), index, CUTOFF - 10);
    }

    let submitter = harness.submitter().with_script([ScriptedOutcome::Revert]);
    let orchestrator = harness.orchestrator(submitter, 100);
    let report = orchestrator.run_at(CUTOFF).await;

    assert!(matches!(
        report.outcome,
        RunOutcome::CompletedFailure(SubmitError::Reverted { .. })
    ));
    assert_eq!(report.cursor, 0);
    assert_eq!(report.claims_released, 0);
    // nothing transitioned, the next scheduled run re-attempts the window
    assert_eq!(harness.store.pending_count(), 3);

    let retry = harness.orchestrator(harness.submitter(), 100);
    let report = retry.run_at(CUTOFF).await;
    assert!(matches!(report.outcome, RunOutcome::CompletedEmpty));
    assert_eq!(report.claims_released, 3);
    assert_eq!(harness.store.pending_count(), 0);
}

#[tokio::test]
async fn future_claims_terminate_the_run() {
    let harness = Harness::new();
    harness.store.insert(CONTRACT_A, claimant(1), 0, CUTOFF + 100);

    let submitter = harness.submitter();
    let probe = submitter.clone();
    let orchestrator = harness.orchestrator(submitter, 100);
    let report = orchestrator.run_at(CUTOFF).await;

    assert!(matches!(report.outcome, RunOutcome::CompletedEmpty));
    assert_eq!(report.cursor, 0);
    assert!(probe.submissions().is_empty());
    assert_eq!(harness.store.pending_count(), 1);
}

#[tokio::test]
async fn indexer_failure_aborts_the_run() {
    let harness = Harness::new();
    harness.store.insert(CONTRACT_A, claimant(1), 0, CUTOFF - 10);

    let mut indexer = harness.indexer.clone();
    indexer.unavailable = true;
    let orchestrator =
        Orchestrator::new(CHAIN_ID, vec![], indexer, harness.submitter(), 100);
    let report = orchestrator.run_at(CUTOFF).await;

    assert!(matches!(report.outcome, RunOutcome::IndexerError(_)));
    assert_eq!(report.cursor, 0);
    assert_eq!(harness.store.pending_count(), 1);
}

#[tokio::test]
async fn refetch_before_submission_is_idempotent() {
    let harness = Harness::new();
    harness.store.insert(CONTRACT_A, claimant(1), 0, CUTOFF - 10);
    harness.store.insert(CONTRACT_A, claimant(2), 1, CUTOFF - 10);

    let first = harness.indexer.fetch_pending_claims(100, 0, CUTOFF).await.unwrap();
    let second = harness.indexer.fetch_pending_claims(100, 0, CUTOFF).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn cursor_advances_past_a_shrinking_result_set() {
    let harness = Harness::new();
    for index in 0..5u64 {
        harness.store.insert(CONTRACT_A, claimant(index as u8 + 1), index, CUTOFF - 10);
    }

    let submitter = harness.submitter();
    let orchestrator = harness.orchestrator(submitter, 2);
    let report = orchestrator.run_at(CUTOFF).await;

    // Released pages shrink the pending set while the cursor still advances
    // by the page size, so part of the tail stays pending for the next run.
    assert!(matches!(report.outcome, RunOutcome::CompletedEmpty));
    assert_eq!(report.cursor, 4);
    assert_eq!(report.claims_released, 3);
    assert_eq!(harness.store.pending_count(), 2);
    // termination bound: ceil(5 / 2) + 1 iterations at most
    assert!(harness.indexer.fetch_count() <= 4);

    let next_run = harness.orchestrator(harness.submitter(), 2);
    let report = next_run.run_at(CUTOFF).await;
    assert!(matches!(report.outcome, RunOutcome::CompletedEmpty));
    assert_eq!(harness.store.pending_count(), 0);
}
