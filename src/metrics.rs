use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics for [`Orchestrator`](crate::orchestrator::Orchestrator) runs.
#[derive(Metrics)]
#[metrics(scope = "releaser")]
pub struct ReleaserMetrics {
    /// Number of pages fetched from the subgraph.
    pub pages_fetched: Counter,
    /// Number of claims released.
    pub claims_released: Counter,
    /// Number of failed release submissions.
    pub submissions_failed: Counter,
    /// Number of runs aborted because the subgraph was unavailable.
    pub indexer_errors: Counter,
    /// Time from broadcast to confirmation of a release transaction, in
    /// milliseconds.
    pub release_time: Histogram,
}
