//! Releaser constants.

/// Number of claims requested from the subgraph per page.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Seconds to wait for a release transaction to be mined before the run is
/// treated as failed.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
