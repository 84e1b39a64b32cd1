//! Client for the dropper subgraph.
//!
//! The subgraph mirrors on-chain claim state; the client only depends on its
//! query contract. Queries window the claim set with `first`/`skip` and
//! filter on status and release time, so re-reading the same window is
//! idempotent until a release transaction changes claim status.
use crate::types::{ClaimPage, ClaimRecord, ClaimStatus, ContractClaims};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;
use tracing::trace;
use url::Url;

/// Errors returned by subgraph queries.
///
/// Any of these aborts the current chain's run; the external scheduler
/// retries on its own cadence.
#[derive(Debug, Error)]
pub enum SubgraphError {
    /// The subgraph endpoint could not be reached.
    #[error("failed to reach subgraph: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body was not the expected query envelope.
    #[error("malformed subgraph response: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The subgraph rejected the query.
    #[error("subgraph query failed: {0}")]
    Query(String),
    /// The response carried neither data nor errors.
    #[error("subgraph response missing data")]
    MissingData,
}

/// Comparison operator applied to the release-time cutoff filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutoffOp {
    /// Claims with `releaseTime <= cutoff` are eligible.
    #[default]
    Lte,
    /// Claims with `releaseTime < cutoff` are eligible.
    Lt,
}

impl CutoffOp {
    /// The filter-key suffix understood by the subgraph, as in
    /// `releaseTime_lte`.
    pub const fn as_suffix(&self) -> &'static str {
        match self {
            Self::Lte => "lte",
            Self::Lt => "lt",
        }
    }
}

/// Read API against a chain's claim indexer.
#[async_trait]
pub trait IndexerApi: Debug + Send + Sync {
    /// Fetches one page of pending claims whose release time has passed the
    /// cutoff, grouped by owning contract.
    ///
    /// The cutoff is captured once per run and reused across pages to keep a
    /// stable snapshot under pagination.
    async fn fetch_pending_claims(
        &self,
        page_size: u64,
        offset: u64,
        cutoff: u64,
    ) -> Result<ClaimPage, SubgraphError>;
}

/// A [`IndexerApi`] implementation backed by a dropper subgraph endpoint.
#[derive(Debug, Clone)]
pub struct SubgraphClient {
    client: reqwest::Client,
    endpoint: Url,
    cutoff_op: CutoffOp,
}

impl SubgraphClient {
    /// Creates a new [`SubgraphClient`] for the given endpoint.
    pub fn new(endpoint: Url, cutoff_op: CutoffOp) -> Self {
        Self { client: reqwest::Client::new(), endpoint, cutoff_op }
    }

    /// Builds the query document for one page window.
    fn query_document(&self, first: u64, skip: u64, cutoff: u64) -> String {
        format!(
            r#"query {{
  dropperContracts {{
    address
    id
    airdrops(first: {first}, skip: {skip}, where: {{status: "{status}", releaseTime_{op}: {cutoff}}}) {{
      from {{
        address
      }}
      index
    }}
  }}
}}"#,
            status = ClaimStatus::Pending.as_filter(),
            op = self.cutoff_op.as_suffix(),
        )
    }
}

#[async_trait]
impl IndexerApi for SubgraphClient {
    async fn fetch_pending_claims(
        &self,
        page_size: u64,
        offset: u64,
        cutoff: u64,
    ) -> Result<ClaimPage, SubgraphError> {
        let query = self.query_document(page_size, offset, cutoff);
        let body = self
            .client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        trace!(%body, "subgraph response");

        parse_page(&body)
    }
}

/// Parses a raw query response body into a [`ClaimPage`].
fn parse_page(body: &str) -> Result<ClaimPage, SubgraphError> {
    let response = serde_json::from_str::<QueryResponse>(body)?;

    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let messages =
            errors.into_iter().map(|err| err.message).collect::<Vec<_>>().join("; ");
        return Err(SubgraphError::Query(messages));
    }

    let data = response.data.ok_or(SubgraphError::MissingData)?;
    let contracts = data
        .dropper_contracts
        .into_iter()
        .map(|contract| ContractClaims {
            address: contract.address,
            claims: contract
                .airdrops
                .into_iter()
                .map(|airdrop| ClaimRecord { claimant: airdrop.from.address, index: airdrop.index })
                .collect(),
        })
        .collect();

    Ok(ClaimPage { contracts })
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    dropper_contracts: Vec<RawContract>,
}

#[derive(Debug, Deserialize)]
struct RawContract {
    address: Address,
    /// Omitted entirely by some indexer versions when no claims match.
    #[serde(default)]
    airdrops: Vec<RawAirdrop>,
}

#[derive(Debug, Deserialize)]
struct RawAirdrop {
    from: RawAccount,
    #[serde(with = "crate::serde::quantity")]
    index: U256,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    address: Address,
}

/// A single error entry of a GraphQL response.
#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}
