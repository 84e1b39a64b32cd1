//! Releaser configuration.
use crate::{
    constants::{DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_PAGE_SIZE},
    subgraph::CutoffOp,
};
use alloy::primitives::{Address, ChainId};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, time::Duration};
use url::Url;

/// Releaser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaserConfig {
    /// Chain configurations, keyed by chain id.
    pub chains: HashMap<ChainId, ChainConfig>,
    /// Number of claims requested from the subgraph per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Comparison operator applied to the release-time cutoff filter.
    #[serde(default)]
    pub cutoff_op: CutoffOp,
    /// Seconds to wait for a release transaction to confirm.
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
}

impl ReleaserConfig {
    /// Sets the subgraph page size.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the chains.
    pub fn with_chains(self, chains: HashMap<ChainId, ChainConfig>) -> Self {
        Self { chains, ..self }
    }

    /// Sets the release-time cutoff operator.
    pub fn with_cutoff_op(mut self, cutoff_op: CutoffOp) -> Self {
        self.cutoff_op = cutoff_op;
        self
    }

    /// The confirmation wait as a [`Duration`].
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for ReleaserConfig {
    fn default() -> Self {
        Self {
            chains: Default::default(),
            page_size: DEFAULT_PAGE_SIZE,
            cutoff_op: CutoffOp::default(),
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
        }
    }
}

/// Chain configuration for individual chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// The RPC endpoint release transactions are sent to.
    pub endpoint: Url,
    /// The subgraph endpoint claims are queried from.
    pub subgraph: Url,
    /// The dropper factory exposing the batched release entry point.
    pub factory: Address,
    /// Dropper contracts known to be deployed on this chain.
    ///
    /// Contracts appearing in query results that are missing from this set
    /// are flagged but still released.
    #[serde(default)]
    pub droppers: Vec<Address>,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_confirmation_timeout() -> u64 {
    DEFAULT_CONFIRMATION_TIMEOUT_SECS
}
