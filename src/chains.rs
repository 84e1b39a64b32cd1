//! A registry of supported chains.
use crate::config::ReleaserConfig;
use alloy::{
    network::EthereumWallet,
    primitives::{Address, ChainId},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use std::collections::HashMap;
use url::Url;

/// A single supported chain.
#[derive(Debug, Clone)]
pub struct Chain {
    /// The chain ID.
    pub chain_id: ChainId,
    /// Provider for the chain, with the release signer attached.
    pub provider: DynProvider,
    /// Subgraph endpoint for the chain's dropper contracts.
    pub subgraph: Url,
    /// The dropper factory exposing the batched release entry point.
    pub factory: Address,
    /// Dropper contracts known to be deployed on this chain.
    pub droppers: Vec<Address>,
}

/// A collection of supported chains, loaded once at process start.
///
/// Registry entries are immutable; concurrently running chain tasks only
/// ever read them.
#[derive(Clone)]
pub struct Chains {
    chains: HashMap<ChainId, Chain>,
}

impl Chains {
    /// Creates a new instance of [`Chains`] from the configured chain set,
    /// wiring one provider per chain with the given release signer.
    pub fn new(config: &ReleaserConfig, signer: PrivateKeySigner) -> Self {
        let wallet = EthereumWallet::from(signer);
        let chains = config
            .chains
            .iter()
            .map(|(chain_id, chain_config)| {
                let provider = ProviderBuilder::new()
                    .wallet(wallet.clone())
                    .connect_http(chain_config.endpoint.clone())
                    .erased();
                (
                    *chain_id,
                    Chain {
                        chain_id: *chain_id,
                        provider,
                        subgraph: chain_config.subgraph.clone(),
                        factory: chain_config.factory,
                        droppers: chain_config.droppers.clone(),
                    },
                )
            })
            .collect();

        Self { chains }
    }

    /// Get a chain for a given chain ID.
    pub fn get(&self, chain_id: ChainId) -> Option<Chain> {
        self.chains.get(&chain_id).cloned()
    }

    /// Get an iterator over the supported chain IDs.
    pub fn chain_ids_iter(&self) -> impl Iterator<Item = &ChainId> {
        self.chains.keys()
    }
}

impl std::fmt::Debug for Chains {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chains").field("chains", &self.chains.keys()).finish()
    }
}
