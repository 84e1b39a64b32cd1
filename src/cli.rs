//! # Releaser CLI
use crate::{
    chains::Chains,
    config::ReleaserConfig,
    error::ReleaserError,
    orchestrator::{Orchestrator, RunReport},
    subgraph::SubgraphClient,
    submit::ReleaseSubmitter,
};
use alloy::{primitives::ChainId, signers::local::PrivateKeySigner};
use clap::Parser;
use eyre::{Context, eyre};
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// The releaser discovers airdrop claims whose release time has passed and
/// submits batched release transactions. One invocation performs one bounded
/// run per requested chain; schedule it externally.
#[derive(Debug, Parser)]
#[command(author, about = "Releaser", long_about = None)]
pub struct Args {
    /// The configuration file.
    #[arg(
        long,
        value_name = "CONFIG",
        env = "RELEASER_CONFIG",
        default_value = "releaser.yaml"
    )]
    pub config: PathBuf,
    /// A chain to release airdrops on. May be repeated; chains are driven
    /// independently and one chain's failure does not abort the others.
    #[arg(long = "chain", value_name = "CHAIN_ID", required = true)]
    pub chains: Vec<ChainId>,
    /// Overrides the configured subgraph page size.
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<u64>,
    /// The secret key to sign release transactions with.
    #[arg(long, value_name = "SECRET_KEY", env = "RELEASER_SK")]
    pub secret_key: String,
}

impl Args {
    /// Run a release pass over the requested chains.
    pub async fn run(self) -> eyre::Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .init();

        let mut config = ReleaserConfig::load_from_file(&self.config)?;
        if let Some(page_size) = self.page_size {
            config = config.with_page_size(page_size);
        }

        let signer = self
            .secret_key
            .parse::<PrivateKeySigner>()
            .wrap_err("failed to parse release signer key")?;
        let chains = Chains::new(&config, signer);

        let runs = futures_util::future::join_all(self.chains.iter().map(|&chain_id| {
            let chains = &chains;
            let config = &config;
            async move { (chain_id, run_chain(chain_id, chains, config).await) }
        }))
        .await;

        let mut failures = 0usize;
        for (chain_id, result) in runs {
            match result {
                Ok(report) if report.outcome.is_success() => {
                    info!(
                        chain = %chain_id,
                        pages = report.pages_released,
                        claims = report.claims_released,
                        "run completed"
                    );
                }
                Ok(report) => {
                    error!(
                        chain = %chain_id,
                        cursor = report.cursor,
                        outcome = ?report.outcome,
                        "run stopped with failure"
                    );
                    failures += 1;
                }
                Err(err) => {
                    error!(chain = %chain_id, %err, "run aborted");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            return Err(eyre!("{failures} of {} chain runs failed", self.chains.len()));
        }
        Ok(())
    }
}

/// Performs one bounded release run for a single chain.
async fn run_chain(
    chain_id: ChainId,
    chains: &Chains,
    config: &ReleaserConfig,
) -> Result<RunReport, ReleaserError> {
    let chain = chains.get(chain_id).ok_or(ReleaserError::UnsupportedChain(chain_id))?;

    let indexer = SubgraphClient::new(chain.subgraph.clone(), config.cutoff_op);
    let submitter = ReleaseSubmitter::new(
        chain.provider.clone(),
        chain.factory,
        config.confirmation_timeout(),
    );
    let orchestrator =
        Orchestrator::new(chain.chain_id, chain.droppers, indexer, submitter, config.page_size);

    Ok(orchestrator.run().await)
}
