//! # Releaser
//!
//! Library for the dropper airdrop release orchestrator.

pub mod aggregate;
pub mod chains;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod serde;
pub mod subgraph;
pub mod submit;
pub mod types;
