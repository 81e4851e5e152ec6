//! RPC connections for every configured chain.
//!
//! - [`create_provider`]: one HTTP provider per endpoint URL
//! - [`ChainRegistry`]: fixed per-chain table of connections, built once at startup

mod registry;

use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use config::Chain;
pub use registry::ChainRegistry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// No RPC endpoint was supplied for the chain
    #[error("No RPC endpoint configured for chain {0}")]
    UnconfiguredChain(Chain),

    /// Error connecting to the RPC endpoint
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Convenience function to create an ethereum rpc provider from url.
pub fn create_provider(rpc_url: &str) -> Result<DynProvider, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider.erased())
}
