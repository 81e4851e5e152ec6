//! Wallet balance fetching across chains.
//!
//! This crate turns on-chain reads into normalized balance records:
//! - [`registry`]: the tracked-contract collaborator and an in-memory implementation
//! - [`decimals`]: resolves missing `decimals()` values and writes them back
//! - [`normalize`]: raw balance + decimals → display string and 18-decimal value
//! - [`fetcher`]: native and ERC-20 balances for one wallet over many chains

pub mod decimals;
pub mod fetcher;
pub mod normalize;
pub mod registry;

#[cfg(test)]
mod test_utils;

use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use config::Chain;
use multicall::{Aggregator, RpcChain};
use std::{future::Future, time::Duration};
use thiserror::Error;

pub use decimals::{resolve_decimals_for_chains, DecimalsReport, DecimalsResolver};
pub use fetcher::{BalanceFetcher, BatchStats, ChainBalances, ChainFailure, PartialResult};
pub use normalize::{NormalizedBalanceRecord, RawBalanceRecord};
pub use registry::{ContractId, ContractRef, ContractRegistry, InMemoryContractRegistry};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No RPC endpoint was configured for the chain
    #[error("No RPC endpoint configured for chain {0}")]
    Unconfigured(Chain),

    /// A direct RPC read failed
    #[error("RPC error on {chain}: {reason}")]
    Rpc { chain: Chain, reason: String },

    /// The contract registry could not be read
    #[error("Contract registry error for {chain}: {reason}")]
    Registry { chain: Chain, reason: String },

    /// The whole request ran past its deadline
    #[error("Balance request exceeded its {0:?} deadline")]
    Deadline(Duration),
}

/// A chain connection that can serve both multicall batches and direct
/// native balance reads.
pub trait BalanceSource: Aggregator {
    fn native_balance(&self, holder: Address) -> impl Future<Output = eyre::Result<U256>> + Send;
}

impl<P: Provider> BalanceSource for RpcChain<P> {
    async fn native_balance(&self, holder: Address) -> eyre::Result<U256> {
        Self::native_balance(self, holder).await
    }
}
