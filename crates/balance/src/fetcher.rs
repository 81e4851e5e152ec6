//! Native and ERC-20 balances for one wallet across chains.

use crate::{
    decimals::DecimalsResolver,
    normalize::{NormalizedBalanceRecord, RawBalanceRecord},
    registry::ContractRegistry,
    BalanceSource, FetchError,
};
use alloy_primitives::Address;
use amount::{HexBalance, NORMALIZED_DECIMALS};
use binding::token::IERC20;
use client::ChainRegistry;
use config::{Chain, FailurePolicy, FetchTuning, NATIVE_TOKEN};
use multicall::{BatchConfig, LeafCall, MulticallExecutor};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// A chain left out of a multi-chain result, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainFailure {
    pub chain: Chain,
    pub reason: String,
}

/// Multicall failures absorbed while producing a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub failed_batches: usize,
    pub decode_failures: usize,
}

impl BatchStats {
    fn merge(&mut self, other: Self) {
        self.failed_batches += other.failed_batches;
        self.decode_failures += other.decode_failures;
    }
}

/// Items gathered across chains, plus the chains that were skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialResult<T> {
    pub items: Vec<T>,
    pub failures: Vec<ChainFailure>,
    pub stats: BatchStats,
}

impl<T> Default for PartialResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
            stats: BatchStats::default(),
        }
    }
}

impl<T> PartialResult<T> {
    /// True when every requested chain contributed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Non-zero balances found on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBalances {
    pub chain: Chain,
    /// Native balance first, then tokens in registry order
    pub records: Vec<NormalizedBalanceRecord>,
    /// Tokens skipped because their decimals are unknown
    pub skipped_unresolved: usize,
    pub stats: BatchStats,
}

/// Fetches wallet balances through a table of per-chain sources.
pub struct BalanceFetcher<'a, S, R> {
    sources: &'a ChainRegistry<S>,
    contracts: &'a R,
    tuning: FetchTuning,
    resolve_decimals: bool,
}

impl<'a, S, R> BalanceFetcher<'a, S, R>
where
    S: BalanceSource,
    R: ContractRegistry,
{
    pub const fn new(
        sources: &'a ChainRegistry<S>,
        contracts: &'a R,
        tuning: FetchTuning,
    ) -> Self {
        Self {
            sources,
            contracts,
            tuning,
            resolve_decimals: false,
        }
    }

    /// Resolve missing decimals on each chain before reading token balances.
    pub const fn with_decimals_resolution(mut self, enabled: bool) -> Self {
        self.resolve_decimals = enabled;
        self
    }

    /// Balances on one chain.
    ///
    /// The native balance is read directly, then `balanceOf` runs in
    /// multicall batches for every tracked token with known decimals.
    /// Zero balances are dropped.
    pub async fn fetch_chain(
        &self,
        chain: Chain,
        wallet: Address,
    ) -> Result<ChainBalances, FetchError> {
        let source = self
            .sources
            .get(chain)
            .map_err(|_| FetchError::Unconfigured(chain))?;

        let native = source
            .native_balance(wallet)
            .await
            .map_err(|e| FetchError::Rpc {
                chain,
                reason: format!("{e:#}"),
            })?;

        if self.resolve_decimals {
            let config = BatchConfig::decimals(&self.tuning);
            if let Err(e) = DecimalsResolver::new(source, self.contracts, config)
                .resolve()
                .await
            {
                warn!(chain = %chain, error = %e, "Decimals resolution failed");
            }
        }

        let contracts = self
            .contracts
            .find_contracts_by_chain(chain.platform_id())
            .await
            .map_err(|e| FetchError::Registry {
                chain,
                reason: format!("{e:#}"),
            })?;

        info!(chain = %chain, tokens = contracts.len(), "Fetching balances");

        let mut records = Vec::new();
        if !native.is_zero() {
            let contract_id = contracts
                .iter()
                .find(|c| c.is_native())
                .map(|c| c.id.clone());
            records.push(
                RawBalanceRecord {
                    contract_id,
                    contract_address: NATIVE_TOKEN,
                    raw_balance: HexBalance::from(native),
                    decimals: NORMALIZED_DECIMALS,
                    network: chain,
                }
                .normalize(),
            );
        }

        let (tokens, unresolved): (Vec<_>, Vec<_>) = contracts
            .iter()
            .filter(|c| !c.is_native())
            .partition(|c| c.decimals.is_some());
        if !unresolved.is_empty() {
            debug!(
                chain = %chain,
                count = unresolved.len(),
                "Skipping tokens with unknown decimals"
            );
        }

        let calls: Vec<LeafCall<IERC20::balanceOfCall>> = tokens
            .iter()
            .map(|c| {
                LeafCall::new(
                    c.contract_address,
                    IERC20::balanceOfCall { account: wallet },
                )
            })
            .collect();
        let results = MulticallExecutor::new(source, BatchConfig::balances(&self.tuning))
            .execute(&calls)
            .await;
        let stats = BatchStats {
            failed_batches: results.failed_batches(),
            decode_failures: results.decode_failures(),
        };

        for (index, balance) in results.into_decoded() {
            if balance.is_zero() {
                continue;
            }
            let contract = tokens[index];
            records.push(
                RawBalanceRecord {
                    contract_id: Some(contract.id.clone()),
                    contract_address: contract.contract_address,
                    raw_balance: HexBalance::from(balance),
                    decimals: contract.decimals.unwrap_or(NORMALIZED_DECIMALS),
                    network: chain,
                }
                .normalize(),
            );
        }

        info!(chain = %chain, count = records.len(), "Found tokens with non-zero balance");

        Ok(ChainBalances {
            chain,
            records,
            skipped_unresolved: unresolved.len(),
            stats,
        })
    }

    /// Balances on every requested chain, in the order given. A chain listed
    /// more than once is fetched once.
    ///
    /// Unconfigured chains are always skipped and reported in
    /// [`PartialResult::failures`]. Other chain failures follow the configured
    /// [`FailurePolicy`]. The whole call is bounded by the request deadline.
    pub async fn fetch_all(
        &self,
        wallet: Address,
        chains: &[Chain],
    ) -> Result<PartialResult<NormalizedBalanceRecord>, FetchError> {
        let deadline = self.tuning.request_deadline();

        tokio::time::timeout(deadline, self.fetch_chains(wallet, chains))
            .await
            .map_err(|_| {
                error!(wallet = %wallet, ?deadline, "Balance request timed out");
                FetchError::Deadline(deadline)
            })?
    }

    async fn fetch_chains(
        &self,
        wallet: Address,
        chains: &[Chain],
    ) -> Result<PartialResult<NormalizedBalanceRecord>, FetchError> {
        let mut result = PartialResult::default();

        for chain in Chain::dedup(chains) {
            match self.fetch_chain(chain, wallet).await {
                Ok(balances) => {
                    result.items.extend(balances.records);
                    result.stats.merge(balances.stats);
                }
                Err(e @ FetchError::Unconfigured(_)) => {
                    warn!(chain = %chain, "Skipping chain without RPC endpoint");
                    result.failures.push(ChainFailure {
                        chain,
                        reason: e.to_string(),
                    });
                }
                Err(e) => match self.tuning.failure_policy {
                    FailurePolicy::FailFast => {
                        error!(chain = %chain, error = %e, "Balance fetch failed");
                        return Err(e);
                    }
                    FailurePolicy::BestEffort => {
                        warn!(chain = %chain, error = %e, "Balance fetch failed, skipping chain");
                        result.failures.push(ChainFailure {
                            chain,
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        Ok(result)
    }
}
