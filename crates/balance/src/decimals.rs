//! Resolves `decimals()` for tracked contracts that do not have it yet.
//!
//! Resolution is attempted once per run. Contracts whose call reverted, failed
//! to decode, or sat in a failed batch stay unresolved until the next run.

use crate::registry::{ContractRef, ContractRegistry};
use binding::token::IERC20;
use client::ChainRegistry;
use config::{Chain, FetchTuning};
use futures_util::future::join_all;
use multicall::{Aggregator, BatchConfig, LeafCall, MulticallExecutor};
use tracing::{error, info, warn};

/// Outcome of resolving one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecimalsReport {
    /// Contracts that needed resolving
    pub pending: usize,
    /// Values read and written back
    pub resolved: usize,
    /// Left for a future run
    pub unresolved: usize,
    pub failed_batches: usize,
}

/// Resolves decimals for one chain.
pub struct DecimalsResolver<'a, A, R> {
    aggregator: &'a A,
    contracts: &'a R,
    config: BatchConfig,
}

impl<'a, A, R> DecimalsResolver<'a, A, R>
where
    A: Aggregator,
    R: ContractRegistry,
{
    pub const fn new(aggregator: &'a A, contracts: &'a R, config: BatchConfig) -> Self {
        Self {
            aggregator,
            contracts,
            config,
        }
    }

    pub async fn resolve(&self) -> eyre::Result<DecimalsReport> {
        let chain = self.aggregator.chain();
        let pending: Vec<ContractRef> = self
            .contracts
            .find_contracts_by_chain(chain.platform_id())
            .await?
            .into_iter()
            .filter(|c| c.decimals.is_none() && !c.is_native())
            .collect();

        if pending.is_empty() {
            info!(chain = %chain, "No tokens requiring decimals update");
            return Ok(DecimalsReport::default());
        }

        info!(chain = %chain, tokens = pending.len(), "Resolving token decimals");

        let calls: Vec<LeafCall<IERC20::decimalsCall>> = pending
            .iter()
            .map(|c| LeafCall::new(c.contract_address, IERC20::decimalsCall {}))
            .collect();
        let results = MulticallExecutor::new(self.aggregator, self.config)
            .execute(&calls)
            .await;
        let failed_batches = results.failed_batches();

        let writes = results.into_decoded().map(|(index, decimals)| {
            let contract = &pending[index];
            async move {
                match self.contracts.update_decimals(&contract.id, decimals).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            chain = %chain,
                            contract = %contract.contract_address,
                            error = %e,
                            "Failed to store resolved decimals"
                        );
                        false
                    }
                }
            }
        });
        let resolved = join_all(writes).await.into_iter().filter(|ok| *ok).count();

        let report = DecimalsReport {
            pending: pending.len(),
            resolved,
            unresolved: pending.len() - resolved,
            failed_batches,
        };
        info!(
            chain = %chain,
            resolved = report.resolved,
            unresolved = report.unresolved,
            "Updated token decimals"
        );

        Ok(report)
    }
}

/// Resolve decimals on each chain in turn.
///
/// Chains are independent: an unconfigured or failing chain is logged and
/// skipped. Returns a report for every chain that ran.
pub async fn resolve_decimals_for_chains<A, R>(
    sources: &ChainRegistry<A>,
    contracts: &R,
    tuning: &FetchTuning,
    chains: &[Chain],
) -> Vec<(Chain, DecimalsReport)>
where
    A: Aggregator,
    R: ContractRegistry,
{
    let config = BatchConfig::decimals(tuning);
    let mut reports = Vec::with_capacity(chains.len());

    for &chain in chains {
        let aggregator = match sources.get(chain) {
            Ok(aggregator) => aggregator,
            Err(e) => {
                warn!(chain = %chain, error = %e, "Skipping chain");
                continue;
            }
        };

        match DecimalsResolver::new(aggregator, contracts, config)
            .resolve()
            .await
        {
            Ok(report) => reports.push((chain, report)),
            Err(e) => error!(chain = %chain, error = %e, "Failed to resolve decimals"),
        }
    }

    reports
}
