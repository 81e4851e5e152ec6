pub mod config;
pub mod metrics;

use crate::metrics::Metrics;
use ::config::{Chain, FetchTuning, RpcConfig};
use alloy_primitives::Address;
use alloy_provider::DynProvider;
use balance::{
    BalanceFetcher, BalanceSource, ChainFailure, ContractRegistry, NormalizedBalanceRecord,
    PartialResult,
};
use client::{ChainRegistry, ClientError};
use ledger::{reconcile, FetchedBalance, LedgerStore, ReconciliationDiff};
use multicall::RpcChain;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Live per-chain sources.
pub type RpcSources = ChainRegistry<RpcChain<DynProvider>>;

/// Connect to every configured chain and check each connection once.
///
/// Unhealthy chains stay registered.
pub async fn connect_sources(rpc: &RpcConfig, tuning: &FetchTuning) -> eyre::Result<RpcSources> {
    let providers = ChainRegistry::connect(rpc)?;

    for (chain, healthy) in providers.health_check().await {
        if !healthy {
            warn!(chain = %chain, "Chain kept for best-effort use");
        }
    }

    let timeout = tuning.rpc_timeout();
    Ok(providers.map(|chain, provider| RpcChain::new(chain, provider.clone(), timeout)))
}

/// Chains to query.
///
/// No explicit selection means every configured chain. An explicitly
/// requested chain without an endpoint is an error. Repeats are dropped.
pub fn select_chains<S>(
    requested: &[Chain],
    sources: &ChainRegistry<S>,
) -> Result<Vec<Chain>, ClientError> {
    if requested.is_empty() {
        return Ok(sources.chains().collect());
    }

    let chains = Chain::dedup(requested);
    for &chain in &chains {
        sources.get(chain)?;
    }
    Ok(chains)
}

/// Fetch a wallet's balances and record metrics.
pub async fn fetch_wallet_balances<S, R>(
    fetcher: &BalanceFetcher<'_, S, R>,
    wallet: Address,
    chains: &[Chain],
    metrics: &Metrics,
) -> eyre::Result<PartialResult<NormalizedBalanceRecord>>
where
    S: BalanceSource,
    R: ContractRegistry,
{
    let started = Instant::now();

    match fetcher.fetch_all(wallet, chains).await {
        Ok(result) => {
            metrics.record_fetch(&result, chains, started.elapsed());
            info!(
                wallet = %wallet,
                balances = result.items.len(),
                skipped_chains = result.failures.len(),
                "Fetched wallet balances"
            );
            Ok(result)
        }
        Err(e) => {
            metrics.record_fetch_failure(started.elapsed());
            Err(e.into())
        }
    }
}

/// Reconciliation outcome for one wallet.
#[derive(Debug, Clone, Serialize)]
pub struct WalletReconciliation {
    pub diffs: Vec<ReconciliationDiff>,
    /// Chains not reconciled because their balances could not be fetched
    pub skipped: Vec<ChainFailure>,
}

/// Fetch fresh balances and diff them against the stored ledger.
///
/// Only chains that were actually fetched are compared, so a skipped chain
/// never reads as a full withdrawal.
pub async fn reconcile_wallet<S, R, L>(
    fetcher: &BalanceFetcher<'_, S, R>,
    ledger: &L,
    wallet: Address,
    wallet_id: &str,
    chains: &[Chain],
    metrics: &Metrics,
) -> eyre::Result<WalletReconciliation>
where
    S: BalanceSource,
    R: ContractRegistry,
    L: LedgerStore,
{
    let fetched = fetch_wallet_balances(fetcher, wallet, chains, metrics).await?;
    let mut diffs = Vec::new();

    for chain in Chain::dedup(chains) {
        if fetched.failures.iter().any(|f| f.chain == chain) {
            continue;
        }

        let stored = ledger.get_stored_balances(wallet_id, chain).await?;
        let fresh: Vec<FetchedBalance> = fetched
            .items
            .iter()
            .filter(|r| r.network() == chain)
            .map(FetchedBalance::from)
            .collect();

        diffs.extend(reconcile(&stored, &fresh));
    }

    let new = diffs.iter().filter(|d| d.is_new).count();
    metrics.record_diffs(new, diffs.len() - new);
    info!(wallet_id, new, changed = diffs.len() - new, "Reconciled wallet");

    Ok(WalletReconciliation {
        diffs,
        skipped: fetched.failures,
    })
}

/// Apply diffs in order, stopping at the first rejected one.
///
/// Holdings of contracts missing from the registry cannot be stored and are
/// skipped. Returns the number of diffs applied.
pub async fn apply_diffs<L: LedgerStore>(
    ledger: &L,
    wallet_id: &str,
    diffs: &[ReconciliationDiff],
) -> eyre::Result<usize> {
    let mut applied = 0;

    for diff in diffs {
        if diff.contract_id.is_none() {
            warn!(
                network = %diff.network,
                contract = %diff.contract_address,
                "Skipping untracked holding"
            );
            continue;
        }
        ledger.apply_diff(wallet_id, diff).await?;
        applied += 1;
    }

    info!(wallet_id, applied, "Applied reconciliation diffs");
    Ok(applied)
}
