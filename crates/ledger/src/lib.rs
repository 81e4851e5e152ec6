//! Stored wallet balances and reconciliation against fresh on-chain reads.
//!
//! [`reconcile`] only computes differences. Applying them is up to the
//! [`LedgerStore`] that owns the stored balances.

pub mod reconcile;
pub mod store;

use alloy_primitives::Address;
use amount::HexBalance;
use balance::{ContractId, NormalizedBalanceRecord};
use config::Chain;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

pub use reconcile::{reconcile, ReconciliationDiff};
pub use store::{InMemoryLedger, Wallets};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A withdrawal would take the stored balance below zero
    #[error("Insufficient balance for {contract_address} on {network}: have {balance}, withdrawing {amount}")]
    InsufficientBalance {
        network: Chain,
        contract_address: Address,
        balance: HexBalance,
        amount: HexBalance,
    },

    /// A withdrawal names a contract the wallet holds no entry for
    #[error("No stored balance for {contract_address} on {network}")]
    ContractNotFound {
        network: Chain,
        contract_address: Address,
    },

    /// A deposit names a contract that is not in the contract registry
    #[error("Contract {contract_address} on {network} is not tracked")]
    UntrackedContract {
        network: Chain,
        contract_address: Address,
    },
}

/// One tracked contract's balance inside a wallet's persisted ledger.
///
/// Balances are stored at 18 decimals, the same scale as
/// [`NormalizedBalanceRecord::normalized_balance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBalanceEntry {
    pub contract_id: ContractId,
    pub network: Chain,
    pub contract_address: Address,
    pub balance: HexBalance,
}

/// A freshly fetched balance, keyed the same way as stored entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBalance {
    pub contract_id: Option<ContractId>,
    pub network: Chain,
    pub contract_address: Address,
    pub balance: HexBalance,
}

impl From<&NormalizedBalanceRecord> for FetchedBalance {
    fn from(record: &NormalizedBalanceRecord) -> Self {
        Self {
            contract_id: record.raw.contract_id.clone(),
            network: record.raw.network,
            contract_address: record.raw.contract_address,
            balance: record.normalized_balance.clone(),
        }
    }
}

/// Persisted per-wallet balances, owned by surrounding application code.
pub trait LedgerStore: Send + Sync {
    /// Stored entries of one wallet on one chain.
    fn get_stored_balances(
        &self,
        wallet_id: &str,
        chain: Chain,
    ) -> impl Future<Output = eyre::Result<Vec<StoredBalanceEntry>>> + Send;

    /// Apply a diff with deposit/withdrawal semantics.
    fn apply_diff(
        &self,
        wallet_id: &str,
        diff: &ReconciliationDiff,
    ) -> impl Future<Output = eyre::Result<()>> + Send;
}
