use crate::{LedgerError, LedgerStore, ReconciliationDiff, StoredBalanceEntry};
use amount::HexBalance;
use config::Chain;
use std::{cmp::Ordering, collections::BTreeMap};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Wallet id → stored entries.
pub type Wallets = BTreeMap<String, Vec<StoredBalanceEntry>>;

/// Ledger held in memory, e.g. loaded from and saved to a file.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    wallets: RwLock<Wallets>,
}

impl InMemoryLedger {
    pub fn new(wallets: Wallets) -> Self {
        Self {
            wallets: RwLock::new(wallets),
        }
    }

    pub async fn snapshot(&self) -> Wallets {
        self.wallets.read().await.clone()
    }

    /// Apply one diff to a wallet.
    ///
    /// A positive delta is a deposit: it adds to the existing entry or appends
    /// a new one. A negative delta is a withdrawal: it subtracts from the
    /// existing entry and removes it at zero. A zero delta changes nothing.
    /// A wallet is only created by a deposit that appends its first entry.
    pub async fn apply(
        &self,
        wallet_id: &str,
        diff: &ReconciliationDiff,
    ) -> Result<(), LedgerError> {
        let mut wallets = self.wallets.write().await;

        match diff.delta.cmp(&HexBalance::zero()) {
            Ordering::Equal => Ok(()),
            Ordering::Greater => deposit(&mut wallets, wallet_id, diff),
            Ordering::Less => withdraw(wallets.get_mut(wallet_id), diff),
        }
    }
}

fn holds(entry: &StoredBalanceEntry, diff: &ReconciliationDiff) -> bool {
    entry.network == diff.network && entry.contract_address == diff.contract_address
}

fn deposit(
    wallets: &mut Wallets,
    wallet_id: &str,
    diff: &ReconciliationDiff,
) -> Result<(), LedgerError> {
    let existing = wallets
        .get_mut(wallet_id)
        .and_then(|entries| entries.iter_mut().find(|e| holds(e, diff)));
    if let Some(entry) = existing {
        entry.balance = &entry.balance + &diff.delta;
        debug!(contract = %diff.contract_address, balance = %entry.balance, "Deposit applied");
        return Ok(());
    }

    let contract_id = diff
        .contract_id
        .clone()
        .ok_or(LedgerError::UntrackedContract {
            network: diff.network,
            contract_address: diff.contract_address,
        })?;

    wallets
        .entry(wallet_id.to_owned())
        .or_default()
        .push(StoredBalanceEntry {
            contract_id,
            network: diff.network,
            contract_address: diff.contract_address,
            balance: diff.delta.clone(),
        });
    info!(network = %diff.network, contract = %diff.contract_address, "New holding recorded");
    Ok(())
}

fn withdraw(
    entries: Option<&mut Vec<StoredBalanceEntry>>,
    diff: &ReconciliationDiff,
) -> Result<(), LedgerError> {
    let not_found = || LedgerError::ContractNotFound {
        network: diff.network,
        contract_address: diff.contract_address,
    };
    let entries = entries.ok_or_else(not_found)?;
    let index = entries
        .iter()
        .position(|e| holds(e, diff))
        .ok_or_else(not_found)?;

    let remaining = &entries[index].balance + &diff.delta;

    match remaining.cmp(&HexBalance::zero()) {
        Ordering::Less => Err(LedgerError::InsufficientBalance {
            network: diff.network,
            contract_address: diff.contract_address,
            balance: entries[index].balance.clone(),
            amount: -diff.delta.clone(),
        }),
        Ordering::Equal => {
            entries.remove(index);
            info!(network = %diff.network, contract = %diff.contract_address, "Holding removed");
            Ok(())
        }
        Ordering::Greater => {
            debug!(contract = %diff.contract_address, balance = %remaining, "Withdrawal applied");
            entries[index].balance = remaining;
            Ok(())
        }
    }
}

impl LedgerStore for InMemoryLedger {
    async fn get_stored_balances(
        &self,
        wallet_id: &str,
        chain: Chain,
    ) -> eyre::Result<Vec<StoredBalanceEntry>> {
        let wallets = self.wallets.read().await;
        Ok(wallets
            .get(wallet_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.network == chain)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn apply_diff(&self, wallet_id: &str, diff: &ReconciliationDiff) -> eyre::Result<()> {
        self.apply(wallet_id, diff).await?;
        Ok(())
    }
}
