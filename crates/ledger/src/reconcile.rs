use crate::{FetchedBalance, StoredBalanceEntry};
use alloy_primitives::Address;
use amount::HexBalance;
use balance::ContractId;
use config::Chain;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A stored balance that no longer matches the chain, or a new holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationDiff {
    pub network: Chain,
    pub contract_address: Address,
    pub contract_id: Option<ContractId>,
    pub stored_balance: HexBalance,
    pub fetched_balance: HexBalance,
    /// `fetched_balance - stored_balance`
    pub delta: HexBalance,
    /// No stored entry existed
    pub is_new: bool,
}

type Key = (Chain, Address);

/// Compare stored entries with fetched balances.
///
/// Entries are matched by `(network, contract_address)` and compared as exact
/// integers. Matching entries produce nothing. A stored entry with no fetched
/// counterpart is treated as fetched zero. Diffs for stored entries come
/// first in stored order, then new holdings in fetched order.
pub fn reconcile(
    stored: &[StoredBalanceEntry],
    fetched: &[FetchedBalance],
) -> Vec<ReconciliationDiff> {
    let fetched_by_key: HashMap<Key, &FetchedBalance> = fetched
        .iter()
        .map(|f| ((f.network, f.contract_address), f))
        .collect();
    let stored_keys: HashSet<Key> = stored
        .iter()
        .map(|s| (s.network, s.contract_address))
        .collect();

    let mut diffs = Vec::new();

    for entry in stored {
        let key = (entry.network, entry.contract_address);
        let fetched_balance = match fetched_by_key.get(&key) {
            Some(f) if f.balance == entry.balance => continue,
            Some(f) => f.balance.clone(),
            None => HexBalance::zero(),
        };

        diffs.push(ReconciliationDiff {
            network: entry.network,
            contract_address: entry.contract_address,
            contract_id: Some(entry.contract_id.clone()),
            delta: &fetched_balance - &entry.balance,
            stored_balance: entry.balance.clone(),
            fetched_balance,
            is_new: false,
        });
    }

    let mut seen = HashSet::new();
    for f in fetched {
        let key = (f.network, f.contract_address);
        if stored_keys.contains(&key) || !seen.insert(key) {
            continue;
        }
        // Last fetched value wins for duplicate keys
        let latest = fetched_by_key.get(&key).copied().unwrap_or(f);

        diffs.push(ReconciliationDiff {
            network: latest.network,
            contract_address: latest.contract_address,
            contract_id: latest.contract_id.clone(),
            stored_balance: HexBalance::zero(),
            fetched_balance: latest.balance.clone(),
            delta: latest.balance.clone(),
            is_new: true,
        });
    }

    diffs
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT_A: Address = Address::repeat_byte(0x0a);
    const CONTRACT_B: Address = Address::repeat_byte(0x0b);
    const CONTRACT_C: Address = Address::repeat_byte(0x0c);

    fn hex(value: &str) -> HexBalance {
        HexBalance::parse(value).unwrap()
    }

    fn stored(address: Address, balance: &str) -> StoredBalanceEntry {
        StoredBalanceEntry {
            contract_id: ContractId(format!("{address:#x}")),
            network: Chain::Ethereum,
            contract_address: address,
            balance: hex(balance),
        }
    }

    fn fetched(address: Address, balance: &str) -> FetchedBalance {
        FetchedBalance {
            contract_id: Some(ContractId(format!("{address:#x}"))),
            network: Chain::Ethereum,
            contract_address: address,
            balance: hex(balance),
        }
    }

    #[test]
    fn test_changed_balance() {
        let diffs = reconcile(&[stored(CONTRACT_A, "0x64")], &[fetched(CONTRACT_A, "0xc8")]);

        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].delta, hex("0x64"));
        assert_eq!(diffs[0].delta, HexBalance::from(100u64));
        assert_eq!(diffs[0].stored_balance, hex("0x64"));
        assert_eq!(diffs[0].fetched_balance, hex("0xc8"));
        assert!(!diffs[0].is_new);
    }

    #[test]
    fn test_new_holding() {
        let diffs = reconcile(&[], &[fetched(CONTRACT_B, "0x32")]);

        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].is_new);
        assert_eq!(diffs[0].stored_balance.to_hex(), "0x0");
        assert_eq!(diffs[0].delta, hex("0x32"));
    }

    #[test]
    fn test_unchanged_balance_omitted() {
        let diffs = reconcile(&[stored(CONTRACT_C, "0x10")], &[fetched(CONTRACT_C, "0x10")]);
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_comparison_is_numeric() {
        let diffs = reconcile(
            &[stored(CONTRACT_C, "0x00010")],
            &[fetched(CONTRACT_C, "10")],
        );
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_missing_fetch_is_full_withdrawal() {
        let diffs = reconcile(&[stored(CONTRACT_A, "0x64")], &[]);

        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].fetched_balance, HexBalance::zero());
        assert_eq!(diffs[0].delta.to_hex(), "-0x64");
        assert!(diffs[0].delta.is_negative());
    }

    #[test]
    fn test_same_address_on_other_chain_is_distinct() {
        let mut on_base = fetched(CONTRACT_A, "0x64");
        on_base.network = Chain::Base;

        let diffs = reconcile(&[stored(CONTRACT_A, "0x64")], &[on_base]);

        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].network, Chain::Ethereum);
        assert!(!diffs[0].is_new);
        assert_eq!(diffs[1].network, Chain::Base);
        assert!(diffs[1].is_new);
    }

    #[test]
    fn test_output_order() {
        let diffs = reconcile(
            &[stored(CONTRACT_C, "0x1"), stored(CONTRACT_A, "0x1")],
            &[
                fetched(CONTRACT_B, "0x5"),
                fetched(CONTRACT_A, "0x2"),
                fetched(CONTRACT_C, "0x3"),
            ],
        );

        let order: Vec<Address> = diffs.iter().map(|d| d.contract_address).collect();
        assert_eq!(order, vec![CONTRACT_C, CONTRACT_A, CONTRACT_B]);
    }
}
