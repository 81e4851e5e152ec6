//! Balance normalization.
//!
//! Token balances carry their own decimals. Rescaling every balance to
//! [`NORMALIZED_DECIMALS`] makes them comparable and summable.

use crate::ContractId;
use alloy_primitives::Address;
use amount::{HexBalance, NORMALIZED_DECIMALS};
use config::Chain;
use serde::{Deserialize, Serialize};

/// A balance as read from chain, in the token's own decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBalanceRecord {
    /// Registry id, when the contract is tracked
    pub contract_id: Option<ContractId>,
    pub contract_address: Address,
    pub raw_balance: HexBalance,
    pub decimals: u8,
    pub network: Chain,
}

impl RawBalanceRecord {
    pub fn normalize(self) -> NormalizedBalanceRecord {
        let balance_decimal_string = self.raw_balance.format_units(self.decimals);
        let normalized_balance = self.raw_balance.normalize_to_18(self.decimals);

        NormalizedBalanceRecord {
            raw: self,
            balance_decimal_string,
            normalized_balance,
        }
    }
}

/// A raw record with its display string and 18-decimal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedBalanceRecord {
    #[serde(flatten)]
    pub raw: RawBalanceRecord,
    /// Human-readable amount, trailing zeros trimmed
    pub balance_decimal_string: String,
    /// `raw_balance` rescaled to [`NORMALIZED_DECIMALS`]
    pub normalized_balance: HexBalance,
}

impl NormalizedBalanceRecord {
    pub const fn network(&self) -> Chain {
        self.raw.network
    }

    pub const fn contract_address(&self) -> Address {
        self.raw.contract_address
    }

    pub const fn normalized_decimals(&self) -> u8 {
        NORMALIZED_DECIMALS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw: u64, decimals: u8) -> RawBalanceRecord {
        RawBalanceRecord {
            contract_id: None,
            contract_address: Address::repeat_byte(0x22),
            raw_balance: HexBalance::from(raw),
            decimals,
            network: Chain::Polygon,
        }
    }

    #[test]
    fn test_six_decimal_token() {
        let normalized = record(1_500_000, 6).normalize();

        assert_eq!(normalized.balance_decimal_string, "1.5");
        assert_eq!(
            normalized.normalized_balance,
            HexBalance::from(1_500_000_000_000_000_000u64)
        );
        assert_eq!(normalized.raw.raw_balance, HexBalance::from(1_500_000u64));
    }

    #[test]
    fn test_eighteen_decimals_unchanged() {
        let normalized = record(1_000_000_000_000_000_000, 18).normalize();

        assert_eq!(normalized.balance_decimal_string, "1");
        assert_eq!(normalized.normalized_balance, normalized.raw.raw_balance);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(record(255, 0).normalize()).unwrap();

        assert_eq!(json["raw_balance"], "0xff");
        assert_eq!(json["decimals"], 0);
        assert_eq!(json["network"], "polygon");
        assert_eq!(json["balance_decimal_string"], "255");
        assert_eq!(json["normalized_balance"], "0xdd2d5fcf3bc9c0000");
    }
}
