//! String-level balance helpers.
//!
//! Ledger documents and API payloads carry balances as strings. These helpers
//! parse, operate and re-serialize in one step so callers never touch the
//! integer type. Every helper fails with [`ParseError`] on malformed input
//! instead of coercing it to zero.

use crate::{HexBalance, ParseError};
use num_bigint::BigInt;

/// Parse a hex integer string, `0x` prefix optional. Empty input is zero.
pub fn parse(value: &str) -> Result<BigInt, ParseError> {
    HexBalance::parse(value).map(HexBalance::into_bigint)
}

/// Canonical `0x`/`-0x` serialization.
pub fn to_hex(value: &BigInt) -> String {
    HexBalance::from(value.clone()).to_hex()
}

/// Scale a decimal string by `10^decimals` and return it as hex.
pub fn from_decimal_string(value: &str, decimals: u8) -> Result<String, ParseError> {
    HexBalance::from_decimal_str(value, decimals).map(|balance| balance.to_hex())
}

/// Render a raw balance as a trimmed decimal string.
pub fn format_token_balance(raw: &str, decimals: u8) -> Result<String, ParseError> {
    Ok(HexBalance::parse(raw)?.format_units(decimals))
}

/// `a + b`. Both operands share one precision, so the sum is taken on the raw
/// integers and stays at that precision.
pub fn add_hex_balances(a: &str, b: &str) -> Result<String, ParseError> {
    let sum = &HexBalance::parse(a)? + &HexBalance::parse(b)?;
    Ok(sum.to_hex())
}

/// `a - b`. May be negative; check [`is_negative`] before storing the result.
pub fn sub_hex_balances(a: &str, b: &str) -> Result<String, ParseError> {
    let difference = &HexBalance::parse(a)? - &HexBalance::parse(b)?;
    Ok(difference.to_hex())
}

/// Rescale to 18 decimals. At 18 decimals the input string is returned as is.
pub fn normalize_to_18_decimals(raw: &str, decimals: u8) -> Result<String, ParseError> {
    let balance = HexBalance::parse(raw)?;
    if decimals == crate::NORMALIZED_DECIMALS {
        return Ok(raw.to_owned());
    }
    Ok(balance.normalize_to_18(decimals).to_hex())
}

pub fn is_zero(value: &str) -> Result<bool, ParseError> {
    HexBalance::parse(value).map(|balance| balance.is_zero())
}

/// Sign-magnitude only: `-0x...` is negative, `0xff...` is not.
pub fn is_negative(value: &str) -> Result<bool, ParseError> {
    HexBalance::parse(value).map(|balance| balance.is_negative())
}

pub fn is_zero_or_negative(value: &str) -> Result<bool, ParseError> {
    HexBalance::parse(value).map(|balance| balance.is_zero_or_negative())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_values() {
        assert_eq!(from_decimal_string("1", 18).unwrap(), "0xde0b6b3a7640000");
        assert_eq!(
            parse(&from_decimal_string("1.5", 18).unwrap()).unwrap(),
            BigInt::from(1_500_000_000_000_000_000u64)
        );
        assert_eq!(
            normalize_to_18_decimals(&to_hex(&BigInt::from(1_000_000u32)), 6).unwrap(),
            to_hex(&BigInt::from(10u8).pow(18))
        );
    }

    #[test]
    fn test_normalize_returns_input_unchanged_at_18() {
        let padded = "0x0000000000000000000000000000000000000000000000000de0b6b3a7640000";
        assert_eq!(normalize_to_18_decimals(padded, 18).unwrap(), padded);
        assert!(normalize_to_18_decimals("0xnothex", 18).is_err());
    }

    #[test]
    fn test_add_and_sub() {
        let one = "0x0000000000000000000000000000000000000000000000000de0b6b3a7640000";
        let half = "0x00000000000000000000000000000000000000000000000006f05b59d3b20000";

        let sum = add_hex_balances(one, half).unwrap();
        assert_eq!(format_token_balance(&sum, 18).unwrap(), "1.5");

        let back = sub_hex_balances(&sum, half).unwrap();
        assert_eq!(parse(&back).unwrap(), parse(one).unwrap());

        let remaining = sub_hex_balances("0x0de0b6b3a7640000", "0x00c62a36cfe0d515").unwrap();
        assert_eq!(
            format_token_balance(&remaining, 18).unwrap(),
            "0.944221539707071211"
        );

        assert_eq!(add_hex_balances("", "0x0").unwrap(), "0x0");
    }

    #[test]
    fn test_sign_follows_exact_difference() {
        let cases = [("0x10", "0x20", true), ("0x20", "0x10", false), ("0x10", "0x10", false)];
        for (a, b, negative) in cases {
            let difference = sub_hex_balances(a, b).unwrap();
            assert_eq!(is_negative(&difference).unwrap(), negative, "{a} - {b}");
        }
        assert_eq!(sub_hex_balances("0x10", "0x20").unwrap(), "-0x10");
    }

    #[test]
    fn test_predicates() {
        assert!(is_zero("").unwrap());
        assert!(is_zero("0x0").unwrap());
        assert!(is_zero("0").unwrap());
        assert!(is_zero_or_negative("0x0").unwrap());
        assert!(is_zero_or_negative("-0x1").unwrap());
        assert!(!is_zero_or_negative("0x1").unwrap());
        assert!(!is_negative("0x8000000000000000").unwrap());
        assert!(is_zero("0xg").is_err());
    }

    #[test]
    fn test_padded_round_trip() {
        let example = "0x00000000000000000000000000000000000000000000000000c62a36cfe0d515";
        let decimal = format_token_balance(example, 18).unwrap();
        assert_eq!(decimal, "0.055778460292928789");

        let restored = crate::HexBalance::from_decimal_str(&decimal, 18).unwrap();
        assert_eq!(restored.to_padded_hex(), example);
    }
}
