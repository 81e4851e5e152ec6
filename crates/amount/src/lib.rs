//! Exact fixed-point arithmetic on hex-encoded token balances.
//!
//! Balances travel between services as hexadecimal strings (`0x1bc16d674ec80000`),
//! optionally signed in sign-magnitude form (`-0x64`). This crate parses those
//! strings into arbitrary-precision integers, scales them between decimal
//! precisions and renders them back. No value is ever held as a float.
//!
//! - [`HexBalance`]: the immutable value type
//! - [`hex`]: string-in/string-out helpers for collaborators that only
//!   handle serialized balances

pub mod hex;

use alloy_primitives::U256;
use num_bigint::{BigInt, BigUint, Sign};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Neg, Sub},
    str::FromStr,
};
use thiserror::Error;

/// Precision every balance is rescaled to before being compared or summed.
pub const NORMALIZED_DECIMALS: u8 = 18;

/// Width of a zero-padded 32-byte hex word, without the `0x` prefix.
const PADDED_HEX_DIGITS: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input is neither a hex nor a decimal integer
    #[error("Invalid integer string: {0:?}")]
    InvalidInteger(String),

    /// Input is not a base-10 number with an optional fractional part
    #[error("Invalid decimal string: {0:?}")]
    InvalidDecimal(String),
}

/// Arbitrary-precision signed balance, serialized as canonical hex.
///
/// An empty string parses to zero. Negative values only arise from
/// subtraction and serialize as `-0x...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexBalance(BigInt);

impl HexBalance {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Parse a hex integer string, `0x` prefix optional, with an optional
    /// leading `-`.
    ///
    /// Bare digits are hex: `"64"` is 100. Use [`Self::parse_decimal`] for
    /// base-10 input.
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let (negative, body) = split_sign(value);
        if body.is_empty() {
            return if negative {
                Err(ParseError::InvalidInteger(value.to_owned()))
            } else {
                Ok(Self::zero())
            };
        }

        let digits = body
            .strip_prefix("0x")
            .or_else(|| body.strip_prefix("0X"))
            .unwrap_or(body);
        let magnitude = parse_digits(digits, 16)
            .ok_or_else(|| ParseError::InvalidInteger(value.to_owned()))?;

        Ok(Self::from_magnitude(negative, magnitude))
    }

    /// Parse a base-10 integer string with an optional leading `-`.
    pub fn parse_decimal(value: &str) -> Result<Self, ParseError> {
        let (negative, body) = split_sign(value);
        if body.is_empty() && !negative {
            return Ok(Self::zero());
        }

        let magnitude = parse_digits(body, 10)
            .ok_or_else(|| ParseError::InvalidInteger(value.to_owned()))?;

        Ok(Self::from_magnitude(negative, magnitude))
    }

    /// Scale a human-readable decimal (`"1.5"`, `".5"`, `"-2"`) by `10^decimals`.
    ///
    /// Fractional digits beyond `decimals` are truncated, not rounded.
    pub fn from_decimal_str(value: &str, decimals: u8) -> Result<Self, ParseError> {
        let (negative, body) = split_sign(value);
        if body.is_empty() && !negative {
            return Ok(Self::zero());
        }

        let (integer, fraction) = body.split_once('.').unwrap_or((body, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        let has_digits = !integer.is_empty() || !fraction.is_empty();
        if !has_digits || !all_digits(integer) || !all_digits(fraction) {
            return Err(ParseError::InvalidDecimal(value.to_owned()));
        }

        let width = usize::from(decimals);
        let kept = &fraction[..fraction.len().min(width)];

        let mut digits = String::with_capacity(integer.len() + width);
        digits.push_str(integer);
        digits.push_str(kept);
        digits.extend(std::iter::repeat_n('0', width - kept.len()));

        if digits.is_empty() {
            return Ok(Self::zero());
        }

        let magnitude = BigUint::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| ParseError::InvalidDecimal(value.to_owned()))?;
        Ok(Self::from_magnitude(negative, magnitude))
    }

    /// Render as a human-readable decimal with `decimals` fractional digits.
    ///
    /// Trailing zeros are trimmed and integral values have no decimal point.
    pub fn format_units(&self, decimals: u8) -> String {
        let scale = BigUint::from(10u8).pow(u32::from(decimals));
        let magnitude = self.0.magnitude();
        let integer = magnitude / &scale;
        let fraction = magnitude % &scale;

        let mut out = String::new();
        if self.is_negative() {
            out.push('-');
        }
        out.push_str(&integer.to_str_radix(10));

        if fraction.bits() != 0 {
            let padded = format!(
                "{:0>width$}",
                fraction.to_str_radix(10),
                width = usize::from(decimals)
            );
            out.push('.');
            out.push_str(padded.trim_end_matches('0'));
        }

        out
    }

    /// Rescale from `decimals` to [`NORMALIZED_DECIMALS`].
    ///
    /// Scaling down divides and truncates toward zero.
    pub fn normalize_to_18(&self, decimals: u8) -> Self {
        match decimals.cmp(&NORMALIZED_DECIMALS) {
            Ordering::Equal => self.clone(),
            Ordering::Less => Self(&self.0 * ten_pow(NORMALIZED_DECIMALS - decimals)),
            Ordering::Greater => Self(&self.0 / ten_pow(decimals - NORMALIZED_DECIMALS)),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.sign() == Sign::NoSign
    }

    /// True only for values carrying an explicit sign. The high bit of the
    /// leading nibble carries no meaning here.
    pub fn is_negative(&self) -> bool {
        self.0.sign() == Sign::Minus
    }

    pub fn is_zero_or_negative(&self) -> bool {
        self.0.sign() != Sign::Plus
    }

    /// Canonical form: `0x` + lowercase digits, `-0x` for negatives.
    pub fn to_hex(&self) -> String {
        let digits = self.0.magnitude().to_str_radix(16);
        if self.is_negative() {
            format!("-0x{digits}")
        } else {
            format!("0x{digits}")
        }
    }

    /// 32-byte word form used by ledger documents: `0x` + 64 digits.
    pub fn to_padded_hex(&self) -> String {
        let digits = self.0.magnitude().to_str_radix(16);
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{sign}0x{digits:0>width$}", width = PADDED_HEX_DIGITS)
    }

    pub const fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    pub fn into_bigint(self) -> BigInt {
        self.0
    }

    fn from_magnitude(negative: bool, magnitude: BigUint) -> Self {
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Self(BigInt::from_biguint(sign, magnitude))
    }
}

fn split_sign(value: &str) -> (bool, &str) {
    let trimmed = value.trim();
    match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    }
}

fn parse_digits(digits: &str, radix: u32) -> Option<BigUint> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
}

fn ten_pow(exponent: u8) -> BigInt {
    BigInt::from(10u8).pow(u32::from(exponent))
}

impl fmt::Display for HexBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for HexBalance {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<BigInt> for HexBalance {
    fn from(value: BigInt) -> Self {
        Self(value)
    }
}

impl From<U256> for HexBalance {
    fn from(value: U256) -> Self {
        Self(BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>()))
    }
}

impl From<u64> for HexBalance {
    fn from(value: u64) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<i64> for HexBalance {
    fn from(value: i64) -> Self {
        Self(BigInt::from(value))
    }
}

impl Add for &HexBalance {
    type Output = HexBalance;

    fn add(self, rhs: Self) -> HexBalance {
        HexBalance(&self.0 + &rhs.0)
    }
}

impl Sub for &HexBalance {
    type Output = HexBalance;

    fn sub(self, rhs: Self) -> HexBalance {
        HexBalance(&self.0 - &rhs.0)
    }
}

impl Neg for HexBalance {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Serialize for HexBalance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HexBalance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
