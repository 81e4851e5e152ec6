//! Supported chains.
//!
//! Each chain maps 1:1 to an RPC endpoint key and to the platform identifier
//! the contract registry files its token contracts under.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Multicall3, deployed at the same address on every supported chain.
///
/// https://github.com/mds1/multicall3
pub const MULTICALL3: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");

/// Placeholder contract address for a chain's native coin.
pub const NATIVE_TOKEN: Address = address!("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown chain: {0}")]
pub struct UnknownChain(pub String);

/// Supported chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Chain {
    #[serde(rename = "eth")]
    Ethereum,
    #[serde(rename = "bnb")]
    Bnb,
    #[serde(rename = "base")]
    Base,
    #[serde(rename = "polygon")]
    Polygon,
    #[serde(rename = "arbitrum")]
    Arbitrum,
    #[serde(rename = "optimism")]
    Optimism,
}

impl Chain {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Ethereum,
        Self::Bnb,
        Self::Base,
        Self::Polygon,
        Self::Arbitrum,
        Self::Optimism,
    ];

    /// Slot of this chain in fixed-size per-chain tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// EVM chain ID.
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::Bnb => 56,
            Self::Base => 8453,
            Self::Polygon => 137,
            Self::Arbitrum => 42161,
            Self::Optimism => 10,
        }
    }

    /// Key used in config files and `RPC_<KEY>` environment variables.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Ethereum => "eth",
            Self::Bnb => "bnb",
            Self::Base => "base",
            Self::Polygon => "polygon",
            Self::Arbitrum => "arbitrum",
            Self::Optimism => "optimism",
        }
    }

    /// Platform identifier the contract registry uses for this chain.
    pub const fn platform_id(self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Bnb => "binance-smart-chain",
            Self::Base => "base",
            Self::Polygon => "polygon-pos",
            Self::Arbitrum => "arbitrum-one",
            Self::Optimism => "optimistic-ethereum",
        }
    }

    /// Infura network name, for endpoint fallback.
    pub const fn infura_network(self) -> &'static str {
        match self {
            Self::Ethereum => "mainnet",
            Self::Bnb => "bsc-mainnet",
            Self::Base => "base-mainnet",
            Self::Polygon => "polygon-mainnet",
            Self::Arbitrum => "arbitrum-mainnet",
            Self::Optimism => "optimism-mainnet",
        }
    }

    pub const fn native_symbol(self) -> &'static str {
        match self {
            Self::Bnb => "BNB",
            Self::Polygon => "POL",
            Self::Ethereum | Self::Base | Self::Arbitrum | Self::Optimism => "ETH",
        }
    }

    pub const fn multicall_address(self) -> Address {
        MULTICALL3
    }

    /// Look up a chain by its registry platform identifier.
    pub fn from_platform_id(platform_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.platform_id() == platform_id)
    }

    /// `chains` with repeats dropped, keeping first occurrences in order.
    pub fn dedup(chains: &[Self]) -> Vec<Self> {
        let mut seen = [false; Self::COUNT];
        chains
            .iter()
            .copied()
            .filter(|chain| !std::mem::replace(&mut seen[chain.index()], true))
            .collect()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Chain {
    type Err = UnknownChain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|chain| chain.key() == lower || chain.platform_id() == lower)
            .ok_or_else(|| UnknownChain(s.to_owned()))
    }
}
