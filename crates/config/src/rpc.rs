//! RPC endpoint configuration.
//!
//! A chain without a URL is unavailable: requesting it explicitly fails, and
//! multi-chain requests skip it.

use crate::{Chain, UnknownChain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const INFURA_API_KEY: &str = "INFURA_API_KEY";

/// Chain key → RPC URL, e.g. `[rpc] eth = "https://..."`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct RpcConfig {
    urls: BTreeMap<Chain, String>,
}

impl TryFrom<BTreeMap<String, String>> for RpcConfig {
    type Error = UnknownChain;

    fn try_from(table: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let urls = table
            .into_iter()
            .map(|(key, url)| Ok((key.parse()?, url)))
            .collect::<Result<_, UnknownChain>>()?;
        Ok(Self { urls })
    }
}

impl From<RpcConfig> for BTreeMap<String, String> {
    fn from(config: RpcConfig) -> Self {
        config
            .urls
            .into_iter()
            .map(|(chain, url)| (chain.key().to_owned(), url))
            .collect()
    }
}

impl RpcConfig {
    pub fn url(&self, chain: Chain) -> Option<&str> {
        self.urls.get(&chain).map(String::as_str)
    }

    /// Set or replace the URL for one chain.
    pub fn with_url(mut self, chain: Chain, url: impl Into<String>) -> Self {
        self.urls.insert(chain, url.into());
        self
    }

    /// Configured chains with their URLs, in [`Chain::ALL`] order.
    pub fn endpoints(&self) -> impl Iterator<Item = (Chain, &str)> {
        self.urls.iter().map(|(chain, url)| (*chain, url.as_str()))
    }

    /// Apply process environment overrides, see [`Self::with_overrides`].
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// `RPC_<KEY>` replaces the configured URL. Chains still without a URL
    /// fall back to Infura when `INFURA_API_KEY` is set.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let infura_key = lookup(INFURA_API_KEY).filter(|key| !key.is_empty());

        for chain in Chain::ALL {
            let var = format!("RPC_{}", chain.key().to_ascii_uppercase());
            if let Some(url) = lookup(&var).filter(|url| !url.is_empty()) {
                self.urls.insert(chain, url);
                continue;
            }

            if let Some(key) = &infura_key {
                self.urls.entry(chain).or_insert_with(|| {
                    format!("https://{}.infura.io/v3/{}", chain.infura_network(), key)
                });
            }
        }

        self
    }
}
