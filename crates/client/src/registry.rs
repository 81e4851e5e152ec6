use crate::{create_provider, ClientError};
use alloy_provider::{DynProvider, Provider};
use config::{Chain, RpcConfig};
use tracing::{error, info};

/// One entry per configured chain, in a fixed table indexed by [`Chain`].
///
/// Read-only once built, so it can be shared by concurrent fetches.
#[derive(Debug, Clone)]
pub struct ChainRegistry<T> {
    slots: [Option<T>; Chain::COUNT],
}

impl<T> Default for ChainRegistry<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<T> ChainRegistry<T> {
    pub fn from_entries(entries: impl IntoIterator<Item = (Chain, T)>) -> Self {
        let mut registry = Self::default();
        for (chain, value) in entries {
            registry.insert(chain, value);
        }
        registry
    }

    /// Insert an entry, returning the one it replaced.
    pub fn insert(&mut self, chain: Chain, value: T) -> Option<T> {
        self.slots[chain.index()].replace(value)
    }

    /// Entry for `chain`, or [`ClientError::UnconfiguredChain`].
    pub fn get(&self, chain: Chain) -> Result<&T, ClientError> {
        self.slots[chain.index()]
            .as_ref()
            .ok_or(ClientError::UnconfiguredChain(chain))
    }

    pub fn contains(&self, chain: Chain) -> bool {
        self.slots[chain.index()].is_some()
    }

    /// Configured entries in [`Chain::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Chain, &T)> {
        Chain::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(chain, slot)| slot.as_ref().map(|value| (chain, value)))
    }

    pub fn chains(&self) -> impl Iterator<Item = Chain> + '_ {
        self.iter().map(|(chain, _)| chain)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a registry of derived values over the same chains.
    pub fn map<U>(&self, mut f: impl FnMut(Chain, &T) -> U) -> ChainRegistry<U> {
        ChainRegistry::from_entries(self.iter().map(|(chain, value)| (chain, f(chain, value))))
    }
}

impl ChainRegistry<DynProvider> {
    /// Create one provider per configured endpoint. Nothing is dialed yet.
    pub fn connect(rpc: &RpcConfig) -> Result<Self, ClientError> {
        let mut registry = Self::default();
        for (chain, url) in rpc.endpoints() {
            registry.insert(chain, create_provider(url)?);
        }
        Ok(registry)
    }
}

impl<P: Provider> ChainRegistry<P> {
    /// Query every connection once.
    ///
    /// A failed check is logged and the connection stays registered for
    /// best-effort use later. Returns `(chain, healthy)` per entry.
    pub async fn health_check(&self) -> Vec<(Chain, bool)> {
        let mut report = Vec::with_capacity(self.len());

        for (chain, provider) in self.iter() {
            match provider.get_block_number().await {
                Ok(block) => {
                    info!(chain = %chain, block, "Connected to RPC");
                    report.push((chain, true));
                }
                Err(e) => {
                    error!(chain = %chain, error = %e, "Failed to connect to RPC");
                    report.push((chain, false));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unconfigured_chain() {
        let registry = ChainRegistry::from_entries([(Chain::Base, "base")]);

        assert_eq!(*registry.get(Chain::Base).unwrap(), "base");
        assert!(matches!(
            registry.get(Chain::Ethereum),
            Err(ClientError::UnconfiguredChain(Chain::Ethereum))
        ));
    }

    #[test]
    fn test_iteration_follows_chain_order() {
        let registry = ChainRegistry::from_entries([
            (Chain::Optimism, 3),
            (Chain::Ethereum, 1),
            (Chain::Base, 2),
        ]);

        let chains: Vec<Chain> = registry.chains().collect();
        assert_eq!(chains, vec![Chain::Ethereum, Chain::Base, Chain::Optimism]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_map_keeps_chains() {
        let registry = ChainRegistry::from_entries([(Chain::Bnb, 7u32)]);
        let doubled = registry.map(|chain, value| (chain, value * 2));

        assert_eq!(*doubled.get(Chain::Bnb).unwrap(), (Chain::Bnb, 14));
        assert!(!doubled.contains(Chain::Polygon));
    }

    #[test]
    fn test_connect_builds_configured_chains_only() {
        let rpc = RpcConfig::default()
            .with_url(Chain::Ethereum, "http://127.0.0.1:8545")
            .with_url(Chain::Arbitrum, "http://127.0.0.1:8546");

        let registry = ChainRegistry::connect(&rpc).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(Chain::Arbitrum));
        assert!(registry.get(Chain::Bnb).is_err());
    }

    #[tokio::test]
    async fn test_unhealthy_chain_stays_registered() {
        let rpc = RpcConfig::default().with_url(Chain::Polygon, "http://127.0.0.1:1");
        let registry = ChainRegistry::connect(&rpc).unwrap();

        let report = registry.health_check().await;

        assert_eq!(report, vec![(Chain::Polygon, false)]);
        assert!(registry.get(Chain::Polygon).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        let rpc = RpcConfig::default().with_url(Chain::Base, "::not a url::");
        assert!(matches!(
            ChainRegistry::connect(&rpc),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
