use crate::{Aggregator, MulticallError};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use binding::multicall::IMulticall3::{self, Call3, Call3Result};
use config::Chain;
use std::time::Duration;
use tracing::debug;

/// One chain's connection, bound to its Multicall3 deployment.
///
/// Every RPC round trip is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct RpcChain<P> {
    chain: Chain,
    provider: P,
    multicall: Address,
    timeout: Duration,
}

impl<P: Provider> RpcChain<P> {
    pub const fn new(chain: Chain, provider: P, timeout: Duration) -> Self {
        Self {
            chain,
            provider,
            multicall: chain.multicall_address(),
            timeout,
        }
    }

    /// Use a different Multicall3 deployment, e.g. on a local fork.
    pub const fn with_multicall(mut self, multicall: Address) -> Self {
        self.multicall = multicall;
        self
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Native coin balance of `holder` at the latest block.
    pub async fn native_balance(&self, holder: Address) -> eyre::Result<U256> {
        debug!(chain = %self.chain, holder = %holder, "Querying native balance");

        let balance = tokio::time::timeout(self.timeout, self.provider.get_balance(holder))
            .await
            .map_err(|_| self.timed_out())??;

        Ok(balance)
    }

    const fn timed_out(&self) -> MulticallError {
        MulticallError::Timeout {
            chain: self.chain,
            after: self.timeout,
        }
    }
}

impl<P: Provider> Aggregator for RpcChain<P> {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn aggregate3(&self, calls: Vec<Call3>) -> eyre::Result<Vec<Call3Result>> {
        let contract = IMulticall3::new(self.multicall, &self.provider);

        let results = tokio::time::timeout(self.timeout, contract.aggregate3(calls).call())
            .await
            .map_err(|_| self.timed_out())??;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_provider::DynProvider;
    use config::MULTICALL3;

    fn unreachable_chain(timeout: Duration) -> RpcChain<DynProvider> {
        let provider = client::create_provider("http://127.0.0.1:1").unwrap();
        RpcChain::new(Chain::Base, provider, timeout)
    }

    #[test]
    fn test_defaults_to_canonical_multicall() {
        let chain = unreachable_chain(Duration::from_secs(1));
        assert_eq!(chain.multicall, MULTICALL3);
        assert_eq!(chain.chain(), Chain::Base);

        let custom = chain.with_multicall(Address::repeat_byte(1));
        assert_eq!(custom.multicall, Address::repeat_byte(1));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let chain = unreachable_chain(Duration::from_secs(5));
        assert!(chain.aggregate3(Vec::new()).await.is_err());
        assert!(chain.native_balance(Address::ZERO).await.is_err());
    }

    #[test]
    fn test_timeout_error_names_chain() {
        let chain = unreachable_chain(Duration::from_millis(250));
        let err = chain.timed_out();
        assert_eq!(
            err,
            MulticallError::Timeout {
                chain: Chain::Base,
                after: Duration::from_millis(250)
            }
        );
        assert!(err.to_string().contains("base"));
    }
}
