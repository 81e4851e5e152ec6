use crate::{
    registry::{ContractId, ContractRef},
    BalanceSource,
};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use binding::{
    multicall::IMulticall3::{Call3, Call3Result},
    token::IERC20,
};
use config::Chain;
use multicall::Aggregator;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

pub fn contract(id: &str, chain: Chain, address: Address, decimals: Option<u8>) -> ContractRef {
    ContractRef {
        id: ContractId::from(id),
        platform_id: chain.platform_id().to_owned(),
        contract_address: address,
        decimals,
        symbol: String::new(),
        name: String::new(),
    }
}

fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

/// In-process chain: tokens answer `decimals()` when configured and
/// `balanceOf` with their configured balance or zero.
#[derive(Default)]
pub struct MockChain {
    chain: Option<Chain>,
    native: U256,
    decimals: HashMap<Address, u8>,
    balances: HashMap<Address, U256>,
    failing_targets: HashSet<Address>,
    failing: bool,
    delay: Option<Duration>,
    requested: Mutex<Vec<Address>>,
}

impl MockChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain: Some(chain),
            ..Default::default()
        }
    }

    pub fn with_native(mut self, balance: U256) -> Self {
        self.native = balance;
        self
    }

    pub fn with_decimals(mut self, token: Address, decimals: u8) -> Self {
        self.decimals.insert(token, decimals);
        self
    }

    pub fn with_balance(mut self, token: Address, balance: U256) -> Self {
        self.balances.insert(token, balance);
        self
    }

    /// Any batch containing `token` fails as a whole.
    pub fn with_failing_target(mut self, token: Address) -> Self {
        self.failing_targets.insert(token);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every RPC call fails.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn requested_targets(&self) -> Vec<Address> {
        self.requested.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    fn answer(&self, call: &Call3) -> Call3Result {
        let selector = call.callData.get(..4).unwrap_or_default();
        let value = if selector == IERC20::decimalsCall::SELECTOR {
            self.decimals.get(&call.target).map(|d| U256::from(*d))
        } else if selector == IERC20::balanceOfCall::SELECTOR {
            Some(self.balances.get(&call.target).copied().unwrap_or_default())
        } else {
            None
        };

        match value {
            Some(value) => Call3Result {
                success: true,
                returnData: word(value),
            },
            None => Call3Result {
                success: false,
                returnData: Bytes::new(),
            },
        }
    }
}

impl Aggregator for MockChain {
    fn chain(&self) -> Chain {
        self.chain.unwrap_or(Chain::Ethereum)
    }

    async fn aggregate3(&self, calls: Vec<Call3>) -> eyre::Result<Vec<Call3Result>> {
        self.requested
            .lock()
            .unwrap()
            .extend(calls.iter().map(|c| c.target));

        if self.failing {
            eyre::bail!("connection refused");
        }
        if calls.iter().any(|c| self.failing_targets.contains(&c.target)) {
            eyre::bail!("execution reverted");
        }

        Ok(calls.iter().map(|call| self.answer(call)).collect())
    }
}

impl BalanceSource for MockChain {
    async fn native_balance(&self, _holder: Address) -> eyre::Result<U256> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            eyre::bail!("connection refused");
        }
        Ok(self.native)
    }
}
