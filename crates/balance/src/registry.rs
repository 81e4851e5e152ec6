//! Tracked token contracts.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{fmt, future::Future};
use tokio::sync::RwLock;

/// Registry identifier of a tracked contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub String);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContractId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A token contract tracked on one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRef {
    pub id: ContractId,
    /// Platform identifier, see [`config::Chain::platform_id`]
    pub platform_id: String,
    pub contract_address: Address,
    /// `None` until resolved on-chain
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

impl ContractRef {
    pub fn is_native(&self) -> bool {
        self.contract_address == config::NATIVE_TOKEN
    }
}

/// Source of tracked contracts, owned by surrounding application code.
pub trait ContractRegistry: Send + Sync {
    /// All contracts tracked under a platform identifier.
    fn find_contracts_by_chain(
        &self,
        platform_id: &str,
    ) -> impl Future<Output = eyre::Result<Vec<ContractRef>>> + Send;

    /// Record a resolved `decimals()` value. Writing the same value twice is harmless.
    fn update_decimals(
        &self,
        id: &ContractId,
        decimals: u8,
    ) -> impl Future<Output = eyre::Result<()>> + Send;
}

/// Contract registry held in memory, e.g. loaded from a file at startup.
#[derive(Debug, Default)]
pub struct InMemoryContractRegistry {
    contracts: RwLock<Vec<ContractRef>>,
}

impl InMemoryContractRegistry {
    pub fn new(contracts: Vec<ContractRef>) -> Self {
        Self {
            contracts: RwLock::new(contracts),
        }
    }

    /// Copy of every tracked contract, e.g. to persist resolved decimals.
    pub async fn snapshot(&self) -> Vec<ContractRef> {
        self.contracts.read().await.clone()
    }
}

impl ContractRegistry for InMemoryContractRegistry {
    async fn find_contracts_by_chain(&self, platform_id: &str) -> eyre::Result<Vec<ContractRef>> {
        let contracts = self.contracts.read().await;
        Ok(contracts
            .iter()
            .filter(|c| c.platform_id == platform_id)
            .cloned()
            .collect())
    }

    async fn update_decimals(&self, id: &ContractId, decimals: u8) -> eyre::Result<()> {
        let mut contracts = self.contracts.write().await;
        let contract = contracts
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| eyre::eyre!("Unknown contract {id}"))?;
        contract.decimals = Some(decimals);
        Ok(())
    }
}
