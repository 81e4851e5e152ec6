use balance::ContractRef;
use config::{FetchTuning, RpcConfig};
use ledger::Wallets;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level aggregator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint per chain key
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Batch sizes, timeouts and failure policy
    #[serde(default)]
    pub tuning: FetchTuning,

    /// Tracked token contracts
    pub contracts_file: PathBuf,

    /// Stored wallet balances, needed by `reconcile`
    #[serde(default)]
    pub ledger_file: Option<PathBuf>,
}

impl Config {
    /// Load the config file, then apply `RPC_<KEY>` / `INFURA_API_KEY` overrides.
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.rpc = config.rpc.with_env_overrides();

        Ok(config)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ContractsFile {
    #[serde(default)]
    contracts: Vec<ContractRef>,
}

/// Read tracked contracts from a TOML file of `[[contracts]]` entries.
pub fn load_contracts(path: impl AsRef<Path>) -> eyre::Result<Vec<ContractRef>> {
    let contents = std::fs::read_to_string(path)?;
    let file: ContractsFile = toml::from_str(&contents)?;
    Ok(file.contracts)
}

/// Write tracked contracts back, e.g. after decimals were resolved.
pub fn save_contracts(path: impl AsRef<Path>, contracts: Vec<ContractRef>) -> eyre::Result<()> {
    let contents = toml::to_string_pretty(&ContractsFile { contracts })?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Read the ledger JSON file. A missing file is an empty ledger.
pub fn load_ledger(path: impl AsRef<Path>) -> eyre::Result<Wallets> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Wallets::new());
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn save_ledger(path: impl AsRef<Path>, wallets: &Wallets) -> eyre::Result<()> {
    let contents = serde_json::to_string_pretty(wallets)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Chain, FailurePolicy};

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
            contracts_file = "contracts.toml"

            [rpc]
            eth = "https://eth.example"
            base = "https://base.example"

            [tuning]
            balance_batch_size = 25
            failure_policy = "best_effort"
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc.url(Chain::Base), Some("https://base.example"));
        assert_eq!(config.tuning.balance_batch_size, 25);
        assert_eq!(config.tuning.decimals_batch_size, 100);
        assert_eq!(config.tuning.failure_policy, FailurePolicy::BestEffort);
        assert_eq!(config.ledger_file, None);
    }

    #[test]
    fn test_minimal_config() {
        let config: Config = toml::from_str(r#"contracts_file = "c.toml""#).unwrap();
        assert_eq!(config.rpc.endpoints().count(), 0);
        assert_eq!(config.tuning, FetchTuning::default());
    }

    #[test]
    fn test_missing_ledger_is_empty() {
        let wallets = load_ledger("/nonexistent/ledger.json").unwrap();
        assert!(wallets.is_empty());
    }

    #[test]
    fn test_contracts_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("contracts-{}.toml", std::process::id()));
        let contracts = vec![ContractRef {
            id: "usdc-base".into(),
            platform_id: "base".to_owned(),
            contract_address: alloy_primitives::Address::repeat_byte(1),
            decimals: Some(6),
            symbol: "USDC".to_owned(),
            name: "USD Coin".to_owned(),
        }];

        save_contracts(&path, contracts.clone()).unwrap();
        let loaded = load_contracts(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, contracts);
    }
}
