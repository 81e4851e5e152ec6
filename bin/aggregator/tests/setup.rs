//! Common test setup utilities shared across integration tests.
#![allow(dead_code)] // used in ignored tests

use aggregator::{config::Config, connect_sources, RpcSources};
use alloy_primitives::Address;
use serde::Deserialize;

/// Addresses used by the live tests, next to the regular config.
#[derive(Debug, Deserialize)]
pub struct LiveTargets {
    /// Wallet with known balances
    pub wallet: Address,
}

#[derive(Debug, Deserialize)]
struct TestConfig {
    #[serde(flatten)]
    config: Config,
    targets: LiveTargets,
}

/// Load test configuration. Panics if not found or invalid.
pub fn load_test_config() -> (Config, LiveTargets) {
    let config_path = "tests/test-config.toml";

    let current_dir = std::env::current_dir().unwrap();
    eprintln!("Looking for config at: {:?}", current_dir.join(config_path));

    let contents =
        std::fs::read_to_string(config_path).expect("Failed to read tests/test-config.toml.");
    let mut parsed: TestConfig =
        toml::from_str(&contents).expect("Failed to parse tests/test-config.toml.");
    parsed.config.rpc = parsed.config.rpc.with_env_overrides();

    (parsed.config, parsed.targets)
}

/// Common test setup: load config and connect every configured chain.
pub async fn setup_sources(config: &Config) -> RpcSources {
    connect_sources(&config.rpc, &config.tuning)
        .await
        .expect("Failed to connect RPC sources")
}
