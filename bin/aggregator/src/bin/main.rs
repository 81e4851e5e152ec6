//! Wallet balance aggregator CLI.
//!
//! - `health`: check every configured RPC endpoint
//! - `resolve-decimals`: resolve missing token decimals and save them to the contracts file
//! - `balances`: print a wallet's non-zero balances across chains
//! - `reconcile`: diff a wallet's fresh balances against the ledger, optionally applying them

use aggregator::{
    apply_diffs,
    config::{load_contracts, load_ledger, save_contracts, save_ledger, Config},
    connect_sources, fetch_wallet_balances,
    metrics::{install_prometheus_exporter, Metrics},
    reconcile_wallet, select_chains,
};
use alloy_primitives::Address;
use balance::{resolve_decimals_for_chains, BalanceFetcher, InMemoryContractRegistry};
use clap::{Parser, Subcommand};
use client::ChainRegistry;
use config::Chain;
use ledger::InMemoryLedger;
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "aggregator")]
#[command(about = "Aggregate and reconcile wallet balances across chains")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "aggregator.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    /// Serve Prometheus metrics on this port while the command runs
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every configured RPC endpoint
    Health,

    /// Resolve missing token decimals and save them to the contracts file
    ResolveDecimals {
        /// Chains to resolve (default: all configured)
        #[arg(long)]
        chain: Vec<Chain>,
    },

    /// Print a wallet's non-zero balances
    Balances {
        /// Wallet address
        #[arg(short, long)]
        wallet: Address,

        /// Chains to query (default: all configured)
        #[arg(long)]
        chain: Vec<Chain>,

        /// Resolve missing decimals before reading balances
        #[arg(long)]
        resolve_decimals: bool,
    },

    /// Diff a wallet's fresh balances against the stored ledger
    Reconcile {
        /// Wallet address
        #[arg(short, long)]
        wallet: Address,

        /// Wallet id in the ledger
        #[arg(long)]
        wallet_id: String,

        /// Chains to reconcile (default: all configured)
        #[arg(long)]
        chain: Vec<Chain>,

        /// Apply the diffs to the ledger file
        #[arg(long)]
        apply: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_json(value: &impl Serialize) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    info!(config = %cli.config, "Loading config");
    let config = Config::from_file(&cli.config)?;

    if let Some(port) = cli.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Serving Prometheus metrics");
    }
    let metrics = Metrics::new();

    match cli.command {
        Command::Health => {
            let providers = ChainRegistry::connect(&config.rpc)?;
            let report: Vec<_> = providers
                .health_check()
                .await
                .into_iter()
                .map(|(chain, healthy)| serde_json::json!({ "chain": chain, "healthy": healthy }))
                .collect();
            print_json(&report)?;
        }
        Command::ResolveDecimals { chain } => {
            let sources = connect_sources(&config.rpc, &config.tuning).await?;
            let chains = select_chains(&chain, &sources)?;
            let contracts = InMemoryContractRegistry::new(load_contracts(&config.contracts_file)?);

            let reports =
                resolve_decimals_for_chains(&sources, &contracts, &config.tuning, &chains).await;
            for (chain, report) in &reports {
                metrics.record_decimals(*chain, report);
                info!(
                    chain = %chain,
                    resolved = report.resolved,
                    unresolved = report.unresolved,
                    "Decimals run complete"
                );
            }

            save_contracts(&config.contracts_file, contracts.snapshot().await)?;
        }
        Command::Balances {
            wallet,
            chain,
            resolve_decimals,
        } => {
            let sources = connect_sources(&config.rpc, &config.tuning).await?;
            let chains = select_chains(&chain, &sources)?;
            let contracts = InMemoryContractRegistry::new(load_contracts(&config.contracts_file)?);
            let fetcher = BalanceFetcher::new(&sources, &contracts, config.tuning.clone())
                .with_decimals_resolution(resolve_decimals);

            let result = fetch_wallet_balances(&fetcher, wallet, &chains, &metrics).await?;
            print_json(&result)?;

            if resolve_decimals {
                save_contracts(&config.contracts_file, contracts.snapshot().await)?;
            }
        }
        Command::Reconcile {
            wallet,
            wallet_id,
            chain,
            apply,
        } => {
            let ledger_file = config
                .ledger_file
                .as_ref()
                .ok_or_else(|| eyre::eyre!("ledger_file is not set in {}", cli.config))?;
            let ledger = InMemoryLedger::new(load_ledger(ledger_file)?);

            let sources = connect_sources(&config.rpc, &config.tuning).await?;
            let chains = select_chains(&chain, &sources)?;
            let contracts = InMemoryContractRegistry::new(load_contracts(&config.contracts_file)?);
            let fetcher = BalanceFetcher::new(&sources, &contracts, config.tuning.clone());

            let reconciliation =
                reconcile_wallet(&fetcher, &ledger, wallet, &wallet_id, &chains, &metrics).await?;
            print_json(&reconciliation)?;

            if apply {
                apply_diffs(&ledger, &wallet_id, &reconciliation.diffs).await?;
                save_ledger(ledger_file, &ledger.snapshot().await)?;
            }
        }
    }

    Ok(())
}
