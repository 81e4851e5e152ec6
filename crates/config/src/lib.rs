//! Configuration types for the balance aggregator.
//!
//! This crate provides:
//! - The closed set of supported chains and their per-chain constants
//! - RPC endpoint configuration with environment overrides
//! - Batch and concurrency tuning for multicall reads

pub mod chain;
pub mod rpc;
pub mod tuning;

pub use chain::{Chain, UnknownChain, MULTICALL3, NATIVE_TOKEN};
pub use rpc::RpcConfig;
pub use tuning::{FailurePolicy, FetchTuning};
