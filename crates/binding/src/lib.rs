//! Contract bindings for all external contracts.
//!
//! This crate consolidates the Solidity interfaces read by the aggregator:
//! - ERC20 tokens (`balanceOf`, `decimals`)
//! - Multicall3 (`aggregate3`)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod multicall;
pub mod token;
