//! Batched read-only contract calls through Multicall3.
//!
//! A caller's call list is split into ordered batches, each sent as one
//! `aggregate3` request with `allowFailure = true` on every leaf. Batches run in
//! bounded concurrency windows. Failures stay contained:
//! - a reverting leaf yields [`CallOutcome::Reverted`]
//! - a leaf whose return data does not decode yields [`CallOutcome::Undecodable`]
//! - a failed request yields [`CallOutcome::BatchFailed`] for every leaf in it
//!
//! Outcomes always line up with the input by index.

pub mod executor;
pub mod rpc;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use binding::multicall::IMulticall3::{Call3, Call3Result};
use config::Chain;
use std::{future::Future, time::Duration};
use thiserror::Error;

pub use executor::{BatchConfig, MulticallExecutor};
pub use rpc::RpcChain;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MulticallError {
    /// The whole `aggregate3` request failed or came back malformed
    #[error("Multicall batch {batch} on {chain} failed: {reason}")]
    Batch {
        chain: Chain,
        batch: usize,
        reason: String,
    },

    /// A leaf call succeeded on-chain but its return data did not decode
    #[error("Failed to decode result from {target} on {chain}: {reason}")]
    Decode {
        chain: Chain,
        target: Address,
        reason: String,
    },

    /// An RPC round trip exceeded its timeout
    #[error("RPC call on {chain} timed out after {after:?}")]
    Timeout { chain: Chain, after: Duration },
}

/// Something that can execute an `aggregate3` request against one chain.
pub trait Aggregator: Send + Sync {
    fn chain(&self) -> Chain;

    /// Execute one `aggregate3` request. Results are in call order.
    fn aggregate3(
        &self,
        calls: Vec<Call3>,
    ) -> impl Future<Output = eyre::Result<Vec<Call3Result>>> + Send;
}

/// One leaf call: a typed contract call against `target`.
#[derive(Debug, Clone)]
pub struct LeafCall<C> {
    pub target: Address,
    pub call: C,
}

impl<C: SolCall> LeafCall<C> {
    pub const fn new(target: Address, call: C) -> Self {
        Self { target, call }
    }

    fn to_call3(&self) -> Call3 {
        Call3 {
            target: self.target,
            allowFailure: true,
            callData: Bytes::from(self.call.abi_encode()),
        }
    }
}

/// Outcome of a single leaf call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    Decoded(T),
    Reverted,
    Undecodable,
    BatchFailed,
}

impl<T> CallOutcome<T> {
    pub const fn decoded(&self) -> Option<&T> {
        match self {
            Self::Decoded(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_decoded(self) -> Option<T> {
        match self {
            Self::Decoded(value) => Some(value),
            _ => None,
        }
    }
}

/// Per-leaf outcomes of an executed call list, plus the contained errors.
#[derive(Debug, Clone)]
pub struct Aggregated<T> {
    outcomes: Vec<CallOutcome<T>>,
    errors: Vec<MulticallError>,
}

impl<T> Aggregated<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
            errors: Vec::new(),
        }
    }

    /// One outcome per input call, in input order.
    pub fn outcomes(&self) -> &[CallOutcome<T>] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Errors that were caught and logged during execution.
    pub fn errors(&self) -> &[MulticallError] {
        &self.errors
    }

    pub fn failed_batches(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e, MulticallError::Batch { .. }))
            .count()
    }

    pub fn decode_failures(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e, MulticallError::Decode { .. }))
            .count()
    }

    /// Successfully decoded results with their input index.
    pub fn decoded(&self) -> impl Iterator<Item = (usize, &T)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.decoded().map(|value| (index, value)))
    }

    pub fn into_decoded(self) -> impl Iterator<Item = (usize, T)> {
        self.outcomes
            .into_iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.into_decoded().map(|value| (index, value)))
    }
}
