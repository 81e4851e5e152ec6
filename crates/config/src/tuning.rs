//! Batch sizes, concurrency and failure policy for balance fetching.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a multi-chain fetch treats a chain that fails outside batch containment.
///
/// Unconfigured chains are always skipped regardless of policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole request on the first failed chain.
    #[default]
    FailFast,
    /// Record the failed chain and keep going.
    BestEffort,
}

/// Fetch tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchTuning {
    /// Leaf calls per `aggregate3` request when resolving decimals
    pub decimals_batch_size: usize,
    /// Leaf calls per `aggregate3` request when reading balances
    pub balance_batch_size: usize,
    /// Batches in flight at once; each window completes before the next starts
    pub concurrent_batches: usize,
    /// Timeout for a single RPC round trip
    pub rpc_timeout_secs: u64,
    /// Deadline for a whole multi-chain balance request
    pub request_deadline_secs: u64,
    /// Extra attempts for a failed batch (0 = single pass)
    pub batch_retries: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for FetchTuning {
    fn default() -> Self {
        Self {
            decimals_batch_size: 100,
            balance_batch_size: 30,
            concurrent_batches: 3,
            rpc_timeout_secs: 20,
            request_deadline_secs: 120,
            batch_retries: 0,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

impl FetchTuning {
    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub const fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    /// Override the failure policy.
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Override the balance batch size.
    pub const fn with_balance_batch_size(mut self, size: usize) -> Self {
        self.balance_batch_size = size;
        self
    }

    /// Override the decimals batch size.
    pub const fn with_decimals_batch_size(mut self, size: usize) -> Self {
        self.decimals_batch_size = size;
        self
    }

    /// Override the concurrency window.
    pub const fn with_concurrent_batches(mut self, count: usize) -> Self {
        self.concurrent_batches = count;
        self
    }
}
