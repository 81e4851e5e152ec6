use crate::{Aggregated, Aggregator, CallOutcome, LeafCall, MulticallError};
use alloy_sol_types::SolCall;
use binding::multicall::IMulticall3::Call3;
use config::FetchTuning;
use futures_util::future::join_all;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, error, warn};

/// Batch shape for one category of calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Leaf calls per `aggregate3` request
    pub batch_size: usize,
    /// Batches in flight at once
    pub concurrent_batches: usize,
    /// Extra attempts for a failed batch
    pub retries: usize,
}

impl BatchConfig {
    /// Shape for `decimals()` resolution.
    pub const fn decimals(tuning: &FetchTuning) -> Self {
        Self {
            batch_size: tuning.decimals_batch_size,
            concurrent_batches: tuning.concurrent_batches,
            retries: tuning.batch_retries,
        }
    }

    /// Shape for `balanceOf()` reads.
    pub const fn balances(tuning: &FetchTuning) -> Self {
        Self {
            batch_size: tuning.balance_batch_size,
            concurrent_batches: tuning.concurrent_batches,
            retries: tuning.batch_retries,
        }
    }
}

/// Runs call lists through an [`Aggregator`] in windows of concurrent batches.
pub struct MulticallExecutor<'a, A> {
    aggregator: &'a A,
    config: BatchConfig,
}

impl<'a, A: Aggregator> MulticallExecutor<'a, A> {
    pub const fn new(aggregator: &'a A, config: BatchConfig) -> Self {
        Self { aggregator, config }
    }

    /// Execute `calls`, returning one outcome per call in input order.
    ///
    /// Batches inside a window run concurrently; a window completes before the
    /// next one starts. Nothing here returns an error: failures are logged and
    /// recorded on the returned [`Aggregated`].
    pub async fn execute<C>(&self, calls: &[LeafCall<C>]) -> Aggregated<C::Return>
    where
        C: SolCall + Sync,
        C::Return: Send,
    {
        let batch_size = self.config.batch_size.max(1);
        let window = self.config.concurrent_batches.max(1);
        let batches: Vec<&[LeafCall<C>]> = calls.chunks(batch_size).collect();

        debug!(
            chain = %self.aggregator.chain(),
            calls = calls.len(),
            batches = batches.len(),
            window,
            "Executing multicall"
        );

        let mut aggregated = Aggregated::with_capacity(calls.len());

        for (window_index, group) in batches.chunks(window).enumerate() {
            let in_flight = group.iter().enumerate().map(|(offset, batch)| {
                self.run_batch(window_index * window + offset, batch)
            });

            // join_all keeps input order regardless of completion order
            for (outcomes, errors) in join_all(in_flight).await {
                aggregated.outcomes.extend(outcomes);
                aggregated.errors.extend(errors);
            }
        }

        aggregated
    }

    async fn run_batch<C>(
        &self,
        index: usize,
        batch: &[LeafCall<C>],
    ) -> (Vec<CallOutcome<C::Return>>, Vec<MulticallError>)
    where
        C: SolCall,
    {
        let chain = self.aggregator.chain();
        let calls: Vec<Call3> = batch.iter().map(LeafCall::to_call3).collect();

        let retry_strategy = ExponentialBackoff::from_millis(100).take(self.config.retries);
        let response = Retry::spawn(retry_strategy, || {
            self.aggregator.aggregate3(calls.clone())
        })
        .await;

        let results = match response {
            Ok(results) if results.len() == batch.len() => results,
            Ok(results) => {
                let reason = format!(
                    "expected {} results, got {}",
                    batch.len(),
                    results.len()
                );
                return batch_failed(chain, index, batch.len(), reason);
            }
            Err(e) => return batch_failed(chain, index, batch.len(), format!("{e:#}")),
        };

        let mut errors = Vec::new();
        let outcomes = batch
            .iter()
            .zip(results)
            .map(|(leaf, result)| {
                if !result.success {
                    return CallOutcome::Reverted;
                }
                match C::abi_decode_returns(&result.returnData) {
                    Ok(value) => CallOutcome::Decoded(value),
                    Err(e) => {
                        let err = MulticallError::Decode {
                            chain,
                            target: leaf.target,
                            reason: e.to_string(),
                        };
                        warn!(chain = %chain, target = %leaf.target, error = %err, "Leaf call result dropped");
                        errors.push(err);
                        CallOutcome::Undecodable
                    }
                }
            })
            .collect();

        (outcomes, errors)
    }
}

fn batch_failed<T>(
    chain: config::Chain,
    batch: usize,
    len: usize,
    reason: String,
) -> (Vec<CallOutcome<T>>, Vec<MulticallError>) {
    let err = MulticallError::Batch {
        chain,
        batch,
        reason,
    };
    error!(chain = %chain, batch, error = %err, "Failed to execute multicall batch");

    let outcomes = std::iter::repeat_with(|| CallOutcome::BatchFailed)
        .take(len)
        .collect();
    (outcomes, vec![err])
}
