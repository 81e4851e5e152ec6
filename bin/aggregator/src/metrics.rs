//! Prometheus metrics for the aggregator.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking and management.

use balance::{DecimalsReport, NormalizedBalanceRecord, PartialResult};
use config::Chain;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Aggregated metrics for the aggregator.
///
/// Metrics are registered with the global metrics registry on creation.
/// Without an installed exporter every call is a no-op.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Fetch metrics
        describe_counter!(
            "aggregator_fetch_requests_total",
            "Total number of multi-chain balance requests"
        );
        describe_counter!(
            "aggregator_fetch_failures_total",
            "Total number of balance requests that failed outright"
        );
        describe_histogram!(
            "aggregator_fetch_duration_seconds",
            "Duration of each balance request in seconds"
        );
        describe_counter!(
            "aggregator_chain_failures_total",
            "Chains left out of a balance request, by chain"
        );
        describe_gauge!(
            "aggregator_nonzero_balances",
            "Non-zero balances found in the last request, by chain"
        );

        // Multicall metrics
        describe_counter!(
            "aggregator_failed_batches_total",
            "Multicall batches that failed as a whole"
        );
        describe_counter!(
            "aggregator_decode_failures_total",
            "Leaf call results that could not be decoded"
        );

        // Decimals metrics
        describe_counter!(
            "aggregator_decimals_resolved_total",
            "Token decimals resolved and written back, by chain"
        );
        describe_gauge!(
            "aggregator_decimals_unresolved",
            "Tokens still missing decimals after the last run, by chain"
        );

        // Reconciliation metrics
        describe_counter!(
            "aggregator_reconciliation_diffs_total",
            "Reconciliation diffs emitted, by kind"
        );
    }

    /// Record a completed balance request.
    pub fn record_fetch(
        &self,
        result: &PartialResult<NormalizedBalanceRecord>,
        chains: &[Chain],
        duration: Duration,
    ) {
        counter!("aggregator_fetch_requests_total").increment(1);
        histogram!("aggregator_fetch_duration_seconds").record(duration.as_secs_f64());

        for failure in &result.failures {
            counter!("aggregator_chain_failures_total", "chain" => failure.chain.key()).increment(1);
        }
        for chain in chains {
            let count = result.items.iter().filter(|r| r.network() == *chain).count();
            gauge!("aggregator_nonzero_balances", "chain" => chain.key()).set(count as f64);
        }

        counter!("aggregator_failed_batches_total").increment(result.stats.failed_batches as u64);
        counter!("aggregator_decode_failures_total").increment(result.stats.decode_failures as u64);
    }

    /// Record a balance request that failed outright.
    pub fn record_fetch_failure(&self, duration: Duration) {
        counter!("aggregator_fetch_requests_total").increment(1);
        counter!("aggregator_fetch_failures_total").increment(1);
        histogram!("aggregator_fetch_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record one chain's decimals run.
    pub fn record_decimals(&self, chain: Chain, report: &DecimalsReport) {
        counter!("aggregator_decimals_resolved_total", "chain" => chain.key())
            .increment(report.resolved as u64);
        gauge!("aggregator_decimals_unresolved", "chain" => chain.key())
            .set(report.unresolved as f64);
        counter!("aggregator_failed_batches_total").increment(report.failed_batches as u64);
    }

    /// Record emitted reconciliation diffs.
    pub fn record_diffs(&self, new: usize, changed: usize) {
        counter!("aggregator_reconciliation_diffs_total", "kind" => "new").increment(new as u64);
        counter!("aggregator_reconciliation_diffs_total", "kind" => "changed")
            .increment(changed as u64);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        let metrics = Metrics::new();
        metrics.record_fetch(&PartialResult::default(), &[Chain::Base], Duration::from_millis(5));
        metrics.record_fetch_failure(Duration::from_millis(5));
        metrics.record_decimals(Chain::Base, &DecimalsReport::default());
        metrics.record_diffs(1, 2);
    }
}
