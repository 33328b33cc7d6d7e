use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("divergence_evaluations_total").absolute(0);
    counter!("golden_signals_emitted").absolute(0);
    counter!("duplicate_signals_suppressed").absolute(0);
    counter!("insufficient_data_total").absolute(0);
    counter!("inconsistent_input_total").absolute(0);
    counter!("whale_transactions_ingested").absolute(0);
    counter!("whale_transactions_resolved").absolute(0);
    counter!("narrative_failures_total").absolute(0);
    counter!("price_feed_failures_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("tracked_assets").set(0.0);
    gauge!("pending_golden_signals").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("evaluation_latency_seconds").record(0.0);

    handle
}
