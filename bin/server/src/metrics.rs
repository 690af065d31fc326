//! Prometheus metrics for the query server.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking and management.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use query::ErrorKind;
use std::time::Duration;

/// Aggregated metrics for the query server.
///
/// Metrics are registered with the global metrics registry on creation.
/// Recording is a no-op until an exporter is installed.
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
        describe_counter!(
            "web3_search_requests_total",
            "Total number of queries served by route"
        );
        describe_counter!(
            "web3_search_requests_failed_total",
            "Total number of failed queries by route and error kind"
        );
        describe_histogram!(
            "web3_search_request_duration_seconds",
            "Duration of each query in seconds"
        );
    }

    /// Record a finished query. `failure` is the error kind when it failed.
    pub fn record_request(&self, route: &'static str, failure: Option<ErrorKind>, duration: Duration) {
        counter!("web3_search_requests_total", "route" => route).increment(1);
        histogram!("web3_search_request_duration_seconds", "route" => route)
            .record(duration.as_secs_f64());

        if let Some(kind) = failure {
            counter!(
                "web3_search_requests_failed_total",
                "route" => route,
                "kind" => kind.as_str()
            )
            .increment(1);
        }
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
