use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::trace;

/// Port on which the Prometheus scrape endpoint listens.
const METRICS_PORT: u16 = 9000;

/// Initializes metrics with an automatic HTTP server on port 9000.
///
/// Installs a global metrics recorder and starts an HTTP server listening on
/// `[::]:9000/metrics` for Prometheus scraping. Must be called at most once per
/// process; later calls fail because the global recorder is already installed.
pub fn init_metrics() -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::new(
            IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            METRICS_PORT,
        ))
        .install()?;

    Ok(())
}

/// Initializes metrics without an HTTP server and returns a handle for rendering.
///
/// The returned [`PrometheusHandle`] lets the caller render metrics at a custom
/// endpoint. A background task periodically performs upkeep to avoid unbounded
/// memory growth in the recorder.
pub fn init_metrics_handle() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trace!("running metrics upkeep");
            upkeep_handle.run_upkeep();
        }
    });

    Ok(handle)
}
