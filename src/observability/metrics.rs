//! Prometheus metrics.

use crate::config::ObservabilitySettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default port for the Prometheus HTTP listener.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Metrics configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Address to bind the exporter; `None` installs the recorder only.
    pub listen_addr: Option<SocketAddr>,
}

impl MetricsConfig {
    /// Builds metrics configuration from settings.
    #[must_use]
    pub fn from_settings(settings: &ObservabilitySettings) -> Self {
        let listen_addr = settings
            .metrics_port
            .map(|port| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
        Self {
            enabled: settings.metrics_enabled,
            listen_addr,
        }
    }
}

/// Installs the Prometheus recorder and, if an address is configured, the
/// HTTP scrape listener.
///
/// Returns whether a recorder was installed. With a listener, the exporter
/// runs on a background thread owned by the exporter crate.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener
/// cannot bind.
pub fn install_prometheus(config: &MetricsConfig) -> Result<bool> {
    if !config.enabled {
        return Ok(false);
    }

    match config.listen_addr {
        Some(addr) => {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .map_err(|e| Error::operation("metrics_exporter_install", e))?;
            tracing::info!(%addr, "Prometheus metrics listener started");
        },
        None => {
            PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| Error::operation("metrics_recorder_install", e))?;
            tracing::debug!("Prometheus recorder installed without listener");
        },
    }

    Ok(true)
}
