//! Prometheus metrics for the reservation service.
//!
//! - [`MetricsConfig`]: Configuration for the metrics system
//! - [`init_metrics`]: Initialize the Prometheus metrics recorder
//! - [`metrics_handler`]: Axum handler for the `/metrics` endpoint
//! - Booking outcome counters
//!
//! # Example
//!
//! ```no_run
//! use tablebook_service_shared::metrics::{MetricsConfig, init_metrics, metrics_handler};
//! use axum::{Router, routing::get};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config).expect("failed to initialize metrics");
//!
//! let app: Router = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use tablebook_lib::ErrorKind;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled.
    pub enabled: bool,
    /// Path for the metrics endpoint (e.g., "/metrics").
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create configuration from environment variables.
    ///
    /// - `METRICS_ENABLED`: "true" or "false" (default: true)
    /// - `METRICS_PATH`: Path for metrics endpoint (default: "/metrics")
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`MetricsConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let path = lookup("METRICS_PATH").unwrap_or_else(|| "/metrics".to_string());

        Self { enabled, path }
    }
}

/// Initialize the Prometheus metrics recorder.
///
/// This must be called once at application startup before any metrics are recorded.
/// Subsequent calls will return an error.
///
/// # Errors
///
/// Returns an error if:
/// - Metrics are disabled in configuration
/// - The recorder has already been installed
/// - The Prometheus builder fails to install
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if [`init_metrics`] has not been called.
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Axum handler for the `/metrics` endpoint.
///
/// Returns Prometheus exposition format text.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, Clone)]
pub enum MetricsError {
    /// Metrics are disabled in configuration.
    Disabled,
    /// The recorder has already been installed.
    AlreadyInitialized,
    /// The Prometheus builder failed to install.
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Booking Metrics
// =============================================================================

/// Record a committed reservation.
///
/// Increments `tablebook_reservations_committed_total`.
pub fn record_reservation_committed() {
    metrics::counter!("tablebook_reservations_committed_total").increment(1);
}

/// Record a rejected booking request.
///
/// Increments `tablebook_reservations_rejected_total`, labelled with the
/// error kind (e.g. "ConflictError", "ValidationError").
pub fn record_reservation_rejected(kind: ErrorKind) {
    metrics::counter!(
        "tablebook_reservations_rejected_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record the size of a listing response.
///
/// Records to the `tablebook_reservations_listed` histogram.
pub fn record_reservations_listed(count: usize) {
    metrics::histogram!("tablebook_reservations_listed").record(count as f64);
}
