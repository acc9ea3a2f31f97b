//! Table reservation HTTP microservice.
//!
//! # Configuration
//!
//! - `RESERVATIONS_DB_PATH` - Path to the reservations database (default: /data/reservations.db)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `METRICS_ENABLED`, `METRICS_PATH` - Prometheus endpoint
//! - `BOOKING_MAX_ATTEMPTS`, `BOOKING_RETRY_BASE_MS` - storage retry policy

use std::env;
use std::net::SocketAddr;

use tracing::{error, info};

use tablebook_lib::{DEFAULT_DB_PATH, ENV_DB_PATH};
use tablebook_service_reservations::router_with_metrics;
use tablebook_service_shared::{init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("reservations");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        // Metrics are optional.
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let db_path = env::var(ENV_DB_PATH).unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    info!(db_path = %db_path, port = port, "starting reservation service");

    let state = AppState::load(&db_path).map_err(|e| {
        error!(error = %e, path = %db_path, "failed to load application state");
        e
    })?;

    let app = router_with_metrics(state, &metrics_config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
