//! Health check handlers for Kubernetes probes.
//!
//! Provides `/health/live` and `/health/ready` endpoints that return JSON
//! status responses for Kubernetes liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator: "ok" or "not_ready: <reason>".
    pub status: String,

    /// Service name for identification.
    pub service: String,

    /// Service version from build-time.
    pub version: String,

    /// RFC 3339 time the probe was answered.
    pub checked_at: String,

    /// Number of tables in the catalog (for readiness check).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables_loaded: Option<usize>,
}

impl HealthStatus {
    /// Create a healthy liveness status.
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            checked_at: now(),
            tables_loaded: None,
        }
    }

    /// Create a ready status with catalog information.
    pub fn ready(service: &str, version: &str, tables: usize) -> Self {
        Self {
            tables_loaded: Some(tables),
            ..Self::alive(service, version)
        }
    }

    /// Create a not-ready status.
    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            ..Self::alive(service, version)
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Liveness probe handler.
///
/// Returns 200 OK if the process is running; touches no storage.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"tablebook-service-shared","version":"0.1.0","checked_at":"2024-06-01T18:00:00Z"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler.
///
/// Returns 200 OK once the table catalog can be read and holds at least one
/// table; 503 otherwise.
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let coordinator = state.coordinator_arc();
    let counted =
        tokio::task::spawn_blocking(move || coordinator.catalog().table_count()).await;

    let status = match counted {
        Ok(Ok(0)) => HealthStatus::not_ready(service, version, "no tables loaded"),
        Ok(Ok(tables)) => {
            return (StatusCode::OK, Json(HealthStatus::ready(service, version, tables)))
                .into_response()
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check could not read the table catalog");
            HealthStatus::not_ready(service, version, "table catalog unavailable")
        }
        Err(e) => {
            tracing::error!(error = %e, "readiness check task failed");
            HealthStatus::not_ready(service, version, "readiness check failed")
        }
    };

    (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
}
