//! HTTP middleware for the reservation service.
//!
//! - [`RequestId`]: correlation ID taken from `X-Request-ID` or generated (UUID v7)
//! - [`MetricsLayer`]: Tower middleware that records HTTP metrics, opens the
//!   per-request tracing span and propagates the request ID
//!
//! # Request ID Propagation
//!
//! The ID is stored in the request extensions (handlers read it back with
//! [`request_id_of`]) and echoed on the response as `X-Request-ID`, so a
//! client can quote it when reporting a failed booking.
//!
//! # Metrics Recording
//!
//! - `http_requests_total`: Counter by method, path, status bucket
//! - `http_request_duration_seconds`: Histogram by method, path
//! - `http_request_size_bytes`: Histogram by method, path
//! - `http_response_size_bytes`: Histogram by method, path

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, HeaderName, HeaderValue, Request, Response};
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use tracing::{info_span, Span};
use uuid::Uuid;

/// Header carrying the correlation ID in both directions.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Newtype wrapper for request correlation IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Create a new request ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new UUID v7 request ID.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the request ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Extract the request ID from headers or generate a new UUID v7.
///
/// Empty or non-UTF-8 header values are replaced by a fresh ID.
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(RequestId::from)
        .unwrap_or_else(RequestId::generate)
}

/// The request ID [`MetricsLayer`] attached to this request, or a fresh one
/// when the layer is not installed.
pub fn request_id_of(extensions: &Extensions) -> RequestId {
    extensions
        .get::<RequestId>()
        .cloned()
        .unwrap_or_else(RequestId::generate)
}

/// Handlers take `RequestId` as an argument to read the propagated ID.
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(request_id_of(&parts.extensions))
    }
}

/// Strip the query string so metric labels stay low-cardinality.
pub fn normalize_path(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

/// Convert HTTP status code to bucket label.
///
/// Groups status codes into buckets: "2xx", "3xx", "4xx", "5xx".
fn status_bucket(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

// =============================================================================
// MetricsLayer - Tower middleware for HTTP metrics
// =============================================================================

/// Tower layer for recording HTTP metrics.
///
/// Wraps services to record:
/// - `http_requests_total`: Counter by method, path, status bucket
/// - `http_request_duration_seconds`: Histogram by method, path
/// - `http_request_size_bytes`: Histogram by method, path
/// - `http_response_size_bytes`: Histogram by method, path
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsMiddleware { inner }
    }
}

/// Middleware service that records HTTP metrics.
#[derive(Debug, Clone)]
pub struct MetricsMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: http_body::Body + Send + 'static,
    ResBody: http_body::Body + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = MetricsFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();

        let method = req.method().to_string();
        let path = normalize_path(req.uri().path()).to_string();

        if let Some(content_length) = req.headers().get(http::header::CONTENT_LENGTH) {
            if let Ok(size) = content_length.to_str().unwrap_or("0").parse::<f64>() {
                metrics::histogram!(
                    "http_request_size_bytes",
                    "method" => method.clone(),
                    "path" => path.clone()
                )
                .record(size);
            }
        }

        let request_id = extract_or_generate_request_id(req.headers());
        req.extensions_mut().insert(request_id.clone());
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string());

        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %method,
            path = %path,
            remote_addr = remote_addr.as_deref().unwrap_or("-"),
        );

        {
            let _enter = span.enter();
            tracing::info!("handling request");
        }

        let future = self.inner.call(req);

        MetricsFuture {
            inner: future,
            start,
            method,
            path,
            request_id,
            span,
        }
    }
}

pin_project! {
    /// Future wrapper that records metrics on completion.
    pub struct MetricsFuture<F> {
        #[pin]
        inner: F,
        start: Instant,
        method: String,
        path: String,
        request_id: RequestId,
        span: Span,
    }
}

impl<F, ResBody, E> Future for MetricsFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
    ResBody: http_body::Body,
{
    type Output = F::Output;


    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _enter = this.span.enter();

        match this.inner.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(mut result) => {
                let duration = this.start.elapsed();
                let duration_secs = duration.as_secs_f64();
                let latency_ms = duration.as_secs_f64() * 1000.0;

                match &mut result {
                    Ok(response) => {
                        if let Ok(value) = HeaderValue::from_str(this.request_id.as_str()) {
                            response.headers_mut().insert(REQUEST_ID_HEADER, value);
                        }

                        let status = response.status().as_u16();
                        let status_label = status_bucket(status);

                        metrics::counter!(
                            "http_requests_total",
                            "method" => this.method.clone(),
                            "path" => this.path.clone(),
                            "status" => status_label
                        )
                        .increment(1);

                        metrics::histogram!(
                            "http_request_duration_seconds",
                            "method" => this.method.clone(),
                            "path" => this.path.clone()
                        )
                        .record(duration_secs);

                        if let Some(content_length) = response.headers().get(http::header::CONTENT_LENGTH) {
                            if let Ok(size) = content_length.to_str().unwrap_or("0").parse::<f64>() {
                                metrics::histogram!(
                                    "http_response_size_bytes",
                                    "method" => this.method.clone(),
                                    "path" => this.path.clone()
                                )
                                .record(size);
                            }
                        }

                        if status >= 500 {
                            tracing::warn!(status, latency_ms, "request completed");
                        } else {
                            tracing::info!(status, latency_ms, "request completed");
                        }
                    }
                    Err(_) => {
                        // Transport errors count as 5xx.
                        metrics::counter!(
                            "http_requests_total",
                            "method" => this.method.clone(),
                            "path" => this.path.clone(),
                            "status" => "5xx"
                        )
                        .increment(1);

                        metrics::histogram!(
                            "http_request_duration_seconds",
                            "method" => this.method.clone(),
                            "path" => this.path.clone()
                        )
                        .record(duration_secs);

                        tracing::error!(latency_ms, "request failed");
                    }
                }

                Poll::Ready(result)
            }
        }
    }
}
