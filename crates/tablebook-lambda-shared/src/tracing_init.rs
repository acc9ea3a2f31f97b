//! JSON tracing for Lambda functions.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Install a JSON subscriber writing one flattened object per event, as the
/// log collector expects.
///
/// Call once from `main` before `lambda_runtime::run`. Returns `false` when a
/// global subscriber was already installed.
///
/// ```no_run
/// tablebook_lambda_shared::init_tracing();
/// ```
pub fn init_tracing() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
