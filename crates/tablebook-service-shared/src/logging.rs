//! Structured logging for the reservation service.
//!
//! `LOG_FORMAT` selects `json` (default) or `text`, `RUST_LOG` the filter and
//! `SERVICE_NAME` the `service` member stamped on every JSON line.
//!
//! ```no_run
//! use tablebook_service_shared::logging::{init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::from_env().with_service("reservations"));
//! ```

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt as tracing_fmt, prelude::*, EnvFilter};

/// Service name used when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "tablebook";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl LogFormat {
    /// `text` and `pretty` select text output; anything else is JSON.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub level: String,
    pub service: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
            service: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::from_str(&v))
                .unwrap_or_default(),
            level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            service: lookup("SERVICE_NAME").filter(|name| !name.trim().is_empty()),
        }
    }

    /// Set the service name unless `SERVICE_NAME` already supplied one.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        if self.service.is_none() {
            self.service = Some(service.into());
        }
        self
    }

    pub fn service_name(&self) -> &str {
        self.service.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }
}

/// JSON event format with the service name as a top-level member:
///
/// ```json
/// {"timestamp":"2024-06-01T18:00:00.000Z","level":"INFO","service":"reservations","target":"tablebook_lib::booking","span":"request","fields":{"message":"reservation committed","table_number":5}}
/// ```
#[derive(Debug, Clone)]
pub struct ServiceJsonFormat {
    service: String,
}

impl ServiceJsonFormat {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for ServiceJsonFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let mut fields = JsonFields::default();
        event.record(&mut fields);

        let mut line = Map::new();
        line.insert(
            "timestamp".into(),
            Utc::now()
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .into(),
        );
        line.insert("level".into(), metadata.level().to_string().into());
        line.insert("service".into(), self.service.clone().into());
        line.insert("target".into(), metadata.target().into());
        if let Some(span) = ctx.lookup_current() {
            line.insert("span".into(), span.name().into());
        }
        line.insert("fields".into(), Value::Object(fields.0));

        let rendered = serde_json::to_string(&line).map_err(|_| fmt::Error)?;
        writeln!(writer, "{rendered}")
    }
}

#[derive(Default)]
struct JsonFields(Map<String, Value>);

impl Visit for JsonFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().to_string(), format!("{value:?}").into());
    }
}

/// Install the global subscriber. Only the first call installs one; later
/// calls return `false`.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Text => registry
            .with(tracing_fmt::layer().pretty())
            .try_init()
            .is_ok(),
        LogFormat::Json => registry
            .with(tracing_fmt::layer().event_format(ServiceJsonFormat::new(config.service_name())))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(
            service = config.service_name(),
            format = ?config.format,
            "logging initialized"
        );
    }
    installed
}
