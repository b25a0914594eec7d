//! Logging and metrics bootstrap for the proxy binary.

use crate::{Error, Result};

use opentelemetry::global;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Environment switch between JSON (default) and plain-text log lines.
pub const LOG_JSON_ENV: &str = "SLO_PROXY_LOG_JSON";

/// Installed logging and the global meter provider.
///
/// Metric instruments record into this provider, but no reader or exporter is
/// attached here: values are only collected once one is configured on the
/// provider. Until then every `record_*` call is a no-op.
pub struct Telemetry {
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    /// Install the tracing subscriber and the global meter provider.
    pub fn init(log_level: &str) -> Result<Self> {
        let level = parse_log_level(log_level)?;
        let json_logs = match std::env::var(LOG_JSON_ENV) {
            Ok(raw) => parse_bool(LOG_JSON_ENV, &raw)?,
            Err(_) => true,
        };

        let builder = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true);
        let installed = if json_logs {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        installed.map_err(|e| {
            Error::Config(format!("failed to initialize telemetry subscriber: {e}"))
        })?;

        let meter_provider = SdkMeterProvider::builder().build();
        global::set_meter_provider(meter_provider.clone());

        info!(json_logs, log_level = %level, "Telemetry bootstrap initialized");

        Ok(Self { meter_provider })
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        let _ = self.meter_provider.shutdown();
    }
}

pub(crate) fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(Error::Config(format!(
            "invalid log level '{other}', expected one of [trace, debug, info, warn, error]"
        ))),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{name} must be a boolean (true/false/1/0), got '{raw}'"
        ))),
    }
}
