//! Proxy-path telemetry instruments and recording helpers.

use crate::rewrite::RelabelStats;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct ProxyInstruments {
    read_requests: Counter<u64>,
    read_duration_seconds: Histogram<f64>,
    backend_duration_seconds: Histogram<f64>,
    series_returned: Histogram<u64>,
    overridden_series: Counter<u64>,
    overridden_samples: Counter<u64>,
}

fn instruments() -> &'static ProxyInstruments {
    static INSTRUMENTS: OnceLock<ProxyInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("slo_proxy.read");
        ProxyInstruments {
            read_requests: meter
                .u64_counter("slo_proxy.read.requests")
                .with_description("Remote-read requests by outcome")
                .init(),
            read_duration_seconds: meter
                .f64_histogram("slo_proxy.read.duration")
                .with_description("Remote-read end-to-end latency")
                .with_unit("s")
                .init(),
            backend_duration_seconds: meter
                .f64_histogram("slo_proxy.backend.duration")
                .with_description("Backend remote-read round trip latency")
                .with_unit("s")
                .init(),
            series_returned: meter
                .u64_histogram("slo_proxy.read.series_returned")
                .with_description("Series returned per remote-read request")
                .init(),
            overridden_series: meter
                .u64_counter("slo_proxy.override.series")
                .with_description("Series whose samples were replaced by an override value")
                .init(),
            overridden_samples: meter
                .u64_counter("slo_proxy.override.samples")
                .with_description("Samples replaced by an override value")
                .init(),
        }
    })
}

/// Terminal state of one proxied read
///
/// The `/read` handler attaches it to the response extensions so the HTTP
/// layer can label its metrics with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Body could not be decompressed or decoded.
    Malformed,
    Rejected,
    ShortCircuited,
    BackendError,
    Relabeled,
    /// Response could not be serialized.
    EncodeFailed,
}

impl ReadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadOutcome::Malformed => "malformed",
            ReadOutcome::Rejected => "rejected",
            ReadOutcome::ShortCircuited => "short_circuit",
            ReadOutcome::BackendError => "backend_error",
            ReadOutcome::Relabeled => "relabeled",
            ReadOutcome::EncodeFailed => "encode_error",
        }
    }
}

pub fn record_read(
    outcome: ReadOutcome,
    error_class: Option<&'static str>,
    duration_seconds: f64,
    series_returned: u64,
) {
    let i = instruments();
    let mut attrs = vec![KeyValue::new("outcome", outcome.as_str())];
    if let Some(error_class) = error_class {
        attrs.push(KeyValue::new("error.class", error_class));
    }

    i.read_requests.add(1, &attrs);
    i.read_duration_seconds.record(duration_seconds, &attrs);
    i.series_returned.record(series_returned, &attrs);
}

pub fn record_backend_call(success: bool, duration_seconds: f64) {
    let outcome = if success { "ok" } else { "error" };
    instruments()
        .backend_duration_seconds
        .record(duration_seconds, &[KeyValue::new("outcome", outcome)]);
}

pub fn record_overrides(stats: &RelabelStats) {
    let i = instruments();
    if stats.overridden_series > 0 {
        i.overridden_series.add(stats.overridden_series as u64, &[]);
    }
    if stats.overridden_samples > 0 {
        i.overridden_samples.add(stats.overridden_samples as u64, &[]);
    }
}
