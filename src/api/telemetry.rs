//! Per-route HTTP metrics, labelled with the remote-read outcome.

use crate::proxy::ReadOutcome;

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info_span, Instrument};

struct RouteInstruments {
    responses: Counter<u64>,
    latency_seconds: Histogram<f64>,
}

fn route_instruments() -> &'static RouteInstruments {
    static INSTRUMENTS: OnceLock<RouteInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("slo_proxy.http");
        RouteInstruments {
            responses: meter
                .u64_counter("slo_proxy.http.responses")
                .with_description("HTTP responses by route, status class and read outcome")
                .init(),
            latency_seconds: meter
                .f64_histogram("slo_proxy.http.latency")
                .with_description("Time from request arrival to response headers")
                .with_unit("s")
                .init(),
        }
    })
}

/// Collapse a status code into its class (`2xx`, `4xx`, ...).
fn status_class(status: u16) -> &'static str {
    match status / 100 {
        1 => "1xx",
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        _ => "5xx",
    }
}

fn route_attributes(route: &str, status: u16, outcome: Option<ReadOutcome>) -> Vec<KeyValue> {
    let mut attrs = vec![
        KeyValue::new("http.route", route.to_string()),
        KeyValue::new("http.status_class", status_class(status)),
    ];
    // Only `/read` reports an outcome; health routes stay two-dimensional.
    if let Some(outcome) = outcome {
        attrs.push(KeyValue::new("slo_proxy.read.outcome", outcome.as_str()));
    }
    attrs
}

/// Times each request and counts it under its route, status class and, for
/// `/read`, the [`ReadOutcome`] the handler attached to the response.
pub async fn route_metrics_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let span = info_span!("slo_proxy.http", method = %req.method(), route = %route);
    let response = next.run(req).instrument(span).await;

    let elapsed = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    let outcome = response.extensions().get::<ReadOutcome>().copied();
    let attrs = route_attributes(&route, status, outcome);

    let instruments = route_instruments();
    instruments.responses.add(1, &attrs);
    instruments.latency_seconds.record(elapsed, &attrs);

    debug!(
        route = %route,
        status,
        outcome = outcome.map(|o| o.as_str()).unwrap_or("none"),
        elapsed_s = elapsed,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_collapse_to_classes() {
        assert_eq!(status_class(200), "2xx");
        assert_eq!(status_class(405), "4xx");
        assert_eq!(status_class(500), "5xx");
    }

    #[test]
    fn read_outcome_becomes_an_attribute() {
        let attrs = route_attributes("/read", 200, Some(ReadOutcome::ShortCircuited));
        assert!(attrs.contains(&KeyValue::new("slo_proxy.read.outcome", "short_circuit")));

        let attrs = route_attributes("/health", 200, None);
        assert_eq!(attrs.len(), 2);
    }
}
