//! HTTP backend tests against an in-process remote-read server
//!
//! A small axum server stands in for the storage backend so the real
//! `HttpBackend` (reqwest + snappy + protobuf) is exercised end to end.

use slo_proxy::api::{build_http_router, ApiServerConfig};
use slo_proxy::backend::{HttpBackend, HttpBackendConfig, RemoteReadBackend};
use slo_proxy::prompb::{
    decode_snappy, encode_snappy, Label, LabelMatcher, Query, QueryResult, ReadRequest,
    ReadResponse, Sample, TimeSeries,
};
use slo_proxy::{Error, OverrideRule, OverrideTable, ReadProxy};

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone, Copy)]
enum Mode {
    Serve,
    Fail,
    Stall,
    TwoResults,
}

#[derive(Clone)]
struct MockState {
    mode: Mode,
    series: Vec<TimeSeries>,
    received: Arc<Mutex<Vec<(HeaderMap, ReadRequest)>>>,
}

async fn mock_read(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: ReadRequest = match decode_snappy(&body) {
        Ok(req) => req,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    state.received.lock().unwrap().push((headers, request));

    let response = match state.mode {
        Mode::Serve => ReadResponse::single(state.series.clone()),
        Mode::Fail => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "storage is warming up\nretry later",
            )
                .into_response()
        }
        Mode::Stall => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ReadResponse::single(vec![])
        }
        Mode::TwoResults => ReadResponse {
            results: vec![QueryResult::default(), QueryResult::default()],
        },
    };
    encode_snappy(&response).unwrap().into_response()
}

/// Spawn a mock backend and return its remote-read URL.
async fn spawn_mock(state: MockState) -> Result<String> {
    let app = Router::new()
        .route("/api/v1/read", post(mock_read))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(format!("http://{}/api/v1/read", addr))
}

fn mock_state(mode: Mode, series: Vec<TimeSeries>) -> MockState {
    MockState {
        mode,
        series,
        received: Arc::new(Mutex::new(Vec::new())),
    }
}

fn backend(url: &str, timeout: Duration) -> HttpBackend {
    HttpBackend::new(HttpBackendConfig::new(url, timeout).unwrap()).unwrap()
}

fn up_query() -> Query {
    Query {
        start_timestamp_ms: 10_000,
        end_timestamp_ms: 20_000,
        matchers: vec![LabelMatcher::metric_name("up")],
        hints: None,
    }
}

fn up_series() -> TimeSeries {
    TimeSeries {
        labels: vec![Label::new("__name__", "up"), Label::new("job", "node")],
        samples: vec![Sample::new(10_000, 0.0), Sample::new(15_000, 1.0)],
        exemplars: vec![],
    }
}

#[tokio::test]
async fn test_read_sends_remote_read_envelope() -> Result<()> {
    let state = mock_state(Mode::Serve, vec![up_series()]);
    let url = spawn_mock(state.clone()).await?;

    let series = backend(&url, Duration::from_secs(5)).read(&up_query()).await?;
    assert_eq!(series, vec![up_series()]);

    let received = state.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let (headers, request) = &received[0];
    assert_eq!(headers["content-encoding"], "snappy");
    assert_eq!(headers["content-type"], "application/x-protobuf");
    assert_eq!(headers["x-prometheus-remote-read-version"], "0.1.0");
    assert!(headers["user-agent"]
        .to_str()?
        .starts_with("slo-proxy/"));
    assert_eq!(request.queries, vec![up_query()]);
    Ok(())
}

#[tokio::test]
async fn test_non_success_status_carries_first_body_line() -> Result<()> {
    let url = spawn_mock(mock_state(Mode::Fail, vec![])).await?;

    let err = backend(&url, Duration::from_secs(5))
        .read(&up_query())
        .await
        .unwrap_err();

    match err {
        Error::BackendStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "storage is warming up");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_slow_backend_times_out() -> Result<()> {
    let url = spawn_mock(mock_state(Mode::Stall, vec![])).await?;

    let err = backend(&url, Duration::from_millis(200))
        .read(&up_query())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout), "got {err}");
    Ok(())
}

#[tokio::test]
async fn test_result_count_mismatch_is_an_error() -> Result<()> {
    let url = spawn_mock(mock_state(Mode::TwoResults, vec![])).await?;

    let err = backend(&url, Duration::from_secs(5))
        .read(&up_query())
        .await
        .unwrap_err();

    assert!(format!("{err}").contains("want 1, got 2"));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_is_a_backend_error() -> Result<()> {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let err = backend(
        &format!("http://{}/api/v1/read", addr),
        Duration::from_secs(2),
    )
    .read(&up_query())
    .await
    .unwrap_err();

    assert!(err.is_backend());
    Ok(())
}

/// Full stack: proxy listener -> HttpBackend -> mock storage.
#[tokio::test]
async fn test_proxy_over_real_sockets() -> Result<()> {
    let storage = mock_state(Mode::Serve, vec![up_series()]);
    let storage_url = spawn_mock(storage.clone()).await?;

    let proxy = ReadProxy::new(
        Arc::new(OverrideTable::from_rules(vec![
            OverrideRule::new("up", 0.5),
            OverrideRule::new("up", 0.99),
        ])),
        Arc::new(backend(&storage_url, Duration::from_secs(5))),
    );
    let app = build_http_router(proxy, &ApiServerConfig::default());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let proxy_addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let body = encode_snappy(&ReadRequest {
        queries: vec![Query {
            matchers: vec![LabelMatcher::metric_name("slo:up")],
            ..up_query()
        }],
        accepted_response_types: vec![],
    })?;
    let response = reqwest::Client::new()
        .post(format!("http://{}/read", proxy_addr))
        .header("Content-Type", "application/x-protobuf")
        .header("Content-Encoding", "snappy")
        .body(body)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);

    let decoded: ReadResponse = decode_snappy(&response.bytes().await?)?;
    let out = &decoded.results[0].timeseries;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].labels[0], Label::new("__name__", "slo:up"));
    assert_eq!(
        out[0].samples,
        vec![Sample::new(10_000, 0.99), Sample::new(15_000, 0.99)],
        "last rule for a pattern wins"
    );

    let received = storage.received.lock().unwrap();
    assert_eq!(received[0].1.queries[0].matchers[0].value, "up");
    Ok(())
}
