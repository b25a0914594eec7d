//! Remote-read request orchestration
//!
//! A request moves through these states:
//!
//! `Received → Validated → Rewritten → (ShortCircuited | BackendQueried) → Relabeled → Responded`
//!
//! - requests that do not carry exactly one query are rejected
//! - queries whose metric name lacks the `slo:` prefix are answered with no data
//! - backend failures are logged and answered with no data

mod telemetry;

pub use telemetry::ReadOutcome;

use crate::backend::RemoteReadBackend;
use crate::overrides::OverrideTable;
use crate::prompb::{ReadRequest, ReadResponse};
use crate::rewrite::{relabel_series, rewrite_query, Rewrite};
use crate::{Error, Result};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info_span, Instrument};

/// Message returned to callers that send more or fewer than one query.
pub const ONE_QUERY_ONLY: &str = "Can only handle one query.";

/// Request handler shared by every connection
///
/// Cloning is cheap: the override table and the backend are shared handles
/// and are never mutated after startup.
#[derive(Clone)]
pub struct ReadProxy {
    overrides: Arc<OverrideTable>,
    backend: Arc<dyn RemoteReadBackend>,
}

impl ReadProxy {
    pub fn new(overrides: Arc<OverrideTable>, backend: Arc<dyn RemoteReadBackend>) -> Self {
        Self { overrides, backend }
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    /// Serve one decoded remote-read request.
    ///
    /// Only a malformed request produces an error; every other path yields a
    /// response carrying exactly one (possibly empty) query result.
    pub async fn handle(&self, request: ReadRequest) -> Result<ReadResponse> {
        self.serve(request).await.map(|(response, _)| response)
    }

    /// Like [`ReadProxy::handle`], also reporting which terminal state the
    /// request reached.
    pub async fn serve(&self, request: ReadRequest) -> Result<(ReadResponse, ReadOutcome)> {
        let start = Instant::now();

        let query = match <[_; 1]>::try_from(request.queries) {
            Ok([query]) => query,
            Err(queries) => {
                debug!(queries = queries.len(), "Rejecting remote-read request");
                telemetry::record_read(
                    ReadOutcome::Rejected,
                    Some("invalid_request"),
                    start.elapsed().as_secs_f64(),
                    0,
                );
                return Err(Error::InvalidRequest(ONE_QUERY_ONLY.to_string()));
            }
        };

        let query = match rewrite_query(query) {
            Rewrite::Forward(query) => query,
            Rewrite::ShortCircuit { metric_name } => {
                debug!(metric_name = %metric_name, "Not an SLO query, returning no data");
                telemetry::record_read(
                    ReadOutcome::ShortCircuited,
                    None,
                    start.elapsed().as_secs_f64(),
                    0,
                );
                return Ok((ReadResponse::single(Vec::new()), ReadOutcome::ShortCircuited));
            }
        };

        let span = info_span!(
            "slo_proxy.backend_read",
            start_ms = query.start_timestamp_ms,
            end_ms = query.end_timestamp_ms,
            matchers = query.matchers.len()
        );
        let backend_start = Instant::now();
        let backend_result = self.backend.read(&query).instrument(span).await;
        telemetry::record_backend_call(
            backend_result.is_ok(),
            backend_start.elapsed().as_secs_f64(),
        );

        let backend_series = match backend_result {
            Ok(series) => series,
            Err(e) => {
                // Callers expect a well-formed response, so backend failures
                // degrade to an empty result instead of an error status.
                error!(err = %e, error_class = e.class(), "Remote read against backend failed");
                telemetry::record_read(
                    ReadOutcome::BackendError,
                    Some(e.class()),
                    start.elapsed().as_secs_f64(),
                    0,
                );
                return Ok((ReadResponse::single(Vec::new()), ReadOutcome::BackendError));
            }
        };

        let (series, stats) = relabel_series(&backend_series, &self.overrides);
        telemetry::record_overrides(&stats);
        telemetry::record_read(
            ReadOutcome::Relabeled,
            None,
            start.elapsed().as_secs_f64(),
            series.len() as u64,
        );
        debug!(
            series = stats.series,
            overridden_series = stats.overridden_series,
            overridden_samples = stats.overridden_samples,
            "Relabeled backend result"
        );

        Ok((ReadResponse::single(series), ReadOutcome::Relabeled))
    }
}
