//! Prometheus remote-read endpoint
//!
//! POST /read
//! Content-Encoding: snappy
//! Content-Type: application/x-protobuf

use crate::api::ApiState;
use crate::prompb::{self, ReadRequest};
use crate::proxy::ReadOutcome;
use crate::Error;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

/// Handle a remote-read request
///
/// Every response carries the [`ReadOutcome`] it ended in as an extension.
pub async fn handle_remote_read(State(state): State<ApiState>, body: Bytes) -> Response {
    // 1. Decompress and decode
    let request: ReadRequest = match prompb::decode_snappy(&body) {
        Ok(req) => req,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e, ReadOutcome::Malformed),
    };

    // 2. Rewrite, query, relabel
    let (response, outcome) = match state.proxy.serve(request).await {
        Ok(served) => served,
        Err(e) => return error_response(status_for(&e), &e, ReadOutcome::Rejected),
    };

    // 3. Encode and compress
    let payload = match prompb::encode_snappy(&response) {
        Ok(data) => data,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e,
                ReadOutcome::EncodeFailed,
            )
        }
    };

    let mut response = (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/x-protobuf"),
            (CONTENT_ENCODING, "snappy"),
        ],
        payload,
    )
        .into_response();
    response.extensions_mut().insert(outcome);
    response
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidRequest(_) | Error::Decode(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, err: &Error, outcome: ReadOutcome) -> Response {
    warn!(
        status = status.as_u16(),
        outcome = outcome.as_str(),
        err = %err,
        "Remote-read request failed"
    );
    let mut response = (status, err.to_string()).into_response();
    response.extensions_mut().insert(outcome);
    response
}
