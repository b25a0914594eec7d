//! Prometheus remote-read wire types
//!
//! Hand-derived `prost` messages matching `prompb/remote.proto` and
//! `prompb/types.proto`. Only the sample-based response type is modelled;
//! native histograms and chunked responses are not served by this proxy.

use crate::{Error, Result};
use prost::Message;

/// Reserved label holding the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadRequest {
    #[prost(message, repeated, tag = "1")]
    pub queries: Vec<Query>,
    #[prost(enumeration = "ReadResponseType", repeated, tag = "2")]
    pub accepted_response_types: Vec<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadResponse {
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<QueryResult>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ReadResponseType {
    Samples = 0,
    StreamedXorChunks = 1,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Query {
    #[prost(int64, tag = "1")]
    pub start_timestamp_ms: i64,
    #[prost(int64, tag = "2")]
    pub end_timestamp_ms: i64,
    #[prost(message, repeated, tag = "3")]
    pub matchers: Vec<LabelMatcher>,
    #[prost(message, optional, tag = "4")]
    pub hints: Option<ReadHints>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryResult {
    #[prost(message, repeated, tag = "1")]
    pub timeseries: Vec<TimeSeries>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Sample {
    #[prost(double, tag = "1")]
    pub value: f64,
    /// Milliseconds since the epoch
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Exemplar {
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
    #[prost(double, tag = "2")]
    pub value: f64,
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TimeSeries {
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
    #[prost(message, repeated, tag = "2")]
    pub samples: Vec<Sample>,
    #[prost(message, repeated, tag = "3")]
    pub exemplars: Vec<Exemplar>,
}

#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct Label {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LabelMatcher {
    #[prost(enumeration = "MatchType", tag = "1")]
    pub r#type: i32,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MatchType {
    Eq = 0,
    Neq = 1,
    Re = 2,
    Nre = 3,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadHints {
    #[prost(int64, tag = "1")]
    pub step_ms: i64,
    #[prost(string, tag = "2")]
    pub func: String,
    #[prost(int64, tag = "3")]
    pub start_ms: i64,
    #[prost(int64, tag = "4")]
    pub end_ms: i64,
    #[prost(string, repeated, tag = "5")]
    pub grouping: Vec<String>,
    #[prost(bool, tag = "6")]
    pub by: bool,
    #[prost(int64, tag = "7")]
    pub range_ms: i64,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl LabelMatcher {
    pub fn new(match_type: MatchType, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            r#type: match_type as i32,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Equality matcher on `__name__`.
    pub fn metric_name(value: impl Into<String>) -> Self {
        Self::new(MatchType::Eq, METRIC_NAME_LABEL, value)
    }
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { value, timestamp }
    }
}

impl ReadResponse {
    /// A response carrying a single query result.
    pub fn single(timeseries: Vec<TimeSeries>) -> Self {
        Self {
            results: vec![QueryResult { timeseries }],
        }
    }
}

/// Decompress a snappy block and decode the protobuf message inside it.
pub fn decode_snappy<M: Message + Default>(compressed: &[u8]) -> Result<M> {
    let raw = snap::raw::Decoder::new()
        .decompress_vec(compressed)
        .map_err(|e| Error::Decode(format!("snappy: {}", e)))?;
    Ok(M::decode(raw.as_slice())?)
}

/// Encode a protobuf message and compress it as a snappy block.
pub fn encode_snappy<M: Message>(message: &M) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(message.encoded_len());
    message.encode(&mut raw)?;
    snap::raw::Encoder::new()
        .compress_vec(&raw)
        .map_err(|e| Error::Encode(format!("snappy: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_field_tags_match_prometheus() {
        // value is tag 1 (fixed64), timestamp is tag 2 (varint)
        let bytes = Sample::new(5, 1.0).encode_to_vec();
        assert_eq!(bytes[0], 0x09);
        assert_eq!(bytes[9], 0x10);
        assert_eq!(bytes[10], 5);
    }

    #[test]
    fn envelope_survives_snappy_framing() {
        let request = ReadRequest {
            queries: vec![Query {
                start_timestamp_ms: 1_000,
                end_timestamp_ms: 2_000,
                matchers: vec![LabelMatcher::metric_name("slo:up")],
                hints: Some(ReadHints {
                    step_ms: 15_000,
                    ..Default::default()
                }),
            }],
            accepted_response_types: vec![],
        };

        let compressed = encode_snappy(&request).unwrap();
        let decoded: ReadRequest = decode_snappy(&compressed).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn decode_rejects_uncompressed_payload() {
        let raw = ReadRequest::default().encode_to_vec();
        let mut junk = raw.clone();
        junk.extend_from_slice(b"not snappy at all");
        let err = decode_snappy::<ReadRequest>(&junk).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
