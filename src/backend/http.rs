//! Remote-read client over HTTP
//!
//! Sends a snappy-compressed protobuf `ReadRequest` and decodes the
//! sample-based `ReadResponse`.

use super::RemoteReadBackend;
use crate::prompb::{self, Query, ReadRequest, ReadResponse, TimeSeries};
use crate::{Error, Result};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

const REMOTE_READ_VERSION_HEADER: &str = "x-prometheus-remote-read-version";
const REMOTE_READ_VERSION: &str = "0.1.0";

/// Configuration for [`HttpBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Remote-read endpoint, e.g. `http://localhost:9090/api/v1/read`
    pub url: Url,
    /// Upper bound on a single backend round trip
    pub timeout: Duration,
}

impl HttpBackendConfig {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "remote-read URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if timeout.is_zero() {
            return Err(Error::Config(
                "remote-read timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self { url, timeout })
    }
}

/// Remote-read backend reached over HTTP
pub struct HttpBackend {
    config: HttpBackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("snappy"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-protobuf"),
        );
        headers.insert(
            REMOTE_READ_VERSION_HEADER,
            HeaderValue::from_static(REMOTE_READ_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("slo-proxy/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn url(&self) -> &Url {
        &self.config.url
    }
}

#[async_trait]
impl RemoteReadBackend for HttpBackend {
    async fn read(&self, query: &Query) -> Result<Vec<TimeSeries>> {
        let start = Instant::now();
        let request = ReadRequest {
            queries: vec![query.clone()],
            accepted_response_types: vec![],
        };
        let body = prompb::encode_snappy(&request)?;

        let response = self
            .client
            .post(self.config.url.clone())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let first_line = text.lines().next().unwrap_or_default().to_string();
            return Err(Error::BackendStatus {
                status: status.as_u16(),
                body: first_line,
            });
        }

        let compressed = response.bytes().await?;
        let mut decoded: ReadResponse = prompb::decode_snappy(&compressed)
            .map_err(|e| Error::Backend(format!("invalid remote-read response: {e}")))?;

        if decoded.results.len() != request.queries.len() {
            return Err(Error::Backend(format!(
                "responses: want {}, got {}",
                request.queries.len(),
                decoded.results.len()
            )));
        }
        let series = decoded.results.swap_remove(0).timeseries;

        debug!(
            url = %self.config.url,
            series = series.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Remote read completed"
        );

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_accepts_http_urls() {
        let config =
            HttpBackendConfig::new("http://localhost:9090/api/v1/read", Duration::from_secs(60))
                .unwrap();
        assert_eq!(config.url.path(), "/api/v1/read");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn config_rejects_bad_urls() {
        let err = HttpBackendConfig::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = HttpBackendConfig::new("ftp://host/read", Duration::from_secs(1)).unwrap_err();
        assert!(format!("{err}").contains("http or https"));
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let err =
            HttpBackendConfig::new("http://localhost:9090/api/v1/read", Duration::ZERO).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("greater than zero")));

        assert!(
            HttpBackendConfig::new("http://localhost:9090/api/v1/read", Duration::from_millis(1))
                .is_ok()
        );
    }
}
