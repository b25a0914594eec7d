//! Remote-read backend interface
//!
//! The proxy forwards one rewritten query per request to a storage system
//! speaking the Prometheus remote-read protocol.

mod http;

pub use http::{HttpBackend, HttpBackendConfig};

use crate::prompb::{Query, TimeSeries};
use crate::Result;
use async_trait::async_trait;

/// Backend query executor
///
/// Implementations run a single query against the storage system and return
/// the matching series. Errors are opaque to the caller and never retried.
#[async_trait]
pub trait RemoteReadBackend: Send + Sync {
    /// Execute `query` and return the series it selects.
    async fn read(&self, query: &Query) -> Result<Vec<TimeSeries>>;
}
