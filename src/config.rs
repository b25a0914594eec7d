//! Process configuration and component factory
//!
//! The binary resolves CLI flags (with environment fallbacks) into a
//! [`ProxyConfig`], and [`ComponentFactory`] turns that into the override
//! table, the backend client, and the request handler.

use crate::backend::{HttpBackend, HttpBackendConfig, RemoteReadBackend};
use crate::overrides::OverrideTable;
use crate::proxy::ReadProxy;
use crate::{Error, Result};

use std::net::{Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_LISTEN_ADDRESS: &str = ":9416";
pub const DEFAULT_CONFIG_FILE: &str = "./configs.yml";
pub const DEFAULT_REMOTE_READ_URL: &str = "http://localhost:9090/api/v1/read";
pub const DEFAULT_REMOTE_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Resolved process configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address the HTTP listener binds to
    pub listen_addr: SocketAddr,
    /// Path of the YAML override document
    pub config_file: PathBuf,
    /// Backend remote-read endpoint
    pub remote_read_url: String,
    /// Backend request timeout
    pub remote_read_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv6Addr::UNSPECIFIED, 9416)),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            remote_read_url: DEFAULT_REMOTE_READ_URL.to_string(),
            remote_read_timeout: DEFAULT_REMOTE_READ_TIMEOUT,
        }
    }
}

/// Parse a listen address.
///
/// A bare `:port` binds the IPv6 wildcard `[::]`, which also accepts IPv4
/// connections on hosts where `net.ipv6.bindv6only` is off (the Linux default).
/// Pass `0.0.0.0:port` to bind IPv4 only.
pub fn parse_listen_addr(raw: &str) -> Result<SocketAddr> {
    let raw = raw.trim();
    let candidate = if raw.starts_with(':') {
        format!("[::]{raw}")
    } else {
        raw.to_string()
    };
    candidate.parse::<SocketAddr>().map_err(|e| {
        Error::Config(format!(
            "invalid listen address '{raw}': {e}; expected host:port or :port"
        ))
    })
}

pub struct ComponentFactory;

impl ComponentFactory {
    /// Load the override table named by the configuration.
    pub fn load_overrides(config: &ProxyConfig) -> Result<Arc<OverrideTable>> {
        let table = OverrideTable::load_file(&config.config_file).map_err(|e| match e {
            Error::Io(io) => Error::Config(format!(
                "cannot read override file {}: {}",
                config.config_file.display(),
                io
            )),
            other => other,
        })?;
        Ok(Arc::new(table))
    }

    /// Create the remote-read backend client.
    pub fn create_backend(config: &ProxyConfig) -> Result<Arc<dyn RemoteReadBackend>> {
        let backend_config =
            HttpBackendConfig::new(&config.remote_read_url, config.remote_read_timeout)?;
        info!(
            url = %backend_config.url,
            timeout_secs = backend_config.timeout.as_secs(),
            "Using HTTP remote-read backend"
        );
        Ok(Arc::new(HttpBackend::new(backend_config)?))
    }

    /// Build the request handler. Any failure here is a startup error.
    pub fn create_proxy(config: &ProxyConfig) -> Result<ReadProxy> {
        let overrides = Self::load_overrides(config)?;
        let backend = Self::create_backend(config)?;
        Ok(ReadProxy::new(overrides, backend))
    }
}
