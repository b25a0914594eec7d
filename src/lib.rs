//! # slo-proxy
//!
//! A Prometheus remote-read proxy that serves service-level objective series.
//!
//! Queries for `slo:<metric>` are forwarded to a remote-read backend as
//! `<metric>`, and the returned series are renamed back into the `slo:`
//! namespace. When the bare metric name has a configured override, every
//! sample value in the series is replaced with the override constant, which
//! lets a dashboard plot an objective line next to the measured series.
//!
//! ## Request flow
//!
//! - **Transport** ([`api`]): snappy + protobuf remote-read envelope over HTTP
//! - **Matcher rewrite** ([`rewrite::rewrite_query`]): strips the `slo:` prefix,
//!   or short-circuits queries that are not SLO queries
//! - **Backend** ([`backend`]): remote-read client for the storage system
//! - **Relabel** ([`rewrite::relabel_series`]): restores the prefix and applies
//!   the [`OverrideTable`]

pub mod api;
pub mod backend;
pub mod config;
pub mod overrides;
pub mod prompb;
pub mod proxy;
pub mod rewrite;
pub mod telemetry;

mod error;

pub use error::{Error, Result};
pub use overrides::{OverrideRule, OverrideTable};
pub use proxy::ReadProxy;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::backend::{HttpBackend, RemoteReadBackend};
    pub use crate::config::{ComponentFactory, ProxyConfig};
    pub use crate::overrides::{OverrideRule, OverrideTable};
    pub use crate::proxy::ReadProxy;
    pub use crate::{Error, Result};
}
