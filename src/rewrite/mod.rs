//! Request and response rewriting between SLO and backend namespaces
//!
//! The proxy only answers queries whose metric name carries the `slo:` prefix.
//! On the way in the prefix is stripped so the backend sees the raw metric;
//! on the way out it is restored and override values are substituted.

mod matchers;
mod relabel;

pub use matchers::{rewrite_query, Rewrite};
pub use relabel::{relabel_series, RelabelStats};

/// Prefix marking a series as a service-level objective.
pub const SLO_PREFIX: &str = "slo:";
