//! Matcher translation from SLO namespace into backend namespace

use super::SLO_PREFIX;
use crate::prompb::{Query, METRIC_NAME_LABEL};

/// Outcome of rewriting an incoming query
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// Query in backend namespace, ready to forward
    Forward(Query),
    /// Not an SLO query; answer with no data and skip the backend
    ShortCircuit {
        /// The `__name__` matcher value that lacked the prefix
        metric_name: String,
    },
}

/// Strip the `slo:` prefix from every `__name__` matcher, in matcher order.
///
/// The first `__name__` matcher without the prefix short-circuits the whole
/// query. The match type is not inspected, so regex matchers on `slo:...`
/// are forwarded with the prefix removed as well. Queries with no `__name__`
/// matcher pass through unchanged.
pub fn rewrite_query(mut query: Query) -> Rewrite {
    for matcher in query.matchers.iter_mut() {
        if matcher.name != METRIC_NAME_LABEL {
            continue;
        }
        match matcher.value.strip_prefix(SLO_PREFIX) {
            Some(bare) => matcher.value = bare.to_string(),
            None => {
                return Rewrite::ShortCircuit {
                    metric_name: std::mem::take(&mut matcher.value),
                }
            }
        }
    }
    Rewrite::Forward(query)
}
