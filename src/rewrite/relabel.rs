//! Restore SLO naming on backend results and apply override values

use super::SLO_PREFIX;
use crate::overrides::OverrideTable;
use crate::prompb::{Label, Sample, TimeSeries, METRIC_NAME_LABEL};

/// Counters collected while relabeling one result set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelabelStats {
    /// Series returned by the backend
    pub series: usize,
    /// Series whose samples were replaced by an override value
    pub overridden_series: usize,
    /// Samples replaced by an override value
    pub overridden_samples: usize,
}

/// Build the SLO-namespace result from backend series.
///
/// Every `__name__` label `X` becomes `slo:X`. The last `__name__` value seen
/// is looked up in `overrides`; on a hit, each sample keeps its timestamp and
/// takes the override value. Series without `__name__` are copied as-is.
/// Series and sample order is preserved.
pub fn relabel_series(
    backend_series: &[TimeSeries],
    overrides: &OverrideTable,
) -> (Vec<TimeSeries>, RelabelStats) {
    let mut stats = RelabelStats {
        series: backend_series.len(),
        ..Default::default()
    };

    let series = backend_series
        .iter()
        .map(|ts| {
            let mut bare_name: Option<&str> = None;
            let labels: Vec<Label> = ts
                .labels
                .iter()
                .map(|label| {
                    if label.name == METRIC_NAME_LABEL {
                        bare_name = Some(label.value.as_str());
                        Label::new(METRIC_NAME_LABEL, format!("{SLO_PREFIX}{}", label.value))
                    } else {
                        label.clone()
                    }
                })
                .collect();

            let samples = match bare_name.and_then(|name| overrides.lookup(name)) {
                Some(value) => {
                    stats.overridden_series += 1;
                    stats.overridden_samples += ts.samples.len();
                    ts.samples
                        .iter()
                        .map(|s| Sample::new(s.timestamp, value))
                        .collect()
                }
                None => ts.samples.clone(),
            };

            TimeSeries {
                labels,
                samples,
                exemplars: ts.exemplars.clone(),
            }
        })
        .collect();

    (series, stats)
}
