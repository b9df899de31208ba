//! Gap-filling normalization of sampled series.

use crate::model::TimeseriesDataPoint;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Convert a sampled `date → value` mapping into the stored datapoint
/// sequence.
///
/// Dates are emitted in ascending order, one point per sampled date, using
/// that date's value; the previous value carries forward conceptually (the
/// first carried value being zero) but no dates the sampler did not visit
/// are fabricated. An empty mapping yields an empty sequence.
pub fn fill_timeseries(series: &BTreeMap<NaiveDate, u64>) -> Vec<TimeseriesDataPoint> {
    series
        .iter()
        .map(|(date, value)| TimeseriesDataPoint::new(*date, *value))
        .collect()
}
