//! Collapses raw price observations into one mean price per calendar bucket.

use crate::domain::{Decimal, Granularity, PriceObservation, PricePoint, PriceSeries, UnixTime};
use std::collections::BTreeMap;

/// Group observations by bucket and average them.
///
/// Buckets without observations are absent from the result; nothing is
/// interpolated.
pub fn bucketize(observations: &[PriceObservation], granularity: Granularity) -> PriceSeries {
    let mut buckets: BTreeMap<i64, Vec<Decimal>> = BTreeMap::new();
    for observation in observations {
        buckets
            .entry(granularity.bucket_start(observation.timestamp.as_secs()))
            .or_default()
            .push(observation.price);
    }

    let points = buckets
        .into_iter()
        .filter_map(|(start, prices)| {
            Decimal::mean(&prices).map(|price| PricePoint {
                bucket_start: UnixTime::new(start),
                price,
            })
        })
        .collect();
    PriceSeries::new(points)
}
