//! Price observations and bucketized price series.

use crate::domain::{Decimal, UnixTime};
use serde::{Deserialize, Serialize};

/// Raw quote as returned by the market-data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub timestamp: UnixTime,
    pub price: Decimal,
}

impl PriceObservation {
    pub fn new(timestamp: i64, price: Decimal) -> Self {
        Self {
            timestamp: UnixTime::new(timestamp),
            price,
        }
    }
}

/// Mean price of one granularity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub bucket_start: UnixTime,
    pub price: Decimal,
}

/// Step function over time: strictly ascending `bucket_start`, one point per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points, sorting them and keeping the first point per start.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.bucket_start);
        points.dedup_by_key(|p| p.bucket_start);
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last point with `bucket_start <= at`, i.e. the price in force at `at`.
    pub fn price_at(&self, at: i64) -> Option<&PricePoint> {
        let idx = self
            .points
            .partition_point(|p| p.bucket_start.as_secs() <= at);
        idx.checked_sub(1).map(|i| &self.points[i])
    }

    /// Points with `after < bucket_start <= until`.
    pub fn breakpoints_within(&self, after: i64, until: i64) -> &[PricePoint] {
        let lo = self
            .points
            .partition_point(|p| p.bucket_start.as_secs() <= after);
        let hi = self
            .points
            .partition_point(|p| p.bucket_start.as_secs() <= until);
        &self.points[lo..hi.max(lo)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(start: i64, price: &str) -> PricePoint {
        PricePoint {
            bucket_start: UnixTime::new(start),
            price: Decimal::from_str_canonical(price).unwrap(),
        }
    }

    #[test]
    fn test_series_sorted_and_unique() {
        let series = PriceSeries::new(vec![point(20, "2"), point(10, "1"), point(20, "2")]);
        let starts: Vec<i64> = series
            .points()
            .iter()
            .map(|p| p.bucket_start.as_secs())
            .collect();
        assert_eq!(starts, vec![10, 20]);
    }

    #[test]
    fn test_price_at_carries_forward() {
        let series = PriceSeries::new(vec![point(10, "1"), point(20, "2")]);
        assert!(series.price_at(9).is_none());
        assert_eq!(series.price_at(10).unwrap().bucket_start.as_secs(), 10);
        assert_eq!(series.price_at(19).unwrap().bucket_start.as_secs(), 10);
        assert_eq!(series.price_at(500).unwrap().bucket_start.as_secs(), 20);
    }

    #[test]
    fn test_breakpoints_within_excludes_start_includes_end() {
        let series = PriceSeries::new(vec![point(10, "1"), point(20, "2"), point(30, "3")]);
        let inside: Vec<i64> = series
            .breakpoints_within(10, 30)
            .iter()
            .map(|p| p.bucket_start.as_secs())
            .collect();
        assert_eq!(inside, vec![20, 30]);
        assert!(series.breakpoints_within(30, 10).is_empty());
    }
}
