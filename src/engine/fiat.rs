//! Fiat valuation of settled amounts against a step-function price series.

use super::virtualizer::PeriodSpan;
use crate::domain::{Amount, PricePoint, PriceSeries};

/// Integrate a constant flow over `span` against `series`.
///
/// The price in force at the span start is carried forward until the next
/// breakpoint inside the span. Time before the first known price contributes
/// nothing. Returns the unsigned fiat value in display units.
pub fn stream_fiat(span: &PeriodSpan, flow_rate: &Amount, decimals: u32, series: &PriceSeries) -> Amount {
    let start = span.start.as_secs();
    let end = span.end.as_secs();

    let relevant: Vec<&PricePoint> = series
        .price_at(start)
        .into_iter()
        .chain(series.breakpoints_within(start, end))
        .collect();

    let mut weighted = Amount::zero();
    for (i, point) in relevant.iter().enumerate() {
        let segment_start = point.bucket_start.as_secs().max(start);
        let segment_end = relevant
            .get(i + 1)
            .map(|next| next.bucket_start.as_secs())
            .unwrap_or(end)
            .min(end);
        let duration = segment_end - segment_start;
        if duration <= 0 {
            continue;
        }
        let price = Amount::from_decimal(point.price);
        weighted = weighted + &Amount::from_i64(duration) * &price;
    }

    (&weighted * flow_rate).scale_down(decimals)
}

/// Value a fixed transfer amount at the price in force at `at`; zero without a prior price.
pub fn transfer_fiat(at: i64, amount: &Amount, decimals: u32, series: &PriceSeries) -> Amount {
    match series.price_at(at) {
        Some(point) => (amount * &Amount::from_decimal(point.price)).scale_down(decimals),
        None => Amount::zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, UnixTime};

    fn series(points: &[(i64, &str)]) -> PriceSeries {
        PriceSeries::new(
            points
                .iter()
                .map(|(start, price)| PricePoint {
                    bucket_start: UnixTime::new(*start),
                    price: Decimal::from_str_canonical(price).unwrap(),
                })
                .collect(),
        )
    }

    fn span(start: i64, end: i64) -> PeriodSpan {
        PeriodSpan {
            start: UnixTime::new(start),
            end: UnixTime::new(end),
        }
    }

    fn wei(s: &str) -> Amount {
        Amount::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_constant_price_over_span() {
        // 1 token/s for 100s at 2.0
        let fiat = stream_fiat(
            &span(100, 200),
            &wei("1000000000000000000"),
            18,
            &series(&[(0, "2.0")]),
        );
        assert_eq!(fiat.to_string(), "200");
    }

    #[test]
    fn test_breakpoint_splits_integral() {
        // 50s at 1.0 then 50s at 3.0
        let fiat = stream_fiat(
            &span(100, 200),
            &wei("1000000000000000000"),
            18,
            &series(&[(0, "1.0"), (150, "3.0"), (300, "9.0")]),
        );
        assert_eq!(fiat.to_string(), "200");
    }

    #[test]
    fn test_no_price_before_first_breakpoint() {
        let fiat = stream_fiat(
            &span(100, 200),
            &wei("1000000000000000000"),
            18,
            &series(&[(180, "5.0")]),
        );
        assert_eq!(fiat.to_string(), "100");
    }

    #[test]
    fn test_empty_series_is_zero() {
        let fiat = stream_fiat(&span(100, 200), &wei("1"), 18, &PriceSeries::default());
        assert!(fiat.is_zero());
    }

    #[test]
    fn test_duplicate_price_point_leaves_integral_unchanged() {
        let rate = wei("385802469135802");
        let base = stream_fiat(&span(100, 10_000), &rate, 18, &series(&[(0, "1.25"), (5_000, "1.5")]));
        let split = stream_fiat(
            &span(100, 10_000),
            &rate,
            18,
            &series(&[(0, "1.25"), (2_000, "1.25"), (5_000, "1.5")]),
        );
        assert_eq!(base, split);
    }

    #[test]
    fn test_transfer_uses_carried_forward_price() {
        let prices = series(&[(0, "1.5"), (1_000, "2.0")]);
        let amount = wei("500000000000000000000");

        assert_eq!(transfer_fiat(999, &amount, 18, &prices).to_string(), "750");
        assert_eq!(transfer_fiat(1_000, &amount, 18, &prices).to_string(), "1000");
        assert!(transfer_fiat(-1, &amount, 18, &prices).is_zero());
    }
}
