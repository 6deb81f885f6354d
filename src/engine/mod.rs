//! Pure computation engine for period virtualization and settlement.

use crate::domain::{FundingInterval, Granularity, PriceSeries, UnixTime, VirtualPeriod};

pub mod bucketizer;
pub mod fiat;
pub mod normalizer;
pub mod settlement;
pub mod virtualizer;

pub use bucketizer::bucketize;
pub use normalizer::{normalize_records, NormalizeError, TokenCatalog};
pub use settlement::{token_amount, Direction, SignPolicy};
pub use virtualizer::{virtualize, PeriodSpan, QueryWindow};

/// Virtualize one interval and settle every resulting period.
///
/// `prices` is `None` when the token has no price match, in which case every
/// period's fiat amount is omitted. Amounts carry the sign of `direction`.
pub fn settle_interval(
    interval: &FundingInterval,
    window: QueryWindow,
    granularity: Granularity,
    as_of: UnixTime,
    direction: Direction,
    prices: Option<&PriceSeries>,
) -> Vec<VirtualPeriod> {
    let decimals = interval.token.decimals;

    virtualize(interval, window, granularity, as_of)
        .into_iter()
        .map(|span| {
            let amount = token_amount(interval, &span);
            let amount_fiat = prices.map(|series| {
                if interval.is_transfer() {
                    fiat::transfer_fiat(span.start.as_secs(), &amount, decimals, series)
                } else {
                    fiat::stream_fiat(&span, &interval.flow_rate, decimals, series)
                }
            });

            VirtualPeriod {
                start_time: span.start,
                end_time: span.end,
                amount: direction.apply(amount),
                amount_fiat: amount_fiat.map(|fiat| direction.apply(fiat)),
            }
        })
        .collect()
}
