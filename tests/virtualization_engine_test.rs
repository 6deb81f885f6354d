//! Engine-level properties of virtualization and settlement.

use stream_accounting::domain::{
    Address, Amount, ChainId, Decimal, FundingInterval, Granularity, IntervalKind,
    PriceObservation, PricePoint, PriceSeries, TokenRef, UnixTime,
};
use stream_accounting::engine::{bucketize, settle_interval, virtualize, Direction, QueryWindow};
use tokio_test::assert_ok;

const AS_OF: i64 = 1_700_000_000;

fn interval(flow_rate: &str, started_at: i64, stopped_at: Option<i64>) -> FundingInterval {
    FundingInterval {
        id: "0xperiod".to_string(),
        chain_id: ChainId(137),
        kind: IntervalKind::Stream,
        token: TokenRef {
            id: Address::new("0x1305f6b6df9dc47159d12eb7ac2804d4a33173c2"),
            symbol: "DAIx".to_string(),
            name: "Super DAI".to_string(),
            underlying_address: Address::new("0x8f3cf7ad23cd3cadbd9735aff958023239c6a063"),
            decimals: 18,
        },
        sender: Address::new("0x1111111111111111111111111111111111111111"),
        receiver: Address::new("0x2222222222222222222222222222222222222222"),
        flow_rate: assert_ok!(Amount::from_str_canonical(flow_rate)),
        started_at: UnixTime::new(started_at),
        stopped_at: stopped_at.map(UnixTime::new),
        amount: None,
        started_at_block: None,
        started_at_tx: None,
        stopped_at_block: None,
        stopped_at_tx: None,
    }
}

fn transfer(at: i64, value: &str) -> FundingInterval {
    let mut t = interval("0", at, Some(at));
    t.kind = IntervalKind::Transfer;
    t.amount = Some(assert_ok!(Amount::from_str_canonical(value)));
    t
}

fn settle(
    interval: &FundingInterval,
    start: i64,
    end: i64,
    granularity: Granularity,
    prices: Option<&PriceSeries>,
) -> Vec<stream_accounting::domain::VirtualPeriod> {
    settle_interval(
        interval,
        QueryWindow::new(start, end),
        granularity,
        UnixTime::new(AS_OF),
        Direction::Inflow,
        prices,
    )
}

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

#[test]
fn scenario_a_three_daily_periods() {
    let stream = interval("1", 1_628_411_351, Some(1_628_587_165));
    let periods = settle(&stream, 0, AS_OF, Granularity::Day, None);

    assert_eq!(periods.len(), 3);
    assert_eq!(periods[0].end_time, UnixTime(1_628_467_200));
    assert_eq!(periods[1].start_time, UnixTime(1_628_467_200));
    assert_eq!(periods[1].end_time, UnixTime(1_628_553_600));
    assert_eq!(periods[2].start_time, UnixTime(1_628_553_600));

    let total: Amount = periods.iter().map(|p| p.amount.clone()).sum();
    assert_eq!(total.to_string(), "175814");
}

#[test]
fn scenario_b_single_period_within_one_day() {
    let stream = interval("385802469135802", 1_628_470_000, Some(1_628_480_000));
    let periods = settle(&stream, 0, AS_OF, Granularity::Day, None);

    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].start_time, UnixTime(1_628_470_000));
    assert_eq!(periods[0].end_time, UnixTime(1_628_480_000));
    assert_eq!(periods[0].amount.to_string(), "3858024691358020000");
}

#[test]
fn scenario_c_transfer_is_single_instant() {
    let t = transfer(1_628_500_000, "500");
    let periods = settle(&t, 1_628_400_000, 1_628_600_000, Granularity::Month, None);

    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].start_time, periods[0].end_time);
    assert_eq!(periods[0].amount.to_string(), "500");
}

#[test]
fn scenario_d_window_outside_lifetime() {
    let stream = interval("1", 1_628_411_351, Some(1_628_587_165));
    assert!(settle(&stream, 1_628_600_000, 1_628_700_000, Granularity::Day, None).is_empty());
    assert!(settle(&stream, 1_600_000_000, 1_628_411_351, Granularity::Day, None).is_empty());
}

#[test]
fn periods_tile_the_overlap_for_every_granularity() {
    let stream = interval("7", 1_577_836_800, None); // 2020-01-01
    let (start, end) = (1_580_000_000, 1_640_000_000);

    for granularity in [
        Granularity::Hour,
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Year,
    ] {
        let spans = virtualize(
            &stream,
            QueryWindow::new(start, end),
            granularity,
            UnixTime::new(AS_OF),
        );

        assert_eq!(spans.first().unwrap().start, UnixTime(start));
        assert_eq!(spans.last().unwrap().end, UnixTime(end));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "{} spans must touch", granularity);
        }
        for span in &spans {
            assert!(span.end > span.start, "{} produced an empty span", granularity);
            let inner = span.start.as_secs();
            assert!(
                span.end.as_secs() <= granularity.bucket_end(inner),
                "{} span crosses a bucket boundary",
                granularity
            );
        }

        let total: i64 = spans.iter().map(|s| s.duration()).sum();
        assert_eq!(total, end - start);
    }
}

#[test]
fn month_boundaries_follow_calendar() {
    // 2020-01-15 .. 2020-04-15 monthly: Feb 2020 has 29 days
    let stream = interval("1", 1_579_046_400, Some(1_586_908_800));
    let periods = settle(&stream, 0, AS_OF, Granularity::Month, None);

    let boundaries: Vec<i64> = periods.iter().map(|p| p.end_time.as_secs()).collect();
    assert_eq!(
        boundaries,
        vec![1_580_515_200, 1_583_020_800, 1_585_699_200, 1_586_908_800]
    );
    assert_eq!(periods[1].amount.to_string(), (29 * 86_400).to_string());
    assert_eq!(
        Granularity::Month.last_second_of_bucket(1_580_515_199),
        1_580_515_199
    );
}

#[test]
fn fiat_equals_token_amount_under_constant_unit_price() {
    let stream = interval("1000000000000000000", 1_628_411_351, Some(1_628_587_165));
    let prices = series(&[(1_628_380_800, "1")]);
    let periods = settle(&stream, 0, AS_OF, Granularity::Day, Some(&prices));

    for period in &periods {
        let fiat = period.amount_fiat.clone().unwrap();
        assert_eq!(fiat, period.amount.scale_down(18));
    }
}

#[test]
fn duplicate_price_point_does_not_change_fiat() {
    let stream = interval("1000000000000000", 1_628_411_351, Some(1_628_587_165));
    let observations = vec![
        PriceObservation::new(1_628_380_800, Decimal::from_str_canonical("1.10").unwrap()),
        PriceObservation::new(1_628_467_200, Decimal::from_str_canonical("1.30").unwrap()),
    ];
    let base = bucketize(&observations, Granularity::Day);

    let mut with_duplicate = observations.clone();
    with_duplicate.push(PriceObservation::new(
        1_628_553_600,
        Decimal::from_str_canonical("1.30").unwrap(),
    ));
    let duplicated = bucketize(&with_duplicate, Granularity::Day);

    let a = settle(&stream, 0, AS_OF, Granularity::Week, Some(&base));
    let b = settle(&stream, 0, AS_OF, Granularity::Week, Some(&duplicated));
    let total = |periods: &[stream_accounting::domain::VirtualPeriod]| -> Amount {
        periods.iter().filter_map(|p| p.amount_fiat.clone()).sum()
    };
    assert_eq!(total(&a), total(&b));
}

#[test]
fn fiat_zero_without_prices_but_present() {
    let stream = interval("1", 1_628_411_351, Some(1_628_587_165));
    let periods = settle(&stream, 0, AS_OF, Granularity::Day, Some(&PriceSeries::default()));
    assert!(periods
        .iter()
        .all(|p| p.amount_fiat.as_ref().map(Amount::is_zero).unwrap_or(false)));
}
