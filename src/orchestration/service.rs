//! Request-level entry point tying fetch, virtualization and pricing together.

use super::aggregator::{unique_tokens, Aggregator};
use super::pricing::{PriceResolver, PricingRequest};
use crate::datasource::FundingQuery;
use crate::domain::{
    Address, ChainId, Currency, FundingRecord, Granularity, Network, NetworkRegistry, UnixTime,
};
use crate::engine::{settle_interval, virtualize, Direction, QueryWindow, SignPolicy};
use crate::error::AppError;
use std::collections::HashSet;
use tracing::info;

const SECONDS_PER_DAY: i64 = 86_400;

/// Parameters of one `GetVirtualizedFundingRecords` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingRequest {
    pub addresses: Vec<Address>,
    pub chains: Vec<ChainId>,
    pub window: QueryWindow,
    pub virtualization: Granularity,
    /// Empty means "any counterparty".
    pub counterparties: Vec<Address>,
    pub currency: Currency,
    pub price_granularity: Granularity,
}

#[derive(Debug, Clone)]
pub struct FundingService {
    registry: NetworkRegistry,
    aggregator: Aggregator,
    pricing: PriceResolver,
    sign_policy: SignPolicy,
    hourly_price_max_age_days: i64,
}

impl FundingService {
    pub fn new(
        registry: NetworkRegistry,
        aggregator: Aggregator,
        pricing: PriceResolver,
        hourly_price_max_age_days: i64,
    ) -> Self {
        Self {
            registry,
            aggregator,
            pricing,
            sign_policy: SignPolicy::default(),
            hourly_price_max_age_days,
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// Fetch, virtualize and price all funding of `request.addresses`.
    ///
    /// `as_of` is the snapshot time: ongoing flows are settled up to it.
    /// Intervals without any period inside the window are omitted.
    pub async fn get_virtualized_funding_records(
        &self,
        request: &FundingRequest,
        as_of: UnixTime,
    ) -> Result<Vec<FundingRecord>, AppError> {
        let networks = self.validate(request, as_of)?;

        info!(
            "Funding request: {} addresses, {} chains, window=[{}, {}], virtualization={}, prices={}/{}",
            request.addresses.len(),
            networks.len(),
            request.window.start,
            request.window.end,
            request.virtualization,
            request.price_granularity,
            request.currency
        );

        let query = FundingQuery {
            addresses: request.addresses.clone(),
            counterparties: request.counterparties.clone(),
            from: request.window.start,
            to: request.window.end,
        };
        let chains = self.aggregator.fetch_all(&networks, &query).await?;

        let intervals: Vec<_> = chains
            .into_iter()
            .flat_map(|chain| chain.intervals)
            .filter(|interval| {
                !virtualize(interval, request.window, request.virtualization, as_of).is_empty()
            })
            .collect();

        let tokens = unique_tokens(&intervals);
        let prices = self
            .pricing
            .price_tokens(
                &self.registry,
                &tokens,
                PricingRequest {
                    currency: request.currency,
                    granularity: request.price_granularity,
                    from: request.window.start,
                    to: request.window.end,
                },
            )
            .await?;

        let queried: HashSet<Address> = request.addresses.iter().cloned().collect();
        let records: Vec<FundingRecord> = intervals
            .into_iter()
            .map(|interval| {
                let direction = Direction::of(&interval, &queried, self.sign_policy);
                let virtual_periods = settle_interval(
                    &interval,
                    request.window,
                    request.virtualization,
                    as_of,
                    direction,
                    prices.get(&interval.token_key()),
                );
                FundingRecord {
                    interval,
                    virtual_periods,
                }
            })
            .collect();

        info!(
            "Funding request settled {} records ({} of {} tokens priced)",
            records.len(),
            tokens.iter().filter(|(key, _)| prices.contains_key(key)).count(),
            tokens.len()
        );
        Ok(records)
    }

    /// Reject malformed requests before anything is fetched.
    fn validate(&self, request: &FundingRequest, as_of: UnixTime) -> Result<Vec<Network>, AppError> {
        if request.addresses.is_empty() {
            return Err(AppError::Validation(
                "At least one address is required".to_string(),
            ));
        }
        if request.window.start > request.window.end {
            return Err(AppError::Validation(format!(
                "start ({}) must not be after end ({})",
                request.window.start, request.window.end
            )));
        }
        if request.chains.is_empty() {
            return Err(AppError::Validation(
                "At least one chain is required".to_string(),
            ));
        }

        // Hourly quotes are only served for recent history; keep a minute of headroom.
        let hourly_cutoff =
            as_of.as_secs() - self.hourly_price_max_age_days * SECONDS_PER_DAY + 60;
        if request.price_granularity == Granularity::Hour
            && request.window.start.as_secs() < hourly_cutoff
        {
            return Err(AppError::Validation(format!(
                "Hourly price granularity can not be used with data older than {} days",
                self.hourly_price_max_age_days
            )));
        }

        let mut networks = Vec::with_capacity(request.chains.len());
        for chain_id in &request.chains {
            let network = self
                .registry
                .get(*chain_id)
                .ok_or(AppError::UnsupportedChain(*chain_id))?;
            if !networks.iter().any(|n: &Network| n.chain_id == *chain_id) {
                networks.push(network.clone());
            }
        }
        Ok(networks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{Category, MockFundingSource, MockPriceSource, RawFlowPeriod, RawRecord, RawToken};
    use std::sync::Arc;

    const ALICE: &str = "0x00000000000000000000000000000000000000a1";
    const BOB: &str = "0x00000000000000000000000000000000000000b2";

    fn service(funding: MockFundingSource) -> FundingService {
        FundingService::new(
            NetworkRegistry::builtin(),
            Aggregator::new(Arc::new(funding), 100),
            PriceResolver::new(Arc::new(MockPriceSource::new())),
            90,
        )
    }

    fn request(start: i64, end: i64) -> FundingRequest {
        FundingRequest {
            addresses: vec![Address::new(BOB)],
            chains: vec![ChainId(137)],
            window: QueryWindow::new(start, end),
            virtualization: Granularity::Day,
            counterparties: vec![],
            currency: Currency::Usd,
            price_granularity: Granularity::Day,
        }
    }

    #[tokio::test]
    async fn test_unsupported_chain_rejected_before_fetch() {
        let funding = MockFundingSource::new();
        let svc = service(funding.clone());
        let mut req = request(0, 100);
        req.chains = vec![ChainId(137), ChainId(31337)];

        let result = svc
            .get_virtualized_funding_records(&req, UnixTime::new(1_000))
            .await;
        assert!(matches!(result, Err(AppError::UnsupportedChain(ChainId(31337)))));
        assert_eq!(funding.page_calls(), 0);
    }

    #[tokio::test]
    async fn test_hourly_price_granularity_age_limit() {
        let svc = service(MockFundingSource::new());
        let as_of = UnixTime::new(1_700_000_000);

        let mut old = request(as_of.as_secs() - 91 * SECONDS_PER_DAY, as_of.as_secs());
        old.price_granularity = Granularity::Hour;
        assert!(matches!(
            svc.get_virtualized_funding_records(&old, as_of).await,
            Err(AppError::Validation(_))
        ));

        let mut recent = request(as_of.as_secs() - 30 * SECONDS_PER_DAY, as_of.as_secs());
        recent.price_granularity = Granularity::Hour;
        assert!(svc
            .get_virtualized_funding_records(&recent, as_of)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_interval_outside_window_is_omitted() {
        let funding = MockFundingSource::new().with_record(
            ChainId(137),
            Category::InflowingStreams,
            RawRecord::Flow(RawFlowPeriod {
                id: "p".to_string(),
                flow_rate: Some("1".to_string()),
                token: Some(RawToken {
                    id: Some("0x00000000000000000000000000000000000000f1".to_string()),
                    ..Default::default()
                }),
                sender: Some(ALICE.to_string()),
                receiver: Some(BOB.to_string()),
                started_at: Some(1_628_411_351),
                stopped_at: Some(1_628_587_165),
                ..Default::default()
            }),
        );
        let svc = service(funding);

        let records = svc
            .get_virtualized_funding_records(
                &request(1_600_000_000, 1_600_100_000),
                UnixTime::new(1_700_000_000),
            )
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_start_after_end_rejected() {
        let svc = service(MockFundingSource::new());
        let result = svc
            .get_virtualized_funding_records(&request(200, 100), UnixTime::new(1_000))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
