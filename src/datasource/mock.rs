//! Mock data sources for testing without network calls.

use super::records::{Category, FundingPage, FundingQuery, PageRequest, RawRecord, RawToken};
use super::{CatalogCoin, DataSourceError, FundingSource, PriceCatalog, PriceSource};
use crate::domain::{ChainId, Currency, Network, PriceObservation, UnixTime};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock indexer returning predefined records per chain and category.
///
/// Records are served in insertion order and sliced by each request's
/// `skip`/`first`; address and time filters are assumed to be pre-applied.
#[derive(Debug, Clone, Default)]
pub struct MockFundingSource {
    records: HashMap<(ChainId, Category), Vec<RawRecord>>,
    tokens: HashMap<ChainId, Vec<RawToken>>,
    failing_chains: HashSet<ChainId>,
    requests: Arc<Mutex<Vec<(ChainId, Vec<PageRequest>)>>>,
    token_calls: Arc<AtomicUsize>,
}

impl MockFundingSource {
    /// Create a new mock source with no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record served under `category` on `chain_id`.
    pub fn with_record(mut self, chain_id: ChainId, category: Category, record: RawRecord) -> Self {
        self.records
            .entry((chain_id, category))
            .or_default()
            .push(record);
        self
    }

    /// Add multiple records served under `category` on `chain_id`.
    pub fn with_records(
        mut self,
        chain_id: ChainId,
        category: Category,
        records: Vec<RawRecord>,
    ) -> Self {
        self.records
            .entry((chain_id, category))
            .or_default()
            .extend(records);
        self
    }

    /// Add token metadata returned by `fetch_tokens` on `chain_id`.
    pub fn with_token(mut self, chain_id: ChainId, token: RawToken) -> Self {
        self.tokens.entry(chain_id).or_default().push(token);
        self
    }

    /// Make every query against `chain_id` fail with a server error.
    pub fn with_failing_chain(mut self, chain_id: ChainId) -> Self {
        self.failing_chains.insert(chain_id);
        self
    }

    /// Number of `query_page` calls served so far.
    pub fn page_calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Page requests received, in call order.
    pub fn page_requests(&self) -> Vec<(ChainId, Vec<PageRequest>)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of `fetch_tokens` calls served so far.
    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    fn check_chain(&self, chain_id: ChainId) -> Result<(), DataSourceError> {
        if self.failing_chains.contains(&chain_id) {
            return Err(DataSourceError::HttpError {
                status: 503,
                message: format!("chain {} unavailable", chain_id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FundingSource for MockFundingSource {
    async fn query_page(
        &self,
        network: &Network,
        _query: &FundingQuery,
        requests: &[PageRequest],
    ) -> Result<FundingPage, DataSourceError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push((network.chain_id, requests.to_vec()));
        }
        self.check_chain(network.chain_id)?;

        let mut page = FundingPage::default();
        for request in requests {
            let records = self
                .records
                .get(&(network.chain_id, request.category))
                .map(|all| {
                    all.iter()
                        .skip(request.skip)
                        .take(request.first)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            page.insert(request.category, records);
        }
        Ok(page)
    }

    async fn fetch_tokens(
        &self,
        network: &Network,
        token_ids: &[String],
    ) -> Result<Vec<RawToken>, DataSourceError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.check_chain(network.chain_id)?;

        let wanted: HashSet<String> = token_ids.iter().map(|id| id.to_lowercase()).collect();
        Ok(self
            .tokens
            .get(&network.chain_id)
            .map(|tokens| {
                tokens
                    .iter()
                    .filter(|t| {
                        t.id
                            .as_deref()
                            .map(|id| wanted.contains(&id.to_lowercase()))
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Mock market-data source with a fixed catalog and per-id observations.
#[derive(Debug, Clone, Default)]
pub struct MockPriceSource {
    coins: Vec<CatalogCoin>,
    observations: HashMap<String, Vec<PriceObservation>>,
    failing: bool,
    series_calls: Arc<AtomicUsize>,
}

impl MockPriceSource {
    /// Create a new mock source with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `catalog_id` as priced for `address` on `platform`.
    pub fn with_coin(mut self, catalog_id: &str, platform: &str, address: &str) -> Self {
        match self.coins.iter_mut().find(|c| c.id == catalog_id) {
            Some(coin) => {
                coin.platforms
                    .insert(platform.to_string(), address.to_string());
            }
            None => self.coins.push(CatalogCoin {
                id: catalog_id.to_string(),
                platforms: HashMap::from([(platform.to_string(), address.to_string())]),
            }),
        }
        self
    }

    /// Add raw observations returned for `catalog_id`.
    pub fn with_observations(mut self, catalog_id: &str, observations: Vec<PriceObservation>) -> Self {
        self.observations
            .entry(catalog_id.to_string())
            .or_default()
            .extend(observations);
        self
    }

    /// Make every call fail with a rate-limit error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Number of `fetch_price_series` calls served so far.
    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_catalog(&self) -> Result<PriceCatalog, DataSourceError> {
        if self.failing {
            return Err(DataSourceError::RateLimited);
        }
        Ok(PriceCatalog::from_coins(self.coins.clone()))
    }

    async fn fetch_price_series(
        &self,
        catalog_id: &str,
        _currency: Currency,
        from: UnixTime,
        to: UnixTime,
    ) -> Result<Vec<PriceObservation>, DataSourceError> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(DataSourceError::RateLimited);
        }

        Ok(self
            .observations
            .get(catalog_id)
            .map(|all| {
                all.iter()
                    .filter(|o| o.timestamp >= from && o.timestamp <= to)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}
