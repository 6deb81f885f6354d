//! Multi-chain funding fetch: pagination, normalization and deduplication.

use crate::datasource::{
    Category, DataSourceError, FundingQuery, FundingSource, PageRequest, RawRecord,
};
use crate::domain::{FundingInterval, IntervalKind, Network, TokenKey, TokenRef};
use crate::engine::normalizer::{build_token_catalog, normalize_records, NormalizeError};
use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Intervals fetched from one chain, in category order.
#[derive(Debug, Clone)]
pub struct ChainFunding {
    pub network: Network,
    pub intervals: Vec<FundingInterval>,
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    source: Arc<dyn FundingSource>,
    page_size: usize,
}

impl Aggregator {
    pub fn new(source: Arc<dyn FundingSource>, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
        }
    }

    /// Fetch every chain concurrently; the first failing chain fails the whole fetch.
    pub async fn fetch_all(
        &self,
        networks: &[Network],
        query: &FundingQuery,
    ) -> Result<Vec<ChainFunding>, AggregationError> {
        let chain_futures = networks
            .iter()
            .map(|network| self.fetch_chain(network, query));
        try_join_all(chain_futures).await
    }

    /// Page through every category on one chain, then normalize and dedupe.
    pub async fn fetch_chain(
        &self,
        network: &Network,
        query: &FundingQuery,
    ) -> Result<ChainFunding, AggregationError> {
        let mut collected: BTreeMap<Category, Vec<RawRecord>> = BTreeMap::new();
        let mut open: Vec<PageRequest> = Category::ALL
            .iter()
            .map(|&category| PageRequest {
                category,
                skip: 0,
                first: self.page_size,
            })
            .collect();

        let mut pages = 0usize;
        while !open.is_empty() {
            let mut page = self.source.query_page(network, query, &open).await?;
            pages += 1;

            let mut next = Vec::with_capacity(open.len());
            for request in &open {
                let records = page.take(request.category);
                if records.len() >= request.first {
                    next.push(PageRequest {
                        skip: request.skip + request.first,
                        ..*request
                    });
                }
                collected.entry(request.category).or_default().extend(records);
            }
            open = next;
        }

        let records = dedupe_records(collected.into_values().flatten());
        debug!(
            "Fetched {} records from chain={} in {} pages",
            records.len(),
            network.chain_id,
            pages
        );

        let token_ids: Vec<String> = records
            .iter()
            .filter_map(|record| match record {
                RawRecord::Transfer(transfer) => transfer.token.as_ref().map(|t| t.to_lowercase()),
                RawRecord::Flow(_) => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let tokens = if token_ids.is_empty() {
            Default::default()
        } else {
            build_token_catalog(self.source.fetch_tokens(network, &token_ids).await?)?
        };

        let intervals = normalize_records(network.chain_id, records, &tokens)?;
        Ok(ChainFunding {
            network: network.clone(),
            intervals,
        })
    }
}

/// Drop records already seen under another category (self-streams appear as
/// both inflowing and outflowing). The first occurrence wins.
fn dedupe_records(records: impl IntoIterator<Item = RawRecord>) -> Vec<RawRecord> {
    let mut seen: HashSet<(IntervalKind, String)> = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let kind = match record {
                RawRecord::Flow(_) => IntervalKind::Stream,
                RawRecord::Transfer(_) => IntervalKind::Transfer,
            };
            seen.insert((kind, record.id().to_string()))
        })
        .collect()
}

/// Unique `(chain, token)` pairs across all intervals, in first-seen order.
pub fn unique_tokens<'a>(
    intervals: impl IntoIterator<Item = &'a FundingInterval>,
) -> Vec<(TokenKey, TokenRef)> {
    let mut seen = HashSet::new();
    intervals
        .into_iter()
        .filter(|interval| seen.insert(interval.token_key()))
        .map(|interval| (interval.token_key(), interval.token.clone()))
        .collect()
}
