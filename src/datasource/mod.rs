//! Data source abstractions for funding records, token metadata and prices.

use crate::domain::{Currency, Network, PriceObservation, UnixTime};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

pub mod coingecko;
mod http;
pub mod mock;
pub mod records;
pub mod subgraph;

pub use coingecko::CoingeckoPriceSource;
pub use mock::{MockFundingSource, MockPriceSource};
pub use records::{
    Category, FundingPage, FundingQuery, PageRequest, RawFlowPeriod, RawRecord, RawToken,
    RawTransfer,
};
pub use subgraph::SubgraphFundingSource;

/// Indexing backend holding flow periods and transfer events.
///
/// Implementations handle transport concerns (retry/backoff, timeouts); callers
/// drive pagination.
#[async_trait]
pub trait FundingSource: Send + Sync + fmt::Debug {
    /// Fetch one page for each requested category.
    ///
    /// # Arguments
    /// * `network` - Chain whose indexer is queried
    /// * `query` - Addresses, counterparties and time window
    /// * `requests` - Categories still being paginated, each with its own offset
    ///
    /// # Returns
    /// A page holding at most `first` records for every requested category
    async fn query_page(
        &self,
        network: &Network,
        query: &FundingQuery,
        requests: &[PageRequest],
    ) -> Result<FundingPage, DataSourceError>;

    /// Fetch token metadata for the given token ids on one chain.
    async fn fetch_tokens(
        &self,
        network: &Network,
        token_ids: &[String],
    ) -> Result<Vec<RawToken>, DataSourceError>;
}

/// Market-data backend providing historical quotes.
#[async_trait]
pub trait PriceSource: Send + Sync + fmt::Debug {
    /// Fetch the catalog used to map on-chain addresses to price ids.
    async fn fetch_catalog(&self) -> Result<PriceCatalog, DataSourceError>;

    /// Fetch raw quotes for one catalog id within `[from, to]`, ascending by time.
    async fn fetch_price_series(
        &self,
        catalog_id: &str,
        currency: Currency,
        from: UnixTime,
        to: UnixTime,
    ) -> Result<Vec<PriceObservation>, DataSourceError>;
}

/// Entry of the price catalog: one priced asset and its contract per platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCoin {
    pub id: String,
    pub platforms: HashMap<String, String>,
}

/// Address index over the price catalog, keyed by `(platform, lowercase address)`.
#[derive(Debug, Clone, Default)]
pub struct PriceCatalog {
    by_platform_address: HashMap<(String, String), String>,
}

impl PriceCatalog {
    pub fn from_coins(coins: impl IntoIterator<Item = CatalogCoin>) -> Self {
        let mut by_platform_address = HashMap::new();
        for coin in coins {
            for (platform, address) in coin.platforms {
                let address = address.trim().to_lowercase();
                if address.is_empty() {
                    continue;
                }
                by_platform_address
                    .entry((platform, address))
                    .or_insert_with(|| coin.id.clone());
            }
        }
        Self {
            by_platform_address,
        }
    }

    /// Resolve the catalog id of a contract deployed on `platform`.
    pub fn resolve(&self, platform: &str, address: &str) -> Option<&str> {
        self.by_platform_address
            .get(&(platform.to_string(), address.trim().to_lowercase()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_platform_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_platform_address.is_empty()
    }
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// GraphQL errors returned with a 200 response
    QueryError(String),
    /// Rate limit exceeded
    RateLimited,
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::QueryError(msg) => write!(f, "Query error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
        }
    }
}

impl std::error::Error for DataSourceError {}
