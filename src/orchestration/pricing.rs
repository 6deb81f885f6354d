//! Resolves tokens to price catalog ids and fetches bucketized series.

use crate::datasource::{DataSourceError, PriceCatalog, PriceSource};
use crate::domain::{
    Currency, Granularity, Network, NetworkRegistry, PriceSeries, TokenKey, TokenRef, UnixTime,
};
use crate::engine::bucketize;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// What to price and over which window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingRequest {
    pub currency: Currency,
    pub granularity: Granularity,
    pub from: UnixTime,
    pub to: UnixTime,
}

#[derive(Debug, Clone)]
pub struct PriceResolver {
    source: Arc<dyn PriceSource>,
}

impl PriceResolver {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    /// Price series for every token with a catalog match.
    ///
    /// Tokens without a match are absent from the result. Each catalog id is
    /// fetched once even when several tokens map to it.
    pub async fn price_tokens(
        &self,
        registry: &NetworkRegistry,
        tokens: &[(TokenKey, TokenRef)],
        request: PricingRequest,
    ) -> Result<HashMap<TokenKey, PriceSeries>, DataSourceError> {
        let priceable = tokens.iter().any(|(key, _)| {
            registry
                .get(key.chain_id)
                .map(|n| n.price_platform.is_some())
                .unwrap_or(false)
        });
        if !priceable {
            return Ok(HashMap::new());
        }

        let catalog = self.source.fetch_catalog().await?;

        let mut by_catalog_id: HashMap<String, Vec<TokenKey>> = HashMap::new();
        for (key, token) in tokens {
            let resolved = registry
                .get(key.chain_id)
                .and_then(|network| resolve_catalog_id(&catalog, network, token));
            match resolved {
                Some(id) => by_catalog_id.entry(id.to_string()).or_default().push(key.clone()),
                None => warn!(
                    "No price match for token {} ({}) on chain={}",
                    token.id, token.symbol, key.chain_id
                ),
            }
        }

        // Start at the bucket containing `from` so the first period has a carried-forward price.
        let from = UnixTime::new(request.granularity.bucket_start(request.from.as_secs()));
        let series_futures = by_catalog_id.into_iter().map(|(catalog_id, keys)| async move {
            let observations = self
                .source
                .fetch_price_series(&catalog_id, request.currency, from, request.to)
                .await?;
            debug!(
                "Fetched {} price observations for {}",
                observations.len(),
                catalog_id
            );
            Ok::<_, DataSourceError>((keys, bucketize(&observations, request.granularity)))
        });

        let mut prices = HashMap::new();
        for (keys, series) in try_join_all(series_futures).await? {
            for key in keys {
                prices.insert(key, series.clone());
            }
        }
        Ok(prices)
    }
}

/// Catalog id for a token on `network`, or `None` when it cannot be priced.
///
/// Lookup order: the underlying asset, then the token contract itself. Tokens
/// wrapping the native asset (no underlying) use the network's native id.
pub fn resolve_catalog_id<'a>(
    catalog: &'a PriceCatalog,
    network: &'a Network,
    token: &TokenRef,
) -> Option<&'a str> {
    let platform = network.price_platform?;

    if !token.underlying_address.is_zero() {
        if let Some(id) = catalog.resolve(platform, token.underlying_address.as_str()) {
            return Some(id);
        }
    }
    if let Some(id) = catalog.resolve(platform, token.id.as_str()) {
        return Some(id);
    }
    if token.underlying_address.is_zero() {
        return network.native_price_id;
    }
    None
}
