//! Market-data client for the price catalog and historical quotes.

use super::http::{build_client, send_json};
use super::{CatalogCoin, DataSourceError, PriceCatalog, PriceSource};
use crate::domain::{Currency, Decimal, PriceObservation, UnixTime};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CoingeckoPriceSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_retry_elapsed: Duration,
}

impl CoingeckoPriceSource {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retry_elapsed: Duration::from_secs(30),
        }
    }

    async fn get(
        &self,
        path: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<serde_json::Value, DataSourceError> {
        let url = format!("{}{}", self.base_url, path);
        let mut params = params;
        if let Some(key) = &self.api_key {
            params.push(("x_cg_pro_api_key", key.clone()));
        }

        send_json(
            || self.client.get(&url).query(&params),
            self.max_retry_elapsed,
        )
        .await
    }
}

#[async_trait]
impl PriceSource for CoingeckoPriceSource {
    async fn fetch_catalog(&self) -> Result<PriceCatalog, DataSourceError> {
        debug!("Fetching price catalog");

        let body = self
            .get(
                "/api/v3/coins/list",
                vec![("include_platform", "true".to_string())],
            )
            .await?;
        let coins: Vec<WireCoin> =
            serde_json::from_value(body).map_err(|e| DataSourceError::ParseError(e.to_string()))?;

        let catalog = PriceCatalog::from_coins(coins.into_iter().map(WireCoin::into_catalog_coin));
        debug!("Price catalog holds {} contract addresses", catalog.len());
        Ok(catalog)
    }

    async fn fetch_price_series(
        &self,
        catalog_id: &str,
        currency: Currency,
        from: UnixTime,
        to: UnixTime,
    ) -> Result<Vec<PriceObservation>, DataSourceError> {
        debug!(
            "Fetching prices for {} in {}, from={}, to={}",
            catalog_id, currency, from, to
        );

        let body = self
            .get(
                &format!("/api/v3/coins/{}/market_chart/range", catalog_id),
                vec![
                    ("vs_currency", currency.code().to_string()),
                    ("from", from.as_secs().to_string()),
                    ("to", to.as_secs().to_string()),
                ],
            )
            .await?;

        let chart: WireMarketChart =
            serde_json::from_value(body).map_err(|e| DataSourceError::ParseError(e.to_string()))?;
        parse_prices(chart.prices)
    }
}

#[derive(Debug, Deserialize)]
struct WireCoin {
    id: String,
    #[serde(default)]
    platforms: HashMap<String, Option<String>>,
}

impl WireCoin {
    fn into_catalog_coin(self) -> CatalogCoin {
        CatalogCoin {
            id: self.id,
            platforms: self
                .platforms
                .into_iter()
                .filter_map(|(platform, address)| address.map(|a| (platform, a)))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMarketChart {
    #[serde(default)]
    prices: Vec<(serde_json::Number, serde_json::Number)>,
}

/// Convert `[millis, price]` pairs into observations, ascending by time.
fn parse_prices(
    raw: Vec<(serde_json::Number, serde_json::Number)>,
) -> Result<Vec<PriceObservation>, DataSourceError> {
    let mut observations = raw
        .into_iter()
        .map(|(millis, price)| {
            let millis = millis
                .as_i64()
                .or_else(|| millis.as_f64().map(|f| f as i64))
                .ok_or_else(|| DataSourceError::ParseError(format!("Invalid timestamp: {}", millis)))?;
            let price = Decimal::from_str_canonical(&price.to_string())
                .ok()
                .or_else(|| price.as_f64().and_then(Decimal::from_f64))
                .ok_or_else(|| DataSourceError::ParseError(format!("Invalid price: {}", price)))?;
            Ok(PriceObservation::new(millis.div_euclid(1000), price))
        })
        .collect::<Result<Vec<_>, DataSourceError>>()?;

    observations.sort_by_key(|o| o.timestamp);
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prices_converts_millis_to_seconds() {
        let chart: WireMarketChart = serde_json::from_value(serde_json::json!({
            "prices": [
                [1628467200500i64, 1.0012],
                [1628463600000i64, 0.9998],
            ]
        }))
        .unwrap();

        let observations = parse_prices(chart.prices).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].timestamp, UnixTime(1_628_463_600));
        assert_eq!(observations[0].price.to_string(), "0.9998");
        assert_eq!(observations[1].timestamp, UnixTime(1_628_467_200));
        assert_eq!(observations[1].price.to_string(), "1.0012");
    }

    #[test]
    fn test_parse_prices_accepts_scientific_notation() {
        let chart: WireMarketChart = serde_json::from_value(serde_json::json!({
            "prices": [[1628467200000i64, 1.5e-7]]
        }))
        .unwrap();

        let observations = parse_prices(chart.prices).unwrap();
        assert_eq!(observations[0].price.to_string(), "0.00000015");
    }

    #[test]
    fn test_catalog_skips_null_platforms() {
        let coins: Vec<WireCoin> = serde_json::from_value(serde_json::json!([
            {
                "id": "usd-coin",
                "symbol": "usdc",
                "name": "USDC",
                "platforms": {
                    "ethereum": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                    "sora": null
                }
            },
            { "id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "platforms": {} }
        ]))
        .unwrap();

        let catalog = PriceCatalog::from_coins(coins.into_iter().map(WireCoin::into_catalog_coin));
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.resolve("ethereum", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            Some("usd-coin")
        );
    }
}
