use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{Address, ChainId, Currency, FundingRecord, Granularity, UnixTime, MAX_UNIX_TIME};
use crate::engine::QueryWindow;
use crate::error::AppError;
use crate::orchestration::FundingRequest;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPeriodsQuery {
    pub addresses: Option<String>,
    pub chains: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub virtualization: Option<String>,
    pub price_granularity: Option<String>,
    pub currency: Option<String>,
    pub counterparties: Option<String>,
}

pub async fn get_stream_periods(
    Query(params): Query<StreamPeriodsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<FundingRecord>>, AppError> {
    let as_of = UnixTime::now();
    let request = parse_request(&params, as_of)?;

    let records = state
        .service
        .get_virtualized_funding_records(&request, as_of)
        .await?;
    Ok(Json(records))
}

/// Turn raw query parameters into a request; `end` defaults to `as_of`.
pub fn parse_request(params: &StreamPeriodsQuery, as_of: UnixTime) -> Result<FundingRequest, AppError> {
    let addresses = parse_addresses("addresses", params.addresses.as_deref().unwrap_or(""))?;
    if addresses.is_empty() {
        return Err(AppError::Validation(
            "At least one address is required".to_string(),
        ));
    }
    let counterparties =
        parse_addresses("counterparties", params.counterparties.as_deref().unwrap_or(""))?;

    let chains = params
        .chains
        .as_deref()
        .ok_or_else(|| AppError::Validation("chains is required".to_string()))?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map(ChainId::new)
                .map_err(|_| AppError::Validation(format!("Invalid chain id: {}", s)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let start = parse_timestamp("start", params.start.as_deref())?.unwrap_or(0);
    let end = parse_timestamp("end", params.end.as_deref())?.unwrap_or(as_of.as_secs());
    if start > end {
        return Err(AppError::Validation(
            "start must be <= end".to_string(),
        ));
    }

    let virtualization = parse_granularity("virtualization", params.virtualization.as_deref())?
        .ok_or_else(|| AppError::Validation("virtualization is required".to_string()))?;
    let price_granularity =
        parse_granularity("priceGranularity", params.price_granularity.as_deref())?
            .unwrap_or(virtualization);

    let currency = match params.currency.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => Currency::from_str(code).map_err(AppError::UnsupportedCurrency)?,
        None => Currency::Usd,
    };

    Ok(FundingRequest {
        addresses,
        chains,
        window: QueryWindow::new(start, end),
        virtualization,
        counterparties,
        currency,
        price_granularity,
    })
}

fn parse_addresses(field: &str, input: &str) -> Result<Vec<Address>, AppError> {
    let mut addresses: Vec<Address> = Vec::new();
    for raw in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let address = Address::from_str(raw)
            .map_err(|e| AppError::Validation(format!("Invalid {}: {}", field, e)))?;
        if !addresses.contains(&address) {
            addresses.push(address);
        }
    }
    Ok(addresses)
}

fn parse_timestamp(field: &str, input: Option<&str>) -> Result<Option<i64>, AppError> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let ts = raw
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("Invalid {}: {}", field, raw)))?;
    if !(0..=MAX_UNIX_TIME).contains(&ts) {
        return Err(AppError::Validation(format!("{} out of range: {}", field, ts)));
    }
    Ok(Some(ts))
}

fn parse_granularity(field: &str, input: Option<&str>) -> Result<Option<Granularity>, AppError> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Granularity::from_str(s)
                .map_err(|e| AppError::Validation(format!("Invalid {}: {}", field, e)))
        })
        .transpose()
}
