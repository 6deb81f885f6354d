//! Converts raw indexer records into validated funding intervals.

use crate::datasource::{RawFlowPeriod, RawRecord, RawToken, RawTransfer};
use crate::domain::{
    Address, Amount, ChainId, FundingInterval, IntervalKind, TokenRef, UnixTime,
    DEFAULT_TOKEN_DECIMALS,
};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("record {id}: missing field {field}")]
    MissingField { id: String, field: &'static str },
    #[error("record {id}: invalid {field}: {value}")]
    InvalidValue {
        id: String,
        field: &'static str,
        value: String,
    },
    #[error("record {id}: stopped at {stopped_at} before it started at {started_at}")]
    StoppedBeforeStart {
        id: String,
        started_at: i64,
        stopped_at: i64,
    },
    #[error("transfer {id}: unknown token {token}")]
    UnknownToken { id: String, token: String },
}

/// Token metadata for one chain, keyed by lowercase token address.
pub type TokenCatalog = HashMap<Address, TokenRef>;

/// Normalize a chain's raw records, preserving input order.
pub fn normalize_records(
    chain_id: ChainId,
    records: Vec<RawRecord>,
    tokens: &TokenCatalog,
) -> Result<Vec<FundingInterval>, NormalizeError> {
    records
        .into_iter()
        .map(|record| match record {
            RawRecord::Flow(flow) => normalize_flow(chain_id, flow),
            RawRecord::Transfer(transfer) => normalize_transfer(chain_id, transfer, tokens),
        })
        .collect()
}

/// Build a token catalog from indexer token metadata.
pub fn build_token_catalog(tokens: Vec<RawToken>) -> Result<TokenCatalog, NormalizeError> {
    tokens
        .into_iter()
        .map(|raw| normalize_token("token", raw).map(|token| (token.id.clone(), token)))
        .collect()
}

pub fn normalize_flow(
    chain_id: ChainId,
    raw: RawFlowPeriod,
) -> Result<FundingInterval, NormalizeError> {
    let id = raw.id;

    let token = raw.token.ok_or_else(|| missing(&id, "token"))?;
    let token = normalize_token(&id, token)?;
    let sender = parse_address(&id, "sender", raw.sender)?;
    let receiver = parse_address(&id, "receiver", raw.receiver)?;

    let flow_rate = parse_amount(&id, "flowRate", raw.flow_rate)?;
    if flow_rate.is_negative() {
        return Err(invalid(&id, "flowRate", flow_rate.to_string()));
    }

    let started_at = raw.started_at.ok_or_else(|| missing(&id, "startedAtTimestamp"))?;
    if let Some(stopped_at) = raw.stopped_at {
        if stopped_at < started_at {
            return Err(NormalizeError::StoppedBeforeStart {
                id,
                started_at,
                stopped_at,
            });
        }
    }

    let amount = raw
        .total_amount_streamed
        .map(|value| parse_amount(&id, "totalAmountStreamed", Some(value)))
        .transpose()?;

    Ok(FundingInterval {
        id,
        chain_id,
        kind: IntervalKind::Stream,
        token,
        sender,
        receiver,
        flow_rate,
        started_at: UnixTime::new(started_at),
        stopped_at: raw.stopped_at.map(UnixTime::new),
        amount,
        started_at_block: raw.started_at_block,
        started_at_tx: raw.started_at_tx,
        stopped_at_block: raw.stopped_at_block,
        stopped_at_tx: raw.stopped_at_tx,
    })
}

/// A transfer becomes a zero-duration interval carrying its value as a fixed amount.
pub fn normalize_transfer(
    chain_id: ChainId,
    raw: RawTransfer,
    tokens: &TokenCatalog,
) -> Result<FundingInterval, NormalizeError> {
    let id = raw.id;

    let token_id = raw.token.ok_or_else(|| missing(&id, "token"))?;
    let token = tokens
        .get(&Address::new(&token_id))
        .cloned()
        .ok_or_else(|| NormalizeError::UnknownToken {
            id: id.clone(),
            token: token_id,
        })?;
    let sender = parse_address(&id, "from", raw.from)?;
    let receiver = parse_address(&id, "to", raw.to)?;
    let value = parse_amount(&id, "value", raw.value)?;
    if value.is_negative() {
        return Err(invalid(&id, "value", value.to_string()));
    }
    let timestamp = UnixTime::new(raw.timestamp.ok_or_else(|| missing(&id, "timestamp"))?);

    Ok(FundingInterval {
        id,
        chain_id,
        kind: IntervalKind::Transfer,
        token,
        sender,
        receiver,
        flow_rate: Amount::zero(),
        started_at: timestamp,
        stopped_at: Some(timestamp),
        amount: Some(value),
        started_at_block: raw.block_number,
        started_at_tx: raw.transaction_hash.clone(),
        stopped_at_block: raw.block_number,
        stopped_at_tx: raw.transaction_hash,
    })
}

fn normalize_token(record_id: &str, raw: RawToken) -> Result<TokenRef, NormalizeError> {
    let token_id = parse_address(record_id, "token.id", raw.id)?;
    let underlying_address = match raw.underlying_address.filter(|a| !a.trim().is_empty()) {
        Some(address) => parse_address(record_id, "token.underlyingAddress", Some(address))?,
        None => Address::new(ZERO_ADDRESS),
    };

    Ok(TokenRef {
        id: token_id,
        symbol: raw.symbol.unwrap_or_default(),
        name: raw.name.unwrap_or_default(),
        underlying_address,
        decimals: raw.decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS),
    })
}

fn parse_address(
    id: &str,
    field: &'static str,
    value: Option<String>,
) -> Result<Address, NormalizeError> {
    let value = value.ok_or_else(|| missing(id, field))?;
    Address::from_str(&value).map_err(|_| invalid(id, field, value))
}

fn parse_amount(
    id: &str,
    field: &'static str,
    value: Option<String>,
) -> Result<Amount, NormalizeError> {
    let value = value.ok_or_else(|| missing(id, field))?;
    Amount::from_str_canonical(&value).map_err(|_| invalid(id, field, value))
}

fn missing(id: &str, field: &'static str) -> NormalizeError {
    NormalizeError::MissingField {
        id: id.to_string(),
        field,
    }
}

fn invalid(id: &str, field: &'static str, value: String) -> NormalizeError {
    NormalizeError::InvalidValue {
        id: id.to_string(),
        field,
        value,
    }
}
