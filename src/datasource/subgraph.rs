//! GraphQL indexer client for flow periods and transfer events.

use super::http::{build_client, send_json};
use super::records::{
    Category, FundingPage, FundingQuery, PageRequest, RawFlowPeriod, RawRecord, RawToken,
    RawTransfer,
};
use super::{DataSourceError, FundingSource};
use crate::domain::Network;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

const PERIOD_FIELDS: &str = r#"
fragment periodFields on StreamPeriod {
  id
  flowRate
  token { ...tokenFields }
  sender { id }
  receiver { id }
  startedAtTimestamp
  startedAtBlockNumber
  startedAtEvent { transactionHash }
  stoppedAtTimestamp
  stoppedAtBlockNumber
  stoppedAtEvent { transactionHash }
  totalAmountStreamed
}
"#;

const TRANSFER_FIELDS: &str = r#"
fragment transferFields on TransferEvent {
  id
  value
  token
  from { id }
  to { id }
  timestamp
  blockNumber
  transactionHash
}
"#;

const TOKEN_FIELDS: &str = r#"
fragment tokenFields on Token {
  id
  symbol
  name
  underlyingAddress
  decimals
}
"#;

/// Indexer client; one instance serves every chain in the registry.
#[derive(Debug, Clone)]
pub struct SubgraphFundingSource {
    client: Client,
    base_url: String,
    max_retry_elapsed: Duration,
}

impl SubgraphFundingSource {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url,
            max_retry_elapsed: Duration::from_secs(30),
        }
    }

    fn endpoint(&self, network: &Network) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            network.subgraph_id
        )
    }

    async fn post_graphql(
        &self,
        network: &Network,
        query: String,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, DataSourceError> {
        let url = self.endpoint(network);
        let payload = serde_json::json!({ "query": query, "variables": variables });

        let mut response = send_json(
            || self.client.post(&url).json(&payload),
            self.max_retry_elapsed,
        )
        .await?;

        if let Some(errors) = response.get("errors").filter(|e| !e.is_null()) {
            return Err(DataSourceError::QueryError(errors.to_string()));
        }

        response
            .get_mut("data")
            .map(serde_json::Value::take)
            .ok_or_else(|| DataSourceError::ParseError("Missing data field".to_string()))
    }
}

#[async_trait]
impl FundingSource for SubgraphFundingSource {
    async fn query_page(
        &self,
        network: &Network,
        query: &FundingQuery,
        requests: &[PageRequest],
    ) -> Result<FundingPage, DataSourceError> {
        if requests.is_empty() {
            return Ok(FundingPage::default());
        }

        debug!(
            "Querying {} categories on chain={}, from={}, to={}",
            requests.len(),
            network.chain_id,
            query.from,
            query.to
        );

        let document = build_funding_query(requests, !query.counterparties.is_empty());
        let mut variables = serde_json::json!({
            "from": query.from.as_secs().to_string(),
            "to": query.to.as_secs().to_string(),
            "addresses": query.addresses.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
            "counterpartyAddresses": query.counterparties.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
        });
        for request in requests {
            variables[format!("first_{}", request.category.alias())] = request.first.into();
            variables[format!("skip_{}", request.category.alias())] = request.skip.into();
        }
        if let Some(map) = variables.as_object_mut() {
            map.retain(|name, _| document.contains(&format!("${}:", name)));
        }

        let data = self.post_graphql(network, document, variables).await?;

        let mut page = FundingPage::default();
        for request in requests {
            let items = data
                .get(request.category.alias())
                .cloned()
                .unwrap_or(serde_json::Value::Array(vec![]));
            let records = if request.category.is_transfer() {
                serde_json::from_value::<Vec<WireTransfer>>(items)
                    .map_err(|e| DataSourceError::ParseError(e.to_string()))?
                    .into_iter()
                    .map(|w| w.into_raw().map(RawRecord::Transfer))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                serde_json::from_value::<Vec<WireFlowPeriod>>(items)
                    .map_err(|e| DataSourceError::ParseError(e.to_string()))?
                    .into_iter()
                    .map(|w| w.into_raw().map(RawRecord::Flow))
                    .collect::<Result<Vec<_>, _>>()?
            };
            page.insert(request.category, records);
        }

        Ok(page)
    }

    async fn fetch_tokens(
        &self,
        network: &Network,
        token_ids: &[String],
    ) -> Result<Vec<RawToken>, DataSourceError> {
        if token_ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Fetching {} tokens on chain={}",
            token_ids.len(),
            network.chain_id
        );

        let document = format!(
            "query GetTokens($tokens: [ID!]!) {{\n  tokens(first: {}, where: {{ id_in: $tokens }}) {{ ...tokenFields }}\n}}\n{}",
            token_ids.len(),
            TOKEN_FIELDS
        );
        let data = self
            .post_graphql(network, document, serde_json::json!({ "tokens": token_ids }))
            .await?;

        let tokens = data
            .get("tokens")
            .cloned()
            .ok_or_else(|| DataSourceError::ParseError("Missing tokens field".to_string()))?;
        let tokens: Vec<WireToken> =
            serde_json::from_value(tokens).map_err(|e| DataSourceError::ParseError(e.to_string()))?;

        tokens.into_iter().map(WireToken::into_raw).collect()
    }
}

/// Build a query selecting only the requested categories, each with its own offset.
fn build_funding_query(requests: &[PageRequest], with_counterparties: bool) -> String {
    let mut params = Vec::with_capacity(4 + 2 * requests.len());
    let mut selections = Vec::with_capacity(requests.len());

    for request in requests {
        let alias = request.category.alias();
        params.push(format!("$first_{}: Int!", alias));
        params.push(format!("$skip_{}: Int!", alias));

        let (entity, fragment) = if request.category.is_transfer() {
            ("transferEvents", "transferFields")
        } else {
            ("streamPeriods", "periodFields")
        };
        selections.push(format!(
            "  {alias}: {entity}(first: $first_{alias}, skip: $skip_{alias}, orderBy: id, orderDirection: asc, where: {{ {filter} }}) {{ ...{fragment} }}",
            alias = alias,
            entity = entity,
            filter = category_filter(request.category, with_counterparties),
            fragment = fragment,
        ));
    }

    // Unused variable declarations fail query validation.
    let body = selections.join("\n");
    let shared = [
        ("$from", "BigInt!"),
        ("$to", "BigInt!"),
        ("$addresses", "[String!]!"),
        ("$counterpartyAddresses", "[String!]!"),
    ];
    let mut declared: Vec<String> = shared
        .iter()
        .filter(|(name, _)| body.contains(name))
        .map(|(name, ty)| format!("{}: {}", name, ty))
        .collect();
    declared.append(&mut params);

    let has_transfers = requests.iter().any(|r| r.category.is_transfer());
    let has_periods = requests.iter().any(|r| !r.category.is_transfer());

    let mut document = format!(
        "query GetFundingPeriods({}) {{\n{}\n}}\n",
        declared.join(", "),
        body
    );
    if has_periods {
        document.push_str(PERIOD_FIELDS);
        document.push_str(TOKEN_FIELDS);
    }
    if has_transfers {
        document.push_str(TRANSFER_FIELDS);
    }
    document
}

fn category_filter(category: Category, with_counterparties: bool) -> String {
    let (own, other) = match category {
        Category::InflowingStreams | Category::InflowingActiveStreams => ("receiver_in", "sender_in"),
        Category::OutflowingStreams | Category::OutflowingActiveStreams => ("sender_in", "receiver_in"),
        Category::IncomingTransfers => ("to_in", "from_in"),
        Category::OutgoingTransfers => ("from_in", "to_in"),
    };

    let window = match category {
        Category::InflowingStreams | Category::OutflowingStreams => {
            "startedAtTimestamp_lt: $to, stoppedAtTimestamp_gte: $from"
        }
        Category::InflowingActiveStreams | Category::OutflowingActiveStreams => {
            "startedAtTimestamp_lt: $to, stoppedAtTimestamp: null"
        }
        Category::IncomingTransfers | Category::OutgoingTransfers => {
            "timestamp_lte: $to, timestamp_gte: $from"
        }
    };

    let counterparty = if with_counterparties {
        format!("{}: $counterpartyAddresses", other)
    } else if category.is_transfer() {
        // Mints and burns are not transfers between accounts.
        let field = other.trim_end_matches("_in");
        format!("{}_not: \"{}\"", field, ZERO_ADDRESS)
    } else {
        String::new()
    };

    [window.to_string(), format!("{}: $addresses", own), counterparty]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The Graph encodes BigInt scalars as strings; Int scalars as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireInt {
    Num(i64),
    Str(String),
}

impl WireInt {
    fn parse(self, field: &str) -> Result<i64, DataSourceError> {
        match self {
            WireInt::Num(n) => Ok(n),
            WireInt::Str(s) => s
                .parse::<i64>()
                .map_err(|_| DataSourceError::ParseError(format!("Invalid {}: {}", field, s))),
        }
    }
}

fn parse_opt_int(value: Option<WireInt>, field: &str) -> Result<Option<i64>, DataSourceError> {
    value.map(|v| v.parse(field)).transpose()
}

fn parse_opt_block(value: Option<WireInt>, field: &str) -> Result<Option<u64>, DataSourceError> {
    parse_opt_int(value, field)?
        .map(|n| {
            u64::try_from(n)
                .map_err(|_| DataSourceError::ParseError(format!("Invalid {}: {}", field, n)))
        })
        .transpose()
}

#[derive(Debug, Deserialize)]
struct WireAccount {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    transaction_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireToken {
    id: Option<String>,
    symbol: Option<String>,
    name: Option<String>,
    underlying_address: Option<String>,
    decimals: Option<WireInt>,
}

impl WireToken {
    fn into_raw(self) -> Result<RawToken, DataSourceError> {
        let decimals = parse_opt_int(self.decimals, "decimals")?
            .map(|d| {
                u32::try_from(d)
                    .map_err(|_| DataSourceError::ParseError(format!("Invalid decimals: {}", d)))
            })
            .transpose()?;
        Ok(RawToken {
            id: self.id,
            symbol: self.symbol,
            name: self.name,
            underlying_address: self.underlying_address,
            decimals,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFlowPeriod {
    id: String,
    flow_rate: Option<String>,
    token: Option<WireToken>,
    sender: Option<WireAccount>,
    receiver: Option<WireAccount>,
    started_at_timestamp: Option<WireInt>,
    started_at_block_number: Option<WireInt>,
    started_at_event: Option<WireEvent>,
    stopped_at_timestamp: Option<WireInt>,
    stopped_at_block_number: Option<WireInt>,
    stopped_at_event: Option<WireEvent>,
    total_amount_streamed: Option<String>,
}

impl WireFlowPeriod {
    fn into_raw(self) -> Result<RawFlowPeriod, DataSourceError> {
        Ok(RawFlowPeriod {
            id: self.id,
            flow_rate: self.flow_rate,
            token: self.token.map(WireToken::into_raw).transpose()?,
            sender: self.sender.and_then(|a| a.id),
            receiver: self.receiver.and_then(|a| a.id),
            started_at: parse_opt_int(self.started_at_timestamp, "startedAtTimestamp")?,
            started_at_block: parse_opt_block(self.started_at_block_number, "startedAtBlockNumber")?,
            started_at_tx: self.started_at_event.and_then(|e| e.transaction_hash),
            stopped_at: parse_opt_int(self.stopped_at_timestamp, "stoppedAtTimestamp")?,
            stopped_at_block: parse_opt_block(self.stopped_at_block_number, "stoppedAtBlockNumber")?,
            stopped_at_tx: self.stopped_at_event.and_then(|e| e.transaction_hash),
            total_amount_streamed: self.total_amount_streamed,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTransfer {
    id: String,
    value: Option<String>,
    token: Option<String>,
    from: Option<WireAccount>,
    to: Option<WireAccount>,
    timestamp: Option<WireInt>,
    block_number: Option<WireInt>,
    transaction_hash: Option<String>,
}

impl WireTransfer {
    fn into_raw(self) -> Result<RawTransfer, DataSourceError> {
        Ok(RawTransfer {
            id: self.id,
            value: self.value,
            token: self.token,
            from: self.from.and_then(|a| a.id),
            to: self.to.and_then(|a| a.id),
            timestamp: parse_opt_int(self.timestamp, "timestamp")?,
            block_number: parse_opt_block(self.block_number, "blockNumber")?,
            transaction_hash: self.transaction_hash,
        })
    }
}
