//! Raw records as delivered by the indexing backend, before normalization.
//!
//! Every field the normalizer validates is optional here so that a missing
//! value surfaces as a `MalformedRecord` instead of being silently dropped by
//! deserialization.

use crate::domain::{Address, UnixTime};
use std::collections::HashMap;

/// Sub-query categories of a funding query. Each paginates independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    InflowingStreams,
    OutflowingStreams,
    InflowingActiveStreams,
    OutflowingActiveStreams,
    IncomingTransfers,
    OutgoingTransfers,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::InflowingStreams,
        Category::OutflowingStreams,
        Category::InflowingActiveStreams,
        Category::OutflowingActiveStreams,
        Category::IncomingTransfers,
        Category::OutgoingTransfers,
    ];

    /// Field alias used in the GraphQL document.
    pub fn alias(&self) -> &'static str {
        match self {
            Category::InflowingStreams => "inflowingStreamPeriods",
            Category::OutflowingStreams => "outflowingStreamPeriods",
            Category::InflowingActiveStreams => "inflowingActiveStreamPeriods",
            Category::OutflowingActiveStreams => "outflowingActiveStreamPeriods",
            Category::IncomingTransfers => "incomingTransfers",
            Category::OutgoingTransfers => "outgoingTransfers",
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            Category::IncomingTransfers | Category::OutgoingTransfers
        )
    }
}

/// Parameters shared by every page of one chain's funding query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingQuery {
    pub addresses: Vec<Address>,
    /// Empty means "any counterparty".
    pub counterparties: Vec<Address>,
    pub from: UnixTime,
    pub to: UnixTime,
}

/// One category's slice of a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub category: Category,
    pub skip: usize,
    pub first: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawToken {
    pub id: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub underlying_address: Option<String>,
    pub decimals: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFlowPeriod {
    pub id: String,
    pub flow_rate: Option<String>,
    pub token: Option<RawToken>,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub started_at: Option<i64>,
    pub started_at_block: Option<u64>,
    pub started_at_tx: Option<String>,
    pub stopped_at: Option<i64>,
    pub stopped_at_block: Option<u64>,
    pub stopped_at_tx: Option<String>,
    pub total_amount_streamed: Option<String>,
}

/// Transfer events reference their token by id only; metadata is fetched separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTransfer {
    pub id: String,
    pub value: Option<String>,
    pub token: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub timestamp: Option<i64>,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecord {
    Flow(RawFlowPeriod),
    Transfer(RawTransfer),
}

impl RawRecord {
    pub fn id(&self) -> &str {
        match self {
            RawRecord::Flow(flow) => &flow.id,
            RawRecord::Transfer(transfer) => &transfer.id,
        }
    }
}

/// Records returned for each requested category of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundingPage {
    pub records: HashMap<Category, Vec<RawRecord>>,
}

impl FundingPage {
    pub fn insert(&mut self, category: Category, records: Vec<RawRecord>) {
        self.records.insert(category, records);
    }

    /// Remove and return a category's records; absent categories yield an empty page.
    pub fn take(&mut self, category: Category) -> Vec<RawRecord> {
        self.records.remove(&category).unwrap_or_default()
    }
}
