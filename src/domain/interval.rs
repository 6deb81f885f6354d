//! Funding intervals: continuous flows and instantaneous transfers in one shape.

use crate::domain::{Address, Amount, ChainId, UnixTime};
use serde::{Deserialize, Serialize};

/// Decimals used by Super Tokens when the indexer does not report them.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    /// Constant-rate flow between `started_at` and `stopped_at`.
    Stream,
    /// Single transfer, `started_at == stopped_at`.
    Transfer,
}

/// Token metadata attached to every interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRef {
    pub id: Address,
    pub symbol: String,
    pub name: String,
    pub underlying_address: Address,
    pub decimals: u32,
}

/// Unified funding interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingInterval {
    pub id: String,
    pub chain_id: ChainId,
    pub kind: IntervalKind,
    pub token: TokenRef,
    pub sender: Address,
    pub receiver: Address,
    /// Base units per second; zero for transfers.
    pub flow_rate: Amount,
    pub started_at: UnixTime,
    /// `None` while the flow is still running.
    pub stopped_at: Option<UnixTime>,
    /// Fixed value of a transfer, or the indexer's streamed total for a flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_tx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at_tx: Option<String>,
}

impl FundingInterval {
    pub fn is_transfer(&self) -> bool {
        self.kind == IntervalKind::Transfer
    }

    /// Zero-duration intervals (transfers) settle a fixed amount rather than a rate.
    pub fn is_instantaneous(&self) -> bool {
        self.stopped_at == Some(self.started_at)
    }

    /// Key used to collapse the same token across records for price lookup.
    pub fn token_key(&self) -> TokenKey {
        TokenKey {
            chain_id: self.chain_id,
            token: self.token.id.clone(),
        }
    }
}

/// `(chain, token address)` pair used to batch price lookups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenKey {
    pub chain_id: ChainId,
    pub token: Address,
}
