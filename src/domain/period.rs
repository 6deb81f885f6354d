//! Virtualized sub-periods and the records returned to callers.

use crate::domain::{Amount, FundingInterval, UnixTime};
use serde::Serialize;

/// Calendar-aligned slice of a funding interval with its settled amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualPeriod {
    pub start_time: UnixTime,
    pub end_time: UnixTime,
    /// Signed: positive for inflow to a queried address, negative for outflow.
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_fiat: Option<Amount>,
}

impl VirtualPeriod {
    pub fn duration(&self) -> i64 {
        self.end_time.as_secs() - self.start_time.as_secs()
    }
}

/// One funding interval with its ordered virtual periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRecord {
    #[serde(flatten)]
    pub interval: FundingInterval,
    pub virtual_periods: Vec<VirtualPeriod>,
}
